// src/utils/geometry.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Shrink applied to both boxes before an overlap test, so rooms that only
/// share a face are not treated as colliding.
pub const OVERLAP_EPSILON: f64 = 1e-3;

/// An integer block coordinate. Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring position one step in `direction`.
    pub fn offset(self, direction: Direction) -> Self {
        self + direction.unit()
    }

    pub fn min(self, other: BlockPos) -> Self {
        BlockPos::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn max(self, other: BlockPos) -> Self {
        BlockPos::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn to_f64(self) -> [f64; 3] {
        [self.x as f64, self.y as f64, self.z as f64]
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from(v: [i32; 3]) -> Self {
        BlockPos::new(v[0], v[1], v[2])
    }
}

impl From<BlockPos> for [i32; 3] {
    fn from(p: BlockPos) -> Self {
        [p.x, p.y, p.z]
    }
}

impl Add for BlockPos {
    type Output = BlockPos;

    fn add(self, other: BlockPos) -> BlockPos {
        BlockPos::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;

    fn sub(self, other: BlockPos) -> BlockPos {
        BlockPos::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for BlockPos {
    type Output = BlockPos;

    fn neg(self) -> BlockPos {
        BlockPos::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// The six axis-aligned directions. North is -Z, East is +X, Up is +Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn unit(self) -> BlockPos {
        match self {
            Direction::North => BlockPos::new(0, 0, -1),
            Direction::South => BlockPos::new(0, 0, 1),
            Direction::East => BlockPos::new(1, 0, 0),
            Direction::West => BlockPos::new(-1, 0, 0),
            Direction::Up => BlockPos::new(0, 1, 0),
            Direction::Down => BlockPos::new(0, -1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        !matches!(self, Direction::Up | Direction::Down)
    }

    /// Applies a rotation about the vertical axis. Up and Down are fixed.
    pub fn rotate(self, rotation: Rotation) -> Direction {
        if !self.is_horizontal() {
            return self;
        }
        let mut dir = self;
        for _ in 0..rotation.quarter_turns() {
            dir = match dir {
                Direction::North => Direction::East,
                Direction::East => Direction::South,
                Direction::South => Direction::West,
                Direction::West => Direction::North,
                other => other,
            };
        }
        dir
    }
}

/// A quarter-turn rotation about the vertical axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    CounterClockwise90,
}

impl Rotation {
    /// Fixed evaluation order for candidate generation.
    pub const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::Clockwise90,
        Rotation::Clockwise180,
        Rotation::CounterClockwise90,
    ];

    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Clockwise180 => 2,
            Rotation::CounterClockwise90 => 3,
        }
    }

    /// Rotates a position about the origin (the placement anchor).
    pub fn rotate_pos(self, pos: BlockPos) -> BlockPos {
        match self {
            Rotation::None => pos,
            Rotation::Clockwise90 => BlockPos::new(-pos.z, pos.y, pos.x),
            Rotation::Clockwise180 => BlockPos::new(-pos.x, pos.y, -pos.z),
            Rotation::CounterClockwise90 => BlockPos::new(pos.z, pos.y, -pos.x),
        }
    }
}

/// An axis-aligned box of blocks. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Region {
    /// Builds a region from any two opposite corners.
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Region { min: a.min(b), max: a.max(b) }
    }

    /// A `size`-sized box anchored at the origin, rotated, then moved to `position`.
    pub fn from_size(size: BlockPos, position: BlockPos, rotation: Rotation) -> Self {
        let far = BlockPos::new(size.x - 1, size.y - 1, size.z - 1);
        Region::new(rotation.rotate_pos(BlockPos::ORIGIN), rotation.rotate_pos(far)).translate(position)
    }

    pub fn translate(self, by: BlockPos) -> Self {
        Region { min: self.min + by, max: self.max + by }
    }

    pub fn size(&self) -> BlockPos {
        self.max - self.min + BlockPos::new(1, 1, 1)
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Continuous centre of the covered blocks.
    pub fn center(&self) -> [f64; 3] {
        let lo = self.min.to_f64();
        let hi = self.max.to_f64();
        [
            (lo[0] + hi[0] + 1.0) / 2.0,
            (lo[1] + hi[1] + 1.0) / 2.0,
            (lo[2] + hi[2] + 1.0) / 2.0,
        ]
    }

    /// AABB overlap with both boxes shrunk by `OVERLAP_EPSILON`, treating each
    /// block as the unit cube `[p, p + 1)`.
    pub fn intersects(&self, other: &Region) -> bool {
        let (a_lo, a_hi) = self.shrunk();
        let (b_lo, b_hi) = other.shrunk();
        (0..3).all(|axis| a_lo[axis] < b_hi[axis] && b_lo[axis] < a_hi[axis])
    }

    fn shrunk(&self) -> ([f64; 3], [f64; 3]) {
        let lo = self.min.to_f64();
        let hi = self.max.to_f64();
        (
            [lo[0] + OVERLAP_EPSILON, lo[1] + OVERLAP_EPSILON, lo[2] + OVERLAP_EPSILON],
            [
                hi[0] + 1.0 - OVERLAP_EPSILON,
                hi[1] + 1.0 - OVERLAP_EPSILON,
                hi[2] + 1.0 - OVERLAP_EPSILON,
            ],
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}
