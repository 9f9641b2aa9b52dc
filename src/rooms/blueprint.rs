// src/rooms/blueprint.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::rooms::pool::Pool;
use crate::utils::{BlockPos, Direction, Region, Rotation};

/// A jigsaw attachment point on a room at some rotation.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Position in the room's feature list; stable across rotations.
    pub index: usize,
    /// Offset from the room's placement origin.
    pub offset: BlockPos,
    pub direction: Direction,
    pub pool: Option<Arc<Pool>>,
}

impl Connection {
    /// Only connections with a drawable pool can ever be open.
    pub fn is_connectable(&self) -> bool {
        self.pool.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// A non-connection content marker (spawners, loot, ...) passed through to the
/// host world painter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub offset: BlockPos,
    pub kind: String,
}

/// Everything a room exposes at one rotation.
#[derive(Debug, Clone, Default)]
pub struct RoomFeatures {
    pub connections: Vec<Connection>,
    pub markers: Vec<Marker>,
}

impl RoomFeatures {
    pub fn connectable(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.iter().filter(|c| c.is_connectable())
    }

    pub fn connectable_count(&self) -> usize {
        self.connectable().count()
    }
}

/// Geometry provider for a blueprint. Both methods must be pure functions of
/// their arguments.
pub trait RoomGeometry: Send + Sync + fmt::Debug {
    fn bounds_with(&self, position: BlockPos, rotation: Rotation) -> Region;
    fn features_with(&self, rotation: Rotation) -> RoomFeatures;
}

/// A rectangular room whose authored features are rotated about the
/// placement origin.
#[derive(Debug, Clone)]
pub struct BoxGeometry {
    size: BlockPos,
    connections: Vec<Connection>,
    markers: Vec<Marker>,
}

impl BoxGeometry {
    pub fn new(size: BlockPos, connections: Vec<Connection>, markers: Vec<Marker>) -> Self {
        BoxGeometry { size, connections, markers }
    }

    pub fn size(&self) -> BlockPos {
        self.size
    }
}

impl RoomGeometry for BoxGeometry {
    fn bounds_with(&self, position: BlockPos, rotation: Rotation) -> Region {
        Region::from_size(self.size, position, rotation)
    }

    fn features_with(&self, rotation: Rotation) -> RoomFeatures {
        RoomFeatures {
            connections: self
                .connections
                .iter()
                .map(|c| Connection {
                    index: c.index,
                    offset: rotation.rotate_pos(c.offset),
                    direction: c.direction.rotate(rotation),
                    pool: c.pool.clone(),
                })
                .collect(),
            markers: self
                .markers
                .iter()
                .map(|m| Marker {
                    offset: rotation.rotate_pos(m.offset),
                    kind: m.kind.clone(),
                })
                .collect(),
        }
    }
}

/// Immutable room template, shared by every placement of it.
#[derive(Debug)]
pub struct RoomBlueprint {
    id: String,
    geometry: Box<dyn RoomGeometry>,
    cache: RwLock<HashMap<Rotation, Arc<RoomFeatures>>>,
    terminal: bool,
}

impl RoomBlueprint {
    pub fn new(id: impl Into<String>, geometry: impl RoomGeometry + 'static) -> Self {
        let reference = geometry.features_with(Rotation::None);
        let terminal = reference.connectable_count() <= 1;
        let mut cache = HashMap::new();
        cache.insert(Rotation::None, Arc::new(reference));
        RoomBlueprint {
            id: id.into(),
            geometry: Box::new(geometry),
            cache: RwLock::new(cache),
            terminal,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Feature list at `rotation`, computed once and shared afterwards.
    pub fn features(&self, rotation: Rotation) -> Arc<RoomFeatures> {
        if let Some(features) = self.cache.read().get(&rotation) {
            return Arc::clone(features);
        }
        let computed = Arc::new(self.geometry.features_with(rotation));
        let mut cache = self.cache.write();
        Arc::clone(cache.entry(rotation).or_insert(computed))
    }

    pub fn bounds_with(&self, position: BlockPos, rotation: Rotation) -> Region {
        self.geometry.bounds_with(position, rotation)
    }

    /// At most one connectable connection at the reference rotation.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hall() -> RoomBlueprint {
        let geometry = BoxGeometry::new(
            BlockPos::new(5, 5, 9),
            vec![
                Connection { index: 0, offset: BlockPos::new(2, 1, 8), direction: Direction::South, pool: None },
                Connection { index: 1, offset: BlockPos::new(2, 1, 0), direction: Direction::North, pool: None },
            ],
            vec![Marker { offset: BlockPos::new(2, 1, 4), kind: "torch".into() }],
        );
        RoomBlueprint::new("hall", geometry)
    }

    #[test]
    fn test_features_rotate_with_room() {
        let bp = hall();
        let rotated = bp.features(Rotation::Clockwise180);
        assert_eq!(rotated.connections[0].direction, Direction::North);
        assert_eq!(rotated.connections[0].offset, BlockPos::new(-2, 1, -8));
        assert_eq!(rotated.markers[0].offset, BlockPos::new(-2, 1, -4));
        assert_eq!(rotated.connections[1].index, 1);
    }

    #[test]
    fn test_connections_stay_inside_rotated_bounds() {
        let bp = hall();
        let origin = BlockPos::new(100, 64, -30);
        for rotation in Rotation::ALL {
            let bounds = bp.bounds_with(origin, rotation);
            for c in &bp.features(rotation).connections {
                assert!(bounds.contains(origin + c.offset), "{rotation:?} {:?}", c.offset);
            }
        }
    }

    #[test]
    fn test_cache_returns_shared_features() {
        let bp = hall();
        let a = bp.features(Rotation::Clockwise90);
        let b = bp.features(Rotation::Clockwise90);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_pool_less_connections_are_not_connectable() {
        let bp = hall();
        assert_eq!(bp.features(Rotation::None).connectable_count(), 0);
        assert!(bp.is_terminal());
    }
}
