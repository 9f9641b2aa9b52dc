// src/spatial/spatial_index.rs

use std::collections::HashMap;
use std::sync::Arc;

use crate::spatial::CELL_SIZE;
use crate::utils::Region;

/// Horizontal grid cell coordinate.
pub type CellKey = (i32, i32);

type CellMap = HashMap<CellKey, Vec<Region>>;

/// Every cell a region's X/Z footprint touches.
fn footprint(region: &Region) -> impl Iterator<Item = CellKey> {
    let x0 = region.min.x.div_euclid(CELL_SIZE);
    let x1 = region.max.x.div_euclid(CELL_SIZE);
    let z0 = region.min.z.div_euclid(CELL_SIZE);
    let z1 = region.max.z.div_euclid(CELL_SIZE);
    (x0..=x1).flat_map(move |x| (z0..=z1).map(move |z| (x, z)))
}

fn overlaps_any(cells: &CellMap, region: &Region) -> bool {
    footprint(region).any(|key| {
        cells
            .get(&key)
            .is_some_and(|placed| placed.iter().any(|other| other.intersects(region)))
    })
}

fn within_vertical_bounds(region: &Region, min_y: i32, max_y: i32) -> bool {
    region.min.y >= min_y && region.max.y <= max_y
}

/// Chunk-bucketed grid of placed room bounds.
///
/// The cell map is shared copy-on-write with any outstanding [`Snapshot`]:
/// mutating while a snapshot is alive clones the map once, so readers never
/// see a partial update.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cells: Arc<CellMap>,
    min_y: i32,
    max_y: i32,
    regions: usize,
}

impl SpatialIndex {
    pub fn new(min_y: i32, max_y: i32) -> Self {
        SpatialIndex {
            cells: Arc::new(HashMap::new()),
            min_y,
            max_y,
            regions: 0,
        }
    }

    /// Adds `region` to every cell its footprint overlaps.
    pub fn index(&mut self, region: Region) {
        let cells = Arc::make_mut(&mut self.cells);
        for key in footprint(&region) {
            cells.entry(key).or_default().push(region);
        }
        self.regions += 1;
    }

    /// Removes one occurrence of `region` from every cell of its footprint.
    /// Returns `false` if it was not indexed.
    pub fn unindex(&mut self, region: &Region) -> bool {
        if !footprint(region).all(|key| self.cells.get(&key).is_some_and(|c| c.contains(region))) {
            return false;
        }
        let cells = Arc::make_mut(&mut self.cells);
        for key in footprint(region) {
            if let Some(bucket) = cells.get_mut(&key) {
                if let Some(pos) = bucket.iter().rposition(|r| r == region) {
                    bucket.remove(pos);
                }
                if bucket.is_empty() {
                    cells.remove(&key);
                }
            }
        }
        self.regions -= 1;
        true
    }

    /// Immutable point-in-time view for concurrent readers.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cells: Arc::clone(&self.cells),
            min_y: self.min_y,
            max_y: self.max_y,
        }
    }

    pub fn intersects(&self, region: &Region) -> bool {
        overlaps_any(&self.cells, region)
    }

    pub fn is_within_vertical_bounds(&self, region: &Region) -> bool {
        within_vertical_bounds(region, self.min_y, self.max_y)
    }

    /// Number of indexed regions.
    pub fn len(&self) -> usize {
        self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions == 0
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn regions_in_cell(&self, key: CellKey) -> &[Region] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.cells = Arc::new(HashMap::new());
        self.regions = 0;
    }
}

/// Read-only copy of a [`SpatialIndex`] taken at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    cells: Arc<CellMap>,
    min_y: i32,
    max_y: i32,
}

impl Snapshot {
    pub fn intersects(&self, region: &Region) -> bool {
        overlaps_any(&self.cells, region)
    }

    pub fn is_within_vertical_bounds(&self, region: &Region) -> bool {
        within_vertical_bounds(region, self.min_y, self.max_y)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
