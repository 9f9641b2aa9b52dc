// src/generation/planned_room.rs

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;

use crate::rooms::{Connection, Marker, RoomBlueprint, RoomFeatures};
use crate::utils::{BlockPos, Region, Rotation};

/// Identity of a placement: two rooms with the same blueprint at the same
/// position are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomKey {
    pub blueprint: String,
    pub position: BlockPos,
}

/// A blueprint placed at a position and rotation, with per-connection
/// open/closed state.
#[derive(Debug, Clone)]
pub struct PlannedRoom {
    blueprint: Arc<RoomBlueprint>,
    position: BlockPos,
    rotation: Rotation,
    bounds: Region,
    features: Arc<RoomFeatures>,
    /// Connection on this room that was matched to reach its parent.
    connected_to_parent_via: Option<usize>,
    /// Connection on the parent that leads here; reopened on revert.
    parent_connects_via: Option<usize>,
    open: BTreeSet<usize>,
}

impl PlannedRoom {
    pub fn new(
        blueprint: Arc<RoomBlueprint>,
        position: BlockPos,
        rotation: Rotation,
        connected_to_parent_via: Option<usize>,
    ) -> Self {
        let bounds = blueprint.bounds_with(position, rotation);
        let features = blueprint.features(rotation);
        let open = features.connectable().map(|c| c.index).collect();
        PlannedRoom {
            blueprint,
            position,
            rotation,
            bounds,
            features,
            connected_to_parent_via,
            parent_connects_via: None,
            open,
        }
    }

    /// The unrotated start room.
    pub fn root(blueprint: Arc<RoomBlueprint>, position: BlockPos) -> Self {
        Self::new(blueprint, position, Rotation::None, None)
    }

    pub fn blueprint(&self) -> &Arc<RoomBlueprint> {
        &self.blueprint
    }

    pub fn blueprint_id(&self) -> &str {
        self.blueprint.id()
    }

    pub fn position(&self) -> BlockPos {
        self.position
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn bounds(&self) -> Region {
        self.bounds
    }

    pub fn features(&self) -> &RoomFeatures {
        &self.features
    }

    pub fn key(&self) -> RoomKey {
        RoomKey {
            blueprint: self.blueprint.id().to_string(),
            position: self.position,
        }
    }

    pub fn connection(&self, index: usize) -> Option<&Connection> {
        self.features.connections.get(index)
    }

    /// World position of a connection point.
    pub fn connection_point(&self, index: usize) -> Option<BlockPos> {
        self.connection(index).map(|c| self.position + c.offset)
    }

    pub fn connected_to_parent_via(&self) -> Option<usize> {
        self.connected_to_parent_via
    }

    pub fn parent_connects_via(&self) -> Option<usize> {
        self.parent_connects_via
    }

    pub fn set_parent_connects_via(&mut self, via: Option<usize>) {
        self.parent_connects_via = via;
    }

    pub fn open_connections(&self) -> impl Iterator<Item = usize> + '_ {
        self.open.iter().copied()
    }

    pub fn has_open_connections(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open.contains(&index)
    }

    /// Returns whether the connection was open.
    pub fn set_closed(&mut self, index: usize) -> bool {
        self.open.remove(&index)
    }

    /// Reopens a connectable connection. Returns whether it was closed.
    pub fn set_open(&mut self, index: usize) -> bool {
        match self.connection(index) {
            Some(c) if c.is_connectable() => self.open.insert(index),
            _ => false,
        }
    }

    pub fn connectable_count(&self) -> usize {
        self.features.connectable_count()
    }
}

impl PartialEq for PlannedRoom {
    fn eq(&self, other: &Self) -> bool {
        self.blueprint.id() == other.blueprint.id() && self.position == other.position
    }
}

impl Eq for PlannedRoom {}

impl Hash for PlannedRoom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.blueprint.id().hash(state);
        self.position.hash(state);
    }
}

/// What the host world painter needs to instantiate a placed room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedRoomRecord {
    pub blueprint: String,
    pub position: BlockPos,
    pub rotation: Rotation,
    pub bounds: Region,
    /// Markers in world coordinates.
    pub markers: Vec<Marker>,
}

impl From<&PlannedRoom> for PlacedRoomRecord {
    fn from(room: &PlannedRoom) -> Self {
        PlacedRoomRecord {
            blueprint: room.blueprint_id().to_string(),
            position: room.position(),
            rotation: room.rotation(),
            bounds: room.bounds(),
            markers: room
                .features()
                .markers
                .iter()
                .map(|m| Marker {
                    offset: room.position() + m.offset,
                    kind: m.kind.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scenario_set;
    use std::collections::HashSet;

    #[test]
    fn test_new_room_opens_connectable_connections() {
        let set = scenario_set();
        let hall = PlannedRoom::new(Arc::clone(set.blueprint("hall").unwrap()), BlockPos::ORIGIN, Rotation::None, None);
        assert_eq!(hall.open_connections().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(hall.connectable_count(), 2);
    }

    #[test]
    fn test_close_and_reopen() {
        let set = scenario_set();
        let mut hall = PlannedRoom::new(Arc::clone(set.blueprint("hall").unwrap()), BlockPos::ORIGIN, Rotation::None, None);
        assert!(hall.set_closed(1));
        assert!(!hall.set_closed(1));
        assert!(!hall.is_open(1));
        assert!(hall.set_open(1));
        assert!(hall.is_open(1));
        assert!(!hall.set_open(7));
    }

    #[test]
    fn test_identity_ignores_rotation() {
        let set = scenario_set();
        let bp = Arc::clone(set.blueprint("hall").unwrap());
        let a = PlannedRoom::new(Arc::clone(&bp), BlockPos::new(1, 2, 3), Rotation::None, None);
        let b = PlannedRoom::new(Arc::clone(&bp), BlockPos::new(1, 2, 3), Rotation::Clockwise90, Some(0));
        let c = PlannedRoom::new(bp, BlockPos::new(1, 2, 4), Rotation::None, None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let set: HashSet<PlannedRoom> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_record_moves_markers_into_world() {
        let set = scenario_set();
        let end = PlannedRoom::new(Arc::clone(set.blueprint("end").unwrap()), BlockPos::new(10, 64, 10), Rotation::None, Some(0));
        let record = PlacedRoomRecord::from(&end);
        assert_eq!(record.blueprint, "end");
        assert_eq!(record.markers[0].offset, BlockPos::new(12, 65, 12));
    }
}
