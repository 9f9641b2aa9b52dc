// src/rooms/room_set.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::rooms::blueprint::{BoxGeometry, Connection, Marker, RoomBlueprint};
use crate::rooms::pool::{Pool, PoolDefinition};
use crate::utils::{BlockPos, Direction, Region, Rotation};

/// Authored room set, as read from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSetData {
    /// Room placed at the start position; it is never rotated.
    pub root: String,
    pub rooms: BTreeMap<String, RoomDefinition>,
    #[serde(default)]
    pub pools: BTreeMap<String, PoolDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDefinition {
    pub size: BlockPos,
    #[serde(default)]
    pub connections: Vec<ConnectionData>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionData {
    /// Block inside the room, relative to its minimum corner.
    pub position: BlockPos,
    pub direction: Direction,
    #[serde(default)]
    pub pool: Option<String>,
}

/// Validated blueprints and flattened pools.
#[derive(Debug)]
pub struct RoomSet {
    root: Arc<RoomBlueprint>,
    blueprints: BTreeMap<String, Arc<RoomBlueprint>>,
    pools: BTreeMap<String, Arc<Pool>>,
}

fn fail(err: LoadError) -> LoadError {
    error!("room set rejected: {}", err);
    err
}

impl RoomSet {
    /// Resolves every reference in `data` and checks the content rules:
    /// no dangling root/pool/room names, every pool member can attach back
    /// to its pool, and at least one pool member is terminal.
    pub fn load(data: &RoomSetData) -> Result<RoomSet, LoadError> {
        if !data.rooms.contains_key(&data.root) {
            return Err(fail(LoadError::UnknownRoot(data.root.clone())));
        }

        let mut pools = BTreeMap::new();
        for (id, definition) in &data.pools {
            // Pool::of logs its own failures.
            let pool = Pool::of(data, id, definition)?;
            pools.insert(id.clone(), Arc::new(pool));
        }

        let mut blueprints = BTreeMap::new();
        for (id, definition) in &data.rooms {
            let blueprint = Self::build_blueprint(id, definition, &pools).map_err(fail)?;
            blueprints.insert(id.clone(), Arc::new(blueprint));
        }

        let mut has_members = false;
        let mut has_terminal = false;
        for (pool_id, pool) in &pools {
            for (room_id, _) in pool.entries().elements() {
                // Pool::of already rejected unknown room names.
                let Some(blueprint) = blueprints.get(room_id) else {
                    continue;
                };
                has_members = true;
                has_terminal |= blueprint.is_terminal();
                let reciprocal = blueprint
                    .features(Rotation::None)
                    .connections
                    .iter()
                    .any(|c| c.pool.as_ref().is_some_and(|p| p.is_connected(pool)));
                if !reciprocal {
                    return Err(fail(LoadError::NoReciprocalConnection {
                        room: room_id.clone(),
                        pool: pool_id.clone(),
                    }));
                }
            }
        }
        if has_members && !has_terminal {
            return Err(fail(LoadError::NoTerminalRooms));
        }

        let root = Arc::clone(&blueprints[&data.root]);
        info!(
            "loaded room set: {} rooms, {} pools, root `{}`",
            blueprints.len(),
            pools.len(),
            root.id()
        );
        Ok(RoomSet { root, blueprints, pools })
    }

    pub fn from_json_str(json: &str) -> Result<RoomSet, LoadError> {
        let data: RoomSetData = serde_json::from_str(json).map_err(|e| fail(e.into()))?;
        Self::load(&data)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<RoomSet, LoadError> {
        let path = path.as_ref();
        debug!("reading room set from {}", path.display());
        let json = fs::read_to_string(path).map_err(|e| fail(e.into()))?;
        Self::from_json_str(&json)
    }

    fn build_blueprint(
        id: &str,
        definition: &RoomDefinition,
        pools: &BTreeMap<String, Arc<Pool>>,
    ) -> Result<RoomBlueprint, LoadError> {
        let size = definition.size;
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return Err(LoadError::InvalidSize {
                room: id.to_string(),
                size: size.to_string(),
            });
        }
        let extent = Region::new(BlockPos::ORIGIN, BlockPos::new(size.x - 1, size.y - 1, size.z - 1));

        let mut connections = Vec::with_capacity(definition.connections.len());
        for (index, data) in definition.connections.iter().enumerate() {
            if !extent.contains(data.position) {
                return Err(LoadError::ConnectionOutsideRoom {
                    room: id.to_string(),
                    index,
                });
            }
            let pool = match &data.pool {
                Some(name) => Some(Arc::clone(pools.get(name).ok_or_else(|| LoadError::UnknownPool {
                    pool: name.clone(),
                    referenced_by: format!("connection #{} of room `{}`", index, id),
                })?)),
                None => None,
            };
            connections.push(Connection {
                index,
                offset: data.position,
                direction: data.direction,
                pool,
            });
        }

        Ok(RoomBlueprint::new(
            id,
            BoxGeometry::new(size, connections, definition.markers.clone()),
        ))
    }

    pub fn root(&self) -> &Arc<RoomBlueprint> {
        &self.root
    }

    pub fn blueprint(&self, id: &str) -> Option<&Arc<RoomBlueprint>> {
        self.blueprints.get(id)
    }

    pub fn pool(&self, id: &str) -> Option<&Arc<Pool>> {
        self.pools.get(id)
    }
}
