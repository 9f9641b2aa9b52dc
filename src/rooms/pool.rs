// src/rooms/pool.rs

use std::collections::BTreeSet;

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::random::WeightedList;
use crate::rooms::room_set::RoomSetData;

/// One weighted room entry of a terminal pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub room: String,
    pub weight: f64,
}

/// Authored pool algebra, flattened into a [`Pool`] at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PoolDefinition {
    /// Resolves to another named pool.
    Reference { pool: String },
    /// Rooms and connection edges of every member.
    Union { pools: Vec<PoolDefinition> },
    /// Leaf holding the actual room entries. `connects_to` lists further pools
    /// this one declares itself compatible with.
    Terminal {
        rooms: Vec<PoolEntry>,
        #[serde(default)]
        connects_to: Vec<String>,
    },
}

/// A flattened, named pool: weighted room ids plus the set of pools it
/// connects to.
#[derive(Debug, Clone)]
pub struct Pool {
    id: String,
    entries: WeightedList<String>,
    connected_pools: BTreeSet<String>,
}

impl Pool {
    /// Flattens `definition` for the pool named `id`.
    ///
    /// Dangling pool or room references, reference cycles and negative
    /// weights are authoring errors and abort with a logged [`LoadError`].
    pub fn of(data: &RoomSetData, id: &str, definition: &PoolDefinition) -> Result<Pool, LoadError> {
        let mut pool = Pool {
            id: id.to_string(),
            entries: WeightedList::new(),
            connected_pools: BTreeSet::new(),
        };
        // A pool always accepts its own connections.
        pool.connected_pools.insert(id.to_string());

        let mut visiting = vec![id.to_string()];
        pool.flatten(data, id, definition, &mut visiting)
            .inspect_err(|e| error!("pool `{}` could not be built: {}", id, e))?;
        Ok(pool)
    }

    fn flatten(
        &mut self,
        data: &RoomSetData,
        owner: &str,
        definition: &PoolDefinition,
        visiting: &mut Vec<String>,
    ) -> Result<(), LoadError> {
        match definition {
            PoolDefinition::Reference { pool } => {
                if visiting.iter().any(|v| v == pool) {
                    let mut path = visiting.clone();
                    path.push(pool.clone());
                    return Err(LoadError::PoolCycle(path));
                }
                let target = data.pools.get(pool).ok_or_else(|| LoadError::UnknownPool {
                    pool: pool.clone(),
                    referenced_by: format!("pool `{}`", owner),
                })?;
                visiting.push(pool.clone());
                self.flatten(data, pool, target, visiting)?;
                visiting.pop();
            }
            PoolDefinition::Union { pools } => {
                for member in pools {
                    self.flatten(data, owner, member, visiting)?;
                }
            }
            PoolDefinition::Terminal { rooms, connects_to } => {
                for entry in rooms {
                    if !data.rooms.contains_key(&entry.room) {
                        return Err(LoadError::UnknownRoom {
                            room: entry.room.clone(),
                            pool: owner.to_string(),
                        });
                    }
                    self.entries
                        .put(entry.room.clone(), entry.weight)
                        .map_err(|_| LoadError::NegativeWeight {
                            pool: owner.to_string(),
                            room: entry.room.clone(),
                            weight: entry.weight,
                        })?;
                }
                self.connected_pools.insert(owner.to_string());
                for other in connects_to {
                    if !data.pools.contains_key(other) {
                        return Err(LoadError::UnknownPool {
                            pool: other.clone(),
                            referenced_by: format!("pool `{}`", owner),
                        });
                    }
                    self.connected_pools.insert(other.clone());
                }
            }
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entries(&self) -> &WeightedList<String> {
        &self.entries
    }

    pub fn connected_pools(&self) -> &BTreeSet<String> {
        &self.connected_pools
    }

    /// Compatibility is symmetric: either side declaring the other suffices.
    pub fn is_connected(&self, other: &Pool) -> bool {
        self.connected_pools.contains(&other.id) || other.connected_pools.contains(&self.id)
    }

    /// No entry can ever be drawn from this pool.
    pub fn is_empty(&self) -> bool {
        self.entries.has_no_weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::room_set::RoomDefinition;
    use crate::utils::BlockPos;
    use std::collections::BTreeMap;

    fn data_with(pools: Vec<(&str, PoolDefinition)>, rooms: &[&str]) -> RoomSetData {
        let rooms: BTreeMap<String, RoomDefinition> = rooms
            .iter()
            .map(|r| {
                (
                    r.to_string(),
                    RoomDefinition {
                        size: BlockPos::new(3, 3, 3),
                        connections: Vec::new(),
                        markers: Vec::new(),
                    },
                )
            })
            .collect();
        RoomSetData {
            root: rooms.keys().next().cloned().unwrap_or_default(),
            rooms,
            pools: pools.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    fn terminal(entries: &[(&str, f64)]) -> PoolDefinition {
        PoolDefinition::Terminal {
            rooms: entries
                .iter()
                .map(|(r, w)| PoolEntry { room: r.to_string(), weight: *w })
                .collect(),
            connects_to: Vec::new(),
        }
    }

    #[test]
    fn test_terminal_pool() {
        let data = data_with(vec![("a", terminal(&[("x", 1.0), ("y", 2.0)]))], &["x", "y"]);
        let pool = Pool::of(&data, "a", &data.pools["a"]).unwrap();
        assert_eq!(pool.entries().len(), 2);
        assert!(pool.connected_pools().contains("a"));
        assert!(pool.is_connected(&pool));
    }

    #[test]
    fn test_union_merges_rooms_and_edges() {
        let data = data_with(
            vec![
                ("a", terminal(&[("x", 1.0)])),
                ("b", terminal(&[("y", 2.0)])),
                (
                    "u",
                    PoolDefinition::Union {
                        pools: vec![
                            PoolDefinition::Reference { pool: "a".into() },
                            PoolDefinition::Reference { pool: "b".into() },
                        ],
                    },
                ),
            ],
            &["x", "y"],
        );
        let u = Pool::of(&data, "u", &data.pools["u"]).unwrap();
        let rooms: Vec<&String> = u.entries().elements().map(|(r, _)| r).collect();
        assert_eq!(rooms, vec!["x", "y"]);
        assert!(u.connected_pools().contains("a"));
        assert!(u.connected_pools().contains("b"));

        let a = Pool::of(&data, "a", &data.pools["a"]).unwrap();
        let b = Pool::of(&data, "b", &data.pools["b"]).unwrap();
        assert!(u.is_connected(&a));
        assert!(a.is_connected(&u));
        assert!(!a.is_connected(&b));
    }

    #[test]
    fn test_one_directional_declaration_is_enough() {
        let data = data_with(
            vec![
                (
                    "a",
                    PoolDefinition::Terminal {
                        rooms: vec![PoolEntry { room: "x".into(), weight: 1.0 }],
                        connects_to: vec!["b".into()],
                    },
                ),
                ("b", terminal(&[("y", 1.0)])),
            ],
            &["x", "y"],
        );
        let a = Pool::of(&data, "a", &data.pools["a"]).unwrap();
        let b = Pool::of(&data, "b", &data.pools["b"]).unwrap();
        assert!(a.is_connected(&b));
        assert!(b.is_connected(&a));
    }

    #[test]
    fn test_unknown_room_fails() {
        let data = data_with(vec![("a", terminal(&[("ghost", 1.0)]))], &["x"]);
        let err = Pool::of(&data, "a", &data.pools["a"]).unwrap_err();
        assert!(matches!(err, LoadError::UnknownRoom { ref room, .. } if room == "ghost"));
    }

    #[test]
    fn test_unknown_reference_fails() {
        let data = data_with(
            vec![("a", PoolDefinition::Reference { pool: "missing".into() })],
            &["x"],
        );
        let err = Pool::of(&data, "a", &data.pools["a"]).unwrap_err();
        assert!(matches!(err, LoadError::UnknownPool { ref pool, .. } if pool == "missing"));
    }

    #[test]
    fn test_reference_cycle_fails() {
        let data = data_with(
            vec![
                ("a", PoolDefinition::Reference { pool: "b".into() }),
                ("b", PoolDefinition::Reference { pool: "a".into() }),
            ],
            &["x"],
        );
        let err = Pool::of(&data, "a", &data.pools["a"]).unwrap_err();
        match err {
            LoadError::PoolCycle(path) => assert_eq!(path, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_weight_fails() {
        let data = data_with(vec![("a", terminal(&[("x", -2.0)]))], &["x"]);
        assert!(matches!(
            Pool::of(&data, "a", &data.pools["a"]),
            Err(LoadError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn test_empty_union_is_empty() {
        let data = data_with(vec![("a", PoolDefinition::Union { pools: Vec::new() })], &["x"]);
        let pool = Pool::of(&data, "a", &data.pools["a"]).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_definition_json_shape() {
        let json = r#"{"type":"union","pools":[{"type":"reference","pool":"a"},
            {"type":"terminal","rooms":[{"room":"x","weight":2.0}]}]}"#;
        let def: PoolDefinition = serde_json::from_str(json).unwrap();
        match def {
            PoolDefinition::Union { pools } => assert_eq!(pools.len(), 2),
            other => panic!("unexpected definition: {other:?}"),
        }
    }
}
