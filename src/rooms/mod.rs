// src/rooms/mod.rs
pub mod blueprint;
pub mod pool;
pub mod room_set;

pub use blueprint::{BoxGeometry, Connection, Marker, RoomBlueprint, RoomFeatures, RoomGeometry};
pub use pool::{Pool, PoolDefinition, PoolEntry};
pub use room_set::{ConnectionData, RoomDefinition, RoomSet, RoomSetData};
