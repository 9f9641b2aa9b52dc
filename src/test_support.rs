// src/test_support.rs
// Room sets shared by the unit tests.

use std::sync::Arc;

use crate::rooms::RoomSet;

/// Root with one north connection into pool "A"; "A" holds a one-door "end"
/// (weight 1) and a straight two-door "hall" (weight 3).
pub fn scenario_json() -> String {
    r#"{
        "root": "root",
        "rooms": {
            "root": {
                "size": [5, 5, 5],
                "connections": [
                    { "position": [2, 1, 0], "direction": "north", "pool": "A" }
                ]
            },
            "end": {
                "size": [5, 5, 5],
                "connections": [
                    { "position": [2, 1, 4], "direction": "south", "pool": "A" }
                ],
                "markers": [ { "offset": [2, 1, 2], "kind": "chest" } ]
            },
            "hall": {
                "size": [5, 5, 9],
                "connections": [
                    { "position": [2, 1, 8], "direction": "south", "pool": "A" },
                    { "position": [2, 1, 0], "direction": "north", "pool": "A" }
                ]
            }
        },
        "pools": {
            "A": {
                "type": "terminal",
                "rooms": [
                    { "room": "end", "weight": 1.0 },
                    { "room": "hall", "weight": 3.0 }
                ]
            }
        }
    }"#
    .to_string()
}

/// A root with four doors and a pool of halls, crossings, tees and ends, so
/// branches can collide with one another.
pub fn branching_json() -> String {
    r#"{
        "root": "plaza",
        "rooms": {
            "plaza": {
                "size": [7, 5, 7],
                "connections": [
                    { "position": [3, 1, 0], "direction": "north", "pool": "halls" },
                    { "position": [3, 1, 6], "direction": "south", "pool": "halls" },
                    { "position": [6, 1, 3], "direction": "east", "pool": "halls" },
                    { "position": [0, 1, 3], "direction": "west", "pool": "halls" }
                ]
            },
            "hall": {
                "size": [5, 5, 9],
                "connections": [
                    { "position": [2, 1, 0], "direction": "north", "pool": "halls" },
                    { "position": [2, 1, 8], "direction": "south", "pool": "halls" }
                ]
            },
            "cross": {
                "size": [7, 5, 7],
                "connections": [
                    { "position": [3, 1, 0], "direction": "north", "pool": "halls" },
                    { "position": [3, 1, 6], "direction": "south", "pool": "halls" },
                    { "position": [6, 1, 3], "direction": "east", "pool": "halls" },
                    { "position": [0, 1, 3], "direction": "west", "pool": "halls" }
                ]
            },
            "tee": {
                "size": [7, 5, 7],
                "connections": [
                    { "position": [3, 1, 0], "direction": "north", "pool": "halls" },
                    { "position": [3, 1, 6], "direction": "south", "pool": "halls" },
                    { "position": [6, 1, 3], "direction": "east", "pool": "halls" }
                ]
            },
            "end": {
                "size": [5, 5, 5],
                "connections": [
                    { "position": [2, 1, 4], "direction": "south", "pool": "halls" }
                ]
            }
        },
        "pools": {
            "halls": {
                "type": "union",
                "pools": [
                    { "type": "terminal", "rooms": [
                        { "room": "hall", "weight": 4.0 },
                        { "room": "cross", "weight": 1.0 },
                        { "room": "tee", "weight": 2.0 }
                    ] },
                    { "type": "reference", "pool": "caps" }
                ]
            },
            "caps": {
                "type": "terminal",
                "rooms": [ { "room": "end", "weight": 3.0 } ],
                "connects_to": [ "halls" ]
            }
        }
    }"#
    .to_string()
}

pub fn scenario_set() -> Arc<RoomSet> {
    Arc::new(RoomSet::from_json_str(&scenario_json()).expect("scenario room set loads"))
}

pub fn branching_set() -> Arc<RoomSet> {
    Arc::new(RoomSet::from_json_str(&branching_json()).expect("branching room set loads"))
}
