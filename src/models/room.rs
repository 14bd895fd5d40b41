use serde::{Deserialize, Serialize};

use crate::Record;

/// A room, keyed by room code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "Room")]
pub struct Room {
    #[record(key)]
    pub id: String,
    #[record(index)]
    #[serde(default)]
    pub facilities: String,
    #[record(index)]
    #[serde(default)]
    pub capacity: u32,
    #[record(index)]
    #[serde(default)]
    pub building: String,
}

impl Room {
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            facilities: String::new(),
            capacity,
            building: String::new(),
        }
    }
}
