use serde::{Deserialize, Serialize};

use crate::Record;

/// A student, keyed by student number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "Student")]
#[serde(default)]
pub struct Student {
    #[record(key)]
    pub id: String,
    #[record(index)]
    pub name: String,
    #[record(index)]
    pub address: String,
    #[record(index)]
    pub origin_school: String,
    #[record(index)]
    pub program: String,
}

impl Student {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}
