use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Record;

/// Marital status recorded for an employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    Widower,
    Widow,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 4] = [
        MaritalStatus::Single,
        MaritalStatus::Married,
        MaritalStatus::Widower,
        MaritalStatus::Widow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MaritalStatus::Single => "Single",
            MaritalStatus::Married => "Married",
            MaritalStatus::Widower => "Widower",
            MaritalStatus::Widow => "Widow",
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaritalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaritalStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown marital status: {}", s))
    }
}

/// An employee, keyed by employee number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "Employee")]
#[serde(default)]
pub struct Employee {
    #[record(key)]
    pub id: String,
    #[record(index)]
    pub name: String,
    #[record(index)]
    pub birthplace: String,
    #[record(index)]
    pub birth_date: Option<NaiveDate>,
    #[record(index)]
    pub marital_status: MaritalStatus,
    #[record(index)]
    pub children: u32,
    #[record(index)]
    pub address: String,
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}
