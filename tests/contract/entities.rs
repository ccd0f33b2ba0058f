//! View models shared by the contract tests.

use serde::{Deserialize, Serialize};
use viewmodels::ViewModel;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ViewModel)]
pub struct TestEntity1 {
    pub id: String,
    pub field1: String,
}

impl TestEntity1 {
    pub fn new(id: &str, field1: &str) -> Self {
        Self {
            id: id.to_string(),
            field1: field1.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ViewModel)]
pub struct TestEntity2 {
    pub id: String,
    pub field2: i32,
}

impl TestEntity2 {
    pub fn new(id: &str, field2: i32) -> Self {
        Self {
            id: id.to_string(),
            field2,
        }
    }
}

/// Same shape as `TestEntity1`, stored under a pinned namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ViewModel)]
#[viewmodel(namespace = "contract.pinned")]
pub struct Pinned {
    pub id: String,
    pub field1: String,
}
