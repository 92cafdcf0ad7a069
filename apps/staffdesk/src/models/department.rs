use serde::{Deserialize, Serialize};

use crate::models::id::RecordId;

/// Department names are meant to be unique but nothing enforces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
}
