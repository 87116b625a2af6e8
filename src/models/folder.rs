use serde::{Deserialize, Serialize};

/// Sentinel parent id of top-level folders. Never stored as a folder row.
pub const ROOT_FOLDER_ID: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    #[serde(default)]
    pub sort_order: i64,
}
