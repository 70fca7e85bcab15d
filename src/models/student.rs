use serde::{Deserialize, Serialize};

/// Roster entry. The server also returns the password column; it is never read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub roll_no: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub department: Option<String>,
}
