use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user known to the user store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    #[sqlx(rename = "user_id")]
    pub id: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        User {
            id: id.into(),
            name: Some(name.into()),
            role: Some(role.into()),
        }
    }
}
