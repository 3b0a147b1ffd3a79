use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// The user who owns the project
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: String, owner: &User) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            owner_id: owner.id,
            created_at: Utc::now(),
        }
    }
}
