use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Attachment, Project, User};
use crate::validation::{self, ValidationErrors};

/// A user-authored annotation on a project.
///
/// `user` and `project` are copies of the referenced rows as loaded by the
/// store; deleting a note never touches them. The attachment, by contrast,
/// belongs to the note and goes away with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub message: Option<String>,
    pub user: Option<User>,
    pub project: Option<Project>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub attachment: Option<Attachment>,
}

impl Default for Note {
    /// An empty note with nothing but an id and timestamps. Never valid.
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            message: None,
            user: None,
            project: None,
            created_at: now,
            updated_at: now,
            attachment: None,
        }
    }
}

impl Note {
    pub fn new(message: String, user: User, project: Project) -> Self {
        Self {
            message: Some(message),
            user: Some(user),
            project: Some(project),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate(self)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Name of the authoring user, if one is set.
    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }

    /// Time elapsed between creation and `now`.
    pub fn creation_time(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Time elapsed since creation, measured against the system clock.
    pub fn age(&self) -> Duration {
        self.creation_time(Utc::now())
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn project_id(&self) -> Option<Uuid> {
        self.project.as_ref().map(|p| p.id)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }
}

/// Render an elapsed duration in words, e.g. `"3 days"` or `"about 1 hour"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    match secs {
        0..=59 => "less than a minute".to_string(),
        60..=3599 => plural(secs / 60, "minute"),
        3600..=86_399 => format!("about {}", plural(secs / 3600, "hour")),
        86_400..=2_591_999 => plural(secs / 86_400, "day"),
        2_592_000..=31_535_999 => plural(secs / 2_592_000, "month"),
        _ => plural(secs / 31_536_000, "year"),
    }
}
