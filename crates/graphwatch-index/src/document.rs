//! Index document mapping.
//!
//! A trigger projects into a flat document of six fields. Each field has an
//! external tag (used to key highlights) and a priority used as the boost of
//! fuzzy term queries against it.

use graphwatch_store::TriggerCheck;
use serde::{Deserialize, Serialize};

/// The indexable fields of a trigger document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Trigger identifier.
    Id,
    /// Trigger name.
    Name,
    /// Trigger description.
    Desc,
    /// Trigger tags.
    Tags,
    /// Trigger author.
    CreatedBy,
}

impl Field {
    /// External tag of the field, used to key highlight fragments.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Desc => "desc",
            Self::Tags => "tags",
            Self::CreatedBy => "created_by",
        }
    }

    /// Priority of the field in fuzzy scoring; zero means "filter only".
    #[must_use]
    pub const fn priority(self) -> f64 {
        match self {
            Self::Id => 5.0,
            Self::Name => 3.0,
            Self::Desc => 1.0,
            Self::Tags | Self::CreatedBy => 0.0,
        }
    }
}

/// A trigger as stored in the index.
///
/// Reflects, but never mutates, the trigger record in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDocument {
    /// Trigger identifier.
    pub id: String,
    /// Trigger name.
    pub name: String,
    /// Trigger description.
    pub desc: String,
    /// Trigger tags, matched exactly.
    pub tags: Vec<String>,
    /// Trigger author, empty when none is set.
    pub created_by: String,
    /// Score of the last check; above zero means "problem".
    pub last_check_score: i64,
}

impl From<TriggerCheck> for TriggerDocument {
    fn from(check: TriggerCheck) -> Self {
        Self {
            id: check.trigger.id,
            name: check.trigger.name,
            desc: check.trigger.desc,
            tags: check.trigger.tags,
            created_by: check.trigger.created_by,
            last_check_score: check.score,
        }
    }
}
