//! Read-only snapshot handed over by the persistence layer.

use serde::{Deserialize, Serialize};

use super::{Checklist, Completion};
use crate::error::Result;

/// Checklists and completions as loaded from storage at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub checklists: Vec<Checklist>,
    #[serde(default)]
    pub completions: Vec<Completion>,
}

impl Snapshot {
    pub fn new(checklists: Vec<Checklist>, completions: Vec<Completion>) -> Self {
        Self {
            checklists,
            completions,
        }
    }

    /// Decode a snapshot from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        tracing::debug!(
            checklists = snapshot.checklists.len(),
            completions = snapshot.completions.len(),
            "decoded snapshot"
        );
        Ok(snapshot)
    }

    pub fn checklist(&self, id: &str) -> Option<&Checklist> {
        self.checklists.iter().find(|c| c.id == id)
    }

    /// Completions recorded against `checklist`, oldest first.
    pub fn completions_for(&self, checklist: &Checklist) -> Vec<Completion> {
        let mut completions: Vec<Completion> = self
            .completions
            .iter()
            .filter(|c| c.belongs_to(checklist))
            .cloned()
            .collect();
        completions.sort_by_key(|c| c.completed_at);
        completions
    }
}
