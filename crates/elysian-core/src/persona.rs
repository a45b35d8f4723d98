//! Persona domain model.
//!
//! A chat counterpart is either an individual entity or a named group of
//! members. The concrete rosters live in the interaction layer; this module
//! holds the types the rest of the domain operates on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An individual member within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Entity ID of the member.
    pub id: String,
    /// Display name of the member.
    pub name: String,
}

impl GroupMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Describes the current speaking entity or group.
///
/// Drives which system instruction the chat session is created with and
/// how the archive labels a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeakerContext {
    /// The entity ID of the individual or group.
    pub id: String,
    /// Display name (e.g. "Nikola Tesla" or "The Innovators Assembly").
    pub name: String,
    pub is_group: bool,
    /// Member list when this is a group; empty for individuals.
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

impl SpeakerContext {
    pub fn individual(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_group: false,
            members: Vec::new(),
        }
    }

    pub fn group(
        id: impl Into<String>,
        name: impl Into<String>,
        members: Vec<GroupMember>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_group: true,
            members,
        }
    }
}

/// A directory of known entities, individual and group.
///
/// The simulator resolves avatar display names through this and the
/// workflow machine builds speaker contexts from it.
#[derive(Debug, Clone, Default)]
pub struct EntityDirectory {
    entries: HashMap<String, DirectoryEntry>,
}

#[derive(Debug, Clone)]
struct DirectoryEntry {
    name: String,
    members: Vec<GroupMember>,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_individual(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.entries.insert(
            id.into(),
            DirectoryEntry {
                name: name.into(),
                members: Vec::new(),
            },
        );
    }

    pub fn insert_group(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        members: Vec<GroupMember>,
    ) {
        self.entries.insert(
            id.into(),
            DirectoryEntry {
                name: name.into(),
                members,
            },
        );
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Resolves the display name for an entity ID.
    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|e| e.name.as_str())
    }

    /// Finds an entity ID by display name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&str> {
        let lowered = name.to_lowercase();
        self.entries
            .iter()
            .find(|(_, entry)| entry.name.to_lowercase() == lowered)
            .map(|(id, _)| id.as_str())
    }

    /// Builds the speaker context for an entity, group or individual.
    pub fn speaker_context(&self, id: &str) -> Option<SpeakerContext> {
        self.entries.get(id).map(|entry| {
            if entry.members.is_empty() {
                SpeakerContext::individual(id, entry.name.clone())
            } else {
                SpeakerContext::group(id, entry.name.clone(), entry.members.clone())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> EntityDirectory {
        let mut dir = EntityDirectory::new();
        dir.insert_individual("tesla", "Nikola Tesla");
        dir.insert_group(
            "assembly",
            "The Innovators Assembly",
            vec![GroupMember::new("tesla", "Nikola Tesla")],
        );
        dir
    }

    #[test]
    fn test_speaker_context_individual_vs_group() {
        let dir = directory();

        let tesla = dir.speaker_context("tesla").unwrap();
        assert!(!tesla.is_group);
        assert!(tesla.members.is_empty());

        let assembly = dir.speaker_context("assembly").unwrap();
        assert!(assembly.is_group);
        assert_eq!(assembly.members.len(), 1);
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let dir = directory();
        assert_eq!(dir.find_by_name("nikola tesla"), Some("tesla"));
        assert_eq!(dir.find_by_name("NIKOLA TESLA"), Some("tesla"));
        assert_eq!(dir.find_by_name("unknown"), None);
    }

    #[test]
    fn test_unknown_entity_has_no_context() {
        let dir = directory();
        assert!(dir.speaker_context("ghost").is_none());
    }
}
