use crate::phone;
use serde::{Deserialize, Serialize};

/// Group metadata, as reported by the channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub id: String,
    pub subject: String,
    /// Creator of the group, when the channel knows it.
    pub owner: Option<String>,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub role: ParticipantRole,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    #[default]
    Member,
    Admin,
    /// Group creator.
    SuperAdmin,
}

impl GroupMetadata {
    /// Role of a participant, compared by digits.
    pub fn role_of(&self, id: &str) -> Option<ParticipantRole> {
        self.participants
            .iter()
            .find(|p| phone::same_user(&p.id, id))
            .map(|p| p.role)
    }

    pub fn is_admin(&self, id: &str) -> bool {
        matches!(
            self.role_of(id),
            Some(ParticipantRole::Admin | ParticipantRole::SuperAdmin)
        )
    }

    /// Creator check: explicit owner field, or the super-admin role.
    pub fn is_creator(&self, id: &str) -> bool {
        self.owner.as_deref().is_some_and(|o| phone::same_user(o, id))
            || self.role_of(id) == Some(ParticipantRole::SuperAdmin)
    }

    pub fn participant_ids(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.id.clone()).collect()
    }
}
