use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::field::FieldValues;
use crate::optimistic::Patch;
use crate::schema::Theme;

/// A profile created through the profile-creation flow.
/// The backend is the system of record; the client only holds it for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub profile_type: String,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub theme: Theme,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// Payload sent to the backend when a draft is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfileRequest {
    pub profile_type: String,
    pub values: FieldValues,
}

/// The signed-in user's profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile: ProfileRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub stats: ProfileStats,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

/// Career numbers shown on the profile card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileStats {
    #[serde(default)]
    pub matches: u32,
    #[serde(default)]
    pub runs: u32,
    #[serde(default)]
    pub wickets: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batting_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// `None` while the role is current.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub status: ConnectionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// Edits to a [`UserProfile`] that are applied optimistically.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfilePatch {
    SetFullName(Option<String>),
    SetBio(String),
    SetLocation(Option<String>),
    SetSkills(Vec<String>),
    SetStats(ProfileStats),
    AddExperience(Experience),
    UpdateExperience(Experience),
    RemoveExperience(Uuid),
    AddAchievement(Achievement),
    UpdateAchievement(Achievement),
    RemoveAchievement(Uuid),
}

impl Patch<UserProfile> for ProfilePatch {
    fn apply(&self, state: &mut UserProfile) {
        let record = &mut state.profile;
        match self {
            ProfilePatch::SetFullName(name) => state.full_name = name.clone(),
            ProfilePatch::SetBio(bio) => record.bio = bio.clone(),
            ProfilePatch::SetLocation(location) => record.location = location.clone(),
            ProfilePatch::SetSkills(skills) => record.skills = skills.clone(),
            ProfilePatch::SetStats(stats) => record.stats = stats.clone(),
            ProfilePatch::AddExperience(experience) => {
                record.experiences.push(experience.clone());
            }
            ProfilePatch::UpdateExperience(experience) => {
                if let Some(slot) = record
                    .experiences
                    .iter_mut()
                    .find(|e| e.id == experience.id)
                {
                    *slot = experience.clone();
                }
            }
            ProfilePatch::RemoveExperience(id) => record.experiences.retain(|e| e.id != *id),
            ProfilePatch::AddAchievement(achievement) => {
                record.achievements.push(achievement.clone());
            }
            ProfilePatch::UpdateAchievement(achievement) => {
                if let Some(slot) = record
                    .achievements
                    .iter_mut()
                    .find(|a| a.id == achievement.id)
                {
                    *slot = achievement.clone();
                }
            }
            ProfilePatch::RemoveAchievement(id) => record.achievements.retain(|a| a.id != *id),
        }
    }

    fn describe(&self) -> String {
        match self {
            ProfilePatch::SetFullName(_) => "set full name".to_string(),
            ProfilePatch::SetBio(_) => "set bio".to_string(),
            ProfilePatch::SetLocation(_) => "set location".to_string(),
            ProfilePatch::SetSkills(skills) => format!("set {} skills", skills.len()),
            ProfilePatch::SetStats(_) => "set stats".to_string(),
            ProfilePatch::AddExperience(e) => format!("add experience {}", e.id),
            ProfilePatch::UpdateExperience(e) => format!("update experience {}", e.id),
            ProfilePatch::RemoveExperience(id) => format!("remove experience {id}"),
            ProfilePatch::AddAchievement(a) => format!("add achievement {}", a.id),
            ProfilePatch::UpdateAchievement(a) => format!("update achievement {}", a.id),
            ProfilePatch::RemoveAchievement(id) => format!("remove achievement {id}"),
        }
    }
}

/// Edits to the connection list.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionPatch {
    Add(Connection),
    Remove(Uuid),
    Replace(Connection),
}

impl Patch<Vec<Connection>> for ConnectionPatch {
    fn apply(&self, state: &mut Vec<Connection>) {
        match self {
            ConnectionPatch::Add(connection) => {
                if !state.iter().any(|c| c.id == connection.id) {
                    state.push(connection.clone());
                }
            }
            ConnectionPatch::Remove(id) => state.retain(|c| c.id != *id),
            ConnectionPatch::Replace(connection) => {
                if let Some(slot) = state.iter_mut().find(|c| c.id == connection.id) {
                    *slot = connection.clone();
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            ConnectionPatch::Add(c) => format!("add connection {}", c.username),
            ConnectionPatch::Remove(id) => format!("remove connection {id}"),
            ConnectionPatch::Replace(c) => format!("replace connection {}", c.id),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn experience_patches_add_update_remove() {
        let mut profile = user_profile("bio");
        let mut exp = experience("Fast bowler");

        ProfilePatch::AddExperience(exp.clone()).apply(&mut profile);
        assert_eq!(profile.profile.experiences.len(), 1);

        exp.title = "Pace spearhead".to_string();
        ProfilePatch::UpdateExperience(exp.clone()).apply(&mut profile);
        assert_eq!(profile.profile.experiences[0].title, "Pace spearhead");

        ProfilePatch::RemoveExperience(exp.id).apply(&mut profile);
        assert!(profile.profile.experiences.is_empty());
    }

    #[test]
    fn updating_missing_achievement_is_a_no_op() {
        let mut profile = user_profile("bio");
        let before = profile.clone();
        ProfilePatch::UpdateAchievement(Achievement {
            id: Uuid::now_v7(),
            title: "Player of the match".to_string(),
            description: None,
            date: None,
        })
        .apply(&mut profile);
        assert_eq!(profile, before);
    }

    #[test]
    fn adding_same_connection_twice_keeps_one() {
        let mut connections = Vec::new();
        let conn = connection("rpant");
        ConnectionPatch::Add(conn.clone()).apply(&mut connections);
        ConnectionPatch::Add(conn.clone()).apply(&mut connections);
        assert_eq!(connections.len(), 1);

        let mut accepted = conn.clone();
        accepted.status = ConnectionStatus::Connected;
        ConnectionPatch::Replace(accepted).apply(&mut connections);
        assert_eq!(connections[0].status, ConnectionStatus::Connected);

        ConnectionPatch::Remove(conn.id).apply(&mut connections);
        assert!(connections.is_empty());
    }

    #[test]
    fn user_profile_tolerates_sparse_backend_payload() {
        let body = serde_json::json!({
            "id": Uuid::now_v7(),
            "username": "smandhana",
            "email": "smriti@example.com",
            "profile": { "bio": "Opener" }
        });
        let profile: UserProfile = serde_json::from_value(body).unwrap();
        assert_eq!(profile.profile.bio, "Opener");
        assert!(profile.profile.experiences.is_empty());
        assert_eq!(profile.profile.stats.matches, 0);
    }
}
