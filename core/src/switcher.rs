use uuid::Uuid;

use crate::profile::Profile;

/// Profiles created during the session, with exactly one active when non-empty.
#[derive(Debug, Clone, Default)]
pub struct ProfileSwitcher {
    profiles: Vec<Profile>,
}

impl ProfileSwitcher {
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn active(&self) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.is_active)
    }

    /// Add a freshly created profile and make it the active one.
    pub fn add(&mut self, mut profile: Profile) {
        self.profiles.retain(|p| p.id != profile.id);
        for p in &mut self.profiles {
            p.is_active = false;
        }
        profile.is_active = true;
        tracing::info!(profile_id = %profile.id, profile_type = %profile.profile_type, "profile added to switcher");
        self.profiles.push(profile);
    }

    /// Returns false if no profile has that id.
    pub fn switch_to(&mut self, id: Uuid) -> bool {
        if !self.profiles.iter().any(|p| p.id == id) {
            return false;
        }
        for p in &mut self.profiles {
            p.is_active = p.id == id;
        }
        true
    }

    /// Remove a profile. When it was active, the most recently added
    /// remaining profile takes over.
    pub fn remove(&mut self, id: Uuid) -> Option<Profile> {
        let index = self.profiles.iter().position(|p| p.id == id)?;
        let removed = self.profiles.remove(index);
        if removed.is_active
            && let Some(last) = self.profiles.last_mut()
        {
            last.is_active = true;
        }
        Some(removed)
    }
}
