//! User profile entity with merge-on-update semantics.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

/// Long-lived profile for a user of the voice companion.
///
/// Created on first write; subsequent writes merge field-wise so a partial
/// update never clears fields it does not mention. Removed only by a full
/// user-data erasure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub current_stage: Option<String>,
    pub registered_at: Timestamp,
    pub session_count: i64,
    pub recurring_themes: Vec<String>,
    pub updated_at: Timestamp,
}

impl UserProfile {
    /// Creates a fresh profile from the first patch a user sends.
    pub fn from_patch(user_id: UserId, patch: ProfilePatch) -> Self {
        let now = Timestamp::now();
        Self {
            user_id,
            display_name: patch.display_name,
            current_stage: patch.current_stage,
            registered_at: now,
            session_count: patch.session_count.unwrap_or(0),
            recurring_themes: patch.recurring_themes.unwrap_or_default(),
            updated_at: now,
        }
    }

    /// Merges a patch into this profile. Fields absent from the patch keep
    /// their current values; `registered_at` never changes.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(name) = patch.display_name {
            self.display_name = Some(name);
        }
        if let Some(stage) = patch.current_stage {
            self.current_stage = Some(stage);
        }
        if let Some(count) = patch.session_count {
            self.session_count = count;
        }
        if let Some(themes) = patch.recurring_themes {
            self.recurring_themes = themes;
        }
        self.updated_at = Timestamp::now();
    }
}

/// Partial profile update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub current_stage: Option<String>,
    pub session_count: Option<i64>,
    pub recurring_themes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn first_patch_creates_profile() {
        let profile = UserProfile::from_patch(
            user(),
            ProfilePatch {
                display_name: Some("Ada".into()),
                ..Default::default()
            },
        );
        assert_eq!(profile.display_name.as_deref(), Some("Ada"));
        assert_eq!(profile.session_count, 0);
        assert!(profile.recurring_themes.is_empty());
    }

    #[test]
    fn merge_keeps_unmentioned_fields() {
        let mut profile = UserProfile::from_patch(
            user(),
            ProfilePatch {
                display_name: Some("Ada".into()),
                current_stage: Some("grounding".into()),
                ..Default::default()
            },
        );
        let registered = profile.registered_at;

        profile.apply(ProfilePatch {
            session_count: Some(3),
            ..Default::default()
        });

        assert_eq!(profile.display_name.as_deref(), Some("Ada"));
        assert_eq!(profile.current_stage.as_deref(), Some("grounding"));
        assert_eq!(profile.session_count, 3);
        assert_eq!(profile.registered_at, registered);
    }

    #[test]
    fn merge_replaces_mentioned_fields() {
        let mut profile = UserProfile::from_patch(
            user(),
            ProfilePatch {
                recurring_themes: Some(vec!["work".into()]),
                ..Default::default()
            },
        );
        profile.apply(ProfilePatch {
            recurring_themes: Some(vec!["work".into(), "family".into()]),
            ..Default::default()
        });
        assert_eq!(profile.recurring_themes, vec!["work", "family"]);
    }
}
