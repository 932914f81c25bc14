//! User profile root document.
//!
//! # Invariants
//! - `uid` is both the document key and the owner of every child document.
//! - A profile is created once with `onboarding_complete = false` and never
//!   recreated over an existing one.

use super::{EpochMs, UserId};
use serde::{Deserialize, Serialize};

/// Root document stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: UserId,
    /// `None` when the sign-in provider did not supply one.
    #[serde(default)]
    pub email: Option<String>,
    pub display_name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    pub onboarding_complete: bool,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

/// Partial profile update; absent fields are left untouched in storage.
///
/// `photo_url: Some(None)` clears the stored photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_complete: Option<bool>,
}

impl ProfilePatch {
    /// Patch that only flips the onboarding flag.
    pub fn onboarding_complete(value: bool) -> Self {
        Self {
            onboarding_complete: Some(value),
            ..Self::default()
        }
    }
}
