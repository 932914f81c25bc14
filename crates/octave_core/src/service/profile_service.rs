//! Profile use-cases.
//!
//! # Invariants
//! - `ensure_profile_on_login` never overwrites an existing profile.
//! - `update_profile` only touches fields present in the patch and always
//!   refreshes `updatedAt`.

use super::{decode, paths, to_object, StoreContext};
use crate::model::profile::{ProfilePatch, UserProfile};
use crate::session::AuthUser;
use crate::store::{DocumentStore, StoreResult, Subscription};
use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;

/// Outcome of the sign-in profile bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileBootstrap {
    Created,
    Existing,
}

pub struct ProfileService<S> {
    ctx: Arc<StoreContext<S>>,
}

impl<S: DocumentStore> ProfileService<S> {
    pub(crate) fn new(ctx: Arc<StoreContext<S>>) -> Self {
        Self { ctx }
    }

    /// Creates the profile on first sign-in; no write when it already exists.
    pub fn ensure_profile_on_login(&self, user: &AuthUser) -> StoreResult<ProfileBootstrap> {
        self.ctx.authorize(&user.id)?;
        let path = paths::user_doc(&user.id)?;
        if self.ctx.store.get(&path)?.is_some() {
            return Ok(ProfileBootstrap::Existing);
        }

        let now = self.ctx.store.server_time_ms();
        let profile = UserProfile {
            uid: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone().unwrap_or_default(),
            photo_url: user.photo_url.clone(),
            onboarding_complete: false,
            created_at: now,
            updated_at: now,
        };
        self.ctx
            .store
            .set(&path, Value::Object(to_object(&profile)?))?;
        info!("event=profile_ensure module=service status=created");
        Ok(ProfileBootstrap::Created)
    }

    pub fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        self.ctx.authorize(user_id)?;
        self.ctx
            .store
            .get(&paths::user_doc(user_id)?)?
            .map(decode)
            .transpose()
    }

    /// Merges `patch` into an existing profile.
    ///
    /// Fails with `StoreError::NotFound` when no profile exists yet.
    pub fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> StoreResult<()> {
        self.ctx.authorize(user_id)?;
        let mut fields = to_object(patch)?;
        fields.insert(
            "updatedAt".to_string(),
            json!(self.ctx.store.server_time_ms()),
        );
        self.ctx
            .store
            .update(&paths::user_doc(user_id)?, Value::Object(fields))
    }

    /// Live profile: current value now, then after every change; `None` while
    /// the document does not exist.
    pub fn subscribe_profile(
        &self,
        user_id: &str,
        callback: impl Fn(Option<UserProfile>) + Send + Sync + 'static,
    ) -> StoreResult<Subscription> {
        self.ctx.authorize(user_id)?;
        self.ctx.store.watch_document(
            &paths::user_doc(user_id)?,
            Box::new(move |value| match value.map(decode::<UserProfile>).transpose() {
                Ok(profile) => callback(profile),
                Err(err) => warn!(
                    "event=profile_watch module=service status=error error_code=decode_failed error={err}"
                ),
            }),
        )
    }
}
