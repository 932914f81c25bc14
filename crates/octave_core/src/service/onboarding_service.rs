//! Onboarding completion.
//!
//! # Invariants
//! - All provided inputs are validated before the first write.
//! - Writes are independent and not atomic: birth data, roles, focus windows,
//!   then `onboardingComplete = true`. A failure part-way leaves earlier
//!   writes in place; re-running the whole save overwrites them.
//! - Omitted inputs leave the stored documents untouched.

use super::{CelestialService, ProfileService, StoreContext};
use crate::model::celestial::{BirthData, SovereignWindow, UserRole};
use crate::model::profile::ProfilePatch;
use crate::store::{DocumentStore, StoreResult};
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;

/// Data collected by the onboarding wizard; `None` fields are not written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnboardingInput {
    pub birth_data: Option<BirthData>,
    pub roles: Option<Vec<UserRole>>,
    pub focus_windows: Option<Vec<SovereignWindow>>,
}

pub struct OnboardingService<S> {
    ctx: Arc<StoreContext<S>>,
}

impl<S: DocumentStore> OnboardingService<S> {
    pub(crate) fn new(ctx: Arc<StoreContext<S>>) -> Self {
        Self { ctx }
    }

    pub fn save_onboarding(&self, user_id: &str, input: &OnboardingInput) -> StoreResult<()> {
        self.ctx.authorize(user_id)?;
        if let Some(birth_data) = input.birth_data.as_ref() {
            birth_data.validate()?;
        }
        for window in input.focus_windows.iter().flatten() {
            window.validate()?;
        }

        let started_at = Instant::now();
        let result = self.write_steps(user_id, input);
        match &result {
            Ok(()) => info!(
                "event=onboarding_save module=service status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=onboarding_save module=service status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn write_steps(&self, user_id: &str, input: &OnboardingInput) -> StoreResult<()> {
        let celestial = CelestialService::new(Arc::clone(&self.ctx));
        if let Some(birth_data) = input.birth_data.as_ref() {
            celestial.save_birth_data(user_id, birth_data)?;
        }
        if let Some(roles) = input.roles.as_ref() {
            celestial.replace_roles(user_id, roles)?;
        }
        if let Some(windows) = input.focus_windows.as_ref() {
            celestial.replace_focus_windows(user_id, windows)?;
        }

        ProfileService::new(Arc::clone(&self.ctx))
            .update_profile(user_id, &ProfilePatch::onboarding_complete(true))
    }
}
