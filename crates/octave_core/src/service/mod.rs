//! Typed Domain Store operations.
//!
//! # Responsibility
//! - Translate per-user domain operations into document store calls.
//! - Stamp store-assigned timestamps and validate input before writes.
//! - Enforce per-user ownership when bound to a `Session`.
//!
//! # Invariants
//! - Every path is composed from `userId` plus a fixed sub-path.
//! - Services never retry; failures propagate to the caller unchanged.

use crate::clock::Clock;
use crate::model::format_iso_date;
use crate::session::Session;
use crate::store::{DocumentStore, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

pub mod celestial_service;
pub mod energy_service;
pub mod intention_service;
pub mod onboarding_service;
pub mod paths;
pub mod profile_service;

pub use celestial_service::CelestialService;
pub use energy_service::EnergyService;
pub use intention_service::IntentionService;
pub use onboarding_service::{OnboardingInput, OnboardingService};
pub use profile_service::{ProfileBootstrap, ProfileService};

/// Shared dependencies of every service.
pub(crate) struct StoreContext<S> {
    pub(crate) store: Arc<S>,
    pub(crate) clock: Arc<dyn Clock>,
    session: Option<Session>,
}

impl<S: DocumentStore> StoreContext<S> {
    /// Rejects access to documents not owned by the signed-in user.
    pub(crate) fn authorize(&self, user_id: &str) -> StoreResult<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        match session.user_id() {
            Some(current) if current == user_id => Ok(()),
            _ => {
                log::warn!("event=authorize module=service status=denied");
                Err(StoreError::PermissionDenied {
                    user_id: user_id.to_string(),
                })
            }
        }
    }

    /// Reader's local calendar date as `YYYY-MM-DD`.
    pub(crate) fn today(&self) -> String {
        format_iso_date(self.clock.today())
    }
}

/// Entry point bundling all Domain Store services over one store.
pub struct DomainStore<S> {
    ctx: Arc<StoreContext<S>>,
}

impl<S> Clone for DomainStore<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<S: DocumentStore> DomainStore<S> {
    /// Unbound store: performs no ownership check.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ctx: Arc::new(StoreContext {
                store,
                clock,
                session: None,
            }),
        }
    }

    /// Store whose operations only accept the session's own `userId`.
    pub fn bound_to(store: Arc<S>, clock: Arc<dyn Clock>, session: Session) -> Self {
        Self {
            ctx: Arc::new(StoreContext {
                store,
                clock,
                session: Some(session),
            }),
        }
    }

    pub fn document_store(&self) -> &Arc<S> {
        &self.ctx.store
    }

    pub fn profiles(&self) -> ProfileService<S> {
        ProfileService::new(Arc::clone(&self.ctx))
    }

    pub fn celestial(&self) -> CelestialService<S> {
        CelestialService::new(Arc::clone(&self.ctx))
    }

    pub fn onboarding(&self) -> OnboardingService<S> {
        OnboardingService::new(Arc::clone(&self.ctx))
    }

    pub fn intentions(&self) -> IntentionService<S> {
        IntentionService::new(Arc::clone(&self.ctx))
    }

    pub fn energy(&self) -> EnergyService<S> {
        EnergyService::new(Arc::clone(&self.ctx))
    }
}

pub(crate) fn to_object<T: Serialize>(value: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidData(
            "domain value did not serialize to an object".to_string(),
        )),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> StoreResult<T> {
    Ok(serde_json::from_value(value)?)
}

pub(crate) fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> StoreResult<Vec<T>> {
    values.into_iter().map(decode).collect()
}
