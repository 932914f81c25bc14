//! Core domain logic for Octave, a personal energy-alignment planner.
//!
//! Owns the per-user document model, the Domain Store over it, the identity
//! session and the live view state derived from both.

pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod store;
pub mod view;

pub use app::{AppError, AppResult, OctaveApp};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::ValidationError;
pub use service::{DomainStore, OnboardingInput, ProfileBootstrap};
pub use session::{
    AuthError, AuthResult, AuthUser, IdentityProvider, LocalIdentityProvider, Session,
    SessionState,
};
pub use store::{
    DocumentStore, SqliteDocumentStore, StoreError, StoreResult, Subscription,
};
pub use view::{auth_gate, needs_onboarding, AuthGate, UserData};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
