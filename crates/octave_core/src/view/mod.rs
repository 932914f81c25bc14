//! View-model hooks consumed by the presentation layer.
//!
//! # Responsibility
//! - Derive ready-to-render state from Domain Store subscriptions and reads.
//! - Own exactly one live subscription per identity.
//!
//! # Invariants
//! - Switching identity cancels the previous subscription before opening the
//!   next one; no two subscriptions of one view are active at once.
//! - Read failures become state (`error`), never panics.

mod gates;
mod today_intentions;
mod user_data;

pub use gates::{auth_gate, needs_onboarding, AuthGate};
pub use today_intentions::{TodayIntentionsState, TodayIntentionsView};
pub use user_data::{UserData, UserDataView};
