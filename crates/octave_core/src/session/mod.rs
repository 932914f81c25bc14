//! Identity Session.
//!
//! # Responsibility
//! - Wrap an external identity provider behind `IdentityProvider`.
//! - Hold the current user explicitly (no ambient global) and push every
//!   auth-state transition to observers.
//!
//! # Invariants
//! - Observers receive the current user on subscription, then once per
//!   transition between different users (or to/from signed out).
//! - `loading` is true only until the persisted session was restored.

use crate::store::subscription::{lock, register, Listener, ListenerSet};
use crate::store::Subscription;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

mod local_provider;

pub use local_provider::LocalIdentityProvider;

pub type AuthResult<T> = Result<T, AuthError>;

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password.
    InvalidCredential,
    EmailAlreadyInUse,
    WeakPassword,
    /// Federated (OAuth popup) sign-in failed or was dismissed.
    FederatedFailure(String),
    /// Any other provider-side failure.
    Provider(String),
}

impl AuthError {
    /// Message suitable for inline display next to the sign-in form.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "Invalid email or password.",
            Self::FederatedFailure(_) => "Google sign-in failed. Please try again.",
            Self::EmailAlreadyInUse => "An account with this email already exists.",
            Self::WeakPassword => "Password should be at least 6 characters.",
            Self::Provider(_) => "Something went wrong. Please try again.",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "invalid_credential",
            Self::EmailAlreadyInUse => "email_in_use",
            Self::WeakPassword => "weak_password",
            Self::FederatedFailure(_) => "federated_failure",
            Self::Provider(_) => "provider_failure",
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredential => write!(f, "invalid credential"),
            Self::EmailAlreadyInUse => write!(f, "email already in use"),
            Self::WeakPassword => write!(f, "password too weak"),
            Self::FederatedFailure(message) => write!(f, "federated sign-in failed: {message}"),
            Self::Provider(message) => write!(f, "identity provider failure: {message}"),
        }
    }
}

impl Error for AuthError {}

/// Operations consumed from the external identity provider.
pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser>;
    fn sign_up(&self, email: &str, password: &str, display_name: &str) -> AuthResult<AuthUser>;
    fn sign_in_with_federated_provider(&self) -> AuthResult<AuthUser>;
    fn sign_out(&self) -> AuthResult<()>;
    /// User persisted by the provider from an earlier run, if any.
    fn restore(&self) -> AuthResult<Option<AuthUser>>;
}

/// Snapshot consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub loading: bool,
}

struct SessionInner {
    provider: Arc<dyn IdentityProvider>,
    state: Mutex<SessionState>,
    observers: Arc<Mutex<ListenerSet<Listener<Option<AuthUser>>>>>,
}

/// Explicit, cloneable handle to the current identity.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Creates a session in `loading` state; call `start` to restore.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                provider,
                state: Mutex::new(SessionState {
                    user: None,
                    loading: true,
                }),
                observers: Arc::default(),
            }),
        }
    }

    /// Restores the provider's persisted user and leaves `loading`.
    pub fn start(&self) -> AuthResult<()> {
        let restored = match self.inner.provider.restore() {
            Ok(user) => user,
            Err(err) => {
                self.transition(None);
                warn!(
                    "event=session_start module=session status=error error_code={}",
                    err.code()
                );
                return Err(err);
            }
        };
        info!(
            "event=session_start module=session status=ok restored={}",
            restored.is_some()
        );
        self.transition(restored);
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner.state).clone()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        lock(&self.inner.state).user.clone()
    }

    /// Id of the signed-in user, if any.
    pub fn user_id(&self) -> Option<String> {
        lock(&self.inner.state).user.as_ref().map(|user| user.id.clone())
    }

    pub fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let result = self.inner.provider.sign_in(email, password);
        self.finish_sign_in("password", result)
    }

    pub fn sign_up(&self, email: &str, password: &str, display_name: &str) -> AuthResult<AuthUser> {
        let result = self.inner.provider.sign_up(email, password, display_name);
        self.finish_sign_in("sign_up", result)
    }

    pub fn sign_in_with_federated_provider(&self) -> AuthResult<AuthUser> {
        let result = self.inner.provider.sign_in_with_federated_provider();
        self.finish_sign_in("federated", result)
    }

    pub fn sign_out(&self) -> AuthResult<()> {
        self.inner.provider.sign_out()?;
        info!("event=sign_out module=session status=ok");
        self.transition(None);
        Ok(())
    }

    /// Pushes the current user now and on every later transition.
    pub fn observe_current_user(
        &self,
        callback: impl Fn(Option<AuthUser>) + Send + Sync + 'static,
    ) -> Subscription {
        let listener = Listener::new(callback);
        let subscription = register(
            &self.inner.observers,
            listener.clone(),
            listener.active_flag(),
        );
        listener.deliver(self.current_user());
        subscription
    }

    /// Forgets the current user locally without notifying observers.
    pub fn shutdown(&self) {
        let mut state = lock(&self.inner.state);
        state.user = None;
        state.loading = false;
    }

    fn finish_sign_in(
        &self,
        method: &'static str,
        result: AuthResult<AuthUser>,
    ) -> AuthResult<AuthUser> {
        match result {
            Ok(user) => {
                info!("event=sign_in module=session status=ok method={method}");
                self.transition(Some(user.clone()));
                Ok(user)
            }
            Err(err) => {
                warn!(
                    "event=sign_in module=session status=error method={method} error_code={}",
                    err.code()
                );
                Err(err)
            }
        }
    }

    fn transition(&self, user: Option<AuthUser>) {
        let changed = {
            let mut state = lock(&self.inner.state);
            let was_loading = state.loading;
            state.loading = false;
            let changed = state.user != user;
            state.user = user.clone();
            changed || was_loading
        };
        if !changed {
            return;
        }

        let listeners: Vec<Listener<Option<AuthUser>>> = lock(&self.inner.observers)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener.deliver(user.clone());
        }
    }
}
