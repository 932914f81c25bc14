//! Composition root wiring session, store and views together.
//!
//! # Responsibility
//! - Own the `Session`, the session-bound `DomainStore` and the live views.
//! - Rebind every view whenever the signed-in user changes.
//! - Bootstrap the profile document after each successful sign-in.
//!
//! # Invariants
//! - Views never observe data of a user other than the session's current one.
//! - `shutdown` leaves no live subscription behind.

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::service::{DomainStore, ProfileBootstrap};
use crate::session::{AuthError, AuthUser, IdentityProvider, Session};
use crate::store::subscription::lock;
use crate::store::{DocumentStore, SqliteDocumentStore, StoreError, StoreResult, Subscription};
use crate::view::{TodayIntentionsView, UserDataView};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub type AppResult<T> = Result<T, AppError>;

/// Failure of a composite app operation.
#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Store(StoreError),
}

impl AppError {
    /// Message suitable for inline display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Auth(err) => err.user_message(),
            Self::Store(StoreError::PermissionDenied { .. }) => {
                "You do not have access to this data."
            }
            Self::Store(_) => "Something went wrong. Please try again.",
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub struct OctaveApp<S: DocumentStore + 'static> {
    session: Session,
    store: DomainStore<S>,
    today_intentions: Arc<TodayIntentionsView<S>>,
    user_data: Arc<UserDataView<S>>,
    identity: Mutex<Option<Subscription>>,
}

impl OctaveApp<SqliteDocumentStore> {
    /// Opens the configured SQLite store (or an in-memory one) on the system clock.
    pub fn open(config: &AppConfig, provider: Arc<dyn IdentityProvider>) -> StoreResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = match config.db_path.as_ref() {
            Some(path) => SqliteDocumentStore::open(path, Arc::clone(&clock))?,
            None => SqliteDocumentStore::open_in_memory(Arc::clone(&clock))?,
        };
        Ok(Self::new(Arc::new(store), clock, provider))
    }
}

impl<S: DocumentStore + 'static> OctaveApp<S> {
    /// Wires the app; nothing is observed until `start`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, provider: Arc<dyn IdentityProvider>) -> Self {
        let session = Session::new(provider);
        let store = DomainStore::bound_to(store, clock, session.clone());
        Self {
            today_intentions: Arc::new(TodayIntentionsView::new(store.clone())),
            user_data: Arc::new(UserDataView::new(store.clone())),
            session,
            store,
            identity: Mutex::new(None),
        }
    }

    /// Binds the views to the session, then restores the persisted user.
    pub fn start(&self) -> AppResult<()> {
        let today = Arc::clone(&self.today_intentions);
        let user_data = Arc::clone(&self.user_data);
        let subscription = self.session.observe_current_user(move |user| {
            let user_id = user.as_ref().map(|user| user.id.as_str());
            if let Err(err) = today.set_identity(user_id) {
                warn!("event=view_bind module=app status=error view=today_intentions error={err}");
            }
            if let Err(err) = user_data.set_identity(user_id) {
                warn!("event=view_bind module=app status=error view=user_data error={err}");
            }
        });
        if let Some(mut previous) = lock(&self.identity).replace(subscription) {
            previous.cancel();
        }

        self.session.start()?;
        info!("event=app_start module=app status=ok");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &DomainStore<S> {
        &self.store
    }

    pub fn today_intentions(&self) -> &TodayIntentionsView<S> {
        &self.today_intentions
    }

    pub fn user_data(&self) -> &UserDataView<S> {
        &self.user_data
    }

    pub fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthUser> {
        let user = self.session.sign_in(email, password)?;
        self.bootstrap_profile(&user)?;
        Ok(user)
    }

    pub fn sign_up(&self, email: &str, password: &str, display_name: &str) -> AppResult<AuthUser> {
        let user = self.session.sign_up(email, password, display_name)?;
        self.bootstrap_profile(&user)?;
        Ok(user)
    }

    pub fn sign_in_with_federated_provider(&self) -> AppResult<AuthUser> {
        let user = self.session.sign_in_with_federated_provider()?;
        self.bootstrap_profile(&user)?;
        Ok(user)
    }

    pub fn sign_out(&self) -> AppResult<()> {
        self.session.sign_out()?;
        Ok(())
    }

    /// Tears down every live subscription and forgets the local user.
    pub fn shutdown(&self) {
        self.detach_views();
        self.session.shutdown();
        info!("event=app_shutdown module=app status=ok");
    }

    fn bootstrap_profile(&self, user: &AuthUser) -> StoreResult<ProfileBootstrap> {
        // The profile subscription opened on transition picks the new document up.
        self.store.profiles().ensure_profile_on_login(user)
    }

    fn detach_views(&self) {
        if let Some(mut subscription) = lock(&self.identity).take() {
            subscription.cancel();
        }
        self.today_intentions.close();
        self.user_data.close();
    }
}

impl<S: DocumentStore + 'static> Drop for OctaveApp<S> {
    fn drop(&mut self) {
        self.detach_views();
    }
}
