//! Aggregate user data: live profile plus one-time celestial reads.
//!
//! One-time reads are all-or-nothing: the first failing read is exposed as
//! `error` and none of the one-time fields is applied.

use crate::model::celestial::{BirthData, NatalChart, SovereignWindow, UserRole};
use crate::model::profile::UserProfile;
use crate::service::DomainStore;
use crate::store::subscription::lock;
use crate::store::{DocumentStore, StoreError, StoreResult, Subscription};
use log::warn;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct UserData {
    pub profile: Option<UserProfile>,
    pub birth_data: Option<BirthData>,
    pub roles: Vec<UserRole>,
    pub focus_windows: Vec<SovereignWindow>,
    pub natal_chart: Option<NatalChart>,
    pub loading: bool,
    pub error: Option<Arc<StoreError>>,
}

impl UserData {
    /// Settled state with every field absent.
    pub fn empty() -> Self {
        Self {
            profile: None,
            birth_data: None,
            roles: Vec::new(),
            focus_windows: Vec::new(),
            natal_chart: None,
            loading: false,
            error: None,
        }
    }
}

struct Snapshot {
    birth_data: Option<BirthData>,
    roles: Vec<UserRole>,
    focus_windows: Vec<SovereignWindow>,
    natal_chart: Option<NatalChart>,
}

pub struct UserDataView<S> {
    store: DomainStore<S>,
    state: Arc<Mutex<UserData>>,
    profile_subscription: Mutex<Option<Subscription>>,
    user_id: Mutex<Option<String>>,
}

impl<S: DocumentStore> UserDataView<S> {
    pub fn new(store: DomainStore<S>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(UserData {
                loading: true,
                ..UserData::empty()
            })),
            profile_subscription: Mutex::new(None),
            user_id: Mutex::new(None),
        }
    }

    pub fn state(&self) -> UserData {
        lock(&self.state).clone()
    }

    /// Rebinds to `user_id`: cancels the previous profile subscription, opens
    /// a new one, then runs the one-time reads. `None` resets everything.
    ///
    /// Read failures are reported through `UserData::error`. A failure to open
    /// the profile subscription is not caught here and is returned instead.
    pub fn set_identity(&self, user_id: Option<&str>) -> StoreResult<()> {
        let mut slot = lock(&self.profile_subscription);
        if let Some(mut previous) = slot.take() {
            previous.cancel();
        }
        *lock(&self.user_id) = user_id.map(str::to_string);

        let Some(user_id) = user_id else {
            *lock(&self.state) = UserData::empty();
            return Ok(());
        };

        *lock(&self.state) = UserData {
            loading: true,
            ..UserData::empty()
        };

        let sink = Arc::clone(&self.state);
        let subscribed = self
            .store
            .profiles()
            .subscribe_profile(user_id, move |profile| {
                lock(&sink).profile = profile;
            });
        match subscribed {
            Ok(subscription) => *slot = Some(subscription),
            Err(err) => {
                lock(&self.state).loading = false;
                return Err(err);
            }
        }
        drop(slot);

        self.load_snapshot(user_id);
        Ok(())
    }

    /// Re-runs the one-time reads for the bound identity.
    pub fn reload(&self) {
        let user_id = lock(&self.user_id).clone();
        if let Some(user_id) = user_id {
            lock(&self.state).loading = true;
            self.load_snapshot(&user_id);
        }
    }

    pub fn close(&self) {
        if let Some(mut subscription) = lock(&self.profile_subscription).take() {
            subscription.cancel();
        }
    }

    fn load_snapshot(&self, user_id: &str) {
        let fetched = self.fetch_snapshot(user_id);
        let mut state = lock(&self.state);
        match fetched {
            Ok(snapshot) => {
                state.birth_data = snapshot.birth_data;
                state.roles = snapshot.roles;
                state.focus_windows = snapshot.focus_windows;
                state.natal_chart = snapshot.natal_chart;
                state.error = None;
            }
            Err(err) => {
                warn!("event=user_data_load module=view status=error error={err}");
                state.error = Some(Arc::new(err));
            }
        }
        state.loading = false;
    }

    fn fetch_snapshot(&self, user_id: &str) -> StoreResult<Snapshot> {
        let celestial = self.store.celestial();
        Ok(Snapshot {
            birth_data: celestial.get_birth_data(user_id)?,
            roles: celestial.get_roles(user_id)?,
            focus_windows: celestial.get_focus_windows(user_id)?,
            natal_chart: celestial.get_natal_chart(user_id)?,
        })
    }
}
