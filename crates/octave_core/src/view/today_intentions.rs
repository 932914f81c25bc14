//! Today's intentions as live view state.

use crate::model::intention::Intention;
use crate::service::DomainStore;
use crate::store::subscription::lock;
use crate::store::{DocumentStore, StoreResult, Subscription};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodayIntentionsState {
    pub intentions: Vec<Intention>,
    pub loading: bool,
}

/// Republishes the today-intentions subscription of the current identity.
pub struct TodayIntentionsView<S> {
    store: DomainStore<S>,
    state: Arc<Mutex<TodayIntentionsState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<S: DocumentStore> TodayIntentionsView<S> {
    /// Starts loading with no identity bound yet.
    pub fn new(store: DomainStore<S>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(TodayIntentionsState {
                intentions: Vec::new(),
                loading: true,
            })),
            subscription: Mutex::new(None),
        }
    }

    pub fn state(&self) -> TodayIntentionsState {
        lock(&self.state).clone()
    }

    /// Rebinds the view to `user_id`, tearing the previous subscription down
    /// first. `None` resets to an empty, settled list.
    pub fn set_identity(&self, user_id: Option<&str>) -> StoreResult<()> {
        let mut slot = lock(&self.subscription);
        if let Some(mut previous) = slot.take() {
            previous.cancel();
        }

        let Some(user_id) = user_id else {
            *lock(&self.state) = TodayIntentionsState {
                intentions: Vec::new(),
                loading: false,
            };
            return Ok(());
        };

        lock(&self.state).loading = true;
        let sink = Arc::clone(&self.state);
        let subscribed = self
            .store
            .intentions()
            .subscribe_today_intentions(user_id, move |intentions| {
                let mut state = lock(&sink);
                state.intentions = intentions;
                state.loading = false;
            });
        match subscribed {
            Ok(subscription) => {
                *slot = Some(subscription);
                Ok(())
            }
            Err(err) => {
                lock(&self.state).loading = false;
                Err(err)
            }
        }
    }

    /// Cancels the live subscription, if any.
    pub fn close(&self) {
        if let Some(mut subscription) = lock(&self.subscription).take() {
            subscription.cancel();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.subscription)
            .as_ref()
            .is_some_and(Subscription::is_active)
    }
}
