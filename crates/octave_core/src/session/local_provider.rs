//! In-process identity provider for local runs and tests.
//!
//! Accounts live in memory only; nothing is persisted across processes.

use super::{AuthError, AuthResult, AuthUser, IdentityProvider};
use crate::store::subscription::lock;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

const MIN_PASSWORD_CHARS: usize = 6;

struct Account {
    user: AuthUser,
    password: String,
}

/// Email/password accounts plus an optional preconfigured federated user.
#[derive(Default)]
pub struct LocalIdentityProvider {
    accounts: Mutex<BTreeMap<String, Account>>,
    federated_user: Option<AuthUser>,
    current: Mutex<Option<AuthUser>>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes federated sign-in succeed as `user`.
    pub fn with_federated_user(mut self, user: AuthUser) -> Self {
        self.federated_user = Some(user);
        self
    }

    fn remember(&self, user: &AuthUser) {
        *lock(&self.current) = Some(user.clone());
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let key = normalize_email(email);
        let user = {
            let accounts = lock(&self.accounts);
            match accounts.get(&key) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(AuthError::InvalidCredential),
            }
        };
        self.remember(&user);
        Ok(user)
    }

    fn sign_up(&self, email: &str, password: &str, display_name: &str) -> AuthResult<AuthUser> {
        let key = normalize_email(email);
        if key.is_empty() || !key.contains('@') {
            return Err(AuthError::Provider("invalid email address".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::WeakPassword);
        }

        let user = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(&key) {
                return Err(AuthError::EmailAlreadyInUse);
            }
            let user = AuthUser {
                id: Uuid::new_v4().simple().to_string(),
                email: Some(key.clone()),
                display_name: Some(display_name.trim().to_string()).filter(|n| !n.is_empty()),
                photo_url: None,
            };
            accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };
        self.remember(&user);
        Ok(user)
    }

    fn sign_in_with_federated_provider(&self) -> AuthResult<AuthUser> {
        let user = self.federated_user.clone().ok_or_else(|| {
            AuthError::FederatedFailure("no federated account configured".to_string())
        })?;
        self.remember(&user);
        Ok(user)
    }

    fn sign_out(&self) -> AuthResult<()> {
        *lock(&self.current) = None;
        Ok(())
    }

    fn restore(&self) -> AuthResult<Option<AuthUser>> {
        Ok(lock(&self.current).clone())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
