//! Owner accounts and bearer-token sessions.

use crate::core::{LedgerError, OwnerId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A registered owner account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerAccount {
    id: OwnerId,
    username: String,
    password_hash: String,
}

impl OwnerAccount {
    pub fn id(&self) -> OwnerId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

/// Account registry keyed by username.
///
/// Credentials never leave this module unhashed; `authenticate` reports the
/// same error for an unknown username and a wrong password.
pub struct AccountManager {
    accounts: RwLock<HashMap<String, OwnerAccount>>,
}

impl AccountManager {
    const MAX_USERNAME_LENGTH: usize = 50;
    const MIN_PASSWORD_LENGTH: usize = 8;

    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuilds the registry from recovered accounts.
    pub fn restore(accounts: Vec<OwnerAccount>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|a| (a.username.clone(), a))
            .collect();
        Self {
            accounts: RwLock::new(accounts),
        }
    }

    fn validate_username(username: &str) -> Result<()> {
        if username.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Username cannot be empty".to_string(),
            ));
        }
        if username.len() > Self::MAX_USERNAME_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Username too long (max {} characters)",
                Self::MAX_USERNAME_LENGTH
            )));
        }
        Ok(())
    }

    fn validate_password(password: &str) -> Result<()> {
        if password.len() < Self::MIN_PASSWORD_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Password must be at least {} characters",
                Self::MIN_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    fn hash_password(password: &str) -> Result<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| LedgerError::Internal(format!("Failed to hash password: {e}")))
    }

    fn verify_password(password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Registers a new owner. Validates credentials before hashing.
    pub async fn create(&self, username: &str, password: &str) -> Result<OwnerAccount> {
        Self::validate_username(username)?;
        Self::validate_password(password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(username) {
            return Err(LedgerError::OwnerExists(username.to_string()));
        }

        let account = OwnerAccount {
            id: OwnerId::new(),
            username: username.to_string(),
            password_hash: Self::hash_password(password)?,
        };
        accounts.insert(username.to_string(), account.clone());
        Ok(account)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<OwnerAccount> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(username)
            .ok_or_else(|| LedgerError::AuthFailed("Invalid username or password".to_string()))?;

        if !Self::verify_password(password, account.password_hash()) {
            return Err(LedgerError::AuthFailed(
                "Invalid username or password".to_string(),
            ));
        }
        Ok(account.clone())
    }

    /// All accounts, for persistence checkpoints.
    pub async fn export(&self) -> Vec<OwnerAccount> {
        self.accounts.read().await.values().cloned().collect()
    }
}

impl Default for AccountManager {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory bearer tokens. Tokens are opaque UUIDs and die with the process;
/// clients log in again after a restart.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, OwnerId>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn issue(&self, owner: OwnerId) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), owner);
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<OwnerId> {
        self.sessions.read().await.get(token).copied()
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
