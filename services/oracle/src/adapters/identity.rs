//! services/oracle/src/adapters/identity.rs
//!
//! An in-process identity provider implementing the `IdentityProvider` port.
//! Accounts live in memory for the lifetime of the process; passwords are hashed with
//! Argon2. Auth state is published on a `watch` channel so every subscriber first sees
//! the current state and then each change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use futures::StreamExt;
use literary_oracle_core::{
    AuthError, AuthStateStream, IdentityProvider, Role, SessionIdentity,
};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{error, info};
use uuid::Uuid;

/// Shortest password the provider accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

struct Account {
    uid: Uuid,
    password_hash: String,
    display_name: String,
    role: Role,
}

pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: watch::Sender<Option<SessionIdentity>>,
    archivists: HashSet<String>,
}

impl InMemoryIdentityProvider {
    /// Creates an empty provider. Accounts registered with an email in `archivists`
    /// receive the archivist role claim.
    pub fn new(archivists: impl IntoIterator<Item = String>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
            archivists: archivists.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    fn identity_for(&self, email: &str, account: &Account) -> SessionIdentity {
        SessionIdentity::from_provider(
            account.uid,
            Some(&account.display_name),
            Some(email),
            account.role,
        )
    }

    fn publish(&self, identity: Option<SessionIdentity>) {
        self.current.send_replace(identity);
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = normalize(email);
        let accounts = self.accounts.lock().await;
        let account = accounts.get(&email).ok_or(AuthError::InvalidCredential)?;

        let parsed_hash = PasswordHash::new(&account.password_hash).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            AuthError::Provider("Authentication error".to_string())
        })?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            return Err(AuthError::InvalidCredential);
        }

        info!("User {} signed in.", email);
        self.publish(Some(self.identity_for(&email, account)));
        Ok(())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), AuthError> {
        let email = normalize(email);
        if display_name.trim().is_empty() {
            return Err(AuthError::MissingDisplayName);
        }
        let email_pattern = EMAIL_PATTERN.as_ref().map_err(|e| {
            error!("Email pattern failed to compile: {}", e);
            AuthError::Provider(String::new())
        })?;
        if !email_pattern.is_match(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&email) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                AuthError::Provider("Failed to hash password".to_string())
            })?
            .to_string();

        let role = if self.archivists.contains(&email) {
            Role::Archivist
        } else {
            Role::Reader
        };
        let account = Account {
            uid: Uuid::new_v4(),
            password_hash,
            display_name: display_name.trim().to_string(),
            role,
        };
        let identity = self.identity_for(&email, &account);
        accounts.insert(email.clone(), account);

        info!("Registered {} ({:?}).", email, role);
        self.publish(Some(identity));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        info!("Signing out.");
        self.publish(None);
        Ok(())
    }

    fn on_auth_state_change(&self) -> AuthStateStream {
        WatchStream::new(self.current.subscribe()).boxed()
    }
}
