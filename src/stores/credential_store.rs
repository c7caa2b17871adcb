use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::internal::{CredentialError, UserError};
use crate::errors::InternalError;
use crate::services::password_policy::PasswordPolicy;
use crate::types::db::user;
use crate::types::internal::{Credential, CredentialScheme};

pub const SALT_LEN: usize = 16;
pub const HASH_LEN: usize = 32;

/// Highest iteration count accepted anywhere: in settings, for new
/// credentials, and for stored ones. Stored counts above it are treated as
/// corrupt rather than letting one row pin a blocking thread for minutes.
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Creates, verifies and rotates PBKDF2-HMAC-SHA256 password credentials
///
/// Key derivation is CPU-bound and always runs on the blocking thread pool.
/// Every derivation increments a counter so the number of derivations a code
/// path performs can be observed.
pub struct CredentialStore {
    iterations: u32,
    policy: PasswordPolicy,
    derivations: Arc<AtomicU64>,
}

/// Decoded form of a stored credential, produced only for verification
struct DecodedCredential {
    scheme: CredentialScheme,
    salt: Vec<u8>,
    hash: Vec<u8>,
    iterations: u32,
}

impl CredentialStore {
    /// Create a new CredentialStore
    ///
    /// # Arguments
    /// * `iterations` - PBKDF2 iteration count for newly created credentials
    /// * `policy` - Strength policy every new password must satisfy
    pub fn new(iterations: u32, policy: PasswordPolicy) -> Self {
        Self {
            iterations,
            policy,
            derivations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Number of key derivations performed since construction
    pub fn derivations(&self) -> u64 {
        self.derivations.load(Ordering::SeqCst)
    }

    /// Deterministic PBKDF2-HMAC-SHA256 primitive
    pub fn derive_key(&self, password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
        derive(&self.derivations, password, salt, iterations)
    }

    /// Create a credential for a new password
    ///
    /// The password is checked against the strength policy first; `username`
    /// enables the username-substring rule.
    ///
    /// # Errors
    /// * `CredentialError::WeakPassword` - Password rejected by policy
    /// * `CredentialError::HashingFailed` - Blocking task could not complete
    pub async fn create_credential(
        &self,
        password: &str,
        username: Option<&str>,
    ) -> Result<Credential, InternalError> {
        self.policy
            .validate(password, username)
            .map_err(CredentialError::from)?;

        self.hash_password(password).await
    }

    /// Replace an old credential after its password was verified
    ///
    /// Used for legacy-plaintext accounts and for credentials derived with
    /// fewer iterations than currently configured. The policy is not applied:
    /// the user already proved knowledge of this password and cannot be
    /// locked out by a policy change.
    pub async fn rotate(&self, password: &str, old: &Credential) -> Result<Credential, InternalError> {
        tracing::debug!(
            "Rotating credential (scheme={}, iterations={}) to {} x {}",
            old.scheme,
            old.iterations,
            CredentialScheme::Pbkdf2Sha256,
            self.iterations
        );
        self.hash_password(password).await
    }

    /// True when the credential is legacy or weaker than the current setting
    pub fn needs_rotation(&self, credential: &Credential) -> bool {
        match CredentialScheme::parse(&credential.scheme) {
            Some(CredentialScheme::Pbkdf2Sha256) => {
                credential.iterations < 0 || (credential.iterations as u32) < self.iterations
            }
            Some(CredentialScheme::LegacyPlaintext) | None => true,
        }
    }

    /// Check a password against a stored credential
    ///
    /// # Returns
    /// * `Ok(true)` - Password matches
    /// * `Ok(false)` - Password does not match
    /// * `Err(InternalError)` - Stored credential is malformed
    pub async fn verify(&self, password: &str, credential: &Credential) -> Result<bool, InternalError> {
        let decoded = decode(credential)?;

        match decoded.scheme {
            CredentialScheme::LegacyPlaintext => {
                Ok(bool::from(password.as_bytes().ct_eq(&decoded.hash)))
            }
            CredentialScheme::Pbkdf2Sha256 => {
                let counter = Arc::clone(&self.derivations);
                let password = password.to_string();
                let DecodedCredential {
                    salt,
                    hash,
                    iterations,
                    ..
                } = decoded;

                tokio::task::spawn_blocking(move || {
                    let derived = derive(&counter, &password, &salt, iterations);
                    bool::from(derived.as_slice().ct_eq(hash.as_slice()))
                })
                .await
                .map_err(|e| CredentialError::HashingFailed(e.to_string()).into())
            }
        }
    }

    /// Persist a credential onto its user row and bump `updated_at`
    ///
    /// Takes the connection explicitly so callers can run it inside a
    /// transaction together with session revocation.
    pub async fn replace_credential<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        credential: &Credential,
    ) -> Result<(), InternalError> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::PasswordScheme, Expr::value(credential.scheme.clone()))
            .col_expr(user::Column::PasswordHash, Expr::value(credential.hash.clone()))
            .col_expr(user::Column::PasswordSalt, Expr::value(credential.salt.clone()))
            .col_expr(user::Column::PasswordIterations, Expr::value(credential.iterations))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().timestamp()))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("replace_credential", e))?;

        if result.rows_affected == 0 {
            return Err(UserError::NotFound(user_id.to_string()).into());
        }

        tracing::debug!(user_id = %user_id, "Credential replaced");
        Ok(())
    }

    /// Credential for a random password nobody knows
    ///
    /// Verifying against it costs exactly what verifying a real credential
    /// costs, which keeps unknown-username logins indistinguishable by timing.
    pub async fn decoy_credential(&self) -> Result<Credential, InternalError> {
        let random: [u8; 24] = rand::rng().random();
        self.hash_password(&STANDARD.encode(random)).await
    }

    /// Build a credential that holds a password verbatim
    ///
    /// Only for importing accounts from the old plaintext column; such
    /// credentials are rotated on their first successful login.
    pub fn legacy_plaintext(password: &str) -> Credential {
        Credential {
            scheme: CredentialScheme::LegacyPlaintext.as_str().to_string(),
            salt: String::new(),
            hash: STANDARD.encode(password.as_bytes()),
            iterations: 0,
        }
    }

    async fn hash_password(&self, password: &str) -> Result<Credential, InternalError> {
        let counter = Arc::clone(&self.derivations);
        let iterations = self.iterations;
        let password = password.to_string();

        let (salt, hash) = tokio::task::spawn_blocking(move || {
            let salt: [u8; SALT_LEN] = rand::rng().random();
            let hash = derive(&counter, &password, &salt, iterations);
            (salt, hash)
        })
        .await
        .map_err(|e| CredentialError::HashingFailed(e.to_string()))?;

        let iterations = i32::try_from(iterations)
            .map_err(|_| InternalError::parse("iterations", "iteration count exceeds i32"))?;

        Ok(Credential {
            scheme: CredentialScheme::Pbkdf2Sha256.as_str().to_string(),
            salt: STANDARD.encode(salt),
            hash: STANDARD.encode(hash),
            iterations,
        })
    }
}

fn derive(counter: &AtomicU64, password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    counter.fetch_add(1, Ordering::SeqCst);
    out
}

fn decode(credential: &Credential) -> Result<DecodedCredential, CredentialError> {
    let scheme = CredentialScheme::parse(&credential.scheme)
        .ok_or_else(|| CredentialError::Malformed(format!("unknown scheme '{}'", credential.scheme)))?;

    let hash = STANDARD
        .decode(&credential.hash)
        .map_err(|e| CredentialError::Malformed(format!("hash is not valid base64: {}", e)))?;

    match scheme {
        CredentialScheme::LegacyPlaintext => {
            if hash.is_empty() {
                return Err(CredentialError::Malformed("empty legacy password".to_string()));
            }
            Ok(DecodedCredential {
                scheme,
                salt: Vec::new(),
                hash,
                iterations: 0,
            })
        }
        CredentialScheme::Pbkdf2Sha256 => {
            let salt = STANDARD
                .decode(&credential.salt)
                .map_err(|e| CredentialError::Malformed(format!("salt is not valid base64: {}", e)))?;
            if salt.is_empty() {
                return Err(CredentialError::Malformed("empty salt".to_string()));
            }
            if hash.len() != HASH_LEN {
                return Err(CredentialError::Malformed(format!(
                    "hash is {} bytes, expected {}",
                    hash.len(),
                    HASH_LEN
                )));
            }
            let iterations = u32::try_from(credential.iterations)
                .ok()
                .filter(|n| (1..=MAX_PBKDF2_ITERATIONS).contains(n))
                .ok_or_else(|| {
                    CredentialError::Malformed(format!("iteration count {} out of range", credential.iterations))
                })?;

            Ok(DecodedCredential {
                scheme,
                salt,
                hash,
                iterations,
            })
        }
    }
}
