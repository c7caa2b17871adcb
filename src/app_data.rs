use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::audit::AuditLogger;
use crate::config::AuthSettings;
use crate::errors::InternalError;
use crate::services::{AuthGate, AuthService, PasswordPolicy};
use crate::stores::{AuditStore, CredentialStore, SessionStore};

/// Centralized application data
///
/// Everything is created once by `AppData::init` and shared behind `Arc`.
///
/// ```text
/// AppData::init(db, settings)
///   ├─ audit_store / audit_logger
///   ├─ credential_store (PBKDF2 + password policy)
///   ├─ session_store (HMAC-keyed token hashes)
///   ├─ auth_gate
///   └─ auth_service (uses all of the above)
/// ```
pub struct AppData {
    pub db: DatabaseConnection,
    pub settings: Arc<AuthSettings>,
    pub audit_store: Arc<AuditStore>,
    pub audit_logger: Arc<AuditLogger>,
    pub credential_store: Arc<CredentialStore>,
    pub session_store: Arc<SessionStore>,
    pub auth_gate: Arc<AuthGate>,
    pub auth_service: Arc<AuthService>,
}

impl AppData {
    /// Initialize all application data
    ///
    /// The database must already be migrated.
    ///
    /// # Errors
    /// Returns `InternalError` when the session key cannot be set up or the
    /// decoy credential cannot be derived
    pub async fn init(db: DatabaseConnection, settings: AuthSettings) -> Result<Self, InternalError> {
        tracing::info!("Initializing AppData...");
        let settings = Arc::new(settings);

        // Audit first; everything else records through it
        let audit_store = Arc::new(AuditStore::new(db.clone()));
        let audit_logger = Arc::new(AuditLogger::new(Arc::clone(&audit_store)));

        let policy = PasswordPolicy::new(
            settings.password_min_length(),
            settings.password_min_char_classes(),
        );
        let credential_store = Arc::new(CredentialStore::new(settings.pbkdf2_iterations(), policy));
        let session_store = Arc::new(SessionStore::new(settings.session_secret())?);
        let auth_gate = Arc::new(AuthGate::new(db.clone(), Arc::clone(&session_store)));

        let auth_service = Arc::new(
            AuthService::new(
                db.clone(),
                &settings,
                Arc::clone(&credential_store),
                Arc::clone(&session_store),
                Arc::clone(&auth_gate),
                Arc::clone(&audit_logger),
            )
            .await?,
        );

        tracing::info!("AppData initialization complete");

        Ok(Self {
            db,
            settings,
            audit_store,
            audit_logger,
            credential_store,
            session_store,
            auth_gate,
            auth_service,
        })
    }
}
