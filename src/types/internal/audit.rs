use std::fmt;

/// Security-relevant actions recorded in the audit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    Logout,
    LoginFailed,
    PasswordChange,
    PasswordResetByAdmin,
    UserCreate,
    UserUpdate,
    RoleChange,
    AccountDisable,
    CredentialUpgrade,
    Custom(String),
}

impl AuditAction {
    /// Convert AuditAction to string representation for database storage
    pub fn as_str(&self) -> &str {
        match self {
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::PasswordChange => "PASSWORD_CHANGE",
            Self::PasswordResetByAdmin => "PASSWORD_RESET_BY_ADMIN",
            Self::UserCreate => "USER_CREATE",
            Self::UserUpdate => "USER_UPDATE",
            Self::RoleChange => "ROLE_CHANGE",
            Self::AccountDisable => "ACCOUNT_DISABLE",
            Self::CredentialUpgrade => "CREDENTIAL_UPGRADE",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for AuditAction {
    fn from(s: &str) -> Self {
        match s {
            "LOGIN" => Self::Login,
            "LOGOUT" => Self::Logout,
            "LOGIN_FAILED" => Self::LoginFailed,
            "PASSWORD_CHANGE" => Self::PasswordChange,
            "PASSWORD_RESET_BY_ADMIN" => Self::PasswordResetByAdmin,
            "USER_CREATE" => Self::UserCreate,
            "USER_UPDATE" => Self::UserUpdate,
            "ROLE_CHANGE" => Self::RoleChange,
            "ACCOUNT_DISABLE" => Self::AccountDisable,
            "CREDENTIAL_UPGRADE" => Self::CredentialUpgrade,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for AuditAction {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Structured key/value detail attached to an audit entry
pub type AuditDetail = serde_json::Map<String, serde_json::Value>;

/// One audit entry, either about to be written or read back
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// None until the store assigns it
    pub id: Option<i64>,
    pub actor_user_id: Option<String>,
    pub action: AuditAction,
    pub target_user_id: Option<String>,
    pub detail: AuditDetail,
    /// RFC 3339, UTC
    pub created_at: String,
}

impl AuditEntry {
    pub fn new(action: AuditAction) -> Self {
        Self {
            id: None,
            actor_user_id: None,
            action,
            target_user_id: None,
            detail: AuditDetail::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Convenience accessor for string-valued detail fields
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.detail.get(key).and_then(|v| v.as_str())
    }
}
