use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::internal::{InternalError, UserError};
use crate::types::db::user;

/// Flat role set. No role implies another; an admin-only action is not
/// available to teachers and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    /// Convert Role to its storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Format-version tag stored next to every credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    /// PBKDF2-HMAC-SHA256 with a per-user random salt
    Pbkdf2Sha256,
    /// Imported account whose password is still held verbatim. Accepted once,
    /// then rotated on the next successful login.
    LegacyPlaintext,
}

impl CredentialScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pbkdf2Sha256 => "pbkdf2-sha256",
            Self::LegacyPlaintext => "legacy-plaintext",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "pbkdf2-sha256" => Some(Self::Pbkdf2Sha256),
            "legacy-plaintext" => Some(Self::LegacyPlaintext),
            _ => None,
        }
    }
}

impl fmt::Display for CredentialScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored credential exactly as persisted
///
/// Salt and hash stay in their base64 text form until verification decodes
/// them, so loading a user never fails because of a damaged credential. Only
/// the code path that actually needs the key material reports it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub scheme: String,
    pub salt: String,
    pub hash: String,
    pub iterations: i32,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field("salt", &"[REDACTED]")
            .field("hash", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .finish()
    }
}

/// A user as seen by every layer above the user store
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub credential: Credential,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserIdentity {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

impl TryFrom<user::Model> for UserIdentity {
    type Error = InternalError;

    fn try_from(model: user::Model) -> Result<Self, Self::Error> {
        let role = Role::from_str(&model.role).map_err(|_| {
            InternalError::User(UserError::UnknownRole {
                user_id: model.id.clone(),
                role: model.role.clone(),
            })
        })?;

        Ok(Self {
            id: model.id,
            username: model.username,
            display_name: model.display_name,
            role,
            credential: Credential {
                scheme: model.password_scheme,
                salt: model.password_salt,
                hash: model.password_hash,
                iterations: model.password_iterations,
            },
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(role: &str) -> user::Model {
        user::Model {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            role: role.to_string(),
            password_scheme: "pbkdf2-sha256".to_string(),
            password_hash: "aGFzaA==".to_string(),
            password_salt: "c2FsdA==".to_string(),
            password_iterations: 1000,
            is_active: true,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn test_role_round_trips_through_storage_form() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert_eq!(Role::from_str(" Teacher ").unwrap(), Role::Teacher);
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_scheme_tags() {
        assert_eq!(CredentialScheme::parse("pbkdf2-sha256"), Some(CredentialScheme::Pbkdf2Sha256));
        assert_eq!(CredentialScheme::parse("legacy-plaintext"), Some(CredentialScheme::LegacyPlaintext));
        assert_eq!(CredentialScheme::parse("bcrypt"), None);
    }

    #[test]
    fn test_identity_from_model() {
        let identity = UserIdentity::try_from(model("teacher")).unwrap();
        assert_eq!(identity.role, Role::Teacher);
        assert_eq!(identity.credential.iterations, 1000);
        assert!(identity.has_role(Role::Teacher));
        assert!(!identity.has_role(Role::Admin));
    }

    #[test]
    fn test_identity_rejects_unknown_role() {
        let err = UserIdentity::try_from(model("janitor")).unwrap_err();
        assert!(matches!(err, InternalError::User(UserError::UnknownRole { .. })));
    }

    #[test]
    fn test_credential_debug_redacts_material() {
        let identity = UserIdentity::try_from(model("student")).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains("aGFzaA=="));
        assert!(!debug.contains("c2FsdA=="));
        assert!(debug.contains("[REDACTED]"));
    }
}
