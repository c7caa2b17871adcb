use std::fmt;
use std::time::Duration;

use crate::config::env_provider::EnvironmentProvider;
use crate::stores::credential_store::MAX_PBKDF2_ITERATIONS;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://classroom_auth.db?mode=rwc";
pub const DEFAULT_COOKIE_NAME: &str = "session";
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 210_000;
/// Below this a warning is logged at startup
pub const RECOMMENDED_MIN_PBKDF2_ITERATIONS: u32 = 150_000;
pub const MIN_PBKDF2_ITERATIONS: u32 = 1_000;
pub const MIN_SESSION_SECRET_LENGTH: usize = 32;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Errors raised while loading settings at startup
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Required setting '{0}' is missing")]
    Missing(&'static str),

    #[error("Setting '{name}' must be at least {expected} characters, got {actual}")]
    TooShort {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Setting '{name}' has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl SettingsError {
    fn invalid(name: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Runtime settings for the credential and session subsystem
#[derive(Clone)]
pub struct AuthSettings {
    database_url: String,
    host: String,
    port: u16,
    session_secret: String,
    session_ttl_days: i64,
    session_cookie_name: String,
    pbkdf2_iterations: u32,
    failed_login_delay: Duration,
    password_min_length: usize,
    password_min_char_classes: usize,
}

impl AuthSettings {
    /// Load and validate settings from the given environment
    ///
    /// # Errors
    /// Returns `SettingsError` for a missing secret or any out-of-range value.
    pub fn from_env(env: &dyn EnvironmentProvider) -> Result<Self, SettingsError> {
        let database_url = env
            .get_var("DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let host = env.get_var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(env, "PORT", 3000u16)?;

        let session_secret = env
            .get_var("SESSION_SECRET")
            .ok_or(SettingsError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(SettingsError::TooShort {
                name: "SESSION_SECRET",
                expected: MIN_SESSION_SECRET_LENGTH,
                actual: session_secret.len(),
            });
        }

        let session_ttl_days = parse_or(env, "SESSION_TTL_DAYS", 7i64)?;
        if !(1..=30).contains(&session_ttl_days) {
            return Err(SettingsError::invalid(
                "SESSION_TTL_DAYS",
                &session_ttl_days.to_string(),
                "must be between 1 and 30",
            ));
        }

        let session_cookie_name = env
            .get_var("SESSION_COOKIE_NAME")
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());
        if session_cookie_name.is_empty()
            || !session_cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SettingsError::invalid(
                "SESSION_COOKIE_NAME",
                &session_cookie_name,
                "only letters, digits, '-' and '_' are allowed",
            ));
        }

        let pbkdf2_iterations = parse_or(env, "PBKDF2_ITERATIONS", DEFAULT_PBKDF2_ITERATIONS)?;
        if pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
            return Err(SettingsError::invalid(
                "PBKDF2_ITERATIONS",
                &pbkdf2_iterations.to_string(),
                format!("must be at least {}", MIN_PBKDF2_ITERATIONS),
            ));
        }
        if pbkdf2_iterations > MAX_PBKDF2_ITERATIONS {
            return Err(SettingsError::invalid(
                "PBKDF2_ITERATIONS",
                &pbkdf2_iterations.to_string(),
                format!("must be at most {}", MAX_PBKDF2_ITERATIONS),
            ));
        }
        if pbkdf2_iterations < RECOMMENDED_MIN_PBKDF2_ITERATIONS {
            tracing::warn!(
                "PBKDF2_ITERATIONS={} is below the recommended minimum of {}",
                pbkdf2_iterations,
                RECOMMENDED_MIN_PBKDF2_ITERATIONS
            );
        }

        let failed_login_delay = Duration::from_millis(parse_or(env, "FAILED_LOGIN_DELAY_MS", 50u64)?);

        let password_min_length = parse_or(env, "PASSWORD_MIN_LENGTH", 8usize)?;
        if password_min_length == 0 || password_min_length > 200 {
            return Err(SettingsError::invalid(
                "PASSWORD_MIN_LENGTH",
                &password_min_length.to_string(),
                "must be between 1 and 200",
            ));
        }

        let password_min_char_classes = parse_or(env, "PASSWORD_MIN_CHAR_CLASSES", 2usize)?;
        if !(1..=4).contains(&password_min_char_classes) {
            return Err(SettingsError::invalid(
                "PASSWORD_MIN_CHAR_CLASSES",
                &password_min_char_classes.to_string(),
                "must be between 1 and 4",
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            session_secret,
            session_ttl_days,
            session_cookie_name,
            pbkdf2_iterations,
            failed_login_delay,
            password_min_length,
            password_min_char_classes,
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Listen address in `host:port` form
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_secret(&self) -> &[u8] {
        self.session_secret.as_bytes()
    }

    /// Session lifetime in seconds
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_days * SECONDS_PER_DAY
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    pub fn pbkdf2_iterations(&self) -> u32 {
        self.pbkdf2_iterations
    }

    pub fn failed_login_delay(&self) -> Duration {
        self.failed_login_delay
    }

    pub fn password_min_length(&self) -> usize {
        self.password_min_length
    }

    pub fn password_min_char_classes(&self) -> usize {
        self.password_min_char_classes
    }
}

fn parse_or<T>(env: &dyn EnvironmentProvider, name: &'static str, default: T) -> Result<T, SettingsError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match env.get_var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| SettingsError::invalid(name, &raw, e.to_string())),
        None => Ok(default),
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("database_url", &self.database_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("session_secret", &"<redacted>")
            .field("session_ttl_days", &self.session_ttl_days)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("pbkdf2_iterations", &self.pbkdf2_iterations)
            .field("failed_login_delay", &self.failed_login_delay)
            .field("password_min_length", &self.password_min_length)
            .field("password_min_char_classes", &self.password_min_char_classes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_provider::MockEnvironment;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn env() -> MockEnvironment {
        MockEnvironment::empty().with_var("SESSION_SECRET", SECRET)
    }

    #[test]
    fn test_defaults() {
        let settings = AuthSettings::from_env(&env()).unwrap();

        assert_eq!(settings.database_url(), DEFAULT_DATABASE_URL);
        assert_eq!(settings.bind_address(), "0.0.0.0:3000");
        assert_eq!(settings.session_ttl_seconds(), 7 * 86_400);
        assert_eq!(settings.session_cookie_name(), "session");
        assert_eq!(settings.pbkdf2_iterations(), 210_000);
        assert_eq!(settings.failed_login_delay(), Duration::from_millis(50));
        assert_eq!(settings.password_min_length(), 8);
        assert_eq!(settings.password_min_char_classes(), 2);
    }

    #[test]
    fn test_missing_secret() {
        let err = AuthSettings::from_env(&MockEnvironment::empty()).unwrap_err();
        assert!(matches!(err, SettingsError::Missing("SESSION_SECRET")));
    }

    #[test]
    fn test_short_secret() {
        let env = MockEnvironment::empty().with_var("SESSION_SECRET", "short");
        let err = AuthSettings::from_env(&env).unwrap_err();
        assert!(matches!(err, SettingsError::TooShort { expected: 32, actual: 5, .. }));
    }

    #[test]
    fn test_ttl_range() {
        assert!(AuthSettings::from_env(&env().with_var("SESSION_TTL_DAYS", "0")).is_err());
        assert!(AuthSettings::from_env(&env().with_var("SESSION_TTL_DAYS", "31")).is_err());

        let settings = AuthSettings::from_env(&env().with_var("SESSION_TTL_DAYS", "30")).unwrap();
        assert_eq!(settings.session_ttl_seconds(), 30 * 86_400);
    }

    #[test]
    fn test_iteration_floor() {
        assert!(AuthSettings::from_env(&env().with_var("PBKDF2_ITERATIONS", "999")).is_err());
        // Allowed, only warns
        let settings = AuthSettings::from_env(&env().with_var("PBKDF2_ITERATIONS", "1000")).unwrap();
        assert_eq!(settings.pbkdf2_iterations(), 1000);
    }

    #[test]
    fn test_iteration_ceiling() {
        let err = AuthSettings::from_env(&env().with_var("PBKDF2_ITERATIONS", "20000000")).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { name: "PBKDF2_ITERATIONS", .. }));
        assert!(AuthSettings::from_env(&env().with_var("PBKDF2_ITERATIONS", "4294967295")).is_err());

        let settings = AuthSettings::from_env(
            &env().with_var("PBKDF2_ITERATIONS", &MAX_PBKDF2_ITERATIONS.to_string()),
        )
        .unwrap();
        assert_eq!(settings.pbkdf2_iterations(), MAX_PBKDF2_ITERATIONS);
    }

    #[test]
    fn test_unparseable_number() {
        let err = AuthSettings::from_env(&env().with_var("PORT", "eighty")).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_cookie_name_charset() {
        assert!(AuthSettings::from_env(&env().with_var("SESSION_COOKIE_NAME", "a b")).is_err());
        assert!(AuthSettings::from_env(&env().with_var("SESSION_COOKIE_NAME", "")).is_err());
        assert!(AuthSettings::from_env(&env().with_var("SESSION_COOKIE_NAME", "class_sess")).is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = AuthSettings::from_env(&env()).unwrap();
        let debug = format!("{:?}", settings);

        assert!(!debug.contains(SECRET));
        assert!(debug.contains("<redacted>"));
    }
}
