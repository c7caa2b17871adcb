use rand::seq::SliceRandom;
use rand::Rng;

/// Upper bound on password length, independent of configuration
pub const MAX_PASSWORD_LENGTH: usize = 200;

/// Password strength policy applied to every new password
///
/// Checks run in order and fail fast:
/// 1. Length (min configurable, max 200 characters)
/// 2. At least one letter and one digit
/// 3. Character class diversity over lowercase, uppercase, digit, symbol
/// 4. No case-insensitive username substring (usernames of 3+ characters)
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
    max_length: usize,
    min_char_classes: usize,
}

impl PasswordPolicy {
    pub fn new(min_length: usize, min_char_classes: usize) -> Self {
        Self {
            min_length,
            max_length: MAX_PASSWORD_LENGTH,
            min_char_classes: min_char_classes.clamp(1, 4),
        }
    }

    /// Validate a password against all configured rules
    ///
    /// # Arguments
    /// * `password` - The password to validate
    /// * `username` - Username of the account the password is for, if known
    pub fn validate(&self, password: &str, username: Option<&str>) -> Result<(), PasswordPolicyError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(PasswordPolicyError::TooShort(self.min_length));
        }
        if length > self.max_length {
            return Err(PasswordPolicyError::TooLong(self.max_length));
        }

        let has_lower = password.chars().any(|c| c.is_lowercase());
        let has_upper = password.chars().any(|c| c.is_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        let has_symbol = password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

        if !password.chars().any(|c| c.is_alphabetic()) {
            return Err(PasswordPolicyError::MissingLetter);
        }
        if !has_digit {
            return Err(PasswordPolicyError::MissingDigit);
        }

        let classes = [has_lower, has_upper, has_digit, has_symbol]
            .iter()
            .filter(|present| **present)
            .count();
        if classes < self.min_char_classes {
            return Err(PasswordPolicyError::TooFewCharClasses(self.min_char_classes));
        }

        if let Some(username) = username {
            let username = username.trim();
            if username.chars().count() >= 3
                && password.to_lowercase().contains(&username.to_lowercase())
            {
                return Err(PasswordPolicyError::ContainsUsername);
            }
        }

        Ok(())
    }

    /// Generate a random 20-character password that satisfies this policy
    ///
    /// One character from each class is always included, so the result passes
    /// any configurable `min_char_classes`.
    pub fn generate_secure_password(&self) -> String {
        const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
        const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
        const DIGITS: &[u8] = b"23456789";
        const SYMBOLS: &[u8] = b"!@#$%^&*";
        const CHARSET: &[u8] =
            b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789!@#$%^&*";

        let mut rng = rand::rng();
        let length = self.min_length.max(20);

        let mut chars: Vec<char> = [LOWER, UPPER, DIGITS, SYMBOLS]
            .iter()
            .map(|set| set[rng.random_range(0..set.len())] as char)
            .collect();
        while chars.len() < length {
            chars.push(CHARSET[rng.random_range(0..CHARSET.len())] as char);
        }
        chars.shuffle(&mut rng);

        chars.into_iter().collect()
    }
}

/// Errors that can occur during password validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {0} characters")]
    TooShort(usize),

    #[error("Password must not exceed {0} characters")]
    TooLong(usize),

    #[error("Password must contain at least one letter")]
    MissingLetter,

    #[error("Password must contain at least one digit")]
    MissingDigit,

    #[error("Password must mix at least {0} of: lowercase, uppercase, digits, symbols")]
    TooFewCharClasses(usize),

    #[error("Password must not contain your username")]
    ContainsUsername,
}
