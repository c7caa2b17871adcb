#[cfg(test)]
mod tests {
    use crate::errors::AuthError;
    use crate::services::password_policy::{PasswordPolicy, PasswordPolicyError};

    fn policy() -> PasswordPolicy {
        PasswordPolicy::new(8, 2)
    }

    #[test]
    fn test_password_too_short() {
        assert_eq!(policy().validate("ab1", None), Err(PasswordPolicyError::TooShort(8)));
    }

    #[test]
    fn test_password_too_long() {
        let long_password = format!("{}1", "a".repeat(200));
        assert_eq!(
            policy().validate(&long_password, None),
            Err(PasswordPolicyError::TooLong(200))
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 8 characters, 12 bytes
        assert!(policy().validate("ääää1234", None).is_ok());
    }

    #[test]
    fn test_password_requires_letter_and_digit() {
        assert_eq!(
            policy().validate("12345678", None),
            Err(PasswordPolicyError::MissingLetter)
        );
        assert_eq!(
            policy().validate("abcdefgh", None),
            Err(PasswordPolicyError::MissingDigit)
        );
    }

    #[test]
    fn test_char_class_diversity() {
        let strict = PasswordPolicy::new(8, 3);
        assert_eq!(
            strict.validate("abcdefg1", None),
            Err(PasswordPolicyError::TooFewCharClasses(3))
        );
        assert!(strict.validate("abcdefG1", None).is_ok());
        assert!(strict.validate("abcdef!1", None).is_ok());
    }

    #[test]
    fn test_password_must_not_contain_username() {
        assert_eq!(
            policy().validate("xxALICE99", Some("alice")),
            Err(PasswordPolicyError::ContainsUsername)
        );
    }

    #[test]
    fn test_short_usernames_are_not_checked() {
        assert!(policy().validate("bob-is-1-cool", Some("bo")).is_ok());
    }

    #[test]
    fn test_policy_error_maps_to_weak_password() {
        let err: AuthError = PasswordPolicyError::MissingDigit.into();
        assert_eq!(
            err,
            AuthError::WeakPassword("Password must contain at least one digit".to_string())
        );
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_generate_secure_password() {
        let strict = PasswordPolicy::new(12, 4);
        let password = strict.generate_secure_password();

        assert_eq!(password.chars().count(), 20);
        assert!(strict.validate(&password, Some("someone")).is_ok());

        let other = strict.generate_secure_password();
        assert_ne!(password, other);
    }
}
