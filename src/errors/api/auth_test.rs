use crate::errors::{ApiError, AuthError};

#[test]
fn test_not_logged_in_maps_to_unauthorized() {
    let api_err = ApiError::from(AuthError::NotLoggedIn);

    assert!(matches!(api_err, ApiError::Unauthorized(_)));
    assert_eq!(api_err.body().error, "not_logged_in");
    assert_eq!(api_err.body().status_code, 401);
}

#[test]
fn test_forbidden_maps_to_403() {
    let api_err = ApiError::from(AuthError::Forbidden);

    assert!(matches!(api_err, ApiError::Forbidden(_)));
    assert_eq!(api_err.message(), "Forbidden");
}

#[test]
fn test_weak_password_keeps_reason() {
    let api_err = ApiError::from(AuthError::WeakPassword("Password must contain a digit".to_string()));

    assert!(matches!(api_err, ApiError::BadRequest(_)));
    assert!(api_err.message().contains("must contain a digit"));
}

#[test]
fn test_malformed_credential_is_generic_500() {
    let api_err = ApiError::from(AuthError::MalformedCredential);

    assert!(matches!(api_err, ApiError::InternalError(_)));
    assert_eq!(api_err.body().status_code, 500);
}

#[test]
fn test_duplicate_username_maps_to_conflict() {
    let api_err = ApiError::from(AuthError::DuplicateUsername);

    assert!(matches!(api_err, ApiError::Conflict(_)));
}
