/// Password Hashing and Verification (bcrypt)

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password using bcrypt at the given cost.
///
/// # Errors
/// Returns error if the password is empty or out of bounds, or hashing fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    validate_password(password)?;

    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash.
///
/// A malformed stored hash is an internal error, not a failed login.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    // both bounds count characters, matching the error messages
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse", TEST_COST).expect("Failed to hash password");

        assert_ne!(hash, "correct horse");
        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_bounds() {
        assert!(matches!(
            hash_password("", TEST_COST),
            Err(AppError::Validation(ValidationError::EmptyField(_)))
        ));
        assert!(matches!(
            hash_password("short", TEST_COST),
            Err(AppError::Validation(ValidationError::TooShort(_, 8)))
        ));
        assert!(matches!(
            hash_password(&"a".repeat(MAX_PASSWORD_LENGTH + 1), TEST_COST),
            Err(AppError::Validation(ValidationError::TooLong(_, 128)))
        ));
    }

    #[test]
    fn test_bounds_count_characters_not_bytes() {
        // 4-byte characters: 40 chars is 160 bytes
        let emoji = "\u{1F510}".repeat(40);
        assert!(validate_password(&emoji).is_ok());

        let too_long = "\u{1F510}".repeat(MAX_PASSWORD_LENGTH + 1);
        assert_eq!(
            validate_password(&too_long),
            Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH))
        );

        let accented = "\u{e9}".repeat(MIN_PASSWORD_LENGTH - 1);
        assert_eq!(
            validate_password(&accented),
            Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH))
        );
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("whatever1", "not-a-bcrypt-hash").is_err());
    }
}
