//! Password Hashing and Verification
//!
//! Credentials are stored as `pbkdf2$<iterations>$<salt>$<hash>` with the
//! salt and derived key base64-encoded. Verification also accepts a legacy
//! bare-plaintext stored form left over from before hashing was introduced;
//! callers that authenticate against such a row are expected to rewrite it
//! with [`hash_password`] immediately ("migrate on login"). New records must
//! never be stored in the legacy form.
//!
//! ## Security Notes
//! - PBKDF2-HMAC-SHA256, 210,000 iterations, fresh 16-byte salt per hash
//! - Constant-time comparison for both stored forms
//! - Derived keys zeroized after comparison
//! - Malformed stored forms fail verification, they never panic

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroize;

use crate::crypto::{constant_time_eq, from_base64, random_bytes, to_base64};

// ============================================================================
// Constants
// ============================================================================

const PBKDF2_PREFIX: &str = "pbkdf2";
const PBKDF2_ITERATIONS: u32 = 210_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Minimum length for newly set credentials.
/// Workspace access codes are short shared secrets, so this stays permissive.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Maximum length for newly set credentials
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Policy violations when setting a new credential
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password is too long
    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Password contains only whitespace
    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Password contains control characters
    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

// ============================================================================
// Policy
// ============================================================================

/// Validate a credential that is about to be stored.
///
/// Unicode is normalized with NFKC before validation and the normalized
/// string is returned; hash the returned value, not the raw input, so that
/// visually identical passwords verify regardless of input method.
///
/// Applies only when a credential is (re)set. Verification paths accept
/// whatever was stored.
pub fn validate_new_password(raw: &str) -> Result<String, PasswordPolicyError> {
    let normalized: String = raw.nfkc().collect();

    if normalized.trim().is_empty() {
        return Err(PasswordPolicyError::EmptyOrWhitespace);
    }

    // Count Unicode code points, not bytes
    let char_count = normalized.chars().count();

    if char_count < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual: char_count,
        });
    }

    if char_count > MAX_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooLong {
            max: MAX_PASSWORD_LENGTH,
            actual: char_count,
        });
    }

    for ch in normalized.chars() {
        if ch.is_control() && ch != ' ' && ch != '\t' {
            return Err(PasswordPolicyError::InvalidCharacter);
        }
    }

    Ok(normalized)
}

// ============================================================================
// Hashing / Verification
// ============================================================================

/// Check whether a stored credential is in the structured hashed form
pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with("pbkdf2$")
}

/// Hash a password into the stored form.
///
/// A new random salt is drawn on every call, so hashing the same password
/// twice produces different stored forms.
pub fn hash_password(password: &str) -> String {
    let salt = random_bytes(SALT_LEN);
    let mut derived = derive_key(password, &salt, PBKDF2_ITERATIONS);
    let stored = format!(
        "{PBKDF2_PREFIX}${PBKDF2_ITERATIONS}${}${}",
        to_base64(&salt),
        to_base64(&derived)
    );
    derived.zeroize();
    stored
}

/// Verify a password against a stored credential.
///
/// Returns `false` for any malformed stored form (wrong part count, bad
/// base64, unparseable or zero iteration count). A missing/empty stored
/// credential never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.is_empty() {
        return false;
    }

    if !is_hashed(stored) {
        // Legacy plaintext row. Callers migrate these on successful login.
        return constant_time_eq(password.as_bytes(), stored.as_bytes());
    }

    let parts: Vec<&str> = stored.split('$').collect();
    if parts.len() != 4 {
        return false;
    }

    let Ok(iterations) = parts[1].parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let Ok(salt) = from_base64(parts[2]) else {
        return false;
    };
    let Ok(expected) = from_base64(parts[3]) else {
        return false;
    };

    let mut derived = derive_key(password, &salt, iterations);
    let matched = constant_time_eq(&expected, &derived);
    derived.zeroize();
    matched
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse battery");
        assert!(is_hashed(&stored));
        assert!(verify_password("correct horse battery", &stored));
        assert!(!verify_password("incorrect horse battery", &stored));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("same-password");
        let b = hash_password("same-password");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn test_stored_form_shape() {
        let stored = hash_password("pw-shape");
        let parts: Vec<&str> = stored.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pbkdf2");
        assert_eq!(parts[1], "210000");
    }

    #[test]
    fn test_legacy_plaintext_verify() {
        // Pre-hashing rows hold the bare password
        assert!(verify_password("secret", "secret"));
        assert!(!verify_password("secret", "other"));
        assert!(!is_hashed("secret"));
    }

    #[test]
    fn test_empty_stored_never_verifies() {
        assert!(!verify_password("", ""));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_malformed_stored_forms() {
        assert!(!verify_password("pw", "pbkdf2$210000$only-three-parts"));
        assert!(!verify_password("pw", "pbkdf2$notanumber$c2FsdA==$aGFzaA=="));
        assert!(!verify_password("pw", "pbkdf2$0$c2FsdA==$aGFzaA=="));
        assert!(!verify_password("pw", "pbkdf2$210000$!!bad!!$aGFzaA=="));
        assert!(!verify_password("pw", "pbkdf2$210000$c2FsdA==$!!bad!!"));
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("0000").is_ok());
        assert!(matches!(
            validate_new_password("abc"),
            Err(PasswordPolicyError::TooShort { .. })
        ));
        assert!(matches!(
            validate_new_password(&"a".repeat(MAX_PASSWORD_LENGTH + 1)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
        assert!(matches!(
            validate_new_password("    "),
            Err(PasswordPolicyError::EmptyOrWhitespace)
        ));
        assert!(matches!(
            validate_new_password("pass\u{0007}word"),
            Err(PasswordPolicyError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_validate_normalizes_unicode() {
        // Fullwidth digits normalize to ASCII under NFKC
        let normalized = validate_new_password("１２３４").unwrap();
        assert_eq!(normalized, "1234");
    }

}
