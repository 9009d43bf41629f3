//! Password verification and strength policy.

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?/~`";

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// If `pepper` is provided it is prepended to the password before
/// verification; it must match the pepper used during hashing.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_string(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Check a new password against the policy: at least `min_length`
/// characters, one uppercase letter, one digit and one special character.
///
/// Every missing character class is named in the error message.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), AuthError> {
    if password.chars().count() < min_length {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {min_length} characters long"
        )));
    }

    let mut missing = Vec::new();
    if !password.chars().any(char::is_uppercase) {
        missing.push("1 uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        missing.push("1 number");
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        missing.push("1 special character");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AuthError::WeakPassword(format!(
            "Password must contain: {}",
            missing.join(", ")
        )))
    }
}
