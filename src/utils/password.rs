use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ErrorMessage;

/// Maximum allowed password length in characters
///
/// Argon2 is deliberately slow, so the input size is capped before hashing.
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Hash a password with Argon2id and a fresh random salt.
///
/// The result is a PHC string (`$argon2id$v=19$m=...$<salt>$<hash>`) that
/// carries its own salt and parameters; store it as-is.
pub fn hash(password: impl Into<String>) -> Result<String, ErrorMessage> {
    let password = password.into();

    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| ErrorMessage::HashingError)?
        .to_string();

    Ok(hashed_password)
}

/// Check a plain-text password against a stored PHC hash.
///
/// A mismatch is not an error: empty or oversized input, an unparsable hash,
/// and a wrong password all come back as `false`.
pub fn verify(password: &str, hashed_password: &str) -> bool {
    if password.is_empty() || password.chars().count() > MAX_PASSWORD_LENGTH {
        return false;
    }

    let parsed_hash = match PasswordHash::new(hashed_password) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Temporary password handed out when an admin creates a reporter account.
pub fn temporary_password() -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("Tmp@{}", &token[..8])
}
