//! Password value object.
//!
//! Hashing and verification of account passwords with Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Hash that never verifies. Checked against when an email is unknown so a
/// failed login costs the same whether or not the account exists.
const UNKNOWN_ACCOUNT_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0c2FsdA$S2VlcFRoZVRpbWluZ0NvbnN0YW50SGVyZQ";

/// Hashed account password.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a plain text password.
    ///
    /// # Errors
    /// Returns a validation error if the password is shorter than
    /// [`MIN_PASSWORD_LENGTH`].
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?
            .to_string();

        Ok(Self { hash })
    }

    /// Wrap a hash loaded from the accounts table.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Stand-in for an account that does not exist.
    pub fn unknown_account() -> Self {
        Self::from_hash(UNKNOWN_ACCOUNT_HASH)
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password. Malformed stored hashes never verify.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let password = Password::new("Diamond#2024").unwrap();

        assert!(password.verify("Diamond#2024"));
        assert!(!password.verify("diamond#2024"));
    }

    #[test]
    fn restored_hash_still_verifies() {
        let hash = Password::new("Solitaire88").unwrap().into_string();
        assert!(Password::from_hash(hash).verify("Solitaire88"));
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        let first = Password::new("SamePassword1").unwrap();
        let second = Password::new("SamePassword1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn too_short_is_rejected() {
        assert!(matches!(Password::new("short"), Err(AppError::Validation(_))));
        assert!(Password::new("12345678").is_ok());
    }

    #[test]
    fn unknown_account_never_verifies() {
        assert!(!Password::unknown_account().verify(""));
        assert!(!Password::unknown_account().verify("Diamond#2024"));
    }

    #[test]
    fn debug_hides_hash() {
        let password = Password::new("Diamond#2024").unwrap();
        assert!(!format!("{:?}", password).contains(password.as_str()));
    }
}
