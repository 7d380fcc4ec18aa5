use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

/// Outcome of a password check against an account's stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Match,
    Mismatch,
    /// Google-only account: there is no local hash to compare against.
    NoLocalPassword,
}

/// Argon2id PHC string for a new or changed account password.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "account password hashing failed");
            anyhow::anyhow!("password hashing failed: {e}")
        })
}

/// A stored hash that does not parse is an error, not a mismatch.
pub fn check_account_password(stored: Option<&str>, plain: &str) -> anyhow::Result<PasswordCheck> {
    let Some(stored) = stored else {
        return Ok(PasswordCheck::NoLocalPassword);
    };
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored account password hash is malformed");
        anyhow::anyhow!("malformed password hash: {e}")
    })?;
    Ok(
        match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => PasswordCheck::Match,
            Err(_) => PasswordCheck::Mismatch,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_matches_only_its_password() {
        let hash = hash_password("squat-rack-42").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_eq!(
            check_account_password(Some(&hash), "squat-rack-42").unwrap(),
            PasswordCheck::Match
        );
        assert_eq!(
            check_account_password(Some(&hash), "benchpress").unwrap(),
            PasswordCheck::Mismatch
        );
    }

    #[test]
    fn google_only_account_has_no_local_password() {
        assert_eq!(
            check_account_password(None, "anything").unwrap(),
            PasswordCheck::NoLocalPassword
        );
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(check_account_password(Some("not-a-valid-hash"), "anything").is_err());
    }
}
