use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

const SALT_LEN: usize = 16;

/// Fixed input hashed once at startup so logins for unknown usernames cost
/// the same as logins with a wrong password.
const DUMMY_PASSWORD: &[u8] = b"parlor-absent-account";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Entropy source failed: {0}")]
    Entropy(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Argon2id password hashing with a cost fixed for the life of the process.
pub struct CredentialManager {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialManager {
    pub fn new(params: Params) -> Result<Self, CredentialError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_PASSWORD)?;
        Ok(Self { argon2, dummy_hash })
    }

    /// Salted PHC-format hash. Only fails if the OS entropy source does.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        hash_with(&self.argon2, password.as_bytes())
    }

    /// Check a candidate against a stored hash. A hash that does not parse is
    /// a mismatch, not an error.
    pub fn verify(&self, hash: &str, candidate: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend one verification's worth of work and report a mismatch. Used when
    /// the account being logged into does not exist.
    pub fn verify_absent(&self, candidate: &str) -> bool {
        let _ = self.verify(&self.dummy_hash, candidate);
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &[u8]) -> Result<String, CredentialError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|e| CredentialError::Entropy(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::Hash(e.to_string()))?;

    let hash = argon2
        .hash_password(password, &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

#[cfg(test)]
pub(crate) fn test_manager() -> CredentialManager {
    // Minimum cost; production cost comes from config
    CredentialManager::new(Params::new(8, 1, 1, None).unwrap()).unwrap()
}
