// 🔐 Password Hashing Service
// Argon2id with a random salt per hash, stored as a PHC string:
//   $argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>
// The algorithm id travels with every stored hash.

use crate::config::HashingConfig;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    #[error("invalid hashing parameters: {0}")]
    Params(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed")]
    Malformed,
}

/// One-way salted hashing + verification
pub struct PasswordService {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordService {
    pub fn new(config: HashingConfig) -> Result<Self, HashError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| HashError::Params(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        // Built up front so the first unknown-user login costs the same as any other
        let dummy_hash = hash_with(&argon2, "danbiz-dummy-password")?;

        Ok(PasswordService { argon2, dummy_hash })
    }

    /// Hash a plaintext password. Same input, different output on every call.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        hash_with(&self.argon2, plaintext)
    }

    /// Check a candidate against a stored hash.
    /// Ok(false) on mismatch, Err(Malformed) when the stored value is not a PHC string.
    pub fn try_verify(&self, stored: &str, candidate: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(stored).map_err(|_| HashError::Malformed)?;

        // Cost parameters are read from the stored hash, not from self.
        Ok(self
            .argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok())
    }

    /// Fail-closed verification: anything but a clean match is `false`
    pub fn verify(&self, stored: &str, candidate: &str) -> bool {
        match self.try_verify(stored, candidate) {
            Ok(matched) => matched,
            Err(err) => {
                tracing::warn!(error = %err, "rejecting login against unreadable password hash");
                false
            }
        }
    }

    /// Spend one verification's worth of work against a throwaway hash.
    /// Used when the username is unknown so both failure paths cost the same.
    pub fn verify_dummy(&self, candidate: &str) {
        let _ = self.try_verify(&self.dummy_hash, candidate);
    }
}

fn hash_with(argon2: &Argon2<'_>, plaintext: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| HashError::Hashing(e.to_string()))?
        .to_string();
    Ok(hash)
}
