//! # mb-auth-argon2
//!
//! Argon2-based implementation of `CredentialVerifier`.
//! Delete passwords are stored as salted PHC strings and checked with a
//! constant-time verify. Hashing is CPU-bound, so it runs on the blocking pool.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use mb_core::traits::CredentialVerifier;

#[derive(Clone)]
pub struct Argon2Credentials {
    argon2: Argon2<'static>,
}

impl Argon2Credentials {
    /// Argon2id with explicit cost parameters (memory in KiB).
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> anyhow::Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

#[async_trait]
impl CredentialVerifier for Argon2Credentials {
    async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow!("password hashing failed: {e}"))
        })
        .await?
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();

        let verified = tokio::task::spawn_blocking(move || {
            let parsed_hash = match PasswordHash::new(&hash) {
                Ok(p) => p,
                Err(_) => return false,
            };
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .await?;

        Ok(verified)
    }
}
