//! One-way password hashing (Argon2id, random salt per hash, PHC strings)

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
        rand_core::OsRng,
    },
};

#[cfg(test)]
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::error::{AppError, AppResult};

/// Stand-in hash checked when no account matches, so unknown emails cost
/// the same as wrong passwords. Same parameters as `Params::default()`.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$b3JkZXItc3ZjLWR1bW15IQ$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    #[cfg(test)]
    verifications: Arc<AtomicUsize>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
            #[cfg(test)]
            verifications: Arc::default(),
        }
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `password` into a self-describing PHC string
    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    }

    /// `Ok(false)` on mismatch; `Err` only for an unreadable stored hash
    pub fn verify(&self, password: &str, stored_hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AppError::Internal(format!("invalid stored hash: {}", e)))?;
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::SeqCst);
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(format!("password verification failed: {}", e))),
        }
    }

    /// Full-cost verification against a hash no password matches
    pub fn verify_dummy(&self, password: &str) -> AppResult<bool> {
        self.verify(password, DUMMY_HASH)
    }

    #[cfg(test)]
    pub(crate) fn verification_count(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }
}
