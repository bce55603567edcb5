use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::error;

/// Argon2id with costs taken from configuration. Cloned into blocking tasks.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, argon2::Error> {
        let params = Params::new(memory_kib, iterations, parallelism, None)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// PHC string with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// Verifies with the parameters recorded in `hashed`, so hashes made
    /// under older cost settings keep working.
    pub fn verify(&self, password: &str, hashed: &str) -> bool {
        match PasswordHash::new(hashed) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                error!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    /// Runs one hash at the configured costs and never matches. Used when
    /// no account exists, so that path costs as much as a wrong password.
    pub fn verify_missing(&self, password: &str) -> bool {
        let mut output = [0u8; 32];
        if let Err(e) = self
            .argon2()
            .hash_password_into(password.as_bytes(), DECOY_SALT, &mut output)
        {
            error!(error = %e, "Decoy hash failed");
        }
        false
    }
}

const DECOY_SALT: &[u8] = b"no-such-account!";

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let hashed = hasher.hash("s3cret").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(hasher.verify("s3cret", &hashed));
        assert!(!hasher.verify("wrong", &hashed));
    }

    #[test]
    fn salts_differ() {
        let hasher = hasher();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!hasher().verify("anything", "not-a-phc-string"));
    }

    #[test]
    fn verify_uses_costs_stored_in_the_hash() {
        let old = CredentialHasher::new(2048, 2, 1).unwrap().hash("pw").unwrap();
        assert!(hasher().verify("pw", &old));
    }

    #[test]
    fn missing_account_never_verifies() {
        let hasher = hasher();
        assert!(!hasher.verify_missing("s3cret"));
        assert!(!hasher.verify_missing(""));
    }

    #[test]
    fn invalid_costs_are_rejected() {
        assert!(CredentialHasher::new(1, 1, 1).is_err());
    }
}
