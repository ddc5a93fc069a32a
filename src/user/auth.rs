//! Password hashing.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[cfg(not(feature = "test-fast-hasher"))]
fn argon2() -> Result<Argon2<'static>> {
    Ok(Argon2::default())
}

/// Minimal cost parameters, only for test builds.
#[cfg(feature = "test-fast-hasher")]
fn argon2() -> Result<Argon2<'static>> {
    let params = argon2::Params::new(8, 1, 1, None).map_err(|err| anyhow!("{}", err))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hashes with a fresh random salt. The result is a PHC string carrying the
/// algorithm, its parameters and the salt.
pub fn hash_password<T: AsRef<str>>(plain: T) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2()?
        .hash_password(plain.as_ref().as_bytes(), &salt)
        .map_err(|err| anyhow!("{}", err))?
        .to_string();
    Ok(hash)
}

/// Verifies `plain` against a PHC hash string. Comparison is done by argon2.
pub fn verify_password(plain: &str, target_hash: &str) -> Result<bool> {
    let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
    Ok(argon2()?
        .verify_password(plain.as_bytes(), &password_hash)
        .is_ok())
}
