//! Password hashing and opaque email verification tokens.

use anyhow::{bail, Result};

use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use std::str::FromStr;

/// Opaque single-purpose token mailed to a user to confirm their address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct VerificationTokenValue(pub String);

impl VerificationTokenValue {
    pub fn generate() -> VerificationTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        VerificationTokenValue(random_string)
    }
}

mod waxlog_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

#[cfg(feature = "test-fast-hasher")]
mod fast_sha256 {
    use sha2::{Digest, Sha256};

    pub fn hash(plain: &[u8], salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(plain);
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub enum WaxlogHasher {
    Argon2,
    #[cfg(feature = "test-fast-hasher")]
    FastSha256,
}

impl WaxlogHasher {
    /// The hasher applied to newly registered accounts.
    pub fn default_hasher() -> WaxlogHasher {
        #[cfg(feature = "test-fast-hasher")]
        return WaxlogHasher::FastSha256;
        #[cfg(not(feature = "test-fast-hasher"))]
        WaxlogHasher::Argon2
    }
}

impl FromStr for WaxlogHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(WaxlogHasher::Argon2),
            #[cfg(feature = "test-fast-hasher")]
            "fast-sha256" => Ok(WaxlogHasher::FastSha256),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl std::fmt::Display for WaxlogHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaxlogHasher::Argon2 => write!(f, "argon2"),
            #[cfg(feature = "test-fast-hasher")]
            WaxlogHasher::FastSha256 => write!(f, "fast-sha256"),
        }
    }
}

impl WaxlogHasher {
    pub fn generate_b64_salt(&self) -> String {
        match self {
            WaxlogHasher::Argon2 => waxlog_argon2::generate_b64_salt(),
            #[cfg(feature = "test-fast-hasher")]
            WaxlogHasher::FastSha256 => waxlog_argon2::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            WaxlogHasher::Argon2 => waxlog_argon2::hash(plain, b64_salt),
            #[cfg(feature = "test-fast-hasher")]
            WaxlogHasher::FastSha256 => Ok(fast_sha256::hash(plain, b64_salt.as_ref())),
        }
    }

    pub fn verify<T: AsRef<str>>(&self, plain_pw: T, target_hash: T, _salt: T) -> Result<bool> {
        match self {
            WaxlogHasher::Argon2 => {
                waxlog_argon2::verify(plain_pw.as_ref().as_bytes(), target_hash)
            }
            #[cfg(feature = "test-fast-hasher")]
            WaxlogHasher::FastSha256 => Ok(fast_sha256::hash(
                plain_pw.as_ref().as_bytes(),
                _salt.as_ref(),
            ) == target_hash.as_ref()),
        }
    }
}
