//! Secret generation and digesting.
//!
//! Plaintext secrets live only in memory between generation and delivery,
//! wrapped in [`SecretString`] so accidental `Debug` formatting or logging
//! cannot leak them. Storage only ever sees the SHA-256 digest.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::purpose::Purpose;

const TOKEN_BYTES: usize = 32;
const OTP_MODULUS: u32 = 1_000_000;
// Largest multiple of OTP_MODULUS representable in u32; draws at or above
// this are rejected to keep the code distribution uniform.
const OTP_REJECT_ABOVE: u32 = u32::MAX - (u32::MAX % OTP_MODULUS);

/// Generate the secret shape a purpose calls for.
pub fn generate(purpose: Purpose) -> Result<SecretString> {
    match purpose {
        Purpose::PasswordReset => generate_token(),
        Purpose::OtpVerification => generate_otp(),
    }
}

/// 256-bit random value, hex encoded. Used for reset links where the value
/// is the sole bearer credential.
pub fn generate_token() -> Result<SecretString> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate reset token")?;
    Ok(SecretString::from(hex::encode(bytes)))
}

/// 6-digit decimal code. Lower entropy is acceptable because delivery goes
/// to a pre-verified channel and the window is short.
pub fn generate_otp() -> Result<SecretString> {
    loop {
        let mut bytes = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate one-time code")?;
        let draw = u32::from_be_bytes(bytes);
        if draw < OTP_REJECT_ABOVE {
            return Ok(SecretString::from(format!("{:06}", draw % OTP_MODULUS)));
        }
    }
}

/// SHA-256 of the plaintext; the only representation that reaches storage.
#[must_use]
pub fn digest(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

/// Digest helper for freshly generated secrets.
#[must_use]
pub fn digest_secret(secret: &SecretString) -> Vec<u8> {
    digest(secret.expose_secret())
}
