//! Request signing.

use crate::{Error, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Produces the `Authorization: Basic` credential for a serialized request body.
///
/// Called once per logical call; retries reuse the same signature.
/// Any `Fn(&str, &str, &[u8]) -> Result<String>` closure is a signer.
pub trait Signer: Send + Sync {
    fn sign(&self, public_key: &str, secret: &str, body: &[u8]) -> Result<String>;
}

impl<F> Signer for F
where
    F: Fn(&str, &str, &[u8]) -> Result<String> + Send + Sync,
{
    fn sign(&self, public_key: &str, secret: &str, body: &[u8]) -> Result<String> {
        self(public_key, secret, body)
    }
}

/// HMAC-SHA256 over the URL-safe base64 of the body, keyed by the secret.
///
/// The credential is `base64(public_key + ":" + hex(mac))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hmac256Signer;

impl Signer for Hmac256Signer {
    fn sign(&self, public_key: &str, secret: &str, body: &[u8]) -> Result<String> {
        let encoded_body = URL_SAFE_NO_PAD.encode(body);
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| Error::signing(e.to_string()))?;
        mac.update(encoded_body.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());
        Ok(STANDARD.encode(format!("{}:{}", public_key, digest)))
    }
}
