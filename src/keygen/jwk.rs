//! RSA keys as JSON Web Keys (RFC 7517, RFC 7518 section 6.3).

use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use serde::{Deserialize, Serialize};

use crate::keygen::error::KeygenError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub alg: String,
    pub n: String,
    pub e: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

impl Jwk {
    /// Builds the private JWK, carrying every CRT parameter.
    pub fn private(key: &RsaPrivateKey, kid: &str, key_use: &str, alg: &str) -> Result<Self, KeygenError> {
        let primes = key.primes();
        if primes.len() != 2 {
            return Err(KeygenError::UnsupportedPrimeCount(primes.len()));
        }
        let dp = key.dp().ok_or(KeygenError::MissingKeyComponent("dp"))?;
        let dq = key.dq().ok_or(KeygenError::MissingKeyComponent("dq"))?;
        let qi = key.crt_coefficient().ok_or(KeygenError::MissingKeyComponent("qi"))?;

        let mut jwk = Self::public(key, kid, key_use, alg);
        jwk.d = Some(encode_uint(key.d()));
        jwk.p = Some(encode_uint(&primes[0]));
        jwk.q = Some(encode_uint(&primes[1]));
        jwk.dp = Some(encode_uint(dp));
        jwk.dq = Some(encode_uint(dq));
        jwk.qi = Some(encode_uint(&qi));
        Ok(jwk)
    }

    pub fn public(key: &RsaPrivateKey, kid: &str, key_use: &str, alg: &str) -> Self {
        Self {
            kty: super::KEY_TYPE.to_string(),
            kid: kid.to_string(),
            key_use: key_use.to_string(),
            alg: alg.to_string(),
            n: encode_uint(key.n()),
            e: encode_uint(key.e()),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
        }
    }

    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    pub fn to_json(&self) -> Result<String, KeygenError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Base64url without padding over the minimal big-endian bytes.
fn encode_uint(value: &BigUint) -> String {
    base64::encode_config(value.to_bytes_be(), base64::URL_SAFE_NO_PAD)
}
