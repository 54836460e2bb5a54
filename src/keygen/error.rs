use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeygenError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("RSA key generation failed: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("PKCS#8 encoding failed: {0}")]
    Pkcs8(#[from] rsa::pkcs8::Error),

    #[error("JWK serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The generated key lacks a CRT parameter the private JWK needs.
    #[error("Generated key is missing the {0} component")]
    MissingKeyComponent(&'static str),

    #[error("Expected a two-prime RSA key, got {0} primes")]
    UnsupportedPrimeCount(usize),
}

impl KeygenError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        KeygenError::Io { path: path.into(), source }
    }
}
