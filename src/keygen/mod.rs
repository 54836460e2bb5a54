use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand_core::OsRng;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;

use crate::keygen::error::KeygenError;
use crate::keygen::jwk::Jwk;

pub mod error;
pub mod jwk;
pub mod options;

pub const KEY_TYPE: &str = "RSA";

pub const KEY_USE: &str = "sig";

pub const PRIVATE_KEY_MODE: u32 = 0o600;

pub const MSG_KEYS_CREATED: &str = "Keys created. Please move to secure storage and remove the keys directory.";

pub const MSG_REMOVE_EXISTING: &str = "Please remove existing keys directory - make sure you have the existing keys \
stored securely because this will generate new ones!";

#[derive(Debug, Clone)]
pub struct KeySpec {
    pub key_name: String,
    pub bits: usize,
    pub alg: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFiles {
    pub private_jwk: PathBuf,
    pub public_jwk: PathBuf,
    pub private_pem: PathBuf,
}

impl KeyFiles {
    pub fn new(out_dir: &Path, key_name: &str) -> Self {
        Self {
            private_jwk: out_dir.join(format!("{}_private.json", key_name)),
            public_jwk: out_dir.join(format!("{}_public.json", key_name)),
            private_pem: out_dir.join(format!("{}.pem", key_name)),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Created(KeyFiles),
    /// Nothing was generated because the directory was already there.
    AlreadyExists(PathBuf),
}

/// Creates `out_dir` and writes a freshly generated key pair into it.
///
/// Missing parent directories are created. `out_dir` itself never is reused:
/// `create_dir` doubles as the existence check, so two concurrent runs cannot
/// both end up writing key material.
pub fn generate_key_files(out_dir: &Path, spec: &KeySpec) -> Result<Outcome, KeygenError> {
    if let Some(parent) = out_dir.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| KeygenError::io(parent, e))?;
    }
    match fs::create_dir(out_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            log::warn!("{} already exists, not generating keys", out_dir.display());
            return Ok(Outcome::AlreadyExists(out_dir.to_path_buf()));
        }
        Err(e) => return Err(KeygenError::io(out_dir, e)),
    }

    log::info!("Generating {}-bit {} key '{}'", spec.bits, KEY_TYPE, spec.key_name);
    let key = RsaPrivateKey::new(&mut OsRng, spec.bits)?;

    let files = KeyFiles::new(out_dir, &spec.key_name);
    let private_jwk = Jwk::private(&key, &spec.key_name, KEY_USE, &spec.alg)?;
    let public_jwk = Jwk::public(&key, &spec.key_name, KEY_USE, &spec.alg);
    let pem = key.to_pkcs8_pem(LineEnding::LF)?;

    write_new_file(&files.private_jwk, private_jwk.to_json()?.as_bytes(), true)?;
    write_new_file(&files.public_jwk, public_jwk.to_json()?.as_bytes(), false)?;
    write_new_file(&files.private_pem, pem.as_bytes(), true)?;

    Ok(Outcome::Created(files))
}

fn write_new_file(path: &Path, contents: &[u8], private: bool) -> Result<(), KeygenError> {
    let mut open_options = OpenOptions::new();
    open_options.write(true).create_new(true);
    if private {
        restrict_to_owner(&mut open_options);
    }

    let mut file = open_options.open(path).map_err(|e| KeygenError::io(path, e))?;
    file.write_all(contents).map_err(|e| KeygenError::io(path, e))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(open_options: &mut OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    open_options.mode(PRIVATE_KEY_MODE);
}

#[cfg(not(unix))]
fn restrict_to_owner(_open_options: &mut OpenOptions) {}

/// The `[apis.okta.authentication]` block Plaid expects, with the PEM inlined.
pub fn okta_config_snippet(private_pem: &str) -> String {
    format!(
        "[apis.okta.authentication]\nclient_id = \"OKTA APP'S CLIENT ID\"\nprivate_key = \"\"\"\n{}\"\"\"\n",
        private_pem
    )
}
