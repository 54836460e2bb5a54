use std::path::PathBuf;

use clap::Parser;

use crate::keygen::KeySpec;

/// Generates the RSA key pair Plaid uses to authenticate its Okta service app.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct KeygenOptions {
    /// The key identifier ("kid"). Also used as the file name prefix.
    #[clap(short, long, default_value = "plaid_service_app_keys")]
    pub key_name: String,

    /// The directory the key files are written to. It must not exist yet.
    #[clap(short, long, default_value = "keys")]
    pub out_dir: PathBuf,

    /// Size of the RSA modulus in bits
    #[clap(long, default_value = "4096")]
    pub bits: usize,

    /// The signing algorithm advertised in the "alg" member of the JWK.
    /// Older key sets used the non-standard "RSA256"; pass it here to reproduce them.
    #[clap(long, default_value = "RS256")]
    pub alg: String,

    /// Also print the Plaid config snippet with the PEM private key embedded
    #[clap(long)]
    pub print_config: bool,
}

impl KeygenOptions {
    pub fn key_spec(&self) -> KeySpec {
        KeySpec {
            key_name: self.key_name.clone(),
            bits: self.bits,
            alg: self.alg.clone(),
        }
    }
}

pub fn parse_options() -> KeygenOptions {
    Parser::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_okta_app_layout() {
        let options = KeygenOptions::try_parse_from(["jwks-keygen"]).unwrap();
        assert_eq!(options.key_name, "plaid_service_app_keys");
        assert_eq!(options.out_dir, PathBuf::from("keys"));
        assert_eq!(options.bits, 4096);
        assert_eq!(options.alg, "RS256");
        assert!(!options.print_config);
    }

    #[test]
    fn key_spec_follows_the_flags() {
        let options = KeygenOptions::try_parse_from([
            "jwks-keygen", "--key-name", "billing_app", "--bits", "2048", "--alg", "RS512",
        ])
        .unwrap();
        let spec = options.key_spec();
        assert_eq!(spec.key_name, "billing_app");
        assert_eq!(spec.bits, 2048);
        assert_eq!(spec.alg, "RS512");
    }
}
