//! Generates the key pair an Okta service app uses to authenticate Plaid.
//!
//! Paste `{key_name}_public.json` into the Okta admin console when registering
//! the app, and the PEM into Plaid's `[apis.okta.authentication]` config.

use std::fs;

use crate::keygen::error::KeygenError;
use crate::keygen::{options, Outcome};

mod common;
mod keygen;

fn main() -> Result<(), KeygenError> {
    common::init_logger();

    let options: options::KeygenOptions = options::parse_options();

    common::print_banner("JWKS keygen");

    match keygen::generate_key_files(&options.out_dir, &options.key_spec())? {
        Outcome::Created(files) => {
            println!("Public JWK:  {}", files.public_jwk.display());
            println!("Private JWK: {}", files.private_jwk.display());
            println!("Private PEM: {}", files.private_pem.display());
            if options.print_config {
                let pem = fs::read_to_string(&files.private_pem)
                    .map_err(|e| KeygenError::io(&files.private_pem, e))?;
                println!("\n{}", keygen::okta_config_snippet(&pem));
            }
            println!("{}", keygen::MSG_KEYS_CREATED);
        }
        Outcome::AlreadyExists(_) => {
            println!("{}", keygen::MSG_REMOVE_EXISTING);
        }
    }

    Ok(())
}
