use anyhow::Context;
use clap::{Arg, ArgMatches, Command};

use crate::auth::{
    credential::CredentialReference,
    kdf::{DEFAULT_ITERATIONS, DEFAULT_KEY_LENGTH, Digest, KdfParams},
};

pub const ARG_ADMIN_PASSWORD_HASH: &str = "admin-password-hash";
pub const ARG_ADMIN_PASSWORD_SALT: &str = "admin-password-salt";
pub const ARG_KDF_ITERATIONS: &str = "kdf-iterations";
pub const ARG_KDF_KEY_LENGTH: &str = "kdf-key-length";
pub const ARG_KDF_DIGEST: &str = "kdf-digest";

#[derive(Debug)]
pub struct Options {
    pub reference: CredentialReference,
    pub params: KdfParams,
}

impl Options {
    /// Parse and validate the admin credential reference.
    ///
    /// # Errors
    /// Returns an error if the reference is missing, malformed or weaker than allowed.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let params = parse_kdf(matches)?;
        let reference = CredentialReference::from_hex(
            string_arg(matches, ARG_ADMIN_PASSWORD_HASH),
            string_arg(matches, ARG_ADMIN_PASSWORD_SALT),
            &params,
        )
        .context("invalid admin credential")?;
        Ok(Self { reference, params })
    }
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or_default()
}

/// # Errors
/// Returns an error if the KDF parameters are below the supported floor.
pub fn parse_kdf(matches: &ArgMatches) -> anyhow::Result<KdfParams> {
    let iterations = matches
        .get_one::<u32>(ARG_KDF_ITERATIONS)
        .copied()
        .unwrap_or(DEFAULT_ITERATIONS);
    let key_length = matches
        .get_one::<usize>(ARG_KDF_KEY_LENGTH)
        .copied()
        .unwrap_or(DEFAULT_KEY_LENGTH);
    let digest = match matches.get_one::<String>(ARG_KDF_DIGEST) {
        Some(value) => value.parse::<Digest>()?,
        None => Digest::default(),
    };
    Ok(KdfParams::new(iterations, key_length, digest)?)
}

/// Reference hash and salt, required by the server.
#[must_use]
pub fn with_args(command: Command) -> Command {
    with_kdf_args(
        command
            .arg(
                Arg::new(ARG_ADMIN_PASSWORD_HASH)
                    .long(ARG_ADMIN_PASSWORD_HASH)
                    .help("Hex-encoded PBKDF2 hash of the admin password (see `folio hash`)")
                    .env("FOLIO_ADMIN_PASSWORD_HASH")
                    .hide_env_values(true)
                    .required(true),
            )
            .arg(
                Arg::new(ARG_ADMIN_PASSWORD_SALT)
                    .long(ARG_ADMIN_PASSWORD_SALT)
                    .help("Salt used to derive the admin password hash")
                    .env("FOLIO_ADMIN_PASSWORD_SALT")
                    .hide_env_values(true)
                    .required(true),
            ),
    )
}

/// KDF parameters, shared by the server and the offline hash tool.
#[must_use]
pub fn with_kdf_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_KDF_ITERATIONS)
                .long(ARG_KDF_ITERATIONS)
                .help("PBKDF2 iterations (minimum 100000)")
                .env("FOLIO_KDF_ITERATIONS")
                .default_value("100000")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_KDF_KEY_LENGTH)
                .long(ARG_KDF_KEY_LENGTH)
                .help("PBKDF2 output length in bytes (minimum 64)")
                .env("FOLIO_KDF_KEY_LENGTH")
                .default_value("64")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_KDF_DIGEST)
                .long(ARG_KDF_DIGEST)
                .help("PBKDF2 HMAC digest: sha512 or sha384")
                .env("FOLIO_KDF_DIGEST")
                .default_value("sha512"),
        )
}
