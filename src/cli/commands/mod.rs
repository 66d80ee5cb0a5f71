pub mod cache;
pub mod credential;
pub mod logging;
pub mod login;
pub mod rate_limit;
pub mod session;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_SERVER: &str = "server";
pub const CMD_HASH: &str = "hash";
pub const CMD_LOGIN: &str = "login";

pub const ARG_TRUSTED_PROXY_HOPS: &str = "trusted-proxy-hops";

pub const ARG_HASH_PASSWORD: &str = "password";
pub const ARG_HASH_SALT: &str = "salt";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("folio")
        .about("Portfolio admin authentication")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(server_command())
        .subcommand(hash_command())
        .subcommand(login::with_args(
            Command::new(CMD_LOGIN).about("Log in to a running server and print the session token"),
        ));

    logging::with_args(command)
}

fn server_command() -> Command {
    let command = Command::new(CMD_SERVER)
        .about("Run the HTTP service")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("FOLIO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL allowed by CORS; https also marks cookies Secure")
                .env("FOLIO_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_TRUSTED_PROXY_HOPS)
                .long(ARG_TRUSTED_PROXY_HOPS)
                .help("Reverse proxies in front of the server; their X-Forwarded-For entries key the rate limiter (0 uses the peer address)")
                .env("FOLIO_TRUSTED_PROXY_HOPS")
                .default_value("0")
                .value_parser(clap::value_parser!(usize)),
        );

    let command = credential::with_args(command);
    let command = session::with_args(command);
    let command = rate_limit::with_args(command);
    cache::with_args(command)
}

fn hash_command() -> Command {
    let command = Command::new(CMD_HASH)
        .about("Derive the admin password hash offline and print it as environment assignments")
        .arg(
            Arg::new(ARG_HASH_PASSWORD)
                .long(ARG_HASH_PASSWORD)
                .help("Plaintext admin password")
                .env("FOLIO_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_HASH_SALT)
                .long(ARG_HASH_SALT)
                .help("Salt to use (default: 16 random bytes, hex encoded)"),
        );
    credential::with_kdf_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_ENV: [(&str, Option<&str>); 4] = [
        ("FOLIO_ADMIN_PASSWORD_HASH", Some("00")),
        ("FOLIO_ADMIN_PASSWORD_SALT", Some("salt")),
        ("FOLIO_CACHE_URL", Some("memory://")),
        ("FOLIO_PORT", Some("443")),
    ];

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "folio");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Portfolio admin authentication".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
        let subcommands: Vec<&str> = command.get_subcommands().map(Command::get_name).collect();
        assert_eq!(subcommands, vec![CMD_SERVER, CMD_HASH, CMD_LOGIN]);
    }

    #[test]
    fn test_subcommand_required() {
        let result = new().try_get_matches_from(vec!["folio"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_env() {
        temp_env::with_vars(SERVER_ENV, || {
            let matches = new().get_matches_from(vec!["folio", "server"]);
            let server = matches.subcommand_matches(CMD_SERVER);
            assert_eq!(
                server.and_then(|m| m.get_one::<u16>("port").copied()),
                Some(443)
            );
            assert_eq!(
                server.and_then(|m| m.get_one::<String>(cache::ARG_CACHE_URL).cloned()),
                Some("memory://".to_string())
            );
        });
    }

    #[test]
    fn test_server_missing_cache_url() {
        temp_env::with_vars(
            [
                ("FOLIO_ADMIN_PASSWORD_HASH", Some("00")),
                ("FOLIO_ADMIN_PASSWORD_SALT", Some("salt")),
                ("FOLIO_CACHE_URL", None),
            ],
            || {
                let result = new().try_get_matches_from(vec!["folio", "server"]);
                assert_eq!(
                    result.map_err(|e| e.kind()).err(),
                    Some(clap::error::ErrorKind::MissingRequiredArgument)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [("FOLIO_LOG_LEVEL", Some(level)), ("FOLIO_ADMIN_PASSWORD", Some("pw"))],
                || {
                    let matches = new().get_matches_from(vec!["folio", "hash"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("FOLIO_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "folio".to_string(),
                    "hash".to_string(),
                    "--password".to_string(),
                    "pw".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
