use crate::auth::{credential::provision, kdf::KdfParams};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub password: SecretString,
    pub salt: Option<String>,
    pub params: KdfParams,
}

/// Derive the reference hash and print it. Opens no sockets.
/// # Errors
/// Returns an error if the password is empty or the derivation task fails.
pub async fn execute(args: Args) -> Result<()> {
    if args.password.expose_secret().is_empty() {
        anyhow::bail!("Refusing to hash an empty password");
    }

    let Args {
        password,
        salt,
        params,
    } = args;
    let reference = tokio::task::spawn_blocking(move || {
        provision(password.expose_secret(), salt.as_deref(), &params)
    })
    .await
    .context("Password derivation task failed")?;

    println!("{}", render_env(reference.salt(), &reference.hash_hex(), &params));
    Ok(())
}

fn render_env(salt: &str, hash_hex: &str, params: &KdfParams) -> String {
    format!(
        "FOLIO_ADMIN_PASSWORD_SALT={salt}\nFOLIO_ADMIN_PASSWORD_HASH={hash_hex}\nFOLIO_KDF_ITERATIONS={}\nFOLIO_KDF_KEY_LENGTH={}\nFOLIO_KDF_DIGEST={}",
        params.iterations(),
        params.key_length(),
        params.digest(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_env_lists_every_assignment() {
        let rendered = render_env("abc", "def", &KdfParams::default());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "FOLIO_ADMIN_PASSWORD_SALT=abc",
                "FOLIO_ADMIN_PASSWORD_HASH=def",
                "FOLIO_KDF_ITERATIONS=100000",
                "FOLIO_KDF_KEY_LENGTH=64",
                "FOLIO_KDF_DIGEST=sha512",
            ]
        );
    }

    #[tokio::test]
    async fn empty_password_rejected() {
        let args = Args {
            password: SecretString::from(String::new()),
            salt: None,
            params: KdfParams::default(),
        };
        assert!(execute(args).await.is_err());
    }
}
