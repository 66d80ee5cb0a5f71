use crate::cli::actions::{Action, hash, login, server};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
        Action::Hash(args) => hash::execute(args).await,
        Action::Login(args) => login::execute(args).await,
    }
}
