//! Operator account commands.
//!
//! # Usage
//!
//! ```bash
//! registry user create --username admin < password.txt
//! ```
//!
//! The password is read from the first line of stdin so it never appears in
//! the shell history or process list.

use std::io::BufRead;

use registry_server::services::auth::AuthService;

use super::{CommandError, connect};

/// Create a new operator account.
///
/// # Errors
///
/// Returns an error if the password cannot be read, is too short, or the
/// username is taken.
pub async fn create(username: &str) -> Result<(), CommandError> {
    let password = read_password(std::io::stdin().lock())?;
    let (_config, pool) = connect().await?;

    let user = AuthService::new(&pool)
        .create_user(username, &password)
        .await?;

    tracing::info!(
        "Operator created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );
    Ok(())
}

/// First line of `input` without its line ending.
fn read_password(mut input: impl BufRead) -> Result<String, CommandError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
