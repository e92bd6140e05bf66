//! Login, logout and session inspection.

use std::io::Write;

use feedme_core::Email;
use secrecy::SecretString;

use super::{CommandError, Context, out};

/// Log in with email and password.
///
/// # Errors
///
/// Returns `CommandError` for an invalid email or rejected credentials.
pub async fn login(ctx: &Context, email: &str, password: String) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let password = SecretString::from(password);

    let session = ctx.client.login(&email, &password).await?;
    tracing::info!(
        user_id = %session.user.id,
        role = %session.user.role,
        "Logged in"
    );

    let mut out = out();
    writeln!(
        out,
        "Logged in as {} ({})",
        display_name(&session.user),
        session.user.role
    )?;
    Ok(())
}

/// Clear the stored session.
///
/// # Errors
///
/// Returns `CommandError` if the session file could not be removed.
pub async fn logout(ctx: &Context) -> Result<(), CommandError> {
    ctx.client.logout().await?;
    writeln!(out(), "Logged out")?;
    Ok(())
}

/// Print the logged-in user.
///
/// # Errors
///
/// Returns `CommandError::Auth` when no usable session exists.
pub fn whoami(ctx: &Context) -> Result<(), CommandError> {
    let auth = ctx.client.session().require_auth()?;
    let user = ctx.client.session().current().map(|s| s.user);

    let mut out = out();
    writeln!(out, "User:  {}", auth.user_id)?;
    if let Some(user) = &user {
        writeln!(out, "Name:  {}", display_name(user))?;
    }
    writeln!(out, "Role:  {}", auth.role)?;
    writeln!(out, "Token: {}", auth.token.preview())?;
    Ok(())
}

fn display_name(user: &feedme_core::User) -> &str {
    if user.name.is_empty() {
        &user.email
    } else {
        &user.name
    }
}
