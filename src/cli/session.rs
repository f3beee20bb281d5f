use crate::error::RagchatError;
use crate::types::RegisterRequest;

use super::context::{read_secret, CliContext};
use super::output::{print_message, print_session_status, print_user};

pub async fn run_login(
    ctx: &CliContext,
    username: &str,
    password: Option<&str>,
) -> Result<(), RagchatError> {
    let password = match password {
        Some(p) => p.to_string(),
        None => read_secret("Password: ")?,
    };
    ctx.client.login(username, &password).await?;
    let user = ctx.client.me().await?;
    print_user(&user, ctx.mode, ctx.is_tty);
    Ok(())
}

pub async fn run_register(
    ctx: &CliContext,
    username: &str,
    email: &str,
    password: Option<&str>,
) -> Result<(), RagchatError> {
    let (password, password2) = match password {
        Some(p) => (p.to_string(), p.to_string()),
        None => (read_secret("Password: ")?, read_secret("Confirm password: ")?),
    };
    let registered = ctx
        .client
        .register(&RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password,
            password2,
        })
        .await?;
    print_message(
        &format!(
            "Registered '{}'. Run: ragchat login {}",
            registered.username, registered.username
        ),
        ctx.mode,
    );
    Ok(())
}

pub async fn run_whoami(ctx: &CliContext) -> Result<(), RagchatError> {
    let user = ctx.client.me().await?;
    print_user(&user, ctx.mode, ctx.is_tty);
    Ok(())
}

pub fn run_logout(ctx: &CliContext) -> Result<(), RagchatError> {
    ctx.client.logout()?;
    print_message("Logged out", ctx.mode);
    Ok(())
}

pub fn run_status(ctx: &CliContext) -> Result<(), RagchatError> {
    let status = ctx.client.session_status();
    print_session_status(&status, ctx.mode, ctx.is_tty);
    Ok(())
}
