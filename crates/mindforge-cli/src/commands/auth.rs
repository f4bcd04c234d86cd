//! Account commands: signup, login, logout, password reset.

use super::AppContext;
use anyhow::Result;

/// Persists the backend session token so later runs restore the session.
fn persist_session(ctx: &AppContext) {
    match ctx.backend.access_token() {
        Some(token) => {
            if let Err(e) = ctx.token_store.save(&token) {
                tracing::warn!(error = %e, "Failed to persist session token");
            }
        }
        None => ctx.token_store.clear(),
    }
}

pub async fn signup(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    let session = ctx.controller.sign_up(email, password).await?;
    persist_session(ctx);
    println!("Account created and signed in as {}", session.email);
    println!("Your free-tier usage has been transferred to the account.");
    Ok(())
}

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    let session = ctx.controller.sign_in(email, password).await?;
    persist_session(ctx);
    println!("Signed in as {}", session.email);
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.controller.sign_out();
    ctx.backend.clear_access_token();
    ctx.token_store.clear();
    println!("Signed out");
    Ok(())
}

pub async fn reset_password(ctx: &AppContext, email: &str) -> Result<()> {
    ctx.controller.request_password_reset(email).await?;
    println!("Password reset email requested for {email}");
    Ok(())
}
