//! API key commands.

use super::AppContext;
use anyhow::{anyhow, Result};
use mindforge_core::provider::Provider;
use std::str::FromStr;

pub async fn set(ctx: &AppContext, provider_name: &str, api_key: &str) -> Result<()> {
    let provider = Provider::from_str(provider_name).map_err(|_| {
        anyhow!("Unknown provider '{provider_name}' (expected google, openai, anthropic or cohere)")
    })?;

    let identity = ctx.controller.identity();
    ctx.vault.save(provider, api_key, &identity).await?;

    if identity.is_authenticated() {
        println!("API key for {provider} stored in your account");
    } else {
        println!("API key for {provider} stored locally (sign up to store it in an account)");
    }
    Ok(())
}

pub async fn list(ctx: &AppContext) -> Result<()> {
    let identity = ctx.controller.identity();

    for provider in Provider::all() {
        match ctx.vault.resolve(provider, &identity).await {
            Some(key) => println!("{provider:<10} {}", mask(&key)),
            None => println!("{provider:<10} (not set)"),
        }
    }
    Ok(())
}

/// Shows just enough of a key to recognize it.
fn mask(key: &str) -> String {
    let prefix: String = key.chars().take(5).collect();
    format!("{prefix}... ({} chars)", key.len())
}
