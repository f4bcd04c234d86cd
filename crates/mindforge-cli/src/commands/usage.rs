//! `mindforge usage` - show remaining free generations.

use super::AppContext;
use anyhow::Result;
use mindforge_core::usage::GenerationKind;

pub fn run(ctx: &AppContext) -> Result<()> {
    if ctx.controller.is_authenticated() {
        let email = ctx.controller.email().unwrap_or_default();
        println!("Signed in as {email}: unlimited generations");
        return Ok(());
    }

    // Re-read the durable file so counts changed by another process show up.
    ctx.ledger.refresh();
    let normal = ctx.ledger.get_remaining(GenerationKind::Normal);
    let research = ctx.ledger.get_remaining(GenerationKind::Research);
    println!("Anonymous usage remaining:");
    println!("  normal    {normal} of {}", GenerationKind::Normal.anonymous_limit());
    println!("  research  {research} of {}", GenerationKind::Research.anonymous_limit());
    println!("Sign up for unlimited generations.");
    Ok(())
}
