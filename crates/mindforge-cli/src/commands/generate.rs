//! `mindforge generate` - submit text and print or save the diagram markup.

use super::AppContext;
use anyhow::{anyhow, Result};
use mindforge_application::GenerationOrchestrator;
use mindforge_core::provider::Provider;
use std::path::PathBuf;
use std::str::FromStr;

pub async fn run(
    ctx: &AppContext,
    text: &str,
    research: bool,
    provider_name: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    if text.trim().is_empty() {
        return Err(anyhow!("Nothing to generate: the input text is empty"));
    }

    let provider = Provider::from_str(provider_name).map_err(|_| {
        anyhow!("Unknown provider '{provider_name}' (expected google, openai, anthropic or cohere)")
    })?;

    let estimate = GenerationOrchestrator::estimate(text, research);
    if research {
        println!("Researching and generating your mind map (estimated ~{estimate}s)...");
    } else {
        println!("Generating your mind map (estimated ~{estimate}s)...");
    }

    match ctx.orchestrator.submit(text, research, provider).await {
        Ok(report) => {
            if report.used_personal_key {
                println!("Generated using your personal {} API key", report.outcome.provider_used);
            } else {
                println!("Generated using the default API ({})", report.outcome.provider_used);
            }

            if let Some(remaining) = report.remaining_after {
                let limit = if research { 2 } else { 5 };
                println!("{remaining} of {limit} free generations left");
            }

            match output {
                Some(path) => {
                    std::fs::write(&path, &report.outcome.diagram_markup)?;
                    println!("Diagram markup written to {}", path.display());
                }
                None => {
                    println!("\n{}", report.outcome.diagram_markup);
                }
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", failure.error);
            if let Some(hint) = failure.hint {
                eprintln!("Hint: {hint}");
            }
            Err(anyhow!("Generation failed"))
        }
    }
}
