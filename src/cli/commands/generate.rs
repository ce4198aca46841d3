//! Generation command handlers

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::models::STYLE_PRESETS;
use crate::state::SharedState;

async fn write_image(dir: &Path, prefix: &str, index: usize, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("{prefix}-{stamp}-{}.png", index + 1));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write image: {}", path.display()))?;
    Ok(path)
}

pub fn cmd_styles() -> anyhow::Result<()> {
    println!("Style Presets:");
    for preset in STYLE_PRESETS {
        println!("• {:<18} {}", preset.id, preset.name);
    }
    Ok(())
}

pub async fn cmd_generate(
    state: &SharedState,
    prompt: &str,
    count: u32,
    style: Option<&str>,
) -> anyhow::Result<()> {
    let account = state.sessions.require_account().await?;

    println!("Generating {count} image(s)...");
    let outcome = state
        .generation
        .generate(&account, prompt, count, style)
        .await?;

    let dir = Path::new(&state.config.general.output_dir);
    for (i, image) in outcome.images.iter().enumerate() {
        let path = write_image(dir, "division", i, image).await?;
        println!("✓ {}", path.display());
    }

    if let Some(note) = &outcome.partial_failure_note {
        println!();
        println!("⚠ {note}");
    }

    if !account.is_admin {
        println!();
        println!(
            "Spent {} credits, {} remaining.",
            outcome.credits_spent, outcome.balance
        );
    }
    Ok(())
}

pub async fn cmd_edit(state: &SharedState, image: &Path, prompt: &str) -> anyhow::Result<()> {
    let account = state.sessions.require_account().await?;

    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read image: {}", image.display()))?;
    let mime = mime_guess::from_path(image).first_or_octet_stream();

    println!("Editing {}...", image.display());
    let outcome = state
        .generation
        .edit(&account, prompt, &bytes, mime.essence_str())
        .await?;

    let dir = Path::new(&state.config.general.output_dir);
    let path = write_image(dir, "division-edited", 0, &outcome.image).await?;
    println!("✓ {}", path.display());

    if !account.is_admin {
        println!();
        println!(
            "Spent {} credits, {} remaining.",
            outcome.credits_spent, outcome.balance
        );
    }
    Ok(())
}
