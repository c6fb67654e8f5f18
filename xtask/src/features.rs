use std::process::Command;

use anyhow::{Context, Result};

/// `koshflow-common` tiers, each checked without default features.
const FEATURE_COMBINATIONS: &[&[&str]] = &[
    &[], // no tiers
    &["foundation"],
    &["observability"],
    &["runtime"],
    &["platform"],
    &["test-utils"],
    &["foundation", "observability"],
    &["platform", "observability"],
];

/// Check that every tier of `koshflow-common` compiles on its own.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} koshflow-common feature combinations...", FEATURE_COMBINATIONS.len());

    for (index, features) in FEATURE_COMBINATIONS.iter().enumerate() {
        let joined = features.join(",");
        let display_label = if features.is_empty() { "none".to_string() } else { joined.clone() };

        println!(
            "\n[{}/{}] cargo check -p koshflow-common --no-default-features{}",
            index + 1,
            FEATURE_COMBINATIONS.len(),
            if features.is_empty() { String::new() } else { format!(" --features {joined}") }
        );

        let mut command = Command::new("cargo");
        command.args(["check", "-p", "koshflow-common", "--no-default-features", "--all-targets"]);
        if !features.is_empty() {
            command.arg("--features").arg(&joined);
        }

        let status = command
            .status()
            .with_context(|| format!("Failed to run cargo check for '{display_label}'"))?;

        if !status.success() {
            anyhow::bail!("Feature combination '{display_label}' failed to compile");
        }

        println!("✅ Features '{display_label}' compiled successfully");
    }

    println!("\n✅ All {} feature combinations compile successfully!", FEATURE_COMBINATIONS.len());

    Ok(())
}
