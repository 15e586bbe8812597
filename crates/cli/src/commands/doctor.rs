//! `relaycord doctor` — Diagnose configuration.

use std::path::PathBuf;

pub async fn run(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Relaycord Doctor — Configuration Check");
    println!("=========================================\n");

    let mut issues = 0;
    let config_path = super::config_path(config.as_deref());

    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file — using defaults (run `relaycord onboard`)");
    }

    match super::load_config(config.as_deref()) {
        Ok(config) => {
            println!("  ✅ Config valid");

            if config.discord.bot_token.is_some() {
                println!("  ✅ Discord bot token configured");
            } else {
                println!("  ❌ No Discord bot token — set discord.bot_token or DISCORD_TOKEN");
                issues += 1;
            }

            if config.anthropic.api_key.is_some() {
                println!("  ✅ Anthropic API key configured");
            } else {
                println!("  ❌ No Anthropic API key — set anthropic.api_key or ANTHROPIC_API_KEY");
                issues += 1;
            }

            println!("  ✅ Model: {}", config.anthropic.model);

            if config.dm_allowlist.is_empty() {
                println!("  ⚠️  dm_allowlist is empty — direct messages will be ignored");
            } else {
                println!("  ✅ {} user(s) allowed in direct messages", config.dm_allowlist.len());
            }

            match config.cache.backend.as_str() {
                "file" => println!("  ✅ File cache at {}", config.cache_dir().display()),
                other => println!("  ✅ Cache backend: {other}"),
            }
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
