//! `relaycord onboard` — First-time setup.

use relaycord_config::AppConfig;
use std::path::PathBuf;

pub async fn run(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_path(config.as_deref());

    println!("Relaycord — First-Time Setup");
    println!("============================\n");

    if let Some(dir) = config_path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        } else {
            println!("  Config directory exists: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Add discord.bot_token (or set DISCORD_TOKEN)");
    println!("   2. Add anthropic.api_key (or set ANTHROPIC_API_KEY)");
    println!("   3. List user IDs allowed to DM the bot in dm_allowlist");
    println!("   4. Run: relaycord doctor\n");

    Ok(())
}
