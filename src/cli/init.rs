use super::config::{resolve_config_path, BallotConfig};

/// Write a default configuration file
///
/// Refuses to overwrite an existing file unless `force` is set.
pub async fn execute(
    administrator: String,
    question: String,
    config_path: Option<String>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if administrator.trim().is_empty() {
        return Err("--administrator must not be empty".into());
    }
    if question.trim().is_empty() {
        return Err("--question must not be empty".into());
    }

    let config_path = resolve_config_path(config_path);
    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists. Use --force to overwrite.",
            config_path.display()
        )
        .into());
    }

    BallotConfig::create_default(&config_path, administrator.trim(), question.trim())?;

    println!("📝 Created configuration: {}", config_path.display());
    println!("   Administrator: {}", administrator.trim());
    println!("   Question: {}", question.trim());

    Ok(())
}
