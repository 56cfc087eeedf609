use anyhow::{Context, Result};
use toml_edit::{value, DocumentMut};
use tvguide_etl::config::{self, KEYS};
use tvguide_etl::{Config, SourceKind};

/// Keys stored as TOML integers rather than strings.
const INTEGER_KEYS: &[&str] = &[
    "erw_timeout_secs",
    "tvmao_timeout_secs",
    "requests_per_second",
    "max_retries",
];

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    println!(
        "File exists: {}\n",
        if config_path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    for key in KEYS {
        if let Some(v) = config.value_of(key) {
            println!("  {key}: {v}");
        }
    }

    println!("\nPriority: CLI args > ENV vars (TVG_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value.
pub fn get_config(key: Option<String>) -> Result<()> {
    let Some(key) = key else {
        // No key provided, show entire config file contents
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{contents}");
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'tvguide config init' to create it.");
        }
        return Ok(());
    };

    let config = Config::load()?;
    match config.value_of(&key) {
        Some(v) => println!("{v}"),
        None => anyhow::bail!(
            "Unknown config key: {}\n\nValid keys: {}",
            key,
            KEYS.join(", ")
        ),
    }

    Ok(())
}

/// Set `key` to `raw` inside a config document, preserving comments and
/// the layout of every other line.
pub fn apply_setting(contents: &str, key: &str, raw: &str) -> Result<String> {
    if !KEYS.contains(&key) {
        anyhow::bail!(
            "Unknown config key: {}\n\nValid keys: {}",
            key,
            KEYS.join(", ")
        );
    }

    let mut doc = contents
        .parse::<DocumentMut>()
        .context("Config file is not valid TOML")?;

    if INTEGER_KEYS.contains(&key) {
        let n: i64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{key} expects a whole number, got {raw:?}"))?;
        if n < 0 {
            anyhow::bail!("{key} cannot be negative");
        }
        doc[key] = value(n);
    } else if key == "source" {
        let kind: SourceKind = raw.parse()?;
        doc[key] = value(kind.as_str());
    } else {
        doc[key] = value(raw);
    }

    Ok(doc.to_string())
}

/// Set a config value.
pub fn set_config(key: String, raw: String) -> Result<()> {
    let config_path = config::config_file_path();

    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = apply_setting(&contents, &key, &raw)?;

    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure tvguide.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
