
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, DatabaseConfig, OllamaConfig, UpsertMode};
use crate::embeddings::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 File Vector Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure the Ollama instance used to embed file contents and queries.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Database Configuration").bold().yellow());
    eprintln!("Configure where file embeddings are stored.");
    eprintln!();

    let current_path = config.vector_database_path().display().to_string();
    configure_database(&mut config.database, &current_path)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before ingesting.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config: &Config) {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    eprintln!("  Protocol: {}", style(&config.ollama.protocol).cyan());
    eprintln!("  Host: {}", style(&config.ollama.host).cyan());
    eprintln!("  Port: {}", style(config.ollama.port).cyan());
    eprintln!("  Model: {}", style(&config.ollama.model).cyan());
    eprintln!("  Timeout: {}s", style(config.ollama.timeout_secs).cyan());
    match config.ollama_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Database Settings:").bold().yellow());
    eprintln!("  URI: {}", style(config.database_uri()).cyan());
    eprintln!("  Table: {}", style(&config.database.table_name).cyan());
    eprintln!("  Upsert mode: {}", style(config.database.upsert_mode).cyan());

    eprintln!();
    eprintln!("{}", style("Search Settings:").bold().yellow());
    eprintln!("  Result limit: {}", style(config.search.limit).cyan());

    eprintln!();
    eprintln!("Config file: {}", style(config.config_file_path().display()).dim());
}

fn load_existing_config(config_dir: &Path) -> Config {
    Config::load_file(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No usable configuration found. Using defaults.").yellow()
            );
            Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            }
        },
        |config| {
            if config.config_file_path().exists() {
                eprintln!("{}", style("Found existing configuration.").green());
            }
            config
        },
    )
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let timeout_secs: u64 = Input::new()
        .with_prompt("Request timeout in seconds")
        .default(ollama.timeout_secs)
        .validate_with(|input: &u64| -> Result<(), &str> {
            if (1..=600).contains(input) {
                Ok(())
            } else {
                Err("Timeout must be between 1 and 600 seconds")
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_model(model)?;
    ollama.set_timeout_secs(timeout_secs)?;

    Ok(())
}

fn configure_database(database: &mut DatabaseConfig, default_uri: &str) -> Result<()> {
    let uri: String = Input::new()
        .with_prompt("LanceDB URI")
        .default(
            database
                .uri
                .clone()
                .unwrap_or_else(|| default_uri.to_string()),
        )
        .interact_text()?;

    let table_name: String = Input::new()
        .with_prompt("Table name")
        .default(database.table_name.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            DatabaseConfig::default().set_table_name(input.clone())
        })
        .interact_text()?;

    let modes = &[UpsertMode::CheckThenWrite, UpsertMode::Merge];
    let labels = &[
        "check_then_write (single ingester)",
        "merge (safe for concurrent ingesters)",
    ];
    let default_index = modes
        .iter()
        .position(|&m| m == database.upsert_mode)
        .unwrap_or(0);

    let mode_index = Select::new()
        .with_prompt("Upsert mode")
        .default(default_index)
        .items(labels)
        .interact()?;

    database.uri = if uri == default_uri { None } else { Some(uri) };
    database.set_table_name(table_name)?;
    database.upsert_mode = modes[mode_index];

    Ok(())
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    OllamaClient::new(ollama)
        .map(|client| client.with_timeout(std::time::Duration::from_secs(5)))
        .and_then(|client| client.ping())
        .is_ok()
}
