//! `glovis config`: inspect and edit the INI configuration.
//!
//! Keys are `section.key` names from [`ConfigKey`]. Values are validated
//! before anything is written; `reset` puts a key back to its built-in
//! default.

use std::fmt::Write as _;

use clap::Subcommand;
use glovis::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting (e.g. filter.max_cloud_cover)
    Get { key: String },

    /// Validate and store a setting (e.g. browser.sensor "Landsat 8 OLI")
    Set { key: String, value: String },

    /// Restore a setting to its default
    Reset { key: String },

    /// Show settings with their accepted values
    List {
        /// Only this section (browser, filter or logging)
        section: Option<String>,
    },

    /// Show where the configuration file lives
    Path,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = parse_key(&key)?;
            println!("{}", describe(key, &ConfigFile::load()?));
        }
        ConfigCommands::Set { key, value } => {
            let key = parse_key(&key)?;
            let mut config = ConfigFile::load()?;
            let change = apply(key, &mut config, Some(&value))?;
            config.save()?;
            println!("{}", change);
        }
        ConfigCommands::Reset { key } => {
            let key = parse_key(&key)?;
            let mut config = ConfigFile::load()?;
            let change = apply(key, &mut config, None)?;
            config.save()?;
            println!("{}", change);
        }
        ConfigCommands::List { section } => {
            print!("{}", render_list(&ConfigFile::load()?, section.as_deref())?);
        }
        ConfigCommands::Path => {
            let path = config_file_path();
            if path.exists() {
                println!("{}", path.display());
            } else {
                println!("{} (not created yet, defaults in use)", path.display());
            }
        }
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown key '{}'. Use 'glovis config list' to see available keys.",
            key
        ))
    })
}

fn shown(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn describe(key: ConfigKey, config: &ConfigFile) -> String {
    format!("{} = {}", key, shown(&key.get(config)))
}

/// Set `key` to `value`, or back to its default when `value` is `None`.
/// Returns a one-line summary of the change.
fn apply(
    key: ConfigKey,
    config: &mut ConfigFile,
    value: Option<&str>,
) -> Result<String, CliError> {
    let before = key.get(config);
    match value {
        Some(value) => key.set(config, value)?,
        None => key.reset(config),
    }
    let after = key.get(config);

    Ok(if before == after {
        format!("{} unchanged ({})", key, shown(&after))
    } else {
        format!("{}: {} -> {}", key, shown(&before), shown(&after))
    })
}

fn render_list(config: &ConfigFile, section: Option<&str>) -> Result<String, CliError> {
    let sections: Vec<&str> = match section {
        None => ConfigKey::SECTIONS.to_vec(),
        Some(name) => {
            let name = name.trim().to_lowercase();
            let found = ConfigKey::SECTIONS
                .iter()
                .copied()
                .find(|s| *s == name)
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "Unknown section '{}'. Expected one of: {}",
                        name,
                        ConfigKey::SECTIONS.join(", ")
                    ))
                })?;
            vec![found]
        }
    };

    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "[{}]", section);
        for key in ConfigKey::in_section(section) {
            let _ = writeln!(
                out,
                "  {:<18} {:<36} # {}",
                key.key_name(),
                shown(&key.get(config)),
                key.hint()
            );
        }
    }
    Ok(out)
}
