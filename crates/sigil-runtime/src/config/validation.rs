//! Configuration validation utilities.

use regex::Regex;
use sigil_framework::PreconditionContainer;
use tracing_subscriber::filter::Directive;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ClientConfig, CommandConfig, LogOutput, LoggingConfig, SigilConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SigilConfig) -> ConfigResult<()> {
    validate_client_config(&config.client)?;
    validate_logging_config(&config.logging)?;
    for (name, command) in &config.commands {
        validate_command_config(name, command)?;
    }
    Ok(())
}

fn validate_client_config(client: &ClientConfig) -> ConfigResult<()> {
    if let Some(id) = &client.id
        && (id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(ConfigError::validation(format!(
            "Client ID must be a non-empty string of digits, got '{id}'"
        )));
    }

    if let Some(prefix) = &client.default_prefix
        && prefix.candidates().any(str::is_empty)
    {
        return Err(ConfigError::validation("Prefixes cannot be empty"));
    }

    if let Some(pattern) = &client.regex_prefix {
        Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPrefix {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
    }

    if client.lexer.quotes.iter().any(|(open, close)| open.is_empty() || close.is_empty()) {
        return Err(ConfigError::validation("Lexer quotes cannot be empty"));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    for (target, level) in &logging.filters {
        let directive = format!("{target}={level}");
        directive.parse::<Directive>().map_err(|e| {
            ConfigError::validation(format!("Invalid log filter '{directive}': {e}"))
        })?;
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "File log output requires 'file_path'",
        ));
    }

    Ok(())
}

fn validate_command_config(name: &str, command: &CommandConfig) -> ConfigResult<()> {
    if let Some(entries) = &command.preconditions {
        PreconditionContainer::from_entries(entries).map_err(|source| {
            ConfigError::InvalidPreconditions {
                command: name.to_string(),
                source,
            }
        })?;
    }
    Ok(())
}
