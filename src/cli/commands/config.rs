//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Run the config command.
///
/// `config_path` is the file given with `--config`, if any.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = apply_setting(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {} in {}", key, value, config_path.display()));
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor).arg(&config_path).status();

            match status {
                Ok(s) if s.success() => match Settings::load_from(Some(&config_path)) {
                    Ok(_) => Output::success("Config saved."),
                    Err(e) => Output::warning(&format!("Config saved but does not load: {}", e)),
                },
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `value`.
///
/// `value` is read as a TOML literal when possible (numbers, booleans,
/// arrays) and as a plain string otherwise.
fn apply_setting(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings).map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

    let (path, field) = key.rsplit_once('.').ok_or_else(|| anyhow!("Key must look like section.field"))?;

    let mut table = &mut root;
    for part in path.split('.') {
        table = table
            .get_mut(part)
            .ok_or_else(|| anyhow!("Unknown config section: {}", part))?;
    }
    let table = table
        .as_table_mut()
        .ok_or_else(|| anyhow!("{} is not a config section", path))?;

    if !table.contains_key(field) && field != "source_language" {
        return Err(anyhow!("Unknown config key: {}", key));
    }
    table.insert(field.to_string(), parse_value(value));

    let updated: Settings = root.try_into().map_err(|e| anyhow!("Invalid value for {}: {}", key, e))?;
    updated.sync.validate()?;
    Ok(updated)
}

fn parse_value(value: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {}", value))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationProvider;

    #[test]
    fn test_apply_number_and_string() {
        let settings = Settings::default();
        let updated = apply_setting(&settings, "sync.max_chars_per_line", "37").unwrap();
        assert_eq!(updated.sync.max_chars_per_line, 37);

        let updated = apply_setting(&updated, "translation.provider", "openai").unwrap();
        assert_eq!(updated.translation.provider, TranslationProvider::Openai);
        assert_eq!(updated.sync.max_chars_per_line, 37);
    }

    #[test]
    fn test_apply_array_and_optional() {
        let settings = Settings::default();
        let updated = apply_setting(&settings, "output.formats", r#"["srt", "ass"]"#).unwrap();
        assert_eq!(updated.output.formats, vec!["srt", "ass"]);

        let updated = apply_setting(&settings, "translation.source_language", "NB").unwrap();
        assert_eq!(updated.translation.source_language.as_deref(), Some("NB"));
    }

    #[test]
    fn test_apply_rejects_bad_keys_and_values() {
        let settings = Settings::default();
        assert!(apply_setting(&settings, "sync.no_such_key", "1").is_err());
        assert!(apply_setting(&settings, "nosection", "1").is_err());
        assert!(apply_setting(&settings, "sync.min_display_ms", "lots").is_err());
        // Violates min_display_ms <= max_display_ms.
        assert!(apply_setting(&settings, "sync.min_display_ms", "9000").is_err());
    }
}
