//! Handlers for `vitrine config {path,get,set,init,export}`.

use std::path::PathBuf;

use vitrine_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::VitrineConfig;

/// Handle a config subcommand.
///
/// Takes the raw `--config` path because `path` and `init` must work
/// before any config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => show_path(config_path),
        ConfigAction::Get { key } => {
            println!("{}", read_key(config_path, &key)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let path = write_key(config_path, &key, &value)?;
            println!("Set {key} = {value} in {}", path.display());
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            let path = init_file(file.as_deref(), force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
        ConfigAction::Export { docker_env } => {
            let config = VitrineConfig::load(config_path)?;
            for line in export_lines(&config, docker_env)? {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn show_path(config_path: Option<&str>) -> Result<()> {
    let path = VitrineConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(not created yet; run `vitrine config init`)");
    }
    Ok(())
}

/// Resolved value of a dotted key, formatted for stdout.
fn read_key(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = VitrineConfig::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Write a dotted key into the existing config file and return its path.
fn write_key(config_path: Option<&str>, key: &str, value: &str) -> Result<PathBuf> {
    let path = VitrineConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `vitrine config init` first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
    set_nested_value(&mut doc, key, parse_value(value))?;

    let rendered = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(&path, rendered).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// Write the default config and return its path.
fn init_file(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => VitrineConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let rendered = VitrineConfig::default().to_toml_string()?;
    std::fs::write(&path, rendered).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

fn export_lines(config: &VitrineConfig, docker_env: bool) -> Result<Vec<String>> {
    Ok(config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| {
            if docker_env {
                format!("--env {key}={value}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect())
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Parse a CLI string into a TOML value: bool, then integer, then float, then string.
fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => s
            .parse::<i64>()
            .map(toml::Value::Integer)
            .or_else(|_| s.parse::<f64>().map(toml::Value::Float))
            .unwrap_or_else(|_| toml::Value::String(s.to_string())),
    }
}

fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, VitrineConfig::default().to_toml_string().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_read_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = default_file(&dir);
        let path = path.to_str().unwrap();

        assert_eq!(read_key(Some(path), "project_name").unwrap(), "vitrine");
        assert_eq!(read_key(Some(path), "search.default_limit").unwrap(), "8");
        assert_eq!(
            read_key(Some(path), "embedding.api_key_env").unwrap(),
            "OPENAI_API_KEY"
        );
    }

    #[test]
    fn test_read_missing_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = default_file(&dir);

        let err = read_key(Some(path.to_str().unwrap()), "store.nope").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_write_key_round_trips_through_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = default_file(&dir);
        let path_str = path.to_str().unwrap();

        write_key(Some(path_str), "search.default_limit", "12").unwrap();
        write_key(Some(path_str), "store.unique_url", "false").unwrap();

        let config = VitrineConfig::load(Some(path_str)).unwrap();
        assert_eq!(config.search.default_limit, 12);
        assert!(!config.store.unique_url);
    }

    #[test]
    fn test_write_key_missing_file() {
        let err = write_key(Some("/nonexistent/config.toml"), "project_name", "x").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_init_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vitrine").join("config.toml");
        let path_str = path.to_str().unwrap();

        assert_eq!(init_file(Some(path_str), false).unwrap(), path);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[embedding]"));
        assert!(content.contains("[store]"));

        let err = init_file(Some(path_str), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(init_file(Some(path_str), true).is_ok());
    }

    #[test]
    fn test_export_lines() {
        let config = VitrineConfig::default();
        let plain = export_lines(&config, false).unwrap();
        assert!(plain.contains(&"VITRINE_SEARCH_DEFAULT_LIMIT=8".to_string()));

        let docker = export_lines(&config, true).unwrap();
        assert!(docker.iter().all(|l| l.starts_with("--env VITRINE_")));
    }

    #[test]
    fn test_nested_value_helpers() {
        let mut val = toml::Value::Table(toml::map::Map::new());
        set_nested_value(&mut val, "store.path", toml::Value::String("/tmp/v".into())).unwrap();
        assert_eq!(
            get_nested_value(&val, "store.path"),
            Some(&toml::Value::String("/tmp/v".into()))
        );

        set_nested_value(&mut val, "store.path", toml::Value::String("/srv".into())).unwrap();
        assert_eq!(
            get_nested_value(&val, "store.path"),
            Some(&toml::Value::String("/srv".into()))
        );
        assert!(get_nested_value(&val, "store.unique_url").is_none());
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut val: toml::Value = toml::from_str("project_name = \"v\"").unwrap();
        assert!(set_nested_value(&mut val, "project_name.inner", toml::Value::Integer(1)).is_err());
        assert!(set_nested_value(&mut val, "store.", toml::Value::Integer(1)).is_err());
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!(parse_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_value("12"), toml::Value::Integer(12));
        assert_eq!(parse_value("0.5"), toml::Value::Float(0.5));
        assert_eq!(
            parse_value("text-embedding-3-large"),
            toml::Value::String("text-embedding-3-large".to_string())
        );
    }

    #[test]
    fn test_format_toml_value() {
        assert_eq!(format_toml_value(&toml::Value::String("x".into())), "x");
        assert_eq!(format_toml_value(&toml::Value::Integer(8)), "8");
        assert_eq!(format_toml_value(&toml::Value::Boolean(false)), "false");
    }
}
