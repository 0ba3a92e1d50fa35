//! Per-workspace merged devcontainer configuration.
//!
//! Every workspace folder owns one slot, `<app_config_dir>/<sha256(folder)>/`,
//! holding a copy of its devcontainer config with the sibling `*.vim.json`
//! laid over it.

use crate::error::ConfigError;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const ADDITIONAL_CONFIG_EXTENSION: &str = "vim.json";

pub fn slot_name(workspace_folder: &str) -> String {
    format!("{:x}", Sha256::digest(workspace_folder.as_bytes()))
}

pub fn config_slot_dir(app_config_dir: &Path, workspace_folder: &str) -> PathBuf {
    app_config_dir.join(slot_name(workspace_folder))
}

/// `devcontainer.json` -> `devcontainer.vim.json`, next to it.
pub fn additional_config_path(config_file_path: &Path) -> PathBuf {
    config_file_path.with_extension(ADDITIONAL_CONFIG_EXTENSION)
}

/// Write the merged config for `workspace_folder` and return its path.
pub fn materialize(
    app_config_dir: &Path,
    workspace_folder: &str,
    config_file_path: &Path,
    additional_config_file_path: &Path,
) -> Result<PathBuf, ConfigError> {
    let slot_dir = config_slot_dir(app_config_dir, workspace_folder);
    let file_name = config_file_path
        .file_name()
        .ok_or_else(|| ConfigError::Merge {
            path: config_file_path.to_path_buf(),
            message: "configuration path has no file name".to_string(),
        })?;

    let original = fs::read(config_file_path).map_err(|source| ConfigError::Io {
        path: config_file_path.to_path_buf(),
        source,
    })?;

    let content = if additional_config_file_path.exists() {
        tracing::info!(
            "Merging {} into {}",
            additional_config_file_path.display(),
            config_file_path.display()
        );
        let base = read_object(config_file_path, &original)?;
        let additional_bytes =
            fs::read(additional_config_file_path).map_err(|source| ConfigError::Io {
                path: additional_config_file_path.to_path_buf(),
                source,
            })?;
        let additional = read_object(additional_config_file_path, &additional_bytes)?;

        let mut merged = serde_json::to_string_pretty(&Value::Object(merge_configs(base, additional)))
            .map_err(|e| ConfigError::Merge {
                path: config_file_path.to_path_buf(),
                message: e.to_string(),
            })?;
        merged.push('\n');
        merged.into_bytes()
    } else {
        tracing::debug!(
            "No additional configuration at {}",
            additional_config_file_path.display()
        );
        original
    };

    fs::create_dir_all(&slot_dir).map_err(|source| ConfigError::Io {
        path: slot_dir.clone(),
        source,
    })?;
    let target = slot_dir.join(file_name);
    fs::write(&target, content).map_err(|source| ConfigError::Io {
        path: target.clone(),
        source,
    })?;

    tracing::info!("Wrote merged configuration to {}", target.display());
    Ok(target)
}

/// Shallow merge: top-level keys of `additional` replace those of `base`.
pub fn merge_configs(mut base: Map<String, Value>, additional: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in additional {
        base.insert(key, value);
    }
    base
}

/// Remove the slot of `workspace_folder`; returns the removed directory, if any.
pub fn remove_config_slot(app_config_dir: &Path, workspace_folder: &str) -> Result<Option<PathBuf>, ConfigError> {
    let slot_dir = config_slot_dir(app_config_dir, workspace_folder);
    if !slot_dir.exists() {
        return Ok(None);
    }
    fs::remove_dir_all(&slot_dir).map_err(|source| ConfigError::Io {
        path: slot_dir.clone(),
        source,
    })?;
    Ok(Some(slot_dir))
}

fn read_object(path: &Path, bytes: &[u8]) -> Result<Map<String, Value>, ConfigError> {
    let merge_error = |message: String| ConfigError::Merge {
        path: path.to_path_buf(),
        message,
    };

    let text = std::str::from_utf8(bytes).map_err(|e| merge_error(e.to_string()))?;
    let value = jsonc_parser::parse_to_value(text, &jsonc_parser::ParseOptions::default())
        .map_err(|e| merge_error(format!("invalid JSON: {e}")))?
        .ok_or_else(|| merge_error("file is empty".to_string()))?;

    match convert_jsonc_to_serde_value(value).map_err(merge_error)? {
        Value::Object(map) => Ok(map),
        _ => Err(merge_error("top-level value is not an object".to_string())),
    }
}

// Numbers keep their source text (`arbitrary_precision`), so values outside
// i64/u64/f64 range survive the merge unchanged.
fn convert_jsonc_to_serde_value(jsonc_value: jsonc_parser::JsonValue) -> Result<Value, String> {
    Ok(match jsonc_value {
        jsonc_parser::JsonValue::Null => Value::Null,
        jsonc_parser::JsonValue::Boolean(b) => Value::Bool(b),
        jsonc_parser::JsonValue::Number(n) => n
            .parse::<serde_json::Number>()
            .map(Value::Number)
            .map_err(|e| format!("invalid number `{}`: {}", n, e))?,
        jsonc_parser::JsonValue::String(s) => Value::String(s.to_string()),
        jsonc_parser::JsonValue::Array(arr) => Value::Array(
            arr.into_iter()
                .map(convert_jsonc_to_serde_value)
                .collect::<Result<_, _>>()?,
        ),
        jsonc_parser::JsonValue::Object(obj) => {
            let mut map = Map::new();
            for (key, value) in obj {
                map.insert(key, convert_jsonc_to_serde_value(value)?);
            }
            Value::Object(map)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        config: PathBuf,
    }

    impl Fixture {
        fn new(config: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let devcontainer_dir = dir.path().join("work").join(".devcontainer");
            fs::create_dir_all(&devcontainer_dir).unwrap();
            let config_path = devcontainer_dir.join("devcontainer.json");
            fs::write(&config_path, config).unwrap();
            Self {
                dir,
                config: config_path,
            }
        }

        fn app_config_dir(&self) -> PathBuf {
            self.dir.path().join("config")
        }

        fn write_additional(&self, content: &str) {
            fs::write(additional_config_path(&self.config), content).unwrap();
        }

        fn materialize(&self, workspace: &str) -> Result<PathBuf, ConfigError> {
            materialize(
                &self.app_config_dir(),
                workspace,
                &self.config,
                &additional_config_path(&self.config),
            )
        }
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_merge_precedence() {
        let merged = merge_configs(as_map(json!({"a": 1, "b": 2})), as_map(json!({"b": 3, "c": 4})));
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_is_shallow() {
        let merged = merge_configs(
            as_map(json!({"customizations": {"vscode": {}, "other": 1}})),
            as_map(json!({"customizations": {"vim": true}})),
        );
        assert_eq!(Value::Object(merged), json!({"customizations": {"vim": true}}));
    }

    #[test]
    fn test_additional_config_path() {
        assert_eq!(
            additional_config_path(Path::new("/work/.devcontainer/devcontainer.json")),
            PathBuf::from("/work/.devcontainer/devcontainer.vim.json")
        );
        assert_eq!(
            additional_config_path(Path::new("/work/.devcontainer.json")),
            PathBuf::from("/work/.devcontainer.vim.json")
        );
    }

    #[test]
    fn test_slot_identity() {
        assert_eq!(slot_name("/home/me/project"), slot_name("/home/me/project"));
        assert_ne!(slot_name("/home/me/project"), slot_name("/home/me/project2"));
        assert_ne!(slot_name("/a/b"), slot_name("/a/b/"));
        assert_eq!(slot_name("/x").len(), 64);
    }

    #[test]
    fn test_absent_additional_copies_bytes() {
        let original = "// comment kept\n{ \"name\": \"dev\",   \"image\": \"debian\", }\n";
        let fixture = Fixture::new(original);

        let target = fixture.materialize("/work").unwrap();

        assert_eq!(target, config_slot_dir(&fixture.app_config_dir(), "/work").join("devcontainer.json"));
        assert_eq!(fs::read_to_string(&target).unwrap(), original);
    }

    #[test]
    fn test_materialize_merges_jsonc() {
        let fixture = Fixture::new(
            r#"{
                // base image
                "name": "dev",
                "image": "debian",
                "features": {},
            }"#,
        );
        fixture.write_additional(r#"{ "image": "ubuntu", "remoteUser": "vim" }"#);

        let target = fixture.materialize("/work").unwrap();
        let merged: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(
            merged,
            json!({"name": "dev", "image": "ubuntu", "features": {}, "remoteUser": "vim"})
        );

        let keys: Vec<&String> = merged.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["name", "image", "features", "remoteUser"]);
    }

    #[test]
    fn test_merge_keeps_numbers_verbatim() {
        let fixture = Fixture::new(
            r#"{"big": 12345678901234567890123, "huge": 1e400, "ratio": 0.1, "keep": 1}"#,
        );
        fixture.write_additional(r#"{"keep": 2, "list": [18446744073709551616]}"#);

        let target = fixture.materialize("/work").unwrap();
        let written = fs::read_to_string(&target).unwrap();

        assert!(written.contains("\"big\": 12345678901234567890123"), "{written}");
        assert!(written.contains("\"huge\": 1e400"), "{written}");
        assert!(written.contains("\"ratio\": 0.1"), "{written}");
        assert!(written.contains("\"keep\": 2"), "{written}");
        assert!(written.contains("18446744073709551616"), "{written}");
        assert!(!written.contains("null"), "{written}");
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let fixture = Fixture::new(r#"{"a": 1, "b": 2}"#);
        fixture.write_additional(r#"{"b": 3, "c": 4}"#);

        let first = fixture.materialize("/work").unwrap();
        let first_bytes = fs::read(&first).unwrap();
        let second = fixture.materialize("/work").unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, fs::read(&second).unwrap());
    }

    #[test]
    fn test_workspaces_do_not_share_slots() {
        let fixture = Fixture::new(r#"{"a": 1}"#);
        let one = fixture.materialize("/work/one").unwrap();
        let two = fixture.materialize("/work/two").unwrap();
        assert_ne!(one.parent(), two.parent());
        assert!(one.exists() && two.exists());
    }

    #[test]
    fn test_malformed_additional_is_merge_error() {
        let fixture = Fixture::new(r#"{"a": 1}"#);
        fixture.write_additional("{ not json");

        let err = fixture.materialize("/work").unwrap_err();
        match err {
            ConfigError::Merge { path, .. } => assert_eq!(path, additional_config_path(&fixture.config)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_object_additional_is_merge_error() {
        let fixture = Fixture::new(r#"{"a": 1}"#);
        fixture.write_additional("[1, 2]");
        assert!(matches!(fixture.materialize("/work"), Err(ConfigError::Merge { .. })));
    }

    #[test]
    fn test_missing_config_is_io_error() {
        let fixture = Fixture::new("{}");
        fs::remove_file(&fixture.config).unwrap();
        assert!(matches!(fixture.materialize("/work"), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_remove_config_slot() {
        let fixture = Fixture::new(r#"{"a": 1}"#);
        let target = fixture.materialize("/work").unwrap();

        let removed = remove_config_slot(&fixture.app_config_dir(), "/work").unwrap();
        assert_eq!(removed.as_deref(), target.parent());
        assert!(!target.exists());

        assert_eq!(remove_config_slot(&fixture.app_config_dir(), "/work").unwrap(), None);
    }
}
