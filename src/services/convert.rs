//! YAML to JSON conversion of the generated specs.

use crate::domain::SpecArtifact;
use crate::error::{ConvertError, ConvertResult};
use serde_json::{Map, Number, Value as Json};
use serde_yaml::Value as Yaml;
use std::fs;
use std::path::{Path, PathBuf};

/// Specs that get a JSON sibling
pub const JSON_ARTIFACTS: [SpecArtifact; 2] = [SpecArtifact::Rest, SpecArtifact::AppComponents];

/// Convert a YAML value into JSON, stringifying non-string map keys.
pub fn yaml_to_json(value: Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Json::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            }
        }
        Yaml::String(s) => Json::String(s),
        Yaml::Sequence(items) => Json::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(key_to_string(key), yaml_to_json(value));
            }
            Json::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn key_to_string(key: Yaml) -> String {
    match key {
        Yaml::String(s) => s,
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Read a YAML file into a JSON value
pub fn read_yaml_as_json(path: &Path) -> ConvertResult<Json> {
    if !path.is_file() {
        return Err(ConvertError::SpecNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let yaml: Yaml = serde_yaml::from_str(&content)?;
    Ok(yaml_to_json(yaml))
}

/// Write `value` as 2-space indented UTF-8 JSON
pub fn write_pretty_json(path: &Path, value: &Json) -> ConvertResult<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

/// Write `<name>.json` next to each spec in `defs_dir`.
///
/// Missing YAML files are skipped with a warning. Returns the files written.
pub fn convert_specs_to_json(defs_dir: &Path) -> ConvertResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    for artifact in JSON_ARTIFACTS {
        let yaml_file = defs_dir.join(artifact.defs_file());
        if !yaml_file.exists() {
            tracing::warn!("YAML file not found: {}", yaml_file.display());
            continue;
        }

        let json_file = yaml_file.with_extension("json");
        let value = read_yaml_as_json(&yaml_file)?;
        write_pretty_json(&json_file, &value)?;

        tracing::info!(
            "Converted {} to {}",
            yaml_file.display(),
            json_file.display()
        );
        written.push(json_file);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_to_json_stringifies_keys() {
        let yaml: Yaml = serde_yaml::from_str(
            "responses:\n  200:\n    description: OK\n  default:\n    description: Error\nflag: true\nratio: 0.5\n",
        )
        .unwrap();

        assert_eq!(
            yaml_to_json(yaml),
            json!({
                "responses": {
                    "200": {"description": "OK"},
                    "default": {"description": "Error"}
                },
                "flag": true,
                "ratio": 0.5
            })
        );
    }

    #[test]
    fn test_key_order_is_preserved() {
        let yaml: Yaml = serde_yaml::from_str("zeta: 1\nalpha: 2\nmid: 3\n").unwrap();
        let json = yaml_to_json(yaml);
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_convert_specs_skips_missing() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("asana_oas.yaml"),
            "openapi: 3.0.0\ninfo:\n  title: Asana – API\n",
        )
        .unwrap();

        let written = convert_specs_to_json(temp.path()).unwrap();
        assert_eq!(written, vec![temp.path().join("asana_oas.json")]);

        let text = fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains("\"title\": \"Asana – API\""));
        assert!(text.starts_with("{\n  \"openapi\""));
    }
}
