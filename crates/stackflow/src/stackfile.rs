//! Stack file loading
//!
//! A stack file describes every delta (deployment slot) of one
//! application; the delta and the version tag picked on the command
//! line select and stamp the config that gets resolved.

use anyhow::Context;
use serde::Deserialize;
use stackflow_core::StackConfig;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct StackFile {
    pub deltas: BTreeMap<String, StackConfig>,
}

pub fn load(path: &Path) -> anyhow::Result<StackFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read stack file {}", path.display()))?;
    let file: StackFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("cannot parse stack file {}", path.display()))?;
    Ok(file)
}

/// Select one delta's config and stamp it with the delta and tag.
pub fn config_for(path: &Path, delta: &str, tag: &str) -> anyhow::Result<StackConfig> {
    let file = load(path)?;
    let mut config = file
        .deltas
        .get(delta)
        .cloned()
        .with_context(|| {
            let available: Vec<&str> = file.deltas.keys().map(String::as_str).collect();
            format!("delta '{delta}' not found; available: {}", available.join(", "))
        })?;
    config.deployment_delta = Some(delta.to_string());
    config.deployment_tag = Some(tag.to_string());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STACK_YAML: &str = r#"
deltas:
  staging:
    app_id: acme
    deployment_region: us-west-2
    buckets:
      - nametip: media
        setting_name: MEDIA_BUCKET_NAME
  prod:
    app_id: acme
    deployment_region: us-west-2
"#;

    fn write_stack_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("stack.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(STACK_YAML.as_bytes()).unwrap();
        path
    }

    #[test]
    fn selects_the_delta_and_stamps_delta_and_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stack_file(&dir);

        let config = config_for(&path, "staging", "v42").unwrap();
        assert_eq!(config.app_id.as_deref(), Some("acme"));
        assert_eq!(config.deployment_delta.as_deref(), Some("staging"));
        assert_eq!(config.deployment_tag.as_deref(), Some("v42"));
        assert_eq!(config.buckets.len(), 1);
    }

    #[test]
    fn unknown_delta_lists_the_available_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stack_file(&dir);

        let err = config_for(&path, "qa", "v1").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("qa"));
        assert!(message.contains("staging"));
    }
}
