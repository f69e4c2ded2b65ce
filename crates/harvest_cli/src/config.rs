use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use harvest_core::HarvestConfig;
use harvest_logging::harvest_info;

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub articles_per_cycle: Option<usize>,
    pub state_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(&self, config: &mut HarvestConfig) {
        if let Some(articles) = self.articles_per_cycle {
            config.cycle.articles_per_cycle = articles;
        }
        if let Some(path) = &self.state_file {
            config.paths.state_file = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.paths.output_dir = dir.clone();
        }
    }
}

/// Builds the effective configuration: file (or defaults), then overrides, then validation.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<HarvestConfig> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => HarvestConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_file(path: &Path) -> anyhow::Result<HarvestConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {:?}", path))?;
    let config = ron::from_str(&text)
        .with_context(|| format!("failed to parse configuration file {:?}", path))?;
    harvest_info!("Loaded configuration from {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("wikiharvest.ron");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let config = load(None, &Overrides::default()).unwrap();
        assert_eq!(config, HarvestConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"(
                cycle: (articles_per_cycle: 5),
                rotation: (repo_name_prefix: "corpus-", require_sync: true),
            )"#,
        );

        let config = load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(config.cycle.articles_per_cycle, 5);
        assert_eq!(config.cycle.max_attempts_per_cycle, 50);
        assert_eq!(config.rotation.repo_name_prefix, "corpus-");
        assert!(config.rotation.require_sync);
        assert_eq!(config.rotation.max_files_per_repo, 25_000);
    }

    #[test]
    fn overrides_win_over_the_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"(cycle: (articles_per_cycle: 5), paths: (state_file: "from-file.json"))"#,
        );
        let overrides = Overrides {
            articles_per_cycle: Some(2),
            state_file: Some(PathBuf::from("cli.json")),
            output_dir: Some(PathBuf::from("batches")),
        };

        let config = load(Some(&path), &overrides).unwrap();
        assert_eq!(config.cycle.articles_per_cycle, 2);
        assert_eq!(config.paths.state_file, PathBuf::from("cli.json"));
        assert_eq!(config.paths.output_dir, PathBuf::from("batches"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let overrides = Overrides {
            articles_per_cycle: Some(0),
            ..Overrides::default()
        };
        let err = load(None, &overrides).unwrap_err();
        assert!(format!("{err:#}").contains("cycle.articles_per_cycle"));
    }

    #[test]
    fn unreadable_or_malformed_files_are_errors() {
        let temp = TempDir::new().unwrap();
        assert!(load(Some(&temp.path().join("missing.ron")), &Overrides::default()).is_err());

        let path = write_config(&temp, "(cycle: (articles_per_cycle: \"three\"))");
        assert!(load(Some(&path), &Overrides::default()).is_err());
    }
}
