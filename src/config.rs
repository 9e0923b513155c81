use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::model::City;

/// Where each city's trip data lives, loaded from JSON.
///
/// ```json
/// { "data_dir": "/srv/bikeshare", "sources": { "chicago": "chicago.parquet" } }
/// ```
///
/// Cities missing from `sources` fall back to their default file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Directory that relative source paths are resolved against.
    pub data_dir: PathBuf,
    /// City name (as typed by users) → file path.
    pub sources: BTreeMap<String, PathBuf>,
    /// Raw rows shown per page of the data preview.
    pub preview_rows: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            sources: City::ALL
                .into_iter()
                .map(|c| (c.name().to_string(), PathBuf::from(default_file_name(c))))
                .collect(),
            preview_rows: 5,
        }
    }
}

/// File name each city's data ships under.
pub fn default_file_name(city: City) -> &'static str {
    match city {
        City::Chicago => "chicago.csv",
        City::NewYorkCity => "new_york_city.csv",
        City::Washington => "washington.csv",
    }
}

impl ExplorerConfig {
    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;

        for key in config.sources.keys() {
            if key.parse::<City>().is_err() {
                log::warn!("Ignoring config source for unknown city '{key}'");
            }
        }
        Ok(config)
    }

    /// Resolve the data file for `city`.
    pub fn source_path(&self, city: City) -> PathBuf {
        let file = self
            .sources
            .iter()
            .find(|(name, _)| name.parse::<City>().ok() == Some(city))
            .map(|(_, path)| path.clone())
            .unwrap_or_else(|| PathBuf::from(default_file_name(city)));
        self.data_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_every_city() {
        let config = ExplorerConfig::default();
        assert_eq!(
            config.source_path(City::NewYorkCity),
            Path::new(".").join("new_york_city.csv")
        );
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.preview_rows, 5);
    }

    #[test]
    fn partial_file_overrides_one_city() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explorer.json");
        std::fs::write(
            &path,
            r#"{ "data_dir": "/data", "sources": { "Chicago": "/archive/chi.parquet" } }"#,
        )
        .unwrap();

        let config = ExplorerConfig::load_from(&path).unwrap();
        assert_eq!(config.preview_rows, 5);
        // absolute paths replace data_dir when joined
        assert_eq!(
            config.source_path(City::Chicago),
            PathBuf::from("/archive/chi.parquet")
        );
        assert_eq!(
            config.source_path(City::Washington),
            PathBuf::from("/data/washington.csv")
        );
    }

    #[test]
    fn config_roundtrip() {
        let config = ExplorerConfig::default();
        let text = serde_json::to_string_pretty(&config).unwrap();
        let parsed: ExplorerConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
