// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-level services for the CLI: data directory, configuration and the
// stats database.

pub mod data_dir;

use std::path::Path;

use doc2any_core::ConverterConfig;
use doc2any_stats::ConversionStats;
use tracing::{debug, warn};

use self::data_dir::DataDir;

/// Load the converter configuration from `explicit`, else `config.json` in
/// the data directory, else defaults. An explicit path must load.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<ConverterConfig> {
    load_config_from(explicit, DataDir::from_env().as_ref())
}

fn load_config_from(
    explicit: Option<&Path>,
    data_dir: Option<&DataDir>,
) -> anyhow::Result<ConverterConfig> {
    if let Some(path) = explicit {
        return ConverterConfig::load(path)
            .map_err(|err| anyhow::anyhow!("cannot load config {}: {}", path.display(), err));
    }

    let Some(path) = data_dir.map(DataDir::config_file).filter(|p| p.exists()) else {
        debug!("no config file, using defaults");
        return Ok(ConverterConfig::default());
    };
    match ConverterConfig::load(&path) {
        Ok(config) => Ok(config),
        Err(err) => {
            warn!(error = %err, path = %path.display(), "ignoring unreadable config file");
            Ok(ConverterConfig::default())
        }
    }
}

/// Open the persistent stats database, or `None` when it cannot be opened.
pub fn open_stats() -> Option<ConversionStats> {
    let Some(data_dir) = DataDir::from_env() else {
        warn!("no data directory (HOME unset), conversion stats unavailable");
        return None;
    };
    open_stats_in(&data_dir)
}

fn open_stats_in(data_dir: &DataDir) -> Option<ConversionStats> {
    let opened = data_dir
        .ensure()
        .map_err(doc2any_core::error::Doc2AnyError::from)
        .and_then(|_| ConversionStats::open(&data_dir.stats_db()));
    match opened {
        Ok(stats) => Some(stats),
        Err(err) => {
            warn!(error = %err, dir = %data_dir.root().display(), "conversion stats unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_config_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"jpeg_quality": 70, "max_rendered_pages": 5}}"#).unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.max_rendered_pages, 5);
        assert_eq!(config.slide_char_budget, 1500);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/doc2any.json"))).is_err());
    }

    #[test]
    fn data_dir_config_is_picked_up() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = DataDir::at(tmp.path());
        std::fs::write(data_dir.config_file(), r#"{"render_scale": 1.5}"#).unwrap();
        let config = load_config_from(None, Some(&data_dir)).unwrap();
        assert_eq!(config.render_scale, 1.5);

        std::fs::write(data_dir.config_file(), "{ not json").unwrap();
        let config = load_config_from(None, Some(&data_dir)).unwrap();
        assert_eq!(config.render_scale, ConverterConfig::default().render_scale);

        let config = load_config_from(None, None).unwrap();
        assert_eq!(config.jpeg_quality, 92);
    }

    #[test]
    fn stats_database_is_created_in_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = DataDir::at(tmp.path().join("fresh"));
        assert!(open_stats_in(&data_dir).is_some());
        assert!(data_dir.stats_db().exists());
    }
}
