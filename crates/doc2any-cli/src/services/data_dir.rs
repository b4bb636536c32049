// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-user data directory holding config.json and stats.db.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "doc2any";
const CONFIG_FILE: &str = "config.json";
const STATS_FILE: &str = "stats.db";

/// Location of the CLI's persistent files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// `$XDG_DATA_HOME/doc2any`, else `$HOME/.local/share/doc2any`. `None`
    /// when neither variable names an absolute path.
    pub fn from_env() -> Option<Self> {
        Self::resolve(std::env::var_os("XDG_DATA_HOME"), std::env::var_os("HOME"))
    }

    fn resolve(xdg_data_home: Option<OsString>, home: Option<OsString>) -> Option<Self> {
        let absolute = |value: OsString| Some(PathBuf::from(value)).filter(|p| p.is_absolute());
        let base = xdg_data_home
            .and_then(absolute)
            .or_else(|| home.and_then(absolute).map(|h| h.join(".local").join("share")))?;
        Some(Self::at(base.join(APP_DIR)))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn stats_db(&self) -> PathBuf {
        self.root.join(STATS_FILE)
    }

    /// Create the directory (and parents) if missing.
    pub fn ensure(&self) -> std::io::Result<&Path> {
        std::fs::create_dir_all(&self.root)?;
        Ok(&self.root)
    }
}
