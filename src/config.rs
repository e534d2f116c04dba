//! JSON configuration for the command-line tools.
//!
//! Every tool takes a single `<config.json>` argument. Relative paths inside
//! a config resolve against the directory holding the config file.
pub mod batch;
pub mod landmarks;

use std::path::{Path, PathBuf};

pub(crate) fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

pub(crate) fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
