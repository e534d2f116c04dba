use super::{config_dir, resolve_path};
use crate::distortion::RegistrationParams;
use crate::reference::MaskOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of the `match_landmarks` debugging tool.
#[derive(Clone, Debug, Deserialize)]
pub struct MatchToolConfig {
    pub reference_image: PathBuf,
    pub layout: PathBuf,
    /// Single document to register.
    pub target_image: PathBuf,
    #[serde(default)]
    pub masks: MaskOptions,
    #[serde(default)]
    pub registration: RegistrationParams,
    /// Where to write the registration report; printed only when absent.
    #[serde(default)]
    pub report_json: Option<PathBuf>,
    /// Labelled copy of the target with matched landmarks drawn in.
    #[serde(default)]
    pub labelled_image: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<MatchToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let mut config: MatchToolConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    let base = config_dir(path);
    config.reference_image = resolve_path(&base, &config.reference_image);
    config.layout = resolve_path(&base, &config.layout);
    config.target_image = resolve_path(&base, &config.target_image);
    config.report_json = config.report_json.map(|p| resolve_path(&base, &p));
    config.labelled_image = config.labelled_image.map(|p| resolve_path(&base, &p));
    Ok(config)
}
