use super::{config_dir, resolve_path};
use crate::distortion::RegistrationParams;
use crate::fields::{DarknessClassifier, FieldOptions};
use crate::reference::MaskOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of the `register_sheets` batch tool.
#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Grayscale master sheet the landmark masks are cut from.
    pub reference_image: PathBuf,
    /// JSON [`LayoutSpec`](crate::reference::LayoutSpec).
    pub layout: PathBuf,
    /// Directory scanned for `.jpg`, `.jpeg` and `.png` documents.
    pub input_dir: PathBuf,
    pub output: OutputConfig,
    #[serde(default)]
    pub masks: MaskOptions,
    #[serde(default)]
    pub registration: RegistrationParams,
    #[serde(default)]
    pub fields: FieldOptions,
    #[serde(default)]
    pub classifier: DarknessClassifier,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Batch report file name inside `dir`.
    #[serde(default = "default_report_name")]
    pub report_json: PathBuf,
    /// Write a labelled PNG per registered document.
    #[serde(default)]
    pub labelled_images: bool,
}

fn default_report_name() -> PathBuf {
    PathBuf::from("report.json")
}

impl OutputConfig {
    pub fn report_path(&self) -> PathBuf {
        resolve_path(&self.dir, &self.report_json)
    }

    /// `<dir>/<stem>_labelled.png` for a document path.
    pub fn labelled_path(&self, document: &Path) -> PathBuf {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.dir.join(format!("{stem}_labelled.png"))
    }
}

impl RuntimeConfig {
    fn resolve_paths(mut self, base_dir: &Path) -> Self {
        self.reference_image = resolve_path(base_dir, &self.reference_image);
        self.layout = resolve_path(base_dir, &self.layout);
        self.input_dir = resolve_path(base_dir, &self.input_dir);
        self.output.dir = resolve_path(base_dir, &self.output.dir);
        self
    }
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config.resolve_paths(&config_dir(path)))
}
