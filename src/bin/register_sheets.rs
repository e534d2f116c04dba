use log::{info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use sheet_registration::config::batch::{self, RuntimeConfig};
use sheet_registration::fields::{classify_fields, ClassifiedSheet};
use sheet_registration::image::io::{load_grayscale_image, save_rgb, write_json_file};
use sheet_registration::image::label::{self, BOX_LABEL_RADIUS, POINT_LABEL_RADIUS};
use sheet_registration::reference::{LayoutSpec, ReferenceLayout};
use sheet_registration::stats::BatchReport;
use sheet_registration::{DistortionModel, RegistrationReport};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

const DOCUMENT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = batch::load_config(Path::new(&config_path))?;

    fs::create_dir_all(&config.output.dir)
        .map_err(|e| format!("Failed to create {}: {e}", config.output.dir.display()))?;

    let reference = load_grayscale_image(&config.reference_image)?;
    let spec = LayoutSpec::load(&config.layout)?;
    let layout = ReferenceLayout::build(&reference.as_view(), &spec, &config.masks)
        .map_err(|e| format!("Failed to build reference layout: {e}"))?;

    let documents = list_documents(&config.input_dir)?;
    info!(
        "register_sheets: {} documents in {}",
        documents.len(),
        config.input_dir.display()
    );

    let t0 = Instant::now();
    let outcomes = process_all(&documents, &layout, &config);

    let grid = layout.fields();
    let mut report = BatchReport::new(grid.questions(), grid.options());
    for (path, outcome) in documents.iter().zip(outcomes) {
        let name = path.display().to_string();
        match outcome {
            Ok((registration, sheet)) => {
                report.push_registered(name, registration, &sheet.answers)
            }
            Err(err) => {
                warn!("register_sheets: skipping {name}: {err}");
                report.push_skipped(name, err);
            }
        }
    }

    let report_path = config.output.report_path();
    write_json_file(&report_path, &report)?;
    println!(
        "Registered {}/{} documents in {:.1} ms; report written to {}",
        report.registered,
        documents.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
        report_path.display()
    );
    Ok(())
}

fn usage() -> String {
    "Usage: register_sheets <config.json>".to_string()
}

fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries =
        fs::read_dir(dir).map_err(|e| format!("Failed to read {}: {e}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| format!("Failed to read {}: {e}", dir.display()))?
            .path();
        let is_document = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_document {
            paths.push(path);
        }
    }
    // Deterministic report order regardless of directory iteration.
    paths.sort();
    Ok(paths)
}

type Outcome = Result<(RegistrationReport, ClassifiedSheet), String>;

fn process_all(documents: &[PathBuf], layout: &ReferenceLayout, config: &RuntimeConfig) -> Vec<Outcome> {
    #[cfg(feature = "parallel")]
    {
        documents
            .par_iter()
            .map(|path| process_document(path, layout, config))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        documents
            .iter()
            .map(|path| process_document(path, layout, config))
            .collect()
    }
}

fn process_document(path: &Path, layout: &ReferenceLayout, config: &RuntimeConfig) -> Outcome {
    let gray = load_grayscale_image(path)?;
    let target = gray.as_view();
    let model = DistortionModel::register(&target, layout, &config.registration)
        .map_err(|e| e.to_string())?;
    let sheet = classify_fields(&target, &model, layout, &config.fields, &config.classifier)
        .map_err(|e| e.to_string())?;

    if config.output.labelled_images {
        let mut labelled = label::to_rgb(&target);
        label::label_points(&mut labelled, &model.matched_points(), POINT_LABEL_RADIUS);
        label::label_areas(&mut labelled, &sheet.filled_centers, BOX_LABEL_RADIUS);
        save_rgb(&labelled, &config.output.labelled_path(path))?;
    }

    Ok((model.report().clone(), sheet))
}
