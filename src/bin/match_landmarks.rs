use sheet_registration::config::landmarks;
use sheet_registration::image::io::{load_grayscale_image, save_rgb, write_json_file};
use sheet_registration::image::label::{self, POINT_LABEL_RADIUS};
use sheet_registration::reference::{LayoutSpec, ReferenceLayout};
use sheet_registration::{DistortionModel, RegistrationReport};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = landmarks::load_config(Path::new(&config_path))?;

    let reference = load_grayscale_image(&config.reference_image)?;
    let spec = LayoutSpec::load(&config.layout)?;
    let layout = ReferenceLayout::build(&reference.as_view(), &spec, &config.masks)
        .map_err(|e| format!("Failed to build reference layout: {e}"))?;

    let gray = load_grayscale_image(&config.target_image)?;
    let target = gray.as_view();
    let model = DistortionModel::register(&target, &layout, &config.registration)
        .map_err(|e| format!("Registration of {} failed: {e}", config.target_image.display()))?;

    print_text_summary(model.report(), &model);

    if let Some(path) = &config.report_json {
        write_json_file(path, model.report())?;
        println!("\nJSON report written to {}", path.display());
    }
    if let Some(path) = &config.labelled_image {
        let mut labelled = label::to_rgb(&target);
        label::label_points(&mut labelled, &model.matched_points(), POINT_LABEL_RADIUS);
        save_rgb(&labelled, path)?;
        println!("Labelled image written to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: match_landmarks <config.json>".to_string()
}

fn print_text_summary(report: &RegistrationReport, model: &DistortionModel) {
    println!("Landmarks ({}x{} target)", report.image_width, report.image_height);
    for lm in &report.landmarks {
        match (&lm.found, &lm.error) {
            (Some(m), _) => println!(
                "  #{:<2} {} -> {} offset=({:+}, {:+}) mismatches={} dist={:.1}",
                lm.index,
                lm.reference,
                m.coordinate,
                m.offset.0,
                m.offset.1,
                m.mismatches,
                m.distance
            ),
            (None, Some(err)) => println!("  #{:<2} {} dropped: {err}", lm.index, lm.reference),
            (None, None) => println!("  #{:<2} {} dropped", lm.index, lm.reference),
        }
    }

    let t = model.transform();
    println!(
        "\nAffine transform:\n    [{:.6} {:.6} | {:.3}]\n    [{:.6} {:.6} | {:.3}]",
        t.matrix[(0, 0)],
        t.matrix[(0, 1)],
        t.translation[0],
        t.matrix[(1, 0)],
        t.matrix[(1, 1)],
        t.translation[1]
    );
    println!(
        "matched={} dropped={} residual_rms={:.3}px",
        report.matched_count(),
        report.failed_count(),
        report.residual_rms_px
    );
    let stages: Vec<String> = report
        .timings
        .stages
        .iter()
        .map(|s| format!("{}={:.3}", s.label, s.elapsed_ms))
        .collect();
    println!("Timings (ms): {} total={:.3}", stages.join(" "), report.timings.total_ms);
}
