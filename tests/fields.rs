mod common;

use common::synthetic_image::{rotation_about, warp_affine, SyntheticSheet};
use sheet_registration::fields::{
    classify_fields, extract_field_patches, DarknessClassifier, FieldOptions,
};
use sheet_registration::image::io::write_json_file;
use sheet_registration::stats::{AnswerTally, BatchReport};
use sheet_registration::{
    DistortionModel, LayoutSpec, MaskOptions, PixelCoordinate, ReferenceLayout,
    RegistrationError, RegistrationParams,
};
use std::fs;
use std::path::PathBuf;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "sheet_registration_{}_{}",
        name,
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn filled_boxes_are_found_on_a_rotated_scan() {
    init_logging();
    let sheet = SyntheticSheet::standard();
    let layout = ReferenceLayout::build(
        &sheet.render(&[]).as_view(),
        &sheet.layout_spec(),
        &MaskOptions::default(),
    )
    .unwrap();

    let marked = [(0, 1), (2, 3), (5, 0), (5, 2)];
    let truth = rotation_about(0.5, 320.0, 440.0, [4.0, 3.0]);
    let scan = warp_affine(&sheet.render(&marked), &truth, sheet.width, sheet.height);
    let target = scan.as_view();

    let model = DistortionModel::register(&target, &layout, &RegistrationParams::default())
        .unwrap();
    let options = FieldOptions::default();

    let patches = extract_field_patches(&target, &model, &layout, &options).unwrap();
    assert_eq!(patches.len(), 6 * 4);
    assert!(patches
        .iter()
        .all(|p| p.patch.width() == 40 && p.patch.height() == 40));

    let sheet_answers =
        classify_fields(&target, &model, &layout, &options, &DarknessClassifier::default())
            .unwrap();
    let answers = &sheet_answers.answers;
    assert_eq!(answers.filled_count(), marked.len());
    for &(q, o) in &marked {
        assert!(answers.is_filled(q, o), "question {q} option {o} not detected");
    }
    assert_eq!(answers.selected(5), vec![0, 2]);
    assert_eq!(sheet_answers.filled_centers.len(), marked.len());

    let tally: AnswerTally = [answers].into_iter().collect();
    assert_eq!(tally.counts[2], vec![0, 0, 0, 1]);
    assert_eq!(tally.unanswered, vec![0, 1, 0, 1, 1, 0]);
    assert_eq!(tally.multiple[5], 1);
}

#[test]
fn custom_classifier_sees_every_patch() {
    init_logging();
    let sheet = SyntheticSheet::standard();
    let reference = sheet.render(&[]);
    let layout =
        ReferenceLayout::build(&reference.as_view(), &sheet.layout_spec(), &MaskOptions::default())
            .unwrap();
    let model = DistortionModel::register(
        &reference.as_view(),
        &layout,
        &RegistrationParams::default(),
    )
    .unwrap();
    let options = FieldOptions {
        crop_radius: 14,
        patch_size: None,
        ..FieldOptions::default()
    };
    // Every unfilled box crop has ink only along its border.
    let classifier = |patch: sheet_registration::image::ImageU8<'_>| patch.get(14, 14) < 128;
    let result =
        classify_fields(&reference.as_view(), &model, &layout, &options, &classifier).unwrap();
    assert_eq!(result.answers.filled_count(), 0);
}

#[test]
fn crops_past_the_scan_border_are_padded() {
    init_logging();
    let sheet = SyntheticSheet::standard();
    let reference = sheet.render(&[]);
    let layout =
        ReferenceLayout::build(&reference.as_view(), &sheet.layout_spec(), &MaskOptions::default())
            .unwrap();
    let model = DistortionModel::register(
        &reference.as_view(),
        &layout,
        &RegistrationParams::default(),
    )
    .unwrap();
    // First column of boxes sits at x = 180; a radius of 200 reaches past x = 0.
    let options = FieldOptions {
        crop_radius: 200,
        patch_size: Some(40),
        ..FieldOptions::default()
    };
    let patches = extract_field_patches(&reference.as_view(), &model, &layout, &options).unwrap();
    assert_eq!(patches.len(), 6 * 4);
    assert!(patches.iter().all(|p| p.patch.width() == 40));
}

#[test]
fn layout_round_trips_through_json() {
    let sheet = SyntheticSheet::standard();
    let dir = scratch_dir("layout");
    let path = dir.join("layout.json");
    write_json_file(&path, &sheet.layout_spec()).unwrap();

    let spec = LayoutSpec::load(&path).unwrap();
    assert_eq!(spec.landmarks, sheet.landmarks);
    assert_eq!(spec.fields, sheet.fields);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ragged_field_grid_is_rejected() {
    let sheet = SyntheticSheet::standard();
    let mut spec = sheet.layout_spec();
    spec.fields[2].pop();
    let err = ReferenceLayout::build(
        &sheet.render(&[]).as_view(),
        &spec,
        &MaskOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidLayout(_)));
}

#[test]
fn layout_json_with_negative_coordinates_fails_to_load() {
    let dir = scratch_dir("negative");
    let path = dir.join("layout.json");
    fs::write(
        &path,
        r#"{"landmarks": [{"x": 10, "y": -3}], "fields": [[{"x": 1, "y": 1}]]}"#,
    )
    .unwrap();
    assert!(LayoutSpec::load(&path).is_err());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn batch_report_serialises_outcomes_and_tally() {
    let sheet = SyntheticSheet::standard();
    let reference = sheet.render(&[(0, 0)]);
    let layout =
        ReferenceLayout::build(&reference.as_view(), &sheet.layout_spec(), &MaskOptions::default())
            .unwrap();
    let model = DistortionModel::register(
        &reference.as_view(),
        &layout,
        &RegistrationParams::default(),
    )
    .unwrap();
    let answers = classify_fields(
        &reference.as_view(),
        &model,
        &layout,
        &FieldOptions::default(),
        &DarknessClassifier::default(),
    )
    .unwrap()
    .answers;

    let mut report = BatchReport::new(6, 4);
    report.push_registered("a.png", model.report().clone(), &answers);
    report.push_skipped("b.png", RegistrationError::InsufficientLandmarks {
        found: 1,
        required: 3,
    });
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["registered"], 1);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["tally"]["counts"][0][0], 1);
    assert_eq!(json["documents"][0]["selected"][0][0], 0);
    assert_eq!(
        json["documents"][0]["registration"]["landmarks"][0]["reference"]["x"],
        PixelCoordinate::new(70, 70).x()
    );
    assert!(json["documents"][1]["error"]
        .as_str()
        .unwrap()
        .contains("landmark"));
}
