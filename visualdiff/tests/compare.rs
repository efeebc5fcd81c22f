//! End-to-end tests for the file-level comparison contract.

use std::fs;
use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use visualdiff::{
    compare_files, highlight_mask, render_highlight, similarity_ratio, Comparison, DiffParams,
    HIGHLIGHT_COLOR,
};

/// Create a unique temp directory for test files.
fn temp_dir() -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("visualdiff-test-{}-{}", std::process::id(), id));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn write_solid_png(path: &std::path::Path, width: u32, height: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .expect("failed to write fixture");
}

#[test]
fn identical_images_yield_zero_and_write_a_blank_diff() {
    let dir = temp_dir();
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    let diff = dir.join("diff.png");

    write_solid_png(&a, 100, 100, [130, 140, 150, 255]);
    write_solid_png(&b, 100, 100, [130, 140, 150, 255]);

    let result = compare_files(&a, &b, &diff, &DiffParams::default()).expect("comparable inputs");
    assert_eq!(result, Comparison::Completed { mismatched: 0 });
    assert!(result.is_match());
    assert!(diff.exists(), "diff artifact must exist on the success path");

    // the persisted canvas shows no highlighted differences
    let saved = image::open(&diff).expect("artifact decodes").to_rgba8();
    assert_eq!(saved.dimensions(), (100, 100));
    assert!(saved.pixels().all(|p| p[3] == 0));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn fully_differing_images_count_every_pixel() {
    let dir = temp_dir();
    let a = dir.join("black.png");
    let b = dir.join("white.png");
    let diff = dir.join("diff.png");

    write_solid_png(&a, 100, 100, [0, 0, 0, 255]);
    write_solid_png(&b, 100, 100, [255, 255, 255, 255]);

    let result = compare_files(&a, &b, &diff, &DiffParams::default()).expect("comparable inputs");
    assert_eq!(result, Comparison::Completed { mismatched: 10000 });
    assert!(diff.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn incompatible_dimensions_report_the_variant_and_write_nothing() {
    let dir = temp_dir();
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    let diff = dir.join("diff.png");

    write_solid_png(&a, 100, 100, [0, 0, 0, 255]);
    write_solid_png(&b, 200, 150, [0, 0, 0, 255]);

    let result = compare_files(&a, &b, &diff, &DiffParams::default()).expect("decodable inputs");
    assert_eq!(
        result,
        Comparison::Incompatible {
            w1: 100,
            h1: 100,
            w2: 200,
            h2: 150
        }
    );
    assert_eq!(result.legacy_count(), 1);
    assert!(!diff.exists(), "no artifact on the incompatible path");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_input_propagates_a_decode_error() {
    let dir = temp_dir();
    let a = dir.join("missing.png");
    let b = dir.join("also-missing.png");
    let diff = dir.join("diff.png");

    let result = compare_files(&a, &b, &diff, &DiffParams::default());
    assert!(result.is_err(), "decode faults are hard failures");
    assert!(!diff.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn unwritable_diff_destination_propagates() {
    let dir = temp_dir();
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    // extension resolves to no known encoder
    let diff = dir.join("diff.notaformat");

    write_solid_png(&a, 10, 10, [1, 2, 3, 255]);
    write_solid_png(&b, 10, 10, [1, 2, 3, 255]);

    let result = compare_files(&a, &b, &diff, &DiffParams::default());
    assert!(result.is_err());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn mismatch_count_grows_with_divergence() {
    let dir = temp_dir();
    let a_path = dir.join("base.png");
    write_solid_png(&a_path, 20, 20, [0, 0, 0, 255]);

    let mut previous = 0u64;
    for (i, altered) in [10u32, 100, 300].iter().enumerate() {
        let b_path = dir.join(format!("variant-{i}.png"));
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        for n in 0..*altered {
            img.put_pixel(n % 20, n / 20, Rgba([255, 255, 255, 255]));
        }
        img.save(&b_path).expect("failed to write fixture");

        let diff = dir.join(format!("diff-{i}.png"));
        let result =
            compare_files(&a_path, &b_path, &diff, &DiffParams::default()).expect("comparable");
        let Comparison::Completed { mismatched } = result else {
            panic!("expected a completed pass");
        };
        assert!(mismatched >= previous, "count must be non-decreasing");
        assert!(mismatched > 0);
        previous = mismatched;
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn similarity_of_identical_images_is_exactly_one() {
    let img = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        200,
        150,
        Rgba([12, 34, 56, 255]),
    ));
    assert_eq!(similarity_ratio(&img, &img), 1.0);
}

#[test]
fn similarity_of_black_vs_white_is_near_zero() {
    let black =
        image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255])));
    let white = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        10,
        10,
        Rgba([255, 255, 255, 255]),
    ));
    let score = similarity_ratio(&black, &white);
    assert!(score < 1e-9, "got {score}");
}

#[test]
fn similarity_decreases_as_mismatch_count_increases() {
    let base =
        image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255])));

    let mut scores = Vec::new();
    for altered in [0u32, 40, 200, 400] {
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        for n in 0..altered {
            img.put_pixel(n % 20, n / 20, Rgba([255, 255, 255, 255]));
        }
        scores.push(similarity_ratio(
            &base,
            &image::DynamicImage::ImageRgba8(img),
        ));
    }

    assert_eq!(scores[0], 1.0);
    for pair in scores.windows(2) {
        assert!(pair[1] <= pair[0], "similarity must be non-increasing");
    }
    assert!(*scores.last().expect("non-empty") < 0.01);
}

#[test]
fn highlight_renderer_persists_and_returns_the_path() {
    let dir = temp_dir();
    let out = dir.join("highlight.png");

    let a = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        20,
        20,
        Rgba([100, 100, 100, 255]),
    ));
    let mut modified = RgbaImage::from_pixel(20, 20, Rgba([100, 100, 100, 255]));
    for y in 0..5 {
        for x in 0..10 {
            modified.put_pixel(x, y, Rgba([220, 220, 220, 255]));
        }
    }
    let b = image::DynamicImage::ImageRgba8(modified);

    let returned = render_highlight(&a, &b, &out).expect("writable destination");
    assert_eq!(returned, out);

    let saved = image::open(&out).expect("artifact decodes").to_rgba8();
    let painted = saved
        .pixels()
        .filter(|p| p[0] == HIGHLIGHT_COLOR[0] && p[1] == HIGHLIGHT_COLOR[1] && p[2] == HIGHLIGHT_COLOR[2])
        .count();
    assert_eq!(painted, 50);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn highlight_mask_follows_first_image_dimensions() {
    let a = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        100,
        100,
        Rgba([0, 0, 0, 255]),
    ));
    let b = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        200,
        150,
        Rgba([0, 0, 0, 255]),
    ));
    let mask = highlight_mask(&a, &b);
    assert_eq!(mask.dimensions(), (100, 100));
}
