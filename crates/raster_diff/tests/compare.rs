use raster_diff::{ComparisonError, ImageComparator, Raster, RasterSize};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn paint_rect(raster: &mut Raster, left: u32, top: u32, width: u32, height: u32, rgba: [u8; 4]) {
    for y_pos in top..top + height {
        for x_pos in left..left + width {
            raster.set_pixel(x_pos, y_pos, rgba);
        }
    }
}

#[test]
fn identical_rasters_have_zero_ratio() {
    let reference = Raster::filled(40, 30, WHITE);
    let candidate = reference.clone();

    let result = ImageComparator::default()
        .compare(&reference, &candidate)
        .unwrap();

    assert!(result.matched);
    assert_eq!(result.diff_ratio, 0.0);
    assert_eq!(result.diff_pixel_count, 0);
    assert_eq!(result.overlap_pixel_count, 1200);
    assert!(!result.size_mismatch());
}

#[test]
fn rectangular_region_ratio_is_area_over_overlap() {
    let reference = Raster::filled(100, 50, WHITE);
    let mut candidate = reference.clone();
    paint_rect(&mut candidate, 10, 5, 20, 10, BLACK);

    let result = ImageComparator::default()
        .compare(&reference, &candidate)
        .unwrap();

    assert_eq!(result.diff_pixel_count, 200);
    assert!((result.diff_ratio - 200.0 / 5000.0).abs() < 1e-12);
    assert!(!result.matched);
}

#[test]
fn mismatched_sizes_use_overlap_only() {
    // Candidate is larger; the extra area is entirely different but outside the overlap.
    let reference = Raster::filled(20, 10, WHITE);
    let mut candidate = Raster::filled(30, 25, BLACK);
    paint_rect(&mut candidate, 0, 0, 20, 10, WHITE);
    paint_rect(&mut candidate, 0, 0, 5, 2, BLACK);

    let result = ImageComparator::default()
        .compare(&reference, &candidate)
        .unwrap();

    assert_eq!(result.overlap_width, 20);
    assert_eq!(result.overlap_height, 10);
    assert_eq!(result.overlap_pixel_count, 200);
    assert_eq!(result.diff_pixel_count, 10);
    assert!((result.diff_ratio - 0.05).abs() < 1e-12);
    assert!(result.size_mismatch());
    assert_eq!(result.reference_size, RasterSize { width: 20, height: 10 });
    assert_eq!(result.candidate_size, RasterSize { width: 30, height: 25 });
}

#[test]
fn overlap_takes_elementwise_minimum() {
    let reference = Raster::filled(50, 8, WHITE);
    let candidate = Raster::filled(12, 40, WHITE);

    let result = ImageComparator::default()
        .compare(&reference, &candidate)
        .unwrap();

    assert_eq!((result.overlap_width, result.overlap_height), (12, 8));
    assert_eq!(result.diff_raster.size(), RasterSize { width: 12, height: 8 });
}

#[test]
fn zero_area_raster_is_an_error() {
    let reference = Raster::filled(0, 10, WHITE);
    let candidate = Raster::filled(10, 10, WHITE);

    let err = ImageComparator::default()
        .compare(&reference, &candidate)
        .unwrap_err();

    assert!(matches!(err, ComparisonError::EmptyOverlap { .. }));

    let flat = Raster::filled(10, 0, WHITE);
    assert!(ImageComparator::default().compare(&candidate, &flat).is_err());
}

#[test]
fn tolerance_absorbs_antialiasing_noise() {
    let reference = Raster::filled(10, 10, [120, 120, 120, 255]);
    let mut candidate = reference.clone();
    paint_rect(&mut candidate, 0, 0, 10, 10, [135, 110, 125, 255]);

    let result = ImageComparator::default()
        .compare(&reference, &candidate)
        .unwrap();
    assert_eq!(result.diff_pixel_count, 0);

    let strict = ImageComparator::new(0.001, 0);
    let result = strict.compare(&reference, &candidate).unwrap();
    assert_eq!(result.diff_pixel_count, 100);
}

#[test]
fn match_threshold_is_strict() {
    // 1 differing pixel out of 1000 is exactly 0.1%, which is not below the threshold.
    let reference = Raster::filled(100, 10, WHITE);
    let mut candidate = reference.clone();
    candidate.set_pixel(3, 3, BLACK);

    let result = ImageComparator::default()
        .compare(&reference, &candidate)
        .unwrap();
    assert!((result.diff_ratio - 0.001).abs() < 1e-12);
    assert!(!result.matched);

    let lenient = ImageComparator::default().with_match_threshold(0.01);
    assert!(lenient.compare(&reference, &candidate).unwrap().matched);
}

#[test]
fn diff_raster_marks_differing_pixels() {
    let reference = Raster::filled(4, 4, WHITE);
    let mut candidate = reference.clone();
    candidate.set_pixel(2, 1, BLACK);

    let result = ImageComparator::default()
        .compare(&reference, &candidate)
        .unwrap();

    assert_eq!(result.diff_raster.pixel(2, 1), Some([255, 0, 0, 255]));
    assert_eq!(result.diff_raster.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn malformed_buffer_is_rejected() {
    let err = Raster::new(4, 4, vec![0; 10]).unwrap_err();
    assert_eq!(
        err,
        ComparisonError::MalformedRaster {
            expected: 64,
            actual: 10
        }
    );
}

#[test]
fn png_bytes_decode_back_to_the_same_pixels() {
    let mut raster = Raster::filled(6, 3, WHITE);
    raster.set_pixel(5, 2, [10, 20, 30, 255]);

    let png = raster.encode_png().unwrap();
    let decoded = Raster::decode_png(&png).unwrap();

    assert_eq!(decoded, raster);
    assert!(matches!(
        Raster::decode_png(b"not a png"),
        Err(ComparisonError::Decode(_))
    ));
}
