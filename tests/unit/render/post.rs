use super::*;
use crate::process::{RecordingRunner, StdoutTarget};

fn checker(w: u32, h: u32) -> Rgb32FImage {
    Rgb32FImage::from_fn(w, h, |x, y| {
        let v = if (x + y) % 2 == 0 { 1.0 } else { 3.0 };
        Rgb([v, v / 2.0, 0.5])
    })
}

#[test]
fn box_downsample_averages_blocks() {
    let out = box_downsample(&checker(4, 2));
    assert_eq!(out.dimensions(), (2, 1));
    for p in out.pixels() {
        assert_eq!(p.0, [2.0, 1.0, 0.5]);
    }
}

#[test]
fn box_downsample_drops_odd_edge() {
    let out = box_downsample(&checker(5, 3));
    assert_eq!(out.dimensions(), (2, 1));
    let tiny = box_downsample(&checker(1, 1));
    assert_eq!(tiny.dimensions(), (1, 1));
    assert_eq!(tiny.get_pixel(0, 0).0, [1.0, 0.5, 0.5]);
}

#[test]
fn native_filter_round_trips_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.hdr");
    let dst = dir.path().join("sub").join("a_filtered.hdr");
    write_hdr(&src, &checker(8, 4)).unwrap();

    assert_eq!(downsample_hdr(&src, &dst).unwrap(), (4, 2));
    let back = read_hdr(&dst).unwrap();
    assert_eq!(back.dimensions(), (4, 2));
    let p = back.get_pixel(0, 0).0;
    for (got, want) in p.iter().zip([2.0f32, 1.0, 0.5]) {
        assert!((got - want).abs() < 0.02, "{p:?}");
    }
}

#[test]
fn read_missing_hdr_is_not_found() {
    let err = read_hdr(Path::new("/definitely/missing.hdr")).unwrap_err();
    assert!(matches!(err, ArchilumeError::NotFound { .. }));
}

#[test]
fn pfilt_command_line() {
    let spec = pfilt_spec(
        Path::new("pfilt"),
        Path::new("img/a.hdr"),
        Path::new("img/a_filtered.hdr"),
        &[],
    );
    assert_eq!(spec.display_line(), "pfilt -1 -x /2 -y /2 img/a.hdr > img/a_filtered.hdr");
    assert_eq!(
        spec.stdout,
        StdoutTarget::File("img/a_filtered.hdr".into())
    );
}

#[test]
fn pfilt_failure_is_an_error() {
    let runner = RecordingRunner::new().fail_when(|s| s.program_name() == "pfilt");
    let err = apply_post_filter(
        PostFilter::Pfilt,
        &runner,
        Path::new("pfilt"),
        &[],
        Path::new("a.hdr"),
        Path::new("a_filtered.hdr"),
    )
    .unwrap_err();
    assert!(matches!(err, ArchilumeError::Process(_)));
}

#[test]
fn tone_map_applies_exposure_and_gamma() {
    assert_eq!(tone_map(0.0, 1.0), 0);
    assert_eq!(tone_map(1.0, 1.0), 255);
    assert_eq!(tone_map(10.0, 1.0), 255);
    assert_eq!(tone_map(0.5, 2.0), 255);
    // 0.5^(1/2.2) * 255 ≈ 186
    assert_eq!(tone_map(0.5, 1.0), 186);
}

#[test]
fn preview_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.hdr");
    let dst = dir.path().join("a.png");
    write_hdr(&src, &checker(4, 4)).unwrap();
    hdr_to_png(&src, &dst, -1.0).unwrap();
    let png = image::open(&dst).unwrap().into_rgb8();
    assert_eq!(png.dimensions(), (4, 4));
    // 1.0 at -1 stop is 0.5.
    assert_eq!(png.get_pixel(0, 0)[0], 186);
}

#[test]
fn post_filter_parses() {
    assert_eq!("PFILT".parse::<PostFilter>().unwrap(), PostFilter::Pfilt);
    assert_eq!("native".parse::<PostFilter>().unwrap(), PostFilter::Native);
    assert!("gauss".parse::<PostFilter>().is_err());
}

#[test]
fn merge_commands_sum_then_normalise() {
    let sum = pcomb_sum_spec(
        Path::new("pcomb"),
        Path::new("img/overcast.hdr"),
        Path::new("img/sun.hdr"),
        Path::new("img/sun_sum.hdr"),
        &[],
    );
    assert_eq!(
        sum.display_line(),
        "pcomb -e ro=ri(1)+ri(2);go=gi(1)+gi(2);bo=bi(1)+bi(2) img/overcast.hdr img/sun.hdr > img/sun_sum.hdr"
    );

    let exposure = pfilt_exposure_spec(
        Path::new("pfilt"),
        Path::new("img/sun_sum.hdr"),
        Path::new("img/sun_combined.hdr"),
        &[],
    );
    assert_eq!(exposure.args.len(), 2);
    assert_eq!(
        exposure.stdout,
        StdoutTarget::File("img/sun_combined.hdr".into())
    );
}
