use super::*;

#[test]
fn resolution_bounds_are_inclusive() {
    assert!(validate_resolution(128).is_ok());
    assert!(validate_resolution(8192).is_ok());
    assert!(matches!(
        validate_resolution(127),
        Err(ArchilumeError::Validation(_))
    ));
    assert!(validate_resolution(8193).is_err());
    assert!(validate_resolution(0).is_err());
}

#[test]
fn backend_defaults_and_parse() {
    assert_eq!(RenderBackend::default(), RenderBackend::Gpu);
    assert_eq!(RenderBackend::Gpu.default_threads(), 1);
    assert_eq!(RenderBackend::Cpu.default_threads(), 2);
    assert_eq!("CPU".parse::<RenderBackend>().unwrap(), RenderBackend::Cpu);
    assert!("opencl".parse::<RenderBackend>().is_err());
}

#[test]
fn thread_override_ignores_zero() {
    let mut opts = BatchRenderOpts::new("s", QualityPreset::lookup("fast").unwrap());
    assert_eq!(opts.effective_threads(), 1);
    opts.threads = Some(0);
    assert_eq!(opts.effective_threads(), 1);
    opts.backend = RenderBackend::Cpu;
    assert_eq!(opts.effective_threads(), 2);
    opts.threads = Some(8);
    assert_eq!(opts.effective_threads(), 8);
}

#[test]
fn discover_sorts_and_filters_view_files() {
    let dir = tempfile::tempdir().unwrap();
    for f in ["plan_L02.vp", "plan_L00.vp", "notes.txt", "plan_L01.vp"] {
        std::fs::write(dir.path().join(f), "rvu").unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.vp")).unwrap();

    let names: Vec<_> = discover_views(dir.path(), None)
        .unwrap()
        .iter()
        .map(|p| stem_of(p))
        .collect();
    assert_eq!(names, ["plan_L00", "plan_L01", "plan_L02"]);

    let one = discover_views(dir.path(), Some("plan_L01.vp")).unwrap();
    assert_eq!(one, vec![dir.path().join("plan_L01.vp")]);
}

#[test]
fn discover_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        discover_views(dir.path(), None),
        Err(ArchilumeError::Validation(_))
    ));
    assert!(matches!(
        discover_views(dir.path(), Some("missing")),
        Err(ArchilumeError::NotFound { .. })
    ));
    assert!(matches!(
        discover_views(&dir.path().join("nope"), None),
        Err(ArchilumeError::NotFound { .. })
    ));
}

#[test]
fn report_counts_outcomes() {
    let view = |name: &str, outcome| ViewReport {
        view: name.to_string(),
        image: PathBuf::from(format!("{name}.hdr")),
        outcome,
        warnings: Vec::new(),
        elapsed: Duration::ZERO,
    };
    let report = BatchReport {
        scene: "s".to_string(),
        views: vec![
            view("a", ViewOutcome::Skipped),
            view("b", ViewOutcome::Rendered { filtered: None }),
            view(
                "c",
                ViewOutcome::Failed {
                    code: Some(1),
                    message: "boom".to_string(),
                },
            ),
        ],
        ..BatchReport::default()
    };
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.rendered(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failed_views(), ["c"]);

    let json = serde_json::to_value(&report.views[2].outcome).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["code"], 1);
}
