use super::*;

#[test]
fn records_calls_in_order_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a.hdr");
    let runner = RecordingRunner::new();

    runner.run(&CommandSpec::new("oconv").arg("-i")).unwrap();
    runner
        .run(&CommandSpec::new("rpict").stdout_to(&out))
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].program_name(), "oconv");
    assert_eq!(calls[1].program_name(), "rpict");
    assert_eq!(runner.count_program("rpict"), 1);
    assert!(!out.exists());
}

#[test]
fn materializing_writes_stdout_and_products() {
    let dir = tempfile::tempdir().unwrap();
    let hdr = dir.path().join("img").join("a.hdr");
    let amb = dir.path().join("img").join("a.amb");
    let runner = RecordingRunner::materializing();

    let out = runner
        .run(&CommandSpec::new("rpict").stdout_to(&hdr).produces(&amb))
        .unwrap();
    assert!(out.success());
    assert_eq!(std::fs::read(&hdr).unwrap(), PLACEHOLDER_CONTENT);
    assert!(amb.exists());
}

#[test]
fn failures_truncate_stdout_but_skip_products() {
    let dir = tempfile::tempdir().unwrap();
    let hdr = dir.path().join("a.hdr");
    let amb = dir.path().join("a.amb");
    let runner = RecordingRunner::materializing().fail_when(|spec| spec.program_name() == "rpict");

    let out = runner
        .run(&CommandSpec::new("rpict").stdout_to(&hdr).produces(&amb))
        .unwrap();
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("simulated failure"));
    assert_eq!(std::fs::metadata(&hdr).unwrap().len(), 0);
    assert!(!amb.exists());
}

#[test]
fn canned_stdout_is_returned_for_captures_only() {
    let runner = RecordingRunner::new().with_stdout("nvidia-smi", "8192\n");

    let captured = runner
        .run(&CommandSpec::new("nvidia-smi").capture_stdout())
        .unwrap();
    assert_eq!(captured.stdout_text(), "8192\n");

    let inherited = runner.run(&CommandSpec::new("nvidia-smi")).unwrap();
    assert!(inherited.stdout.is_empty());
}

#[test]
fn run_checked_surfaces_simulated_failures() {
    let runner = RecordingRunner::new().fail_when(|_| true);
    let err = runner.run_checked(&CommandSpec::new("obj2rad")).unwrap_err();
    assert!(err.to_string().contains("obj2rad"));
    assert_eq!(runner.call_count(), 1);
}
