use super::*;
use crate::process::RecordingRunner;

#[test]
fn cache_is_thirty_percent_of_vram_capped() {
    assert_eq!(cache_bytes_for_vram(8192), 2457 * 1024 * 1024);
    assert_eq!(cache_bytes_for_vram(24576), 7372 * 1024 * 1024);
    assert_eq!(cache_bytes_for_vram(81920), 16384 * 1024 * 1024);
    assert_eq!(cache_bytes_for_vram(0), 0);
}

#[test]
fn parse_takes_first_gpu() {
    assert_eq!(parse_vram_mb("12288\n8192\n").unwrap(), 12288);
    assert_eq!(parse_vram_mb("\n  6144 \n").unwrap(), 6144);
    assert!(parse_vram_mb("").is_err());
    assert!(parse_vram_mb("N/A").is_err());
}

#[test]
fn env_has_three_cuda_vars() {
    let env = cuda_env(42);
    assert_eq!(
        env,
        vec![
            ("CUDA_CACHE_MAXSIZE".to_string(), "42".to_string()),
            ("CUDA_CACHE_DISABLE".to_string(), "0".to_string()),
            ("CUDA_FORCE_PTX_JIT".to_string(), "1".to_string()),
        ]
    );
}

#[test]
fn detect_uses_query_output() {
    let runner = RecordingRunner::new().with_stdout("nvidia-smi", "10000\n");
    let (env, warning) = detect_cuda_env(&runner);
    assert!(warning.is_none());
    assert_eq!(env[0].1, (3000u64 * 1024 * 1024).to_string());
    assert_eq!(runner.count_program("nvidia-smi"), 1);
}

#[test]
fn detect_falls_back_when_query_fails() {
    let runner = RecordingRunner::new().fail_when(|s| s.program_name() == "nvidia-smi");
    let (env, warning) = detect_cuda_env(&runner);
    assert!(warning.unwrap().contains("could not determine VRAM"));
    assert_eq!(env[0].1, FALLBACK_CACHE_BYTES.to_string());
}

#[test]
fn detect_falls_back_on_garbage() {
    let runner = RecordingRunner::new().with_stdout("nvidia-smi", "No devices were found");
    let (env, warning) = detect_cuda_env(&runner);
    assert!(warning.is_some());
    assert_eq!(env[0].1, "1073741824");
}
