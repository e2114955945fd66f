use crate::foundation::error::{ArchilumeError, ArchilumeResult};
use crate::process::{CommandRunner, CommandSpec};

/// Cache size used when VRAM cannot be queried.
pub const FALLBACK_CACHE_BYTES: u64 = 1_073_741_824;

/// Upper bound of the CUDA JIT cache.
pub const MAX_CACHE_MB: u64 = 16_384;

const CACHE_FRACTION: f64 = 0.3;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// `nvidia-smi` query for total memory of each GPU, in MB, one per line.
pub fn vram_query() -> CommandSpec {
    CommandSpec::new("nvidia-smi")
        .args([
            "--query-gpu=memory.total",
            "--format=csv,nounits,noheader",
        ])
        .capture_stdout()
}

/// Total VRAM in MB of the first GPU listed.
pub fn parse_vram_mb(stdout: &str) -> ArchilumeResult<u64> {
    let first = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ArchilumeError::parse("nvidia-smi printed no GPUs"))?;
    first
        .parse::<u64>()
        .map_err(|e| ArchilumeError::parse(format!("unexpected VRAM value '{first}': {e}")))
}

/// 30% of VRAM, capped at 16 GiB, in bytes.
pub fn cache_bytes_for_vram(vram_mb: u64) -> u64 {
    let mb = ((vram_mb as f64 * CACHE_FRACTION).floor() as u64).min(MAX_CACHE_MB);
    mb * BYTES_PER_MB
}

/// CUDA environment handed to every Accelerad process.
pub fn cuda_env(cache_bytes: u64) -> Vec<(String, String)> {
    vec![
        ("CUDA_CACHE_MAXSIZE".to_string(), cache_bytes.to_string()),
        ("CUDA_CACHE_DISABLE".to_string(), "0".to_string()),
        ("CUDA_FORCE_PTX_JIT".to_string(), "1".to_string()),
    ]
}

/// Query VRAM through `runner` and size the CUDA cache.
///
/// Returns the environment and a warning when the query failed and the fallback size is used.
pub fn detect_cuda_env(runner: &dyn CommandRunner) -> (Vec<(String, String)>, Option<String>) {
    match query_cache_bytes(runner) {
        Ok(bytes) => {
            tracing::info!(
                cache_mb = bytes / BYTES_PER_MB,
                "CUDA cache sized from VRAM"
            );
            (cuda_env(bytes), None)
        }
        Err(e) => {
            let warning = format!(
                "could not determine VRAM ({e}); using {FALLBACK_CACHE_BYTES} byte CUDA cache"
            );
            tracing::warn!("{warning}");
            (cuda_env(FALLBACK_CACHE_BYTES), Some(warning))
        }
    }
}

fn query_cache_bytes(runner: &dyn CommandRunner) -> ArchilumeResult<u64> {
    let out = runner.run_checked(&vram_query())?;
    let vram = parse_vram_mb(&out.stdout_text())?;
    Ok(cache_bytes_for_vram(vram))
}

#[cfg(test)]
#[path = "../../tests/unit/render/gpu.rs"]
mod tests;
