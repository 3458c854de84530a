use anyhow::{Result, bail};
use rayon::ThreadPoolBuilder;
use std::sync::Once;

use crate::census::TotalPopulationPolicy;
use crate::parallel::{Cutoffs, DEFAULT_GRID_CUTOFF, DEFAULT_POINT_CUTOFF};

/// A positive integer read from the environment, and where it came from.
struct EnvHint {
    value: usize,
    source: String,
}

fn parse_env_positive(keys: &[&str]) -> Option<EnvHint> {
    keys.iter().find_map(|&key| {
        let value = std::env::var(key).ok()?.trim().parse::<usize>().ok()?;
        (value > 0).then(|| EnvHint {
            value,
            source: key.to_string(),
        })
    })
}

fn detect_thread_count() -> EnvHint {
    const ENV_HINTS: [&str; 4] = [
        "POPQ_THREADS",
        "RAYON_NUM_THREADS",
        "SLURM_CPUS_PER_TASK",
        "OMP_NUM_THREADS",
    ];

    parse_env_positive(&ENV_HINTS).unwrap_or_else(|| EnvHint {
        value: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .max(1),
        source: "available_parallelism".to_string(),
    })
}

/// Size the global rayon pool once; every fork-join split runs on it.
pub fn configure_thread_pool() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let threads = detect_thread_count();
        match ThreadPoolBuilder::new()
            .num_threads(threads.value)
            .thread_name(|i| format!("popq-worker-{i}"))
            .build_global()
        {
            Ok(_) => {
                log::info!("rayon pool = {} threads (hint: {})", threads.value, threads.source);
            }
            Err(err) => {
                log::warn!("failed to configure rayon pool ({err}); continuing with default");
            }
        }
    });
}

/// `POPQ_POINT_CUTOFF` / `POPQ_GRID_CUTOFF`, defaults when unset or not positive.
pub fn cutoffs_from_env() -> Cutoffs {
    let points = parse_env_positive(&["POPQ_POINT_CUTOFF"]).map_or(DEFAULT_POINT_CUTOFF, |h| h.value);
    let cells = parse_env_positive(&["POPQ_GRID_CUTOFF"]).map_or(DEFAULT_GRID_CUTOFF, |h| h.value);
    Cutoffs { points, cells }
}

pub fn total_policy_from_env() -> TotalPopulationPolicy {
    match std::env::var("POPQ_TOTAL_POLICY") {
        Ok(raw) if !raw.trim().is_empty() => raw.parse().unwrap_or_else(|err| {
            log::warn!("{err}; using default");
            TotalPopulationPolicy::default()
        }),
        _ => TotalPopulationPolicy::default(),
    }
}

// -------------------------------------------------------------------------------------
// Memory tracking
// -------------------------------------------------------------------------------------

const MB: u64 = 1024 * 1024;

pub fn memory_budget_bytes() -> Option<u64> {
    let raw = std::env::var("POPQ_MAX_RSS_MB").ok()?;
    raw.trim().parse::<u64>().ok().map(|v| v.saturating_mul(MB))
}

fn current_rss_bytes() -> Option<u64> {
    let contents = std::fs::read_to_string("/proc/self/statm").ok()?;
    let mut parts = contents.split_whitespace();
    let _total = parts.next()?;
    let resident_pages: u64 = parts.next()?.parse().ok()?;
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return None;
    }
    Some(resident_pages.saturating_mul(page_size as u64))
}

/// Log resident memory after a phase and fail if it is over `budget`.
pub fn report_memory(phase: &str, budget: Option<u64>) -> Result<()> {
    let Some(rss) = current_rss_bytes() else {
        return Ok(());
    };
    match budget {
        Some(limit) => {
            log::info!("{phase}: rss={} MiB (limit {} MiB)", rss / MB, limit / MB);
            if rss > limit {
                bail!(
                    "RSS {} MiB exceeded limit {} MiB after {phase} (set via POPQ_MAX_RSS_MB)",
                    rss / MB,
                    limit / MB
                );
            }
        }
        None => log::info!("{phase}: rss={} MiB", rss / MB),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generous_budget_passes() {
        assert!(report_memory("test", Some(u64::MAX)).is_ok());
        assert!(report_memory("test", None).is_ok());
    }

    #[test]
    fn env_hint_takes_first_positive_key() {
        // names used by no other test
        unsafe {
            std::env::set_var("POPQ_TEST_HINT_ZERO", "0");
            std::env::set_var("POPQ_TEST_HINT_SET", " 6 ");
        }
        let hint = parse_env_positive(&["POPQ_TEST_HINT_UNSET", "POPQ_TEST_HINT_ZERO", "POPQ_TEST_HINT_SET"]).unwrap();
        assert_eq!(hint.value, 6);
        assert_eq!(hint.source, "POPQ_TEST_HINT_SET");
        assert!(parse_env_positive(&["POPQ_TEST_HINT_UNSET"]).is_none());
    }

    #[test]
    fn cutoffs_are_positive() {
        let c = cutoffs_from_env();
        assert!(c.points >= 1 && c.cells >= 1);
    }
}
