use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Temp path unique to this process and call.
pub(crate) fn scratch_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("{}_{}_{}_{}", name, std::process::id(), nanos, seq))
}

#[cfg(test)]
mod tests {
    use super::scratch_path;

    #[test]
    fn scratch_paths_differ_per_call() {
        let a = scratch_path("swingtrade_scratch");
        let b = scratch_path("swingtrade_scratch");
        assert_ne!(a, b);
        assert!(a.starts_with(std::env::temp_dir()));
    }
}
