use std::time::Instant;

use once_cell::sync::Lazy;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Nanoseconds elapsed since a process-local epoch captured on first use.
/// Always at least 1, so 0 stays free to mean "never" / "unset" in expiry
/// stamps and lock session tokens. Values are only comparable within one
/// process.
pub fn monotonic_ns() -> i64 {
    let ns = EPOCH.elapsed().as_nanos();
    i64::try_from(ns).unwrap_or(i64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_returns_zero() {
        assert!(monotonic_ns() >= 1);
    }

    #[test]
    fn advances() {
        let a = monotonic_ns();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = monotonic_ns();
        assert!(b > a);
    }
}
