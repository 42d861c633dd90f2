//! High-Precision Timing
//!
//! Cycle counter access (RDTSCP on x86_64, CNTVCT_EL0 on AArch64) and the
//! per-trial run clock shared by the work and sampler threads.

use std::time::{Duration, Instant};

// ─── Inline cycle counter helpers ────────────────────────────────────────────

/// Read the CPU cycle/tick counter (platform-specific).
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub(crate) fn read_cycles() -> u64 {
    // SAFETY: RDTSCP is available on all x86_64 CPUs since ~2006.
    // It waits for all prior instructions to complete before reading the counter.
    unsafe {
        let mut _aux: u32 = 0;
        std::arch::x86_64::__rdtscp(&mut _aux)
    }
}

/// Read the virtual counter timer on AArch64 (comparable to x86 TSC).
#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub(crate) fn read_cycles() -> u64 {
    let cnt: u64;
    // SAFETY: CNTVCT_EL0 is accessible from EL0 (userspace) on all
    // AArch64 implementations.
    unsafe {
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt, options(nostack, nomem));
    }
    cnt
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
pub(crate) fn read_cycles() -> u64 {
    0
}

/// Whether this platform provides real cycle counters.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

// ─── RunClock ────────────────────────────────────────────────────────────────

/// Monotonic clock started at the beginning of a trial.
///
/// Bucket samples are stamped with [`RunClock::elapsed_nanos`]; the clock is
/// `Copy` so the sampler thread reads the same origin as the caller.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    origin: Instant,
}

impl RunClock {
    /// Start a clock now
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Time since the clock started
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Nanoseconds since the clock started
    #[inline(always)]
    pub fn elapsed_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_clock_elapsed() {
        let clock = RunClock::start();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = clock.elapsed();

        // Should be at least 10ms
        assert!(elapsed >= Duration::from_millis(10));
        // Should be less than a second (accounting for scheduling)
        assert!(elapsed < Duration::from_secs(1));
        assert!(clock.elapsed_nanos() >= 10_000_000);
    }

    #[test]
    fn test_cycle_counter() {
        if HAS_CYCLE_COUNTER {
            let a = read_cycles();
            let b = read_cycles();
            assert!(b >= a, "cycle counter should be monotonic");
        }
    }
}
