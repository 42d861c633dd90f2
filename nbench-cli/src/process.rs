//! Process controls
//!
//! Reduce scheduling noise before benchmarks run. Threads spawned afterwards
//! (background samplers included) inherit both the affinity mask and the
//! priority.

/// Nice value requested by [`raise_priority`]
pub const HIGH_PRIORITY_NICE: i32 = -10;

/// Pin the calling thread to a specific core.
///
/// Called before any benchmark thread exists, so the whole run stays on
/// that core and avoids core migrations.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    if cpu >= libc::CPU_SETSIZE as usize {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("cpu index {cpu} out of range"),
        ));
    }

    // SAFETY: an all-zero cpu_set_t is a valid empty set, and the pointer
    // handed to sched_setaffinity is valid for the stated size.
    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// CPU affinity is not supported on this platform; does nothing
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    tracing::debug!("CPU pinning not supported on this platform");
    Ok(())
}

/// Lower the process nice value to [`HIGH_PRIORITY_NICE`].
///
/// Usually needs elevated privileges; the error is returned, not swallowed.
#[cfg(unix)]
pub fn raise_priority() -> Result<(), std::io::Error> {
    // SAFETY: setpriority has no memory-safety preconditions.
    let result = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, HIGH_PRIORITY_NICE) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

/// Scheduling priority is not supported on this platform; does nothing
#[cfg(not(unix))]
pub fn raise_priority() -> Result<(), std::io::Error> {
    tracing::debug!("priority control not supported on this platform");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_pin_rejects_out_of_range_cpu() {
        let err = pin_to_cpu(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_pin_on_worker_thread() {
        // Pinning a scratch thread leaves the test harness threads alone.
        std::thread::spawn(|| {
            let cpu = unsafe { libc::sched_getcpu() };
            if cpu >= 0 {
                pin_to_cpu(cpu as usize).unwrap();
            }
        })
        .join()
        .unwrap();
    }
}
