//! Operating-system counters
//!
//! Fault and context-switch counts come from `getrusage`. Storage I/O bytes
//! come from `/proc/self/io`, whose handle is pooled: the running benchmark and
//! every collector hold a reference, disposal drops it, and the file closes
//! when the last one goes.

use super::MetricCollector;
use crate::metrics::ProcessMetric;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Default location of the per-process I/O accounting file
pub const PROC_SELF_IO: &str = "/proc/self/io";

/// Whose resource usage a [`UsageCollector`] reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageScope {
    /// The whole process
    Process,
    /// Only the calling thread (falls back to the process outside linux)
    Thread,
}

/// `getrusage`-backed fault and context-switch counter
#[derive(Debug)]
pub struct UsageCollector {
    metric: ProcessMetric,
    scope: UsageScope,
}

impl UsageCollector {
    /// Open a collector, or `None` when the metric is not a `getrusage` field or
    /// the platform has no `getrusage`
    pub fn open(metric: ProcessMetric, scope: UsageScope) -> Option<Self> {
        if matches!(metric, ProcessMetric::ReadBytes | ProcessMetric::WrittenBytes) {
            return None;
        }
        let collector = Self { metric, scope };
        collector.read().map(|_| collector)
    }

    /// Scope this collector reads
    pub fn scope(&self) -> UsageScope {
        self.scope
    }

    #[cfg(unix)]
    fn read(&self) -> Option<f64> {
        let who = match self.scope {
            UsageScope::Process => libc::RUSAGE_SELF,
            UsageScope::Thread => thread_usage_flag(),
        };

        let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
        // SAFETY: `usage` is a valid, writable rusage for the duration of the call
        let rc = unsafe { libc::getrusage(who, usage.as_mut_ptr()) };
        if rc != 0 {
            return None;
        }
        // SAFETY: getrusage succeeded, so the struct is initialized
        let usage = unsafe { usage.assume_init() };

        let value = match self.metric {
            ProcessMetric::MinorFaults => usage.ru_minflt,
            ProcessMetric::MajorFaults => usage.ru_majflt,
            ProcessMetric::VoluntaryContextSwitches => usage.ru_nvcsw,
            ProcessMetric::InvoluntaryContextSwitches => usage.ru_nivcsw,
            ProcessMetric::ReadBytes | ProcessMetric::WrittenBytes => return None,
        };
        Some(value as f64)
    }

    #[cfg(not(unix))]
    fn read(&self) -> Option<f64> {
        None
    }
}

#[cfg(target_os = "linux")]
fn thread_usage_flag() -> libc::c_int {
    libc::RUSAGE_THREAD
}

#[cfg(all(unix, not(target_os = "linux")))]
fn thread_usage_flag() -> libc::c_int {
    libc::RUSAGE_SELF
}

impl MetricCollector for UsageCollector {
    fn collect(&mut self) -> f64 {
        self.read().unwrap_or(0.0)
    }
}

/// Open handle on the I/O accounting file
#[derive(Debug)]
pub struct ProcfsIoFile {
    file: File,
}

impl ProcfsIoFile {
    fn read_field(&self, key: &str) -> io::Result<u64> {
        let mut buf = [0u8; 512];
        let len = self.read_from_start(&mut buf)?;
        let text = String::from_utf8_lossy(&buf[..len]);
        parse_io_field(&text, key)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("missing {key}")))
    }

    #[cfg(unix)]
    fn read_from_start(&self, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, 0)
    }

    #[cfg(not(unix))]
    fn read_from_start(&self, buf: &mut [u8]) -> io::Result<usize> {
        use std::io::{Read, Seek, SeekFrom};
        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))?;
        file.read(buf)
    }
}

fn parse_io_field(text: &str, key: &str) -> Option<u64> {
    text.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim() == key {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Shares one open I/O accounting file between collectors and across trials.
///
/// The pool itself holds no strong reference. A benchmark keeps the file open
/// between trials by holding an [`acquire`](Self::acquire)d handle while it runs.
#[derive(Debug)]
pub struct ProcfsIoPool {
    path: PathBuf,
    shared: Mutex<Weak<ProcfsIoFile>>,
    opened: AtomicUsize,
}

impl ProcfsIoPool {
    /// Pool over [`PROC_SELF_IO`]
    pub fn new() -> Self {
        Self::with_path(PROC_SELF_IO)
    }

    /// Pool over an arbitrary file with the same `key: value` layout
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            shared: Mutex::new(Weak::new()),
            opened: AtomicUsize::new(0),
        }
    }

    /// Take a reference to the shared handle, opening the file if nobody holds it
    pub fn acquire(&self) -> io::Result<Arc<ProcfsIoFile>> {
        let mut slot = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.upgrade() {
            return Ok(handle);
        }

        let handle = Arc::new(ProcfsIoFile {
            file: File::open(&self.path)?,
        });
        *slot = Arc::downgrade(&handle);
        self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(handle)
    }

    /// How many times the file has been opened
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Number of live references to the shared handle (0 when closed)
    pub fn references(&self) -> usize {
        self.shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .strong_count()
    }

    /// Whether the file is currently open
    pub fn is_open(&self) -> bool {
        self.references() > 0
    }
}

impl Default for ProcfsIoPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage bytes read or written by this process
#[derive(Debug)]
pub struct ProcfsIoCollector {
    key: &'static str,
    handle: Option<Arc<ProcfsIoFile>>,
}

impl ProcfsIoCollector {
    /// Open a collector for `ReadBytes` or `WrittenBytes` through `pool`
    pub fn open(metric: ProcessMetric, pool: &ProcfsIoPool) -> io::Result<Self> {
        let key = match metric {
            ProcessMetric::ReadBytes => "read_bytes",
            ProcessMetric::WrittenBytes => "write_bytes",
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{other:?} is not an I/O accounting field"),
                ));
            }
        };

        let handle = pool.acquire()?;
        // Fail now rather than read zero on every sample
        handle.read_field(key)?;

        Ok(Self {
            key,
            handle: Some(handle),
        })
    }
}

impl MetricCollector for ProcfsIoCollector {
    fn collect(&mut self) -> f64 {
        self.handle
            .as_ref()
            .and_then(|h| h.read_field(self.key).ok())
            .map(|v| v as f64)
            .unwrap_or(0.0)
    }

    fn dispose(&mut self) {
        self.handle.take();
    }
}
