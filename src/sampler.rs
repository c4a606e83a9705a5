use std::path::Path;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

/// Assumed total when the physical-memory lookup fails. A documented
/// approximation, not a silent bug: usage is still rendered, just against
/// an 8 GB baseline.
const ASSUMED_TOTAL_MEMORY_MB: f32 = 8192.0;

/// Memory reading in megabytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemorySample {
    pub used_mb: f32,
    pub total_mb: f32,
}

impl MemorySample {
    /// Used percentage, 0 when the total is unknown.
    pub fn percent(&self) -> f32 {
        if self.total_mb > 0.0 {
            self.used_mb / self.total_mb * 100.0
        } else {
            0.0
        }
    }
}

/// Storage reading for the designated volume, in bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StorageSample {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl StorageSample {
    /// Used percentage, 0 when the total is unknown.
    pub fn percent(&self) -> f64 {
        if self.total_bytes > 0 {
            self.used_bytes as f64 / self.total_bytes as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// One instantaneous reading of host utilization.
///
/// Each field is independently `None` when its probe fails; a partial
/// sample is valid and is rendered as "unavailable" for just that field.
/// `None` is distinct from zero: zero means "no usage", `None` means
/// "no reading".
#[derive(Clone, Debug)]
pub struct Sample {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    /// Global processor utilization in [0, 100]. The first reading after
    /// sampler creation is a warm-up artifact (commonly near zero) and
    /// must not be treated as a fault.
    pub cpu_percent: Option<f32>,
    pub memory: Option<MemorySample>,
    pub storage: Option<StorageSample>,
}

/// The volume whose usage the system widget displays.
fn designated_mount() -> &'static Path {
    if cfg!(windows) {
        Path::new("C:\\")
    } else {
        Path::new("/")
    }
}

fn refresh_kind() -> RefreshKind {
    RefreshKind::new()
        .with_cpu(CpuRefreshKind::new().with_cpu_usage())
        .with_memory(MemoryRefreshKind::everything())
}

fn bytes_to_mb(bytes: u64) -> f32 {
    (bytes as f64 / (1024.0 * 1024.0)) as f32
}

/// `used = total - available`. A zero total falls back to the assumed
/// 8192 MB; total and available both zero means the probe itself failed
/// and the field is unavailable.
fn derive_memory(total_bytes: u64, available_bytes: u64) -> Option<MemorySample> {
    if total_bytes == 0 && available_bytes == 0 {
        log::debug!("memory probe returned nothing, marking unavailable");
        return None;
    }
    let total_mb = if total_bytes > 0 {
        bytes_to_mb(total_bytes)
    } else {
        log::debug!("total memory unknown, assuming {ASSUMED_TOTAL_MEMORY_MB} MB");
        ASSUMED_TOTAL_MEMORY_MB
    };
    let used_mb = (total_mb - bytes_to_mb(available_bytes)).max(0.0);
    Some(MemorySample { used_mb, total_mb })
}

/// A volume reporting zero total space is present but not ready; its
/// field is unavailable (not zero), leaving the other probes untouched.
fn derive_storage(total_bytes: u64, available_bytes: u64) -> Option<StorageSample> {
    if total_bytes == 0 {
        log::debug!("designated volume not ready, marking unavailable");
        return None;
    }
    Some(StorageSample {
        used_bytes: total_bytes.saturating_sub(available_bytes),
        total_bytes,
    })
}

/// Queries processor, memory, and storage utilization on demand.
///
/// Owns the sysinfo probe handles; CPU usage is computed from the delta
/// between refreshes, which is where the first-sample warm-up artifact
/// comes from. Probes are independently guarded so one failure never
/// aborts the others.
pub struct MetricsSampler {
    sys: System,
    disks: Disks,
}

impl MetricsSampler {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(refresh_kind());
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
        }
    }

    /// Take one reading. Synchronous; expected to complete well inside the
    /// tick interval.
    pub fn sample(&mut self) -> Sample {
        self.sys.refresh_specifics(refresh_kind());
        self.disks.refresh();

        Sample {
            timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
            cpu_percent: self.cpu_percent(),
            memory: self.memory(),
            storage: self.storage(),
        }
    }

    fn cpu_percent(&self) -> Option<f32> {
        let cpus = self.sys.cpus();
        if cpus.is_empty() {
            log::debug!("cpu probe returned no cores, marking unavailable");
            return None;
        }
        let sum: f32 = cpus.iter().map(|c| c.cpu_usage()).sum();
        Some(sum / cpus.len() as f32)
    }

    fn memory(&self) -> Option<MemorySample> {
        derive_memory(self.sys.total_memory(), self.sys.available_memory())
    }

    /// Unavailable (not zero) when the designated volume is absent or not
    /// ready; the other probes are unaffected.
    fn storage(&self) -> Option<StorageSample> {
        let mount = designated_mount();
        let Some(disk) = self.disks.iter().find(|d| d.mount_point() == mount) else {
            log::debug!("volume {} not mounted, marking unavailable", mount.display());
            return None;
        };
        derive_storage(disk.total_space(), disk.available_space())
    }
}

impl Default for MetricsSampler {
    fn default() -> Self {
        Self::new()
    }
}
