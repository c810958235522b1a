//! Platform detection.
//!
//! Each candidate platform is probed by opening and immediately closing a
//! well-known system library through that platform's own loading primitive.
//! The first probe that succeeds wins. The result is cached for the process.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Platforms with a known dynamic loading primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Linux and other non-Apple Unix systems (`dlopen`).
    Unix,
    /// macOS (`dlopen` on `.dylib`).
    MacOsx,
    /// Windows desktop (`LoadLibrary`).
    WindowsDesktop,
    /// Universal Windows Platform (`LoadPackagedLibrary`).
    Uwp,
    /// No probe succeeded.
    Unknown,
}

impl Platform {
    /// Returns the platform name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unix => "unix",
            Self::MacOsx => "macosx",
            Self::WindowsDesktop => "windows-desktop",
            Self::Uwp => "uwp",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true unless this is [`Platform::Unknown`].
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A platform probe: returns true if the platform's loader works here.
pub type Probe = fn() -> bool;

/// Probes in priority order.
pub const DEFAULT_PROBES: [(Platform, Probe); 4] = [
    (Platform::Unix, probe_unix),
    (Platform::MacOsx, probe_macosx),
    (Platform::WindowsDesktop, probe_windows_desktop),
    (Platform::Uwp, probe_uwp),
];

/// Runs a fixed list of probes once and remembers the answer.
#[derive(Debug)]
pub struct PlatformDetector {
    probes: Vec<(Platform, Probe)>,
    detected: OnceLock<Platform>,
}

impl PlatformDetector {
    /// Creates a detector with the default probe order
    /// (Unix, MacOSX, WindowsDesktop, UWP).
    #[must_use]
    pub fn new() -> Self {
        Self::with_probes(DEFAULT_PROBES.to_vec())
    }

    /// Creates a detector with a custom probe list, tried front to back.
    #[must_use]
    pub fn with_probes(probes: Vec<(Platform, Probe)>) -> Self {
        Self {
            probes,
            detected: OnceLock::new(),
        }
    }

    /// Returns the detected platform, probing only on the first call.
    pub fn detect(&self) -> Platform {
        *self.detected.get_or_init(|| self.probe())
    }

    /// Returns the cached result without probing.
    #[must_use]
    pub fn cached(&self) -> Option<Platform> {
        self.detected.get().copied()
    }

    fn probe(&self) -> Platform {
        for (platform, probe) in &self.probes {
            if probe() {
                tracing::info!(platform = %platform, "detected dynamic loading platform");
                return *platform;
            }
            tracing::debug!(platform = %platform, "platform probe failed");
        }
        tracing::warn!("no platform probe succeeded");
        Platform::Unknown
    }
}

impl Default for PlatformDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Detects the host platform once per process.
///
/// Repeated calls return the cached value without re-probing.
pub fn detect() -> Platform {
    static DETECTOR: OnceLock<PlatformDetector> = OnceLock::new();
    DETECTOR.get_or_init(PlatformDetector::new).detect()
}

fn probe_unix() -> bool {
    #[cfg(all(unix, not(target_vendor = "apple")))]
    {
        crate::unix::probe()
    }
    #[cfg(not(all(unix, not(target_vendor = "apple"))))]
    {
        false
    }
}

fn probe_macosx() -> bool {
    #[cfg(target_vendor = "apple")]
    {
        crate::macos::probe()
    }
    #[cfg(not(target_vendor = "apple"))]
    {
        false
    }
}

fn probe_windows_desktop() -> bool {
    #[cfg(windows)]
    {
        crate::windows::probe_desktop()
    }
    #[cfg(not(windows))]
    {
        false
    }
}

fn probe_uwp() -> bool {
    #[cfg(windows)]
    {
        crate::windows::probe_uwp()
    }
    #[cfg(not(windows))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_platform_name() {
        assert_eq!(Platform::Unix.name(), "unix");
        assert_eq!(Platform::WindowsDesktop.to_string(), "windows-desktop");
        assert!(!Platform::Unknown.is_known());
        assert!(Platform::Uwp.is_known());
    }

    #[test]
    fn test_detect_is_memoized() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn counting() -> bool {
            CALLS.fetch_add(1, Ordering::SeqCst);
            true
        }

        let detector = PlatformDetector::with_probes(vec![(Platform::MacOsx, counting as Probe)]);
        assert_eq!(detector.cached(), None);
        for _ in 0..5 {
            assert_eq!(detector.detect(), Platform::MacOsx);
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(detector.cached(), Some(Platform::MacOsx));
    }

    #[test]
    fn test_first_successful_probe_wins() {
        static LATER: AtomicUsize = AtomicUsize::new(0);
        fn fails() -> bool {
            false
        }
        fn succeeds() -> bool {
            true
        }
        fn later() -> bool {
            LATER.fetch_add(1, Ordering::SeqCst);
            true
        }

        let detector = PlatformDetector::with_probes(vec![
            (Platform::Unix, fails as Probe),
            (Platform::WindowsDesktop, succeeds as Probe),
            (Platform::Uwp, later as Probe),
        ]);
        assert_eq!(detector.detect(), Platform::WindowsDesktop);
        assert_eq!(LATER.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_probes_fail_is_unknown() {
        fn fails() -> bool {
            false
        }
        let detector = PlatformDetector::with_probes(vec![
            (Platform::Unix, fails as Probe),
            (Platform::Uwp, fails as Probe),
        ]);
        assert_eq!(detector.detect(), Platform::Unknown);
        assert_eq!(detector.detect(), Platform::Unknown);
    }

    #[test]
    fn test_default_probe_order() {
        let order: Vec<Platform> = DEFAULT_PROBES.iter().map(|(p, _)| *p).collect();
        assert_eq!(
            order,
            vec![
                Platform::Unix,
                Platform::MacOsx,
                Platform::WindowsDesktop,
                Platform::Uwp
            ]
        );
    }

    #[test]
    fn test_global_detect_is_stable() {
        assert_eq!(detect(), detect());
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn test_detect_on_linux_is_unix() {
        assert_eq!(detect(), Platform::Unix);
    }
}
