//! System-wide monotonic timestamps.
//!
//! `std::time::Instant` cannot cross a process boundary, so producers stamp
//! messages with `CLOCK_MONOTONIC` seconds instead. The clock is shared by all
//! processes on the host, which makes stamps from different producers
//! comparable without relying on wall-clock time.

/// Seconds since an unspecified, host-wide monotonic epoch.
pub fn monotonic_secs() -> f64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec and CLOCK_MONOTONIC is
    // always available on Linux.
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    if rc != 0 {
        return 0.0;
    }
    ts.tv_sec as f64 + ts.tv_nsec as f64 / 1_000_000_000.0
}
