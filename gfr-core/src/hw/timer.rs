//! Phase deadlines
//!
//! A measurement phase ends when an arm-once `timerfd` on `CLOCK_MONOTONIC`
//! expires. If the timer cannot be created or armed the deadline falls back
//! to comparing against the monotonic clock.

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, FromRawFd};
use std::time::{Duration, Instant};

use tracing::debug;

/// End of a timed phase
#[derive(Debug)]
pub enum PhaseDeadline {
    Timer(TimerFd),
    Clock(Instant),
}

impl PhaseDeadline {
    /// Arm a deadline `after` from now, preferring the OS timer
    pub fn arm(after: Duration) -> Self {
        match TimerFd::arm(after) {
            Ok(timer) => PhaseDeadline::Timer(timer),
            Err(e) => {
                debug!("timerfd unavailable ({}), using clock fallback", e);
                Self::clock(after)
            }
        }
    }

    /// Deadline based only on the monotonic clock
    pub fn clock(after: Duration) -> Self {
        PhaseDeadline::Clock(Instant::now() + after)
    }

    pub fn is_os_timer(&self) -> bool {
        matches!(self, PhaseDeadline::Timer(_))
    }

    /// Time left until expiry; zero once expired
    pub fn remaining(&mut self) -> Duration {
        match self {
            PhaseDeadline::Timer(timer) => match timer.remaining() {
                Ok(left) => left,
                Err(e) => {
                    // Timer became unusable mid-phase; treat it as expired
                    debug!("timerfd query failed: {}", e);
                    Duration::ZERO
                }
            },
            PhaseDeadline::Clock(end) => end.saturating_duration_since(Instant::now()),
        }
    }

    pub fn expired(&mut self) -> bool {
        match self {
            PhaseDeadline::Timer(timer) => {
                timer.fired() || timer.remaining().map(|left| left.is_zero()).unwrap_or(true)
            }
            PhaseDeadline::Clock(end) => Instant::now() >= *end,
        }
    }
}

/// Non-blocking one-shot timer file descriptor
#[derive(Debug)]
pub struct TimerFd {
    file: File,
    fired: bool,
}

impl TimerFd {
    pub fn arm(after: Duration) -> io::Result<Self> {
        // SAFETY: plain syscall, the result is checked below.
        let fd = unsafe {
            libc::timerfd_create(libc::CLOCK_MONOTONIC, libc::TFD_NONBLOCK | libc::TFD_CLOEXEC)
        };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: fd was just created and is owned by nobody else.
        let file = unsafe { File::from_raw_fd(fd) };

        // A zero it_value disarms a timerfd, so arm for at least 1ns.
        let after = after.max(Duration::from_nanos(1));
        let spec = libc::itimerspec {
            it_interval: libc::timespec { tv_sec: 0, tv_nsec: 0 },
            it_value: libc::timespec {
                tv_sec: after.as_secs() as libc::time_t,
                tv_nsec: after.subsec_nanos() as _,
            },
        };
        // SAFETY: fd is a valid timerfd and spec outlives the call.
        let ret = unsafe { libc::timerfd_settime(file.as_raw_fd(), 0, &spec, std::ptr::null_mut()) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { file, fired: false })
    }

    /// Consume the expiration count if the timer fired
    pub fn fired(&mut self) -> bool {
        if self.fired {
            return true;
        }
        let mut expirations = [0u8; 8];
        if let Ok(8) = self.file.read(&mut expirations) {
            self.fired = true;
        }
        self.fired
    }

    pub fn remaining(&self) -> io::Result<Duration> {
        if self.fired {
            return Ok(Duration::ZERO);
        }
        // SAFETY: itimerspec is plain old data.
        let mut spec: libc::itimerspec = unsafe { std::mem::zeroed() };
        // SAFETY: fd is a valid timerfd and spec is writable.
        let ret = unsafe { libc::timerfd_gettime(self.file.as_raw_fd(), &mut spec) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Duration::new(
            spec.it_value.tv_sec.max(0) as u64,
            spec.it_value.tv_nsec.max(0) as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_deadline_expires() {
        let mut d = PhaseDeadline::clock(Duration::from_millis(20));
        assert!(!d.is_os_timer());
        assert!(!d.expired());
        assert!(d.remaining() <= Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(30));
        assert!(d.expired());
        assert_eq!(d.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_timer_deadline_expires() {
        let mut d = PhaseDeadline::arm(Duration::from_millis(20));
        assert!(!d.expired());
        std::thread::sleep(Duration::from_millis(40));
        assert!(d.expired());
        // Stays expired after the expiration count was consumed
        assert!(d.expired());
        assert_eq!(d.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_zero_deadline_is_expired_quickly() {
        let mut d = PhaseDeadline::arm(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(5));
        assert!(d.expired());
    }
}
