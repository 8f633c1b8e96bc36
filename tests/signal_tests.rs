/*
 * Signal handling tests for gpio-fan-rpm
 *
 * Kept in their own test binary: the interrupt handler can only be
 * installed once per process.
 */

use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use gfr_core::StopFlag;
use gpio_fan_rpm::app::install_interrupt_handler;

#[test]
fn test_sigterm_sets_stop_flag() {
    let stop = StopFlag::new();
    install_interrupt_handler(&stop);

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let started = Instant::now();
    while !stop.is_set() && started.elapsed() < Duration::from_secs(2) {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(stop.is_set());
}
