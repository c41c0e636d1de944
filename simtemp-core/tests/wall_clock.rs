//! Scenarios on the real timer thread and monotonic clock.

use std::thread;
use std::time::{Duration, Instant};

use simtemp_core::prelude::*;
use simtemp_core::selftest::{default_budget, run_alert_selftest};

#[test]
fn default_period_produces_two_or_three_updates_in_two_and_a_half_seconds() {
    let device = SimTemp::new();
    device.start(Settings::default()).unwrap();
    thread::sleep(Duration::from_millis(2_500));
    let updates = device.stats().unwrap().updates;
    device.stop();
    assert!((2..=3).contains(&updates), "updates={updates}");
}

#[test]
fn minimum_threshold_is_priority_within_one_period() {
    let device = SimTemp::new();
    device
        .start(Settings {
            sampling_ms: 100,
            ..Settings::default()
        })
        .unwrap();
    device.set_threshold_mc(-50_000).unwrap();

    let deadline = Instant::now() + Duration::from_millis(100 + 150);
    let mut readiness = device.poll().unwrap();
    while !readiness.priority_ready && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
        readiness = device.poll().unwrap();
    }
    assert!(readiness.priority_ready);
}

#[test]
fn blocking_read_times_out_on_slow_period() {
    let device = SimTemp::new();
    device
        .start(Settings {
            sampling_ms: 60_000,
            ..Settings::default()
        })
        .unwrap();

    let started = Instant::now();
    let result = device.read(&ReadOptions::blocking().with_timeout(Duration::from_millis(50)));
    assert!(matches!(result, Err(DeviceError::TimedOut)));
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[test]
fn blocking_reads_follow_the_generator() {
    let device = SimTemp::new();
    device
        .start(Settings {
            sampling_ms: 100,
            mode: Mode::Ramp,
            ..Settings::default()
        })
        .unwrap();

    let options = ReadOptions::blocking().with_timeout(Duration::from_secs(2));
    let first = device.read(&options).unwrap();
    let second = device.read(&options).unwrap();
    assert!(second.timestamp_ns() > first.timestamp_ns());
    assert!(second.temp_mc() > first.temp_mc());
}

#[test]
fn stop_joins_the_generator() {
    let device = SimTemp::new();
    device
        .start(Settings {
            sampling_ms: 100,
            ..Settings::default()
        })
        .unwrap();
    thread::sleep(Duration::from_millis(250));
    device.stop();
    assert!(!device.is_running());

    // Restart sees no ticks from the previous schedule.
    device.start(Settings::default()).unwrap();
    thread::sleep(Duration::from_millis(300));
    assert_eq!(device.stats().unwrap().updates, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn selftest_passes_on_fast_period() {
    let device = SimTemp::new();
    device
        .start(Settings {
            sampling_ms: 100,
            ..Settings::default()
        })
        .unwrap();

    let report = run_alert_selftest(&device, default_budget(100)).await.unwrap();
    assert!(report.passed());
    assert_eq!(device.threshold_mc().unwrap(), 50_000);
}
