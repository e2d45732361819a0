//! Link Timer Tests
//!
//! Countdown behavior of the three shared timers under the 1 ms tick.

use rflink_firmware::config::{CAL_HOLDOFF_SECS, INDICATOR_FLASH_MS, SERIAL_IDLE_TIMEOUT_MS};
use rflink_firmware::radio::timing::LinkTimers;

fn tick(timers: &LinkTimers, n: u32) {
    for _ in 0..n {
        timers.tick_1ms();
    }
}

#[test]
fn fresh_timers_are_expired() {
    let timers = LinkTimers::new();
    assert!(timers.serial_idle_expired());
    assert!(timers.cal_holdoff_expired());
    assert!(!timers.indicator_lit());
}

#[test]
fn serial_idle_expires_after_the_timeout() {
    let timers = LinkTimers::new();
    timers.start_serial_idle();
    assert!(!timers.serial_idle_expired());

    tick(&timers, u32::from(SERIAL_IDLE_TIMEOUT_MS) - 1);
    assert!(!timers.serial_idle_expired());

    tick(&timers, 1);
    assert!(timers.serial_idle_expired());
}

#[test]
fn serial_idle_rearms_on_every_byte() {
    let timers = LinkTimers::new();
    timers.start_serial_idle();
    tick(&timers, u32::from(SERIAL_IDLE_TIMEOUT_MS) - 1);

    // another byte arrives just before expiry
    timers.start_serial_idle();
    tick(&timers, u32::from(SERIAL_IDLE_TIMEOUT_MS) - 1);
    assert!(!timers.serial_idle_expired());
    tick(&timers, 1);
    assert!(timers.serial_idle_expired());
}

#[test]
fn indicator_stays_lit_for_the_flash_duration() {
    let timers = LinkTimers::new();
    timers.flash_indicator();
    assert!(timers.indicator_lit());

    tick(&timers, u32::from(INDICATOR_FLASH_MS) - 1);
    assert!(timers.indicator_lit());

    tick(&timers, 1);
    assert!(!timers.indicator_lit());
}

#[test]
fn holdoff_counts_whole_seconds() {
    let timers = LinkTimers::new();
    timers.start_cal_holdoff();
    assert!(!timers.cal_holdoff_expired());

    let total_ms = u32::from(CAL_HOLDOFF_SECS) * 1000;
    tick(&timers, total_ms - 1);
    assert!(!timers.cal_holdoff_expired());

    tick(&timers, 1);
    assert!(timers.cal_holdoff_expired());
}

#[test]
fn rearming_the_holdoff_restarts_the_window() {
    let timers = LinkTimers::new();
    timers.start_cal_holdoff();
    tick(&timers, 30_000);

    timers.start_cal_holdoff();
    tick(&timers, u32::from(CAL_HOLDOFF_SECS) * 1000 - 1);
    assert!(!timers.cal_holdoff_expired());
    tick(&timers, 1);
    assert!(timers.cal_holdoff_expired());
}

#[test]
fn expired_timers_stay_at_zero() {
    let timers = LinkTimers::new();
    timers.start_serial_idle();
    tick(&timers, 1000);
    assert!(timers.serial_idle_expired());
    // further ticks must not wrap anything back to life
    tick(&timers, 5000);
    assert!(timers.serial_idle_expired());
    assert!(!timers.indicator_lit());
}
