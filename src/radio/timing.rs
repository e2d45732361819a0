//! Link Countdown Timers
//!
//! Three independent countdown timers shared between the control loop and
//! the periodic tick task: the serial inter-byte idle timeout, the
//! activity-indicator duration and the second-resolution calibration
//! holdoff. The fields are relaxed atomics; the tick task is the only
//! decrementer and the control loop only arms and reads, which mirrors
//! the interrupt/main split of the timer hardware this models.

use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use crate::config::{CAL_HOLDOFF_SECS, INDICATOR_FLASH_MS, SERIAL_IDLE_TIMEOUT_MS};

/// Shared timing state driven by a 1 ms tick
#[derive(Debug)]
pub struct LinkTimers {
    serial_idle_ms: AtomicU16,
    indicator_ms: AtomicU16,
    cal_holdoff_s: AtomicU8,
    ms_to_s: AtomicU16,
}

impl LinkTimers {
    /// Create with every timer expired
    #[must_use]
    pub const fn new() -> Self {
        Self {
            serial_idle_ms: AtomicU16::new(0),
            indicator_ms: AtomicU16::new(0),
            cal_holdoff_s: AtomicU8::new(0),
            ms_to_s: AtomicU16::new(999),
        }
    }

    /// Advance all timers by one millisecond
    pub fn tick_1ms(&self) {
        countdown_u16(&self.serial_idle_ms);
        countdown_u16(&self.indicator_ms);

        let prescaler = self.ms_to_s.load(Ordering::Relaxed);
        if prescaler == 0 {
            self.ms_to_s.store(999, Ordering::Relaxed);
            let secs = self.cal_holdoff_s.load(Ordering::Relaxed);
            if secs > 0 {
                self.cal_holdoff_s.store(secs - 1, Ordering::Relaxed);
            }
        } else {
            self.ms_to_s.store(prescaler - 1, Ordering::Relaxed);
        }
    }

    /// Re-arm the serial inter-byte idle timeout; called for every host
    /// byte accepted into the outgoing packet
    pub fn start_serial_idle(&self) {
        self.serial_idle_ms
            .store(SERIAL_IDLE_TIMEOUT_MS, Ordering::Relaxed);
    }

    /// No host byte has arrived for the idle window
    #[must_use]
    pub fn serial_idle_expired(&self) -> bool {
        self.serial_idle_ms.load(Ordering::Relaxed) == 0
    }

    /// Light the activity indicator for one flash duration
    pub fn flash_indicator(&self) {
        self.indicator_ms
            .store(INDICATOR_FLASH_MS, Ordering::Relaxed);
    }

    /// Whether the activity indicator should currently be lit
    #[must_use]
    pub fn indicator_lit(&self) -> bool {
        self.indicator_ms.load(Ordering::Relaxed) != 0
    }

    /// Re-arm the calibration holdoff; called whenever an RX entry is
    /// strobed, since the IDLE->RX transition starts a frequency-
    /// synthesizer calibration that must not be interrupted
    pub fn start_cal_holdoff(&self) {
        self.cal_holdoff_s
            .store(CAL_HOLDOFF_SECS, Ordering::Relaxed);
    }

    /// The device has been in receive mode past the holdoff window
    #[must_use]
    pub fn cal_holdoff_expired(&self) -> bool {
        self.cal_holdoff_s.load(Ordering::Relaxed) == 0
    }
}

impl Default for LinkTimers {
    fn default() -> Self {
        Self::new()
    }
}

/// Saturating one-step decrement
fn countdown_u16(timer: &AtomicU16) {
    let remaining = timer.load(Ordering::Relaxed);
    if remaining > 0 {
        timer.store(remaining - 1, Ordering::Relaxed);
    }
}
