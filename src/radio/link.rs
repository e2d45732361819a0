//! Link Arbitration State Machine
//!
//! The control-loop engine that time-shares the single radio between
//! receiving and transmitting. Each pass drains at most one received
//! packet, keeps the device parked in receive mode, flushes the outgoing
//! buffer when it is due, and decides the next mode strobe from a fresh
//! status poll.
//!
//! The engine performs no waiting of its own: every pass is a bounded
//! sequence of bus transactions, and the caller sets the pass cadence.
//! That cadence is load-bearing — the enter-TX strobe is deliberately
//! re-issued every pass because the device defers the switch on
//! clear-channel assessment, and the retry converges once the channel
//! clears.

use crate::config;
use crate::drivers::cc1101::{Cc1101, Error, Strobe};
use crate::radio::bridge::TxAccumulator;
use crate::radio::timing::LinkTimers;
use crate::types::{DeviceState, LinkStats, Packet, RxOutcome, TxOutcome};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Result of the boot-time configuration sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootReport {
    /// Registers whose read-back did not match the written value. The
    /// link keeps running in a degraded state when this is non-zero.
    pub register_faults: u8,
}

/// Reset the device and apply the full boot configuration: RF settings,
/// output-power table, packet-engine settings. Every register write is
/// verified by read-back; mismatches are counted, never fatal.
pub fn initialize<SPI, CS, SpiE, PinE>(
    radio: &mut Cc1101<SPI, CS>,
    delay: &mut impl DelayNs,
) -> Result<BootReport, Error<SpiE, PinE>>
where
    SPI: SpiBus<u8, Error = SpiE>,
    CS: OutputPin<Error = PinE>,
{
    radio.reset(delay)?;

    let mut faults = radio.write_config(&config::RF_SETTINGS)?;
    radio.write_power_table(&config::PA_TABLE)?;
    faults = faults.saturating_add(radio.write_config(&config::PACKET_SETTINGS)?);

    Ok(BootReport {
        register_faults: faults,
    })
}

/// What one arbitration pass did
#[derive(Debug)]
pub struct PollOutcome<'a> {
    /// Result of the RX drain attempt
    pub rx: RxOutcome,
    /// CRC-valid received packet to forward to the host, if any
    pub delivered: Option<&'a Packet>,
    /// Result of the TX flush, when one was due
    pub tx: Option<TxOutcome>,
    /// Device mode observed by the end-of-pass poll
    pub state: DeviceState,
}

/// Arbitration engine: owns one packet per direction and the running
/// diagnostic counters
#[derive(Debug, Default)]
pub struct LinkEngine {
    inbound: Packet,
    outbound: TxAccumulator,
    stats: LinkStats,
}

impl LinkEngine {
    /// Create an idle engine
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inbound: Packet::new(),
            outbound: TxAccumulator::new(),
            stats: LinkStats {
                crc_drops: 0,
                corrupt_frames: 0,
                capacity_anomalies: 0,
            },
        }
    }

    /// The outgoing packet can take more host bytes. Check before
    /// dequeuing from the host stream so refused bytes stay queued
    /// upstream.
    #[must_use]
    pub fn ready_for_host_bytes(&self) -> bool {
        !self.outbound.is_full()
    }

    /// Feed one host byte into the outgoing packet, re-arming the
    /// inter-byte idle timer on acceptance
    pub fn accept_host_byte(&mut self, byte: u8, timers: &LinkTimers) -> bool {
        if self.outbound.push(byte) {
            timers.start_serial_idle();
            true
        } else {
            false
        }
    }

    /// Bytes currently queued for transmission
    #[must_use]
    pub fn pending_out(&self) -> usize {
        self.outbound.len()
    }

    /// Running diagnostic counters
    #[must_use]
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Run one arbitration pass.
    ///
    /// Order matters and matches the device's constraints: drain first so
    /// a completed reception is never overwritten by the RX restart, then
    /// restart RX (re-arming the calibration holdoff), then flush the
    /// outgoing buffer, then decide the mode strobe from a fresh poll.
    pub fn poll<'a, SPI, CS, SpiE, PinE>(
        &'a mut self,
        radio: &mut Cc1101<SPI, CS>,
        timers: &LinkTimers,
    ) -> Result<PollOutcome<'a>, Error<SpiE, PinE>>
    where
        SPI: SpiBus<u8, Error = SpiE>,
        CS: OutputPin<Error = PinE>,
    {
        // 1. drain one received packet, dropping CRC failures silently
        let rx = radio.receive(&mut self.inbound)?;
        let mut deliver = false;
        match rx {
            RxOutcome::Received => {
                if self.inbound.crc_ok {
                    deliver = true;
                } else {
                    self.stats.crc_drops = self.stats.crc_drops.wrapping_add(1);
                }
            }
            RxOutcome::Corrupt => {
                self.stats.corrupt_frames = self.stats.corrupt_frames.wrapping_add(1);
            }
            RxOutcome::NotReady | RxOutcome::Empty => {}
        }

        // 2. the device fell back to IDLE unless a reception is still in
        // progress; restart RX. IDLE->RX starts a frequency-synthesizer
        // calibration, so the holdoff window is re-armed alongside.
        if rx != RxOutcome::NotReady {
            radio.strobe(Strobe::EnterRx)?;
            timers.start_cal_holdoff();
        }

        // 3. flush the outgoing buffer when full or gone idle; keep it
        // queued on anything but a successful injection
        let mut tx = None;
        if self.outbound.should_flush(timers.serial_idle_expired()) {
            let outcome = radio.transmit(self.outbound.packet())?;
            match outcome {
                TxOutcome::Loaded => self.outbound.clear(),
                TxOutcome::CapacityAnomaly => {
                    self.stats.capacity_anomalies = self.stats.capacity_anomalies.wrapping_add(1);
                }
                TxOutcome::Empty | TxOutcome::CapacityRejected => {}
            }
            tx = Some(outcome);
        }

        // 4. fresh mode poll, then the strobe decision
        let state = DeviceState::from_status(radio.strobe(Strobe::Nop)?);
        match state {
            DeviceState::Rx => {
                if radio.tx_fifo_level()? != 0 {
                    // TX entry is deferred by clear-channel assessment,
                    // so keep strobing until it takes
                    radio.strobe(Strobe::EnterTx)?;
                } else if timers.cal_holdoff_expired() {
                    // park in IDLE so the next RX entry recalibrates
                    radio.strobe(Strobe::EnterIdle)?;
                }
            }
            DeviceState::Tx => timers.flash_indicator(),
            DeviceState::Idle | DeviceState::Transitional => {}
        }

        Ok(PollOutcome {
            rx,
            delivered: deliver.then_some(&self.inbound),
            tx,
            state,
        })
    }
}
