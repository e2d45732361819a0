//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the RF link bridge.
//! Pin mappings, timing parameters and the CC1101 register tables are
//! centralized here.

use crate::drivers::cc1101::regs;

/// CC1101 hardware FIFO depth in bytes (both directions)
pub const FIFO_SIZE: usize = 64;

/// Per-packet protocol overhead: length byte plus device margin bytes
pub const PKT_OVERHEAD: usize = 4;

/// Maximum payload length of one radio packet
pub const MAX_PAYLOAD: usize = FIFO_SIZE - PKT_OVERHEAD;

/// Host serial link baud rate
pub const SERIAL_BAUD: u32 = 9600;

/// Inter-byte idle timeout that flushes a partial outgoing packet
pub const SERIAL_IDLE_TIMEOUT_MS: u16 = 10;

/// Duration of one activity-indicator flash
pub const INDICATOR_FLASH_MS: u16 = 100;

/// Minimum time the device stays in receive mode after an RX entry, so the
/// frequency-synthesizer calibration started by the IDLE->RX transition is
/// never interrupted
pub const CAL_HOLDOFF_SECS: u8 = 60;

/// SPI clock for the CC1101 (mode 0)
pub const SPI_FREQUENCY_HZ: u32 = 500_000;

/// Host-side byte queue depth between the UART ring and the bridge
pub const SERIAL_QUEUE_LEN: usize = 80;

/// Watchdog deadline for one control-loop pass, in microseconds
pub const WATCHDOG_TIMEOUT_US: u32 = 2_000_000;

/// Control loop pass cadence in milliseconds
pub const LOOP_PERIOD_MS: u64 = 1;

/// RF front-end settings.
///
/// SmartRF Studio export: base frequency 433.92 MHz, 26 MHz crystal, GFSK,
/// channel 0, 9.6 kBaud, 20 kHz deviation, 100 kHz channel spacing,
/// 70 kHz RX filter bandwidth.
pub const RF_SETTINGS: [(u8, u8); 22] = [
    (regs::SYNC1, 122),
    (regs::SYNC0, 14),
    (regs::FSCTRL1, 6),
    (regs::FREQ2, 16),
    (regs::FREQ1, 176),
    (regs::FREQ0, 113),
    (regs::MDMCFG4, 232),
    (regs::MDMCFG3, 131),
    (regs::MDMCFG2, 22),
    (regs::MDMCFG1, 33),
    (regs::DEVIATN, 52),
    (regs::FOCCFG, 22),
    (regs::AGCCTRL2, 67),
    (regs::AGCCTRL1, 73),
    (regs::WORCTRL, 251),
    (regs::FSCAL3, 233),
    (regs::FSCAL2, 42),
    (regs::FSCAL1, 0),
    (regs::FSCAL0, 31),
    (regs::TEST2, 129),
    (regs::TEST1, 53),
    (regs::TEST0, 9),
];

/// Packet-engine settings: GDO0 function, FIFO thresholds, variable-length
/// packets capped at [`MAX_PAYLOAD`], CCA-gated TX, calibration on
/// IDLE->RX/TX, front-end configuration.
pub const PACKET_SETTINGS: [(u8, u8); 6] = [
    (regs::IOCFG0, 0x06),
    (regs::FIFOTHR, 47),
    (regs::PKTLEN, MAX_PAYLOAD as u8),
    (regs::PKTCTRL0, 0x45),
    (regs::MCSM0, 0x18),
    (regs::FREND0, 0x07),
];

/// Output power ramp, CC1101 datasheet values for the 433 MHz band
pub const PA_TABLE: [u8; 8] = [0x12, 0x0E, 0x1D, 0x34, 0x60, 0x84, 0xC8, 0xC0];

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// SPI1 SCK to the CC1101
    pub const SPI_SCK: &str = "PA5";

    /// SPI1 MISO from the CC1101
    pub const SPI_MISO: &str = "PA6";

    /// SPI1 MOSI to the CC1101
    pub const SPI_MOSI: &str = "PA7";

    /// CC1101 chip select (active low)
    pub const RADIO_CS: &str = "PA4";

    /// Activity LED
    pub const LED_ACTIVITY: &str = "PB0";

    /// Host UART TX
    pub const UART_TX: &str = "PA9";

    /// Host UART RX
    pub const UART_RX: &str = "PA10";
}
