//! CC1101 Sub-GHz Transceiver Driver
//!
//! Register/command interface and packet FIFO transfer layer for the
//! TI CC1101. The driver is generic over `embedded-hal` [`SpiBus`] and
//! [`OutputPin`] so the whole layer runs unmodified against a mock bus in
//! host tests.
//!
//! Every bus transaction asserts the select line, clocks one header byte
//! (read/write and burst flags plus a 6-bit address or strobe code) and
//! any data bytes, then releases the line. The device answers each header
//! with a status byte: bits 6:4 are the mode, bits 3:0 the FIFO count.
//!
//! The SPI transport is assumed byte-exchange-reliable; bus faults are
//! propagated to the caller and never retried here.

use crate::config::{FIFO_SIZE, PKT_OVERHEAD};
use crate::types::{status_fifo_count, DeviceState, Packet, RxOutcome, TxOutcome};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// CC1101 register map and header-byte encoding
pub mod regs {
    //! Addresses from the CC1101 datasheet. Configuration registers are
    //! reachable with all four access modes; the 0x30..=0x3D range decodes
    //! as a strobe when written and as a status register when read with
    //! the burst flag set.

    /// Header flag: single register write
    pub const WRITE_SINGLE: u8 = 0x00;
    /// Header flag: burst register write
    pub const WRITE_BURST: u8 = 0x40;
    /// Header flag: single register read
    pub const READ_SINGLE: u8 = 0x80;
    /// Header flag: burst register read (also selects status registers)
    pub const READ_BURST: u8 = 0xC0;

    /// GDO2 output pin configuration
    pub const IOCFG2: u8 = 0x00;
    /// GDO1 output pin configuration
    pub const IOCFG1: u8 = 0x01;
    /// GDO0 output pin configuration
    pub const IOCFG0: u8 = 0x02;
    /// RX/TX FIFO thresholds
    pub const FIFOTHR: u8 = 0x03;
    /// Sync word, high byte
    pub const SYNC1: u8 = 0x04;
    /// Sync word, low byte
    pub const SYNC0: u8 = 0x05;
    /// Packet length cap
    pub const PKTLEN: u8 = 0x06;
    /// Packet automation control 1
    pub const PKTCTRL1: u8 = 0x07;
    /// Packet automation control 0
    pub const PKTCTRL0: u8 = 0x08;
    /// Device address
    pub const ADDR: u8 = 0x09;
    /// Channel number
    pub const CHANNR: u8 = 0x0A;
    /// Frequency synthesizer control, IF
    pub const FSCTRL1: u8 = 0x0B;
    /// Frequency synthesizer control, offset
    pub const FSCTRL0: u8 = 0x0C;
    /// Frequency control word, high byte
    pub const FREQ2: u8 = 0x0D;
    /// Frequency control word, middle byte
    pub const FREQ1: u8 = 0x0E;
    /// Frequency control word, low byte
    pub const FREQ0: u8 = 0x0F;
    /// Modem configuration 4 (channel bandwidth, symbol rate exponent)
    pub const MDMCFG4: u8 = 0x10;
    /// Modem configuration 3 (symbol rate mantissa)
    pub const MDMCFG3: u8 = 0x11;
    /// Modem configuration 2 (modulation, sync mode)
    pub const MDMCFG2: u8 = 0x12;
    /// Modem configuration 1 (FEC, preamble, channel spacing exponent)
    pub const MDMCFG1: u8 = 0x13;
    /// Modem configuration 0 (channel spacing mantissa)
    pub const MDMCFG0: u8 = 0x14;
    /// Modem deviation setting
    pub const DEVIATN: u8 = 0x15;
    /// Main radio control state machine configuration 2
    pub const MCSM2: u8 = 0x16;
    /// Main radio control state machine configuration 1
    pub const MCSM1: u8 = 0x17;
    /// Main radio control state machine configuration 0
    pub const MCSM0: u8 = 0x18;
    /// Frequency offset compensation configuration
    pub const FOCCFG: u8 = 0x19;
    /// Bit synchronization configuration
    pub const BSCFG: u8 = 0x1A;
    /// AGC control 2
    pub const AGCCTRL2: u8 = 0x1B;
    /// AGC control 1
    pub const AGCCTRL1: u8 = 0x1C;
    /// AGC control 0
    pub const AGCCTRL0: u8 = 0x1D;
    /// Wake-on-radio event timeout, high byte
    pub const WOREVT1: u8 = 0x1E;
    /// Wake-on-radio event timeout, low byte
    pub const WOREVT0: u8 = 0x1F;
    /// Wake-on-radio control
    pub const WORCTRL: u8 = 0x20;
    /// Front-end RX configuration
    pub const FREND1: u8 = 0x21;
    /// Front-end TX configuration
    pub const FREND0: u8 = 0x22;
    /// Frequency synthesizer calibration 3
    pub const FSCAL3: u8 = 0x23;
    /// Frequency synthesizer calibration 2
    pub const FSCAL2: u8 = 0x24;
    /// Frequency synthesizer calibration 1
    pub const FSCAL1: u8 = 0x25;
    /// Frequency synthesizer calibration 0
    pub const FSCAL0: u8 = 0x26;
    /// RC oscillator configuration 1
    pub const RCCTRL1: u8 = 0x27;
    /// RC oscillator configuration 0
    pub const RCCTRL0: u8 = 0x28;
    /// Production test register
    pub const FSTEST: u8 = 0x29;
    /// Production test register
    pub const PTEST: u8 = 0x2A;
    /// Production test register
    pub const AGCTEST: u8 = 0x2B;
    /// Test register 2
    pub const TEST2: u8 = 0x2C;
    /// Test register 1
    pub const TEST1: u8 = 0x2D;
    /// Test register 0
    pub const TEST0: u8 = 0x2E;

    /// Status register: TX FIFO occupancy (read with [`READ_BURST`])
    pub const TXBYTES: u8 = 0x3A;
    /// Status register: RX FIFO occupancy (read with [`READ_BURST`])
    pub const RXBYTES: u8 = 0x3B;
    /// Output power table (burst-writable)
    pub const PATABLE: u8 = 0x3E;
    /// TX FIFO when written, RX FIFO when read
    pub const FIFO: u8 = 0x3F;

    /// Mask for the occupancy bits of TXBYTES/RXBYTES; bit 7 flags
    /// underflow/overflow
    pub const FIFO_LEVEL_MASK: u8 = 0x7F;
}

/// Command strobes: single-byte commands triggering an immediate device
/// action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Strobe {
    /// Reset chip
    Reset = 0x30,
    /// Enable RX; starts frequency-synthesizer calibration when coming
    /// from IDLE
    EnterRx = 0x34,
    /// Enable TX; deferred by clear-channel assessment while in RX
    EnterTx = 0x35,
    /// Exit RX/TX, go to IDLE
    EnterIdle = 0x36,
    /// Flush the RX FIFO (valid in IDLE or after an overflow)
    FlushRx = 0x3A,
    /// No operation; used to fetch the status byte
    Nop = 0x3D,
}

impl Strobe {
    /// Strobe code as it appears on the bus
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Strobe {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Reset => defmt::write!(f, "SRES"),
            Self::EnterRx => defmt::write!(f, "SRX"),
            Self::EnterTx => defmt::write!(f, "STX"),
            Self::EnterIdle => defmt::write!(f, "SIDLE"),
            Self::FlushRx => defmt::write!(f, "SFRX"),
            Self::Nop => defmt::write!(f, "SNOP"),
        }
    }
}

/// Bus fault raised by the SPI transport or the select pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<SpiE, PinE> {
    /// SPI transfer failed
    Spi(SpiE),
    /// Chip-select pin could not be driven
    Pin(PinE),
}

/// CC1101 driver: owns the SPI bus handle and the chip-select pin
pub struct Cc1101<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS, SpiE, PinE> Cc1101<SPI, CS>
where
    SPI: SpiBus<u8, Error = SpiE>,
    CS: OutputPin<Error = PinE>,
{
    /// Take ownership of the bus and select pin, idling the select line
    /// high. SPI mode 0 and the clock rate are board configuration done by
    /// the caller.
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, Error<SpiE, PinE>> {
        cs.set_high().map_err(Error::Pin)?;
        Ok(Self { spi, cs })
    }

    /// Release the bus handle and select pin
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    /// Run one framed transaction: select, exchange, flush, deselect.
    /// The line is released even when the exchange fails.
    fn framed<T>(
        &mut self,
        operation: impl FnOnce(&mut SPI) -> Result<T, SpiE>,
    ) -> Result<T, Error<SpiE, PinE>> {
        self.cs.set_low().map_err(Error::Pin)?;
        let result = operation(&mut self.spi);
        let flushed = self.spi.flush();
        let released = self.cs.set_high();
        let value = result.map_err(Error::Spi)?;
        flushed.map_err(Error::Spi)?;
        released.map_err(Error::Pin)?;
        Ok(value)
    }

    /// Write a configuration register. Returns the status byte clocked
    /// back during the data phase.
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<u8, Error<SpiE, PinE>> {
        self.framed(|spi| {
            let mut frame = [regs::WRITE_SINGLE | reg, value];
            spi.transfer_in_place(&mut frame)?;
            Ok(frame[1])
        })
    }

    /// Read a configuration register
    pub fn read_register(&mut self, reg: u8) -> Result<u8, Error<SpiE, PinE>> {
        self.framed(|spi| {
            let mut frame = [regs::READ_SINGLE | reg, 0];
            spi.transfer_in_place(&mut frame)?;
            Ok(frame[1])
        })
    }

    /// Issue a command strobe and return the status byte
    pub fn strobe(&mut self, strobe: Strobe) -> Result<u8, Error<SpiE, PinE>> {
        self.framed(|spi| exchange(spi, regs::WRITE_SINGLE | strobe.code()))
    }

    /// Read a status register (burst-flagged access). Returns the register
    /// value together with the leading status byte.
    pub fn read_status_register(&mut self, reg: u8) -> Result<(u8, u8), Error<SpiE, PinE>> {
        self.framed(|spi| {
            let mut frame = [regs::READ_BURST | reg, 0];
            spi.transfer_in_place(&mut frame)?;
            Ok((frame[1], frame[0]))
        })
    }

    /// Burst-write the output power table
    pub fn write_power_table(&mut self, table: &[u8]) -> Result<(), Error<SpiE, PinE>> {
        self.framed(|spi| {
            spi.write(&[regs::WRITE_BURST | regs::PATABLE])?;
            spi.write(table)
        })
    }

    /// Write a register table, reading every entry back. Verification
    /// failures are counted and the remaining entries are still written;
    /// the device keeps running in a degraded state on mismatch.
    pub fn write_config(&mut self, table: &[(u8, u8)]) -> Result<u8, Error<SpiE, PinE>> {
        let mut mismatches: u8 = 0;
        for &(reg, value) in table {
            self.write_register(reg, value)?;
            if self.read_register(reg)? != value {
                mismatches = mismatches.saturating_add(1);
            }
        }
        Ok(mismatches)
    }

    /// Reset the device, with settle time on both sides of the strobe
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<u8, Error<SpiE, PinE>> {
        delay.delay_ms(10);
        let status = self.strobe(Strobe::Reset)?;
        delay.delay_ms(10);
        Ok(status)
    }

    /// TX FIFO occupancy in bytes
    pub fn tx_fifo_level(&mut self) -> Result<u8, Error<SpiE, PinE>> {
        let (level, _status) = self.read_status_register(regs::TXBYTES)?;
        Ok(level & regs::FIFO_LEVEL_MASK)
    }

    /// Inject one packet into the TX FIFO.
    ///
    /// An empty packet returns [`TxOutcome::Empty`] without touching the
    /// bus. The injection is refused, leaving the packet queued for a
    /// later pass, when the FIFO cannot take the payload plus the
    /// per-packet overhead.
    pub fn transmit(&mut self, pkt: &Packet) -> Result<TxOutcome, Error<SpiE, PinE>> {
        if pkt.is_empty() {
            return Ok(TxOutcome::Empty);
        }

        let occupancy = usize::from(self.tx_fifo_level()?);
        if occupancy > FIFO_SIZE {
            // should not happen, but the level mask allows it
            return Ok(TxOutcome::CapacityAnomaly);
        }
        if pkt.len() + PKT_OVERHEAD > FIFO_SIZE - occupancy {
            return Ok(TxOutcome::CapacityRejected);
        }

        self.framed(|spi| {
            spi.write(&[regs::WRITE_BURST | regs::FIFO, pkt.len() as u8])?;
            spi.write(pkt.payload())
        })?;
        Ok(TxOutcome::Loaded)
    }

    /// Extract one packet from the RX FIFO.
    ///
    /// The whole exchange happens under a single select assertion so the
    /// FIFO read pointer only advances for bytes actually taken. A length
    /// field above the payload capacity aborts the frame before any
    /// payload byte is clocked and flushes the RX FIFO.
    pub fn receive(&mut self, pkt: &mut Packet) -> Result<RxOutcome, Error<SpiE, PinE>> {
        let outcome = self.framed(|spi| {
            let status = exchange(spi, regs::READ_BURST | regs::FIFO)?;
            if DeviceState::from_status(status) != DeviceState::Idle {
                // packet reception might not be complete yet
                return Ok(RxOutcome::NotReady);
            }
            if status_fifo_count(status) == 0 {
                return Ok(RxOutcome::Empty);
            }

            let len = usize::from(exchange(spi, 0)?);
            let Some(payload) = pkt.begin_receive(len) else {
                return Ok(RxOutcome::Corrupt);
            };
            spi.read(payload)?;

            let rssi = exchange(spi, 0)?;
            let lqi = exchange(spi, 0)?;
            pkt.finish_receive(rssi, lqi);
            Ok(RxOutcome::Received)
        })?;

        if outcome == RxOutcome::Corrupt {
            self.strobe(Strobe::FlushRx)?;
        }
        Ok(outcome)
    }
}

/// Clock one byte out, returning the byte clocked in
fn exchange<SPI: SpiBus<u8>>(spi: &mut SPI, byte: u8) -> Result<u8, SPI::Error> {
    let mut frame = [byte];
    spi.transfer_in_place(&mut frame)?;
    Ok(frame[0])
}
