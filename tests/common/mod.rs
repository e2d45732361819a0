//! Shared mock SPI bus and chip-select pin for host-side tests.
//!
//! Both halves append to one event log so tests can assert on the exact
//! framing of every transaction: select edges, bytes clocked out, filler
//! clocking for reads, and bus flushes. Response bytes are scripted into
//! a queue that is consumed in wire order; an exhausted queue answers
//! with zeros.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// One observable bus event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    /// Chip select asserted (driven low)
    Select,
    /// Chip select released (driven high)
    Deselect,
    /// Bytes clocked out on MOSI (header/data writes and transfers)
    Mosi(Vec<u8>),
    /// Read-only clocking of `n` filler bytes
    Clock(usize),
    /// Bus flush
    Flush,
}

type Log = Rc<RefCell<Vec<BusEvent>>>;
type Responses = Rc<RefCell<VecDeque<u8>>>;

/// Handle kept by the test to script responses and inspect traffic
#[derive(Clone, Default)]
pub struct BusProbe {
    log: Log,
    responses: Responses,
}

impl BusProbe {
    /// Append bytes to the MISO response script
    pub fn queue(&self, bytes: &[u8]) {
        self.responses.borrow_mut().extend(bytes.iter().copied());
    }

    /// Snapshot of the event log
    pub fn events(&self) -> Vec<BusEvent> {
        self.log.borrow().clone()
    }

    /// Forget previously recorded events
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    /// Number of recorded events
    pub fn event_count(&self) -> usize {
        self.log.borrow().len()
    }

    /// Whether a single-byte frame with this code was clocked out
    /// (strobes are the only one-byte transfers the driver makes)
    pub fn strobed(&self, code: u8) -> bool {
        self.log
            .borrow()
            .iter()
            .any(|e| matches!(e, BusEvent::Mosi(bytes) if bytes.as_slice() == [code]))
    }

    /// Whether any frame starting with this header byte was clocked out
    pub fn wrote_frame_with_header(&self, header: u8) -> bool {
        self.log
            .borrow()
            .iter()
            .any(|e| matches!(e, BusEvent::Mosi(bytes) if bytes.first() == Some(&header)))
    }
}

/// Scripted SPI bus half
pub struct MockSpi {
    log: Log,
    responses: Responses,
}

/// Recorded chip-select half
pub struct MockCs {
    log: Log,
}

/// Build a connected mock bus: SPI half, select half and the probe
pub fn mock_bus() -> (MockSpi, MockCs, BusProbe) {
    let probe = BusProbe::default();
    (
        MockSpi {
            log: Rc::clone(&probe.log),
            responses: Rc::clone(&probe.responses),
        },
        MockCs {
            log: Rc::clone(&probe.log),
        },
        probe,
    )
}

impl MockSpi {
    fn pop(&self) -> u8 {
        self.responses.borrow_mut().pop_front().unwrap_or(0)
    }
}

impl embedded_hal::spi::ErrorType for MockSpi {
    type Error = Infallible;
}

impl SpiBus<u8> for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(BusEvent::Clock(words.len()));
        for slot in words.iter_mut() {
            *slot = self.pop();
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(BusEvent::Mosi(words.to_vec()));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(BusEvent::Mosi(write.to_vec()));
        for slot in read.iter_mut() {
            *slot = self.pop();
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(BusEvent::Mosi(words.to_vec()));
        for slot in words.iter_mut() {
            *slot = self.pop();
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(BusEvent::Flush);
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for MockCs {
    type Error = Infallible;
}

impl OutputPin for MockCs {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(BusEvent::Select);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(BusEvent::Deselect);
        Ok(())
    }
}

/// Delay source that completes immediately (boot-sequence settle times)
pub struct NoopDelay;

impl embedded_hal::delay::DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
