//! RF Link Firmware Library
//!
//! This library provides the core functionality for an STM32G474-based
//! wireless serial cable replacement. A CC1101 sub-GHz transceiver is
//! driven over SPI; host bytes arriving on the UART are packed into radio
//! packets and radio packets with a valid CRC are streamed back out, giving
//! two boards a transparent point-to-point serial link.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Link Arbitration  │  Serial Bridge  │  Link Timers          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     DRIVER LAYER                             │
//! │  CC1101 register/command interface │ packet FIFO transfer    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / TRAIT LAYER                          │
//! │  embedded-hal SpiBus + OutputPin  │  UART  │  GPIO           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Trait-generic driver**: the radio driver only needs `SpiBus` and
//!   `OutputPin`, so every layer above the bus runs in host tests
//! - **Discrete results, no exceptions**: FIFO transfers report
//!   `TxOutcome`/`RxOutcome` values consumed synchronously
//! - **Bounds-checked buffers**: packet payloads live in fixed-capacity
//!   `heapless` vectors with explicit lengths
//! - **Single bus owner**: one cooperative task performs all SPI traffic;
//!   the tick task only touches atomic countdown timers

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Provides safe abstractions over STM32G474 peripherals.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// The CC1101 transceiver driver: register/command interface and the
/// packet FIFO transfer layer.
pub mod drivers;

/// Link Control Logic
///
/// Arbitration state machine, serial bridge and countdown timers.
pub mod radio;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::OutputPin;
    pub use embedded_hal::spi::SpiBus;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
