//! Hardware Abstraction Layer
//!
//! Provides safe abstractions over STM32G474 peripherals. The SPI bus and
//! UART come straight from embassy with their `embedded-hal` trait
//! implementations; only board-semantic wrappers live here.

pub mod gpio;
