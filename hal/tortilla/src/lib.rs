//! Tortilla: compile-time bound bus wrappers
//!
//! This crate wraps integrator-supplied transfer functions in small,
//! buffer-safe channel types. The hardware access itself (register-level
//! SPI/I2C drivers, the timer behind a delay) stays outside; the channels
//! only decide *how* a buffer is handed to it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application / device drivers           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tortilla (this crate - channels)       │
//! │  Delay · Spi · I2c                      │
//! └─────────────────────────────────────────┘
//!                     │  bound at compile time
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Integrator transfer functions          │
//! │  (closures, fn items, extern "C" fns)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Every callback is a generic parameter of its channel, so a call through
//! a channel monomorphizes down to a direct call of the bound function.
//! Buffer lengths are const generics: the length that reaches the callback
//! is always the length of the array the caller passed.
//!
//! # Components
//!
//! - [`delay::Delay`] - millisecond / microsecond delays
//! - [`spi::Spi`] - full-duplex transfers with optional automatic chip select
//! - [`i2c::I2c`] - addressed transfers with a repeated-start flag
//! - [`raw`] - bindings for C functions using the pointer/length convention
//! - [`ehal`] - `embedded-hal` 1.0 trait implementations
//!
//! # Concurrency
//!
//! All operations block until the bound callback returns. The channels add
//! no locking: sharing one channel between an interrupt handler and the
//! main loop must be serialized by the caller.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod delay;
pub mod ehal;
pub mod i2c;
pub mod raw;
pub mod spi;
pub mod status;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export key types at crate root for convenience
pub use buffer::{Buffer, EMPTY};
pub use delay::{Delay, DelayMs, DelayUs};
pub use ehal::I2cError;
pub use i2c::{I2c, I2cTransfer};
pub use spi::{ChipSelect, ChipSelectMode, Spi, SpiConfig, SpiTransfer};
pub use status::{Status, StatusCode};
