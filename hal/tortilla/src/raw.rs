//! Bindings for C transfer functions
//!
//! Existing bus drivers written in C take a base pointer and a length per
//! buffer. The wrappers here adapt such functions to the channel backend
//! traits so they bind exactly like closures:
//!
//! ```text
//! int  spi_xfer(const uint8_t *tx, size_t tx_len, uint8_t *rx, size_t rx_len);
//! void spi_cs(bool level);
//! int  i2c_xfer(uint16_t addr, const uint8_t *tx, size_t tx_len,
//!               uint8_t *rx, size_t rx_len, bool repeated);
//! void delay(uint32_t count);
//! ```
//!
//! A zero-length buffer is passed as a null pointer with length 0.

#![allow(unsafe_code)]

use core::ffi::c_int;
use core::ptr;

use crate::delay::{DelayMs, DelayUs};
use crate::i2c::I2cTransfer;
use crate::spi::{ChipSelect, SpiTransfer};

/// C signature of an SPI transfer function
pub type SpiTransferFn =
    unsafe extern "C" fn(tx: *const u8, tx_len: usize, rx: *mut u8, rx_len: usize) -> c_int;

/// C signature of a chip-select function
pub type ChipSelectFn = unsafe extern "C" fn(level: bool);

/// C signature of an I2C transfer function
pub type I2cTransferFn = unsafe extern "C" fn(
    address: u16,
    tx: *const u8,
    tx_len: usize,
    rx: *mut u8,
    rx_len: usize,
    repeated: bool,
) -> c_int;

/// C signature of a delay function
pub type DelayFn = unsafe extern "C" fn(count: u32);

fn tx_parts(tx: &[u8]) -> (*const u8, usize) {
    if tx.is_empty() {
        (ptr::null(), 0)
    } else {
        (tx.as_ptr(), tx.len())
    }
}

fn rx_parts(rx: &mut [u8]) -> (*mut u8, usize) {
    if rx.is_empty() {
        (ptr::null_mut(), 0)
    } else {
        (rx.as_mut_ptr(), rx.len())
    }
}

/// C SPI transfer function usable as an [`SpiTransfer`] backend
#[derive(Debug, Clone, Copy)]
pub struct RawSpiTransfer(SpiTransferFn);

impl RawSpiTransfer {
    /// Wrap `f`
    ///
    /// # Safety
    ///
    /// `f` must read at most `tx_len` bytes from `tx`, write at most
    /// `rx_len` bytes to `rx`, never dereference a pointer whose length is
    /// 0, and not keep either pointer after returning.
    pub const unsafe fn new(f: SpiTransferFn) -> Self {
        Self(f)
    }
}

impl SpiTransfer for RawSpiTransfer {
    type Status = c_int;

    #[inline(always)]
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> c_int {
        let (tx_ptr, tx_len) = tx_parts(tx);
        let (rx_ptr, rx_len) = rx_parts(rx);
        // SAFETY: pointer/length pairs come from live slices and `new`
        // holds the callee to those bounds.
        unsafe { (self.0)(tx_ptr, tx_len, rx_ptr, rx_len) }
    }
}

/// C chip-select function usable as a [`ChipSelect`] backend
#[derive(Debug, Clone, Copy)]
pub struct RawChipSelect(ChipSelectFn);

impl RawChipSelect {
    /// Wrap `f`
    ///
    /// # Safety
    ///
    /// `f` must be safe to call with either level at any time the owning
    /// channel is used.
    pub const unsafe fn new(f: ChipSelectFn) -> Self {
        Self(f)
    }
}

impl ChipSelect for RawChipSelect {
    #[inline(always)]
    fn write_cs(&mut self, level: bool) {
        // SAFETY: guaranteed by the contract of `new`
        unsafe { (self.0)(level) }
    }
}

/// C I2C transfer function usable as an [`I2cTransfer`] backend
#[derive(Debug, Clone, Copy)]
pub struct RawI2cTransfer(I2cTransferFn);

impl RawI2cTransfer {
    /// Wrap `f`
    ///
    /// # Safety
    ///
    /// Same buffer contract as [`RawSpiTransfer::new`].
    pub const unsafe fn new(f: I2cTransferFn) -> Self {
        Self(f)
    }
}

impl I2cTransfer for RawI2cTransfer {
    type Status = c_int;

    #[inline(always)]
    fn transfer(&mut self, address: u16, tx: &[u8], rx: &mut [u8], repeated: bool) -> c_int {
        let (tx_ptr, tx_len) = tx_parts(tx);
        let (rx_ptr, rx_len) = rx_parts(rx);
        // SAFETY: see `RawSpiTransfer::transfer`
        unsafe { (self.0)(address, tx_ptr, tx_len, rx_ptr, rx_len, repeated) }
    }
}

/// C delay function usable as a [`DelayMs`] or [`DelayUs`] backend
#[derive(Debug, Clone, Copy)]
pub struct RawDelay(DelayFn);

impl RawDelay {
    /// Wrap `f`
    ///
    /// # Safety
    ///
    /// `f` must be safe to call with any count.
    pub const unsafe fn new(f: DelayFn) -> Self {
        Self(f)
    }
}

impl DelayMs for RawDelay {
    #[inline(always)]
    fn delay_ms(&mut self, ms: u32) {
        // SAFETY: guaranteed by the contract of `new`
        unsafe { (self.0)(ms) }
    }
}

impl DelayUs for RawDelay {
    #[inline(always)]
    fn delay_us(&mut self, us: u32) {
        // SAFETY: guaranteed by the contract of `new`
        unsafe { (self.0)(us) }
    }
}
