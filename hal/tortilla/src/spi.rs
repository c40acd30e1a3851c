//! SPI channel
//!
//! [`Spi`] binds a full-duplex transfer function and a chip-select
//! function. Transfers take fixed-size buffers; the transmit and receive
//! sides are sized independently and either may be empty.
//!
//! # Chip select
//!
//! In manual mode (the default) the caller drives chip select with
//! [`Spi::write_cs`]. In automatic mode every transfer is wrapped:
//!
//! ```text
//! write_cs(false) ─▶ transfer(tx, rx) ─▶ write_cs(true)
//! ```
//!
//! The deselect happens whatever status the transfer returned. The
//! sequence starts and ends inside a single call, so switching modes with
//! [`Spi::enable_auto_cs`] never leaves a transaction half open.

use crate::buffer::Buffer;

/// Full-duplex transfer backend
///
/// Implemented for every `FnMut(&[u8], &mut [u8]) -> S`. The two slices
/// have independent lengths and either may be empty; an empty slice must
/// not be dereferenced.
pub trait SpiTransfer {
    /// Status returned by the backend, handed back to the caller untouched
    type Status;

    /// Clock out `tx` while receiving into `rx`
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Self::Status;
}

impl<F, S> SpiTransfer for F
where
    F: FnMut(&[u8], &mut [u8]) -> S,
{
    type Status = S;

    #[inline(always)]
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> S {
        self(tx, rx)
    }
}

/// Chip-select backend
///
/// Implemented for every `FnMut(bool)`. The level is active low:
/// `false` selects the peripheral, `true` releases it.
pub trait ChipSelect {
    /// Drive the chip-select line to `level`
    fn write_cs(&mut self, level: bool);
}

impl<F: FnMut(bool)> ChipSelect for F {
    #[inline(always)]
    fn write_cs(&mut self, level: bool) {
        self(level)
    }
}

/// Who drives chip select around transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipSelectMode {
    /// The caller uses [`Spi::write_cs`]
    #[default]
    Manual,
    /// Every transfer is wrapped in select / deselect
    Automatic,
}

/// SPI channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Initial chip-select mode
    pub chip_select: ChipSelectMode,
}

impl SpiConfig {
    /// Caller-controlled chip select
    pub const MANUAL_CS: Self = Self {
        chip_select: ChipSelectMode::Manual,
    };

    /// Chip select asserted around every transfer
    pub const AUTO_CS: Self = Self {
        chip_select: ChipSelectMode::Automatic,
    };
}

/// SPI channel bound to a transfer and a chip-select backend
///
/// # Concurrency
///
/// Every operation blocks until the backend returns. The channel does no
/// locking of its own: if it is reachable from both an interrupt handler
/// and the main loop, the caller must keep the two from overlapping
/// (e.g. by masking the interrupt around the transaction).
///
/// ```
/// fn xfer(_tx: &[u8], _rx: &mut [u8]) -> i32 { 0 }
/// fn cs(_level: bool) {}
///
/// let mut spi = tortilla::Spi::with_config(xfer, cs, tortilla::SpiConfig::AUTO_CS);
/// let mut rx = [0u8; 10];
/// assert_eq!(spi.transfer(&[0x01, 54], &mut rx), 0);
/// ```
pub struct Spi<X, C> {
    xfer: X,
    cs: C,
    auto_cs: bool,
}

impl<X: SpiTransfer, C: ChipSelect> Spi<X, C> {
    /// Bind the backends with manual chip select
    pub const fn new(xfer: X, cs: C) -> Self {
        Self::with_config(xfer, cs, SpiConfig::MANUAL_CS)
    }

    /// Bind the backends with the given configuration
    pub const fn with_config(xfer: X, cs: C, config: SpiConfig) -> Self {
        let auto_cs = matches!(config.chip_select, ChipSelectMode::Automatic);
        Self { xfer, cs, auto_cs }
    }

    /// Drive chip select directly (`false` = selected)
    #[inline]
    pub fn write_cs(&mut self, level: bool) {
        #[cfg(feature = "defmt")]
        defmt::trace!("spi cs={=bool}", level);
        self.cs.write_cs(level);
    }

    /// Turn automatic chip select on or off for subsequent transfers
    pub fn enable_auto_cs(&mut self, enable: bool) {
        self.auto_cs = enable;
    }

    /// Whether transfers are wrapped in chip select
    pub fn auto_cs(&self) -> bool {
        self.auto_cs
    }

    /// Current configuration
    pub fn config(&self) -> SpiConfig {
        if self.auto_cs {
            SpiConfig::AUTO_CS
        } else {
            SpiConfig::MANUAL_CS
        }
    }

    /// Full-duplex transfer of `tx` while receiving into `rx`
    ///
    /// Returns the backend status unchanged.
    #[inline]
    pub fn transfer<const TX: usize, const RX: usize>(
        &mut self,
        tx: &Buffer<TX>,
        rx: &mut Buffer<RX>,
    ) -> X::Status {
        self.transfer_slices(tx, rx)
    }

    /// Full-duplex transfer over buffers sized at run time
    ///
    /// Same sequencing as [`Spi::transfer`].
    pub fn transfer_slices(&mut self, tx: &[u8], rx: &mut [u8]) -> X::Status {
        #[cfg(feature = "defmt")]
        defmt::trace!(
            "spi transfer tx={=usize} rx={=usize} auto_cs={=bool}",
            tx.len(),
            rx.len(),
            self.auto_cs
        );

        if !self.auto_cs {
            return self.xfer.transfer(tx, rx);
        }

        self.write_cs(false);
        let status = self.xfer.transfer(tx, rx);
        // Release even when the transfer failed
        self.write_cs(true);
        status
    }

    /// Transmit `buffer`, receive nothing
    #[inline]
    pub fn write<const N: usize>(&mut self, buffer: &Buffer<N>) -> X::Status {
        self.transfer(buffer, &mut [])
    }

    /// Transmit a single byte
    #[inline]
    pub fn write_byte(&mut self, byte: u8) -> X::Status {
        self.write(&[byte])
    }

    /// Clock `buffer` out on the bus with an empty receive side
    ///
    /// Same call as [`Spi::write`]: the bytes of `buffer` are the dummy
    /// data driven while clocking, and nothing is stored. Use
    /// [`Spi::transfer`] with a receive buffer to capture data.
    #[inline]
    pub fn read<const N: usize>(&mut self, buffer: &Buffer<N>) -> X::Status {
        self.transfer(buffer, &mut [])
    }

    /// Receive a single byte
    ///
    /// The backend status is discarded; use [`Spi::transfer`] when
    /// failures must be detected.
    pub fn read_byte(&mut self) -> u8 {
        let mut rx = [0u8; 1];
        let _ = self.transfer(&[], &mut rx);
        rx[0]
    }

    /// Release the bound backends
    pub fn release(self) -> (X, C) {
        (self.xfer, self.cs)
    }
}
