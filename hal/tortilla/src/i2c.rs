//! I2C channel
//!
//! [`I2c`] binds a single addressed transfer function. Every operation
//! names its target address and a `repeated` flag; the channel itself
//! keeps no state.
//!
//! The `repeated` flag is passed through untouched. Its bus meaning
//! (typically: end the transaction with a repeated START instead of a
//! STOP so a following read keeps the bus) is up to the bound function.
//! Pass `false` for an ordinary STOP-terminated transaction.

use crate::buffer::Buffer;

/// Addressed transfer backend
///
/// Implemented for every `FnMut(u16, &[u8], &mut [u8], bool) -> S`. The
/// write phase sends `tx` and the read phase fills `rx`; either slice may
/// be empty and must then not be dereferenced.
pub trait I2cTransfer {
    /// Status returned by the backend, handed back to the caller untouched
    type Status;

    /// Run a transaction against `address`
    fn transfer(
        &mut self,
        address: u16,
        tx: &[u8],
        rx: &mut [u8],
        repeated: bool,
    ) -> Self::Status;
}

impl<F, S> I2cTransfer for F
where
    F: FnMut(u16, &[u8], &mut [u8], bool) -> S,
{
    type Status = S;

    #[inline(always)]
    fn transfer(&mut self, address: u16, tx: &[u8], rx: &mut [u8], repeated: bool) -> S {
        self(address, tx, rx, repeated)
    }
}

/// I2C channel bound to an addressed transfer backend
///
/// # Concurrency
///
/// Operations block until the backend returns and take no lock. Callers
/// sharing a channel between interrupt and thread context must serialize
/// access themselves.
///
/// ```
/// fn xfer(_addr: u16, _tx: &[u8], rx: &mut [u8], _repeated: bool) -> i32 {
///     rx.fill(0x2A);
///     0
/// }
///
/// let mut i2c = tortilla::I2c::new(xfer);
/// assert_eq!(i2c.write(0x51, &[0x00, 0x10], true), 0);
/// assert_eq!(i2c.read_byte(0x51, false), 0x2A);
/// ```
pub struct I2c<X> {
    xfer: X,
}

impl<X: I2cTransfer> I2c<X> {
    /// Bind the transfer backend
    pub const fn new(xfer: X) -> Self {
        Self { xfer }
    }

    /// Write `tx` then read into `rx` at `address`
    ///
    /// Returns the backend status unchanged.
    #[inline]
    pub fn transfer<const TX: usize, const RX: usize>(
        &mut self,
        address: u16,
        tx: &Buffer<TX>,
        rx: &mut Buffer<RX>,
        repeated: bool,
    ) -> X::Status {
        self.transfer_slices(address, tx, rx, repeated)
    }

    /// Same as [`I2c::transfer`] over buffers sized at run time
    pub fn transfer_slices(
        &mut self,
        address: u16,
        tx: &[u8],
        rx: &mut [u8],
        repeated: bool,
    ) -> X::Status {
        #[cfg(feature = "defmt")]
        defmt::trace!(
            "i2c {=u16:#x} tx={=usize} rx={=usize} repeated={=bool}",
            address,
            tx.len(),
            rx.len(),
            repeated
        );
        self.xfer.transfer(address, tx, rx, repeated)
    }

    /// Write `buffer` to `address`, read nothing
    #[inline]
    pub fn write<const N: usize>(
        &mut self,
        address: u16,
        buffer: &Buffer<N>,
        repeated: bool,
    ) -> X::Status {
        self.transfer(address, buffer, &mut [], repeated)
    }

    /// Write a single byte to `address`
    #[inline]
    pub fn write_byte(&mut self, address: u16, byte: u8, repeated: bool) -> X::Status {
        self.write(address, &[byte], repeated)
    }

    /// Fill `buffer` from `address`, write nothing
    #[inline]
    pub fn read<const N: usize>(
        &mut self,
        address: u16,
        buffer: &mut Buffer<N>,
        repeated: bool,
    ) -> X::Status {
        self.transfer(address, &[], buffer, repeated)
    }

    /// Read a single byte from `address`
    ///
    /// The backend status is discarded; use [`I2c::read`] when failures
    /// must be detected.
    pub fn read_byte(&mut self, address: u16, repeated: bool) -> u8 {
        let mut rx = [0u8; 1];
        let _ = self.read(address, &mut rx, repeated);
        rx[0]
    }

    /// Release the bound backend
    pub fn release(self) -> X {
        self.xfer
    }
}
