//! `embedded-hal` 1.0 implementations
//!
//! Lets drivers written against `embedded-hal` run on bound callbacks:
//!
//! - [`Delay`] implements [`DelayNs`]
//! - [`Spi`] implements [`SpiBus`]; with automatic chip select each bus
//!   operation is wrapped in its own select / deselect
//! - [`I2c`] implements [`I2c`](i2c::I2c) for 7-bit addresses
//!
//! A callback status is turned into a `Result` through [`Status`], so the
//! bus impls exist whenever the backend's status type implements it and
//! its error implements the matching `embedded-hal` error trait.
//!
//! The I2C callback receives a plain `u16` address with no addressing
//! mode, so only [`SevenBitAddress`] transactions are offered. Bind a
//! channel to a 10-bit bus and use [`I2c::transfer`] directly for wide
//! addresses.
//!
//! The channels' own `read`/`write`/`transfer` methods take precedence
//! over the trait methods of the same name; call the trait through a
//! generic driver or with `SpiBus::write(&mut spi, ..)`.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, Operation, SevenBitAddress};
use embedded_hal::spi::{self, SpiBus};

use crate::delay::{Delay, DelayMs, DelayUs};
use crate::i2c::{I2c, I2cTransfer};
use crate::spi::{ChipSelect, Spi, SpiTransfer};
use crate::status::{Status, StatusCode};

/// Stack scratch size for [`SpiBus::transfer_in_place`]
const IN_PLACE_CHUNK: usize = 32;

/// Stack scratch size for merging adjacent I2C operations of one kind
pub const MERGE_CAPACITY: usize = 32;

/// Error of an `embedded-hal` I2C transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError<E> {
    /// The backend reported a failing status
    Status(E),
    /// Adjacent operations of one kind add up to more than
    /// [`MERGE_CAPACITY`] bytes and cannot be sent as one phase
    MergeOverflow,
}

impl<E: fmt::Display> fmt::Display for I2cError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => fmt::Display::fmt(status, f),
            Self::MergeOverflow => write!(
                f,
                "adjacent operations exceed {} bytes",
                MERGE_CAPACITY
            ),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for I2cError<E> {}

impl spi::Error for StatusCode {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl i2c::Error for StatusCode {
    fn kind(&self) -> i2c::ErrorKind {
        i2c::ErrorKind::Other
    }
}

impl<E: i2c::Error> i2c::Error for I2cError<E> {
    fn kind(&self) -> i2c::ErrorKind {
        match self {
            Self::Status(status) => status.kind(),
            Self::MergeOverflow => i2c::ErrorKind::Other,
        }
    }
}

impl<Ms: DelayMs, Us: DelayUs> DelayNs for Delay<Ms, Us> {
    /// Rounded up to whole microseconds
    fn delay_ns(&mut self, ns: u32) {
        self.us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms(ms);
    }
}

impl<X, C> spi::ErrorType for Spi<X, C>
where
    X: SpiTransfer,
    X::Status: Status,
    <X::Status as Status>::Error: spi::Error,
    C: ChipSelect,
{
    type Error = <X::Status as Status>::Error;
}

impl<X, C> Spi<X, C>
where
    X: SpiTransfer,
    X::Status: Status,
    C: ChipSelect,
{
    fn transfer_in_place_chunks(
        &mut self,
        words: &mut [u8],
    ) -> Result<(), <X::Status as Status>::Error> {
        let mut scratch = [0u8; IN_PLACE_CHUNK];
        for chunk in words.chunks_mut(IN_PLACE_CHUNK) {
            let tx = &mut scratch[..chunk.len()];
            tx.copy_from_slice(chunk);
            self.transfer_slices(tx, chunk).into_result()?;
        }
        Ok(())
    }
}

impl<X, C> SpiBus<u8> for Spi<X, C>
where
    X: SpiTransfer,
    X::Status: Status,
    <X::Status as Status>::Error: spi::Error,
    C: ChipSelect,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.transfer_slices(&[], words).into_result()
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.transfer_slices(words, &mut []).into_result()
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.transfer_slices(write, read).into_result()
    }

    /// Goes through a stack scratch buffer in chunks. With automatic chip
    /// select the whole operation stays inside one select / deselect.
    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        if words.is_empty() {
            return Ok(());
        }
        if !self.auto_cs() {
            return self.transfer_in_place_chunks(words);
        }

        self.enable_auto_cs(false);
        self.write_cs(false);
        let result = self.transfer_in_place_chunks(words);
        self.write_cs(true);
        self.enable_auto_cs(true);
        result
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<X> i2c::ErrorType for I2c<X>
where
    X: I2cTransfer,
    X::Status: Status,
    <X::Status as Status>::Error: i2c::Error,
{
    type Error = I2cError<<X::Status as Status>::Error>;
}

fn is_read(operation: &Operation<'_>) -> bool {
    matches!(operation, Operation::Read(_))
}

fn operation_len(operation: &Operation<'_>) -> usize {
    match operation {
        Operation::Read(buffer) => buffer.len(),
        Operation::Write(bytes) => bytes.len(),
    }
}

impl<X> I2c<X>
where
    X: I2cTransfer,
    X::Status: Status,
{
    /// One backend call per run of adjacent operations of the same kind;
    /// all but the last run ask for a repeated start.
    fn run_operations(
        &mut self,
        address: u16,
        operations: &mut [Operation<'_>],
    ) -> Result<(), I2cError<<X::Status as Status>::Error>> {
        let mut start = 0;
        while start < operations.len() {
            let read = is_read(&operations[start]);
            let end = operations[start..]
                .iter()
                .position(|operation| is_read(operation) != read)
                .map_or(operations.len(), |run| start + run);
            let repeated = end < operations.len();
            self.run_phase(address, &mut operations[start..end], repeated)?;
            start = end;
        }
        Ok(())
    }

    /// Issue `phase`, all reads or all writes, as a single backend call
    fn run_phase(
        &mut self,
        address: u16,
        phase: &mut [Operation<'_>],
        repeated: bool,
    ) -> Result<(), I2cError<<X::Status as Status>::Error>> {
        if let [operation] = &mut *phase {
            let status = match operation {
                Operation::Write(bytes) => {
                    self.transfer_slices(address, bytes, &mut [], repeated)
                }
                Operation::Read(buffer) => self.transfer_slices(address, &[], buffer, repeated),
            };
            return status.into_result().map_err(I2cError::Status);
        }

        let total: usize = phase.iter().map(operation_len).sum();
        if total > MERGE_CAPACITY {
            return Err(I2cError::MergeOverflow);
        }
        let mut scratch = [0u8; MERGE_CAPACITY];
        let merged = &mut scratch[..total];

        if phase.first().is_some_and(is_read) {
            self.transfer_slices(address, &[], &mut *merged, repeated)
                .into_result()
                .map_err(I2cError::Status)?;
            let mut offset = 0;
            for operation in phase.iter_mut() {
                if let Operation::Read(buffer) = operation {
                    let len = buffer.len();
                    buffer.copy_from_slice(&merged[offset..offset + len]);
                    offset += len;
                }
            }
            Ok(())
        } else {
            let mut offset = 0;
            for operation in phase.iter() {
                if let Operation::Write(bytes) = operation {
                    merged[offset..offset + bytes.len()].copy_from_slice(bytes);
                    offset += bytes.len();
                }
            }
            self.transfer_slices(address, merged, &mut [], repeated)
                .into_result()
                .map_err(I2cError::Status)
        }
    }
}

impl<X> i2c::I2c<SevenBitAddress> for I2c<X>
where
    X: I2cTransfer,
    X::Status: Status,
    <X::Status as Status>::Error: i2c::Error,
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run_operations(u16::from(address), operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{DelayCall, DelayRecorder, I2cCall, I2cRecorder, SpiEvent, SpiRecorder};
    use crate::SpiConfig;

    /// Register read the way an `embedded-hal` sensor driver does it
    fn read_register<B: i2c::I2c>(
        bus: &mut B,
        address: u8,
        register: u8,
    ) -> Result<u8, B::Error> {
        let mut value = [0u8; 1];
        bus.write_read(address, &[register], &mut value)?;
        Ok(value[0])
    }

    fn settle<D: DelayNs>(delay: &mut D) {
        delay.delay_ms(2);
        delay.delay_us(30);
        delay.delay_ns(1_500);
        delay.delay_ns(0);
    }

    #[test]
    fn test_delay_ns_rounds_up_to_us() {
        let recorder = DelayRecorder::new();
        let mut delay = Delay::new(recorder.ms(), recorder.us());

        settle(&mut delay);

        assert_eq!(
            recorder.calls().as_slice(),
            &[
                DelayCall::Ms(2),
                DelayCall::Us(30),
                DelayCall::Us(2),
                DelayCall::Us(0)
            ]
        );
    }

    #[test]
    fn test_i2c_write_read_uses_repeated_start() {
        let recorder = I2cRecorder::new();
        recorder.set_read_data(&[0x68]);
        let mut i2c = I2c::new(recorder.transfer());

        assert_eq!(read_register(&mut i2c, 0x68, 0x75), Ok(0x68));
        assert_eq!(
            recorder.calls().as_slice(),
            &[
                I2cCall {
                    address: 0x68,
                    tx_len: 1,
                    rx_len: 0,
                    repeated: true,
                },
                I2cCall {
                    address: 0x68,
                    tx_len: 0,
                    rx_len: 1,
                    repeated: false,
                },
            ]
        );
        assert_eq!(recorder.written().as_slice(), &[0x75]);
    }

    #[test]
    fn test_i2c_stops_at_first_failure() {
        let recorder = I2cRecorder::new();
        recorder.set_status(-6);
        let mut i2c = I2c::new(recorder.transfer());

        assert_eq!(
            read_register(&mut i2c, 0x20, 0x00),
            Err(I2cError::Status(StatusCode(-6)))
        );
        assert_eq!(recorder.calls().len(), 1);
    }

    #[test]
    fn test_i2c_adjacent_writes_share_one_phase() {
        let recorder = I2cRecorder::new();
        let mut i2c = I2c::new(recorder.transfer());

        i2c::I2c::<SevenBitAddress>::transaction(
            &mut i2c,
            0x51,
            &mut [Operation::Write(&[0x05]), Operation::Write(&[0x10, 0x20])],
        )
        .unwrap();

        assert_eq!(
            recorder.calls().as_slice(),
            &[I2cCall {
                address: 0x51,
                tx_len: 3,
                rx_len: 0,
                repeated: false,
            }]
        );
        assert_eq!(recorder.written().as_slice(), &[0x05, 0x10, 0x20]);
    }

    #[test]
    fn test_i2c_adjacent_reads_share_one_phase() {
        let recorder = I2cRecorder::new();
        recorder.set_read_data(&[1, 2, 3, 4]);
        let mut i2c = I2c::new(recorder.transfer());

        let mut head = [0u8; 1];
        let mut tail = [0u8; 3];
        i2c::I2c::<SevenBitAddress>::transaction(
            &mut i2c,
            0x40,
            &mut [
                Operation::Write(&[0xF7]),
                Operation::Read(&mut head),
                Operation::Read(&mut tail),
            ],
        )
        .unwrap();

        assert_eq!(head, [1]);
        assert_eq!(tail, [2, 3, 4]);
        assert_eq!(
            recorder.calls().as_slice(),
            &[
                I2cCall {
                    address: 0x40,
                    tx_len: 1,
                    rx_len: 0,
                    repeated: true,
                },
                I2cCall {
                    address: 0x40,
                    tx_len: 0,
                    rx_len: 4,
                    repeated: false,
                },
            ]
        );
    }

    #[test]
    fn test_i2c_oversized_merge_is_rejected() {
        let recorder = I2cRecorder::new();
        let mut i2c = I2c::new(recorder.transfer());

        let data = [0u8; MERGE_CAPACITY];
        let result = i2c::I2c::<SevenBitAddress>::transaction(
            &mut i2c,
            0x51,
            &mut [Operation::Write(&[0x00]), Operation::Write(&data)],
        );

        assert_eq!(result, Err(I2cError::MergeOverflow));
        assert_eq!(
            i2c::Error::kind(&I2cError::<StatusCode>::MergeOverflow),
            i2c::ErrorKind::Other
        );
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_i2c_single_write_is_not_size_limited() {
        let recorder = I2cRecorder::new();
        let mut i2c = I2c::new(recorder.transfer());

        let data = [0x33u8; 2 * MERGE_CAPACITY];
        i2c::I2c::<SevenBitAddress>::write(&mut i2c, 0x51, &data).unwrap();

        assert_eq!(recorder.calls()[0].tx_len, 2 * MERGE_CAPACITY);
    }

    #[test]
    fn test_i2c_empty_transaction_is_noop() {
        let recorder = I2cRecorder::new();
        let mut i2c = I2c::new(recorder.transfer());

        i2c::I2c::<SevenBitAddress>::transaction(&mut i2c, 0x10, &mut []).unwrap();

        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_spi_bus_operations_map_to_transfers() {
        let recorder = SpiRecorder::new();
        recorder.set_read_data(&[0xA0, 0xA1, 0xA2]);
        let mut spi = Spi::new(recorder.transfer(), recorder.chip_select());

        let mut read = [0u8; 2];
        SpiBus::<u8>::write(&mut spi, &[0x9F]).unwrap();
        SpiBus::<u8>::read(&mut spi, &mut read).unwrap();
        let mut partial = [0u8; 1];
        SpiBus::<u8>::transfer(&mut spi, &mut partial, &[0x01, 0x02]).unwrap();
        SpiBus::<u8>::flush(&mut spi).unwrap();

        assert_eq!(read, [0xA0, 0xA1]);
        assert_eq!(partial, [0xA2]);
        assert_eq!(
            recorder.events().as_slice(),
            &[
                SpiEvent::Transfer { tx_len: 1, rx_len: 0 },
                SpiEvent::Transfer { tx_len: 0, rx_len: 2 },
                SpiEvent::Transfer { tx_len: 2, rx_len: 1 },
            ]
        );
    }

    #[test]
    fn test_spi_bus_error_from_status() {
        let recorder = SpiRecorder::new();
        recorder.set_status(9);
        let mut spi = Spi::new(recorder.transfer(), recorder.chip_select());

        let err = SpiBus::<u8>::write(&mut spi, &[0x00]).unwrap_err();
        assert_eq!(err, StatusCode(9));
        assert_eq!(spi::Error::kind(&err), spi::ErrorKind::Other);
    }

    #[test]
    fn test_transfer_in_place_chunks_under_one_select() {
        let recorder = SpiRecorder::new();
        let incoming: std::vec::Vec<u8> = (0..40).map(|i| 0x80 | i as u8).collect();
        recorder.set_read_data(&incoming);
        let mut spi = Spi::with_config(
            recorder.transfer(),
            recorder.chip_select(),
            SpiConfig::AUTO_CS,
        );

        let mut words: std::vec::Vec<u8> = (0..40).collect();
        SpiBus::<u8>::transfer_in_place(&mut spi, &mut words).unwrap();

        assert_eq!(words, incoming);
        let outgoing: std::vec::Vec<u8> = (0..40).collect();
        assert_eq!(recorder.written().as_slice(), outgoing.as_slice());
        assert_eq!(
            recorder.events().as_slice(),
            &[
                SpiEvent::ChipSelect(false),
                SpiEvent::Transfer { tx_len: 32, rx_len: 32 },
                SpiEvent::Transfer { tx_len: 8, rx_len: 8 },
                SpiEvent::ChipSelect(true),
            ]
        );
        assert!(spi.auto_cs());
    }

    #[test]
    fn test_transfer_in_place_deselects_on_error() {
        let recorder = SpiRecorder::new();
        recorder.set_status(1);
        let mut spi = Spi::with_config(
            recorder.transfer(),
            recorder.chip_select(),
            SpiConfig::AUTO_CS,
        );

        let mut words = [0u8; 40];
        assert!(SpiBus::<u8>::transfer_in_place(&mut spi, &mut words).is_err());
        assert_eq!(
            recorder.events().as_slice(),
            &[
                SpiEvent::ChipSelect(false),
                SpiEvent::Transfer { tx_len: 32, rx_len: 32 },
                SpiEvent::ChipSelect(true),
            ]
        );
        assert!(spi.auto_cs());
    }

    #[test]
    fn test_transfer_in_place_empty_leaves_chip_select_alone() {
        let recorder = SpiRecorder::new();
        let mut spi = Spi::with_config(
            recorder.transfer(),
            recorder.chip_select(),
            SpiConfig::AUTO_CS,
        );

        SpiBus::<u8>::transfer_in_place(&mut spi, &mut []).unwrap();

        assert!(recorder.events().is_empty());
        assert!(spi.auto_cs());
    }

    #[test]
    fn test_infallible_backend() {
        let mut spi = Spi::new(|_tx: &[u8], rx: &mut [u8]| rx.fill(1), |_level: bool| {});

        let mut words = [0u8; 3];
        let result: Result<(), core::convert::Infallible> =
            SpiBus::<u8>::read(&mut spi, &mut words);
        assert!(result.is_ok());
        assert_eq!(words, [1, 1, 1]);
    }
}
