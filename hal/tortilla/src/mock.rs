//! Recording test doubles
//!
//! Each recorder hands out callbacks that log every call into a shared,
//! fixed-capacity log, return a scripted status and fill receive buffers
//! from a scripted queue. Bind the callbacks to a channel, run the code
//! under test, then inspect the log.
//!
//! ```
//! use tortilla::mock::{SpiEvent, SpiRecorder};
//! use tortilla::Spi;
//!
//! let recorder = SpiRecorder::new();
//! let mut spi = Spi::new(recorder.transfer(), recorder.chip_select());
//! spi.enable_auto_cs(true);
//! spi.write(&[0x01, 0x02]);
//!
//! assert_eq!(
//!     recorder.events().as_slice(),
//!     &[
//!         SpiEvent::ChipSelect(false),
//!         SpiEvent::Transfer { tx_len: 2, rx_len: 0 },
//!         SpiEvent::ChipSelect(true),
//!     ]
//! );
//! ```
//!
//! Calls past [`MAX_EVENTS`] and bytes past [`MAX_BYTES`] are dropped
//! from the log.

use core::cell::{Cell, RefCell};

use heapless::{Deque, Vec};

/// Capacity of every call log
pub const MAX_EVENTS: usize = 32;

/// Capacity of the written-bytes log and of the read-data queue
pub const MAX_BYTES: usize = 256;

/// Call log
pub type EventLog<T> = Vec<T, MAX_EVENTS>;

/// Byte log
pub type ByteLog = Vec<u8, MAX_BYTES>;

/// Shared scripting state of the bus recorders
struct Script {
    status: Cell<i32>,
    read_data: RefCell<Deque<u8, MAX_BYTES>>,
    written: RefCell<ByteLog>,
}

impl Script {
    fn new() -> Self {
        Self {
            status: Cell::new(0),
            read_data: RefCell::new(Deque::new()),
            written: RefCell::new(Vec::new()),
        }
    }

    fn set_read_data(&self, data: &[u8]) {
        let mut queue = self.read_data.borrow_mut();
        queue.clear();
        for &byte in data {
            let _ = queue.push_back(byte);
        }
    }

    /// Log `tx`, fill `rx` from the queue and return the scripted status
    fn exchange(&self, tx: &[u8], rx: &mut [u8]) -> i32 {
        let mut written = self.written.borrow_mut();
        for &byte in tx {
            let _ = written.push(byte);
        }

        let mut queue = self.read_data.borrow_mut();
        for slot in rx.iter_mut() {
            match queue.pop_front() {
                Some(byte) => *slot = byte,
                None => break,
            }
        }

        self.status.get()
    }
}

/// One call seen by an [`SpiRecorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiEvent {
    /// Chip-select callback invoked with this level
    ChipSelect(bool),
    /// Transfer callback invoked with these lengths
    Transfer { tx_len: usize, rx_len: usize },
}

/// Records SPI transfer and chip-select calls
pub struct SpiRecorder {
    events: RefCell<EventLog<SpiEvent>>,
    script: Script,
}

impl SpiRecorder {
    /// Create a recorder returning status `0` and no read data
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            script: Script::new(),
        }
    }

    /// Transfer callback bound to this recorder
    pub fn transfer(&self) -> impl FnMut(&[u8], &mut [u8]) -> i32 + '_ {
        move |tx: &[u8], rx: &mut [u8]| {
            let _ = self.events.borrow_mut().push(SpiEvent::Transfer {
                tx_len: tx.len(),
                rx_len: rx.len(),
            });
            self.script.exchange(tx, rx)
        }
    }

    /// Chip-select callback bound to this recorder
    pub fn chip_select(&self) -> impl FnMut(bool) + '_ {
        move |level: bool| {
            let _ = self.events.borrow_mut().push(SpiEvent::ChipSelect(level));
        }
    }

    /// Status returned by every following transfer
    pub fn set_status(&self, status: i32) {
        self.script.status.set(status);
    }

    /// Bytes handed out to following receive buffers, in order
    pub fn set_read_data(&self, data: &[u8]) {
        self.script.set_read_data(data);
    }

    /// Calls recorded so far
    pub fn events(&self) -> EventLog<SpiEvent> {
        self.events.borrow().clone()
    }

    /// All transmitted bytes, concatenated
    pub fn written(&self) -> ByteLog {
        self.script.written.borrow().clone()
    }

    /// Forget recorded calls and written bytes
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
        self.script.written.borrow_mut().clear();
    }
}

impl Default for SpiRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// One call seen by an [`I2cRecorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cCall {
    pub address: u16,
    pub tx_len: usize,
    pub rx_len: usize,
    pub repeated: bool,
}

/// Records I2C transfer calls
pub struct I2cRecorder {
    calls: RefCell<EventLog<I2cCall>>,
    script: Script,
}

impl I2cRecorder {
    /// Create a recorder returning status `0` and no read data
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            script: Script::new(),
        }
    }

    /// Transfer callback bound to this recorder
    pub fn transfer(&self) -> impl FnMut(u16, &[u8], &mut [u8], bool) -> i32 + '_ {
        move |address: u16, tx: &[u8], rx: &mut [u8], repeated: bool| {
            let _ = self.calls.borrow_mut().push(I2cCall {
                address,
                tx_len: tx.len(),
                rx_len: rx.len(),
                repeated,
            });
            self.script.exchange(tx, rx)
        }
    }

    /// Status returned by every following transfer
    pub fn set_status(&self, status: i32) {
        self.script.status.set(status);
    }

    /// Bytes handed out to following receive buffers, in order
    pub fn set_read_data(&self, data: &[u8]) {
        self.script.set_read_data(data);
    }

    /// Calls recorded so far
    pub fn calls(&self) -> EventLog<I2cCall> {
        self.calls.borrow().clone()
    }

    /// All transmitted bytes, concatenated
    pub fn written(&self) -> ByteLog {
        self.script.written.borrow().clone()
    }

    /// Forget recorded calls and written bytes
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
        self.script.written.borrow_mut().clear();
    }
}

impl Default for I2cRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// One call seen by a [`DelayRecorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayCall {
    Ms(u32),
    Us(u32),
}

/// Records delay calls without waiting
pub struct DelayRecorder {
    calls: RefCell<EventLog<DelayCall>>,
}

impl DelayRecorder {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Millisecond callback bound to this recorder
    pub fn ms(&self) -> impl FnMut(u32) + '_ {
        move |ms: u32| {
            let _ = self.calls.borrow_mut().push(DelayCall::Ms(ms));
        }
    }

    /// Microsecond callback bound to this recorder
    pub fn us(&self) -> impl FnMut(u32) + '_ {
        move |us: u32| {
            let _ = self.calls.borrow_mut().push(DelayCall::Us(us));
        }
    }

    /// Calls recorded so far
    pub fn calls(&self) -> EventLog<DelayCall> {
        self.calls.borrow().clone()
    }
}

impl Default for DelayRecorder {
    fn default() -> Self {
        Self::new()
    }
}
