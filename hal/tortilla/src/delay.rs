//! Blocking delays
//!
//! [`Delay`] binds a millisecond and a microsecond delay function and
//! dispatches to them. It adds nothing on top: the bound functions decide
//! how the wait is performed and how accurate it is.

/// Millisecond delay backend
///
/// Implemented for every `FnMut(u32)`, so a plain function binds directly.
pub trait DelayMs {
    /// Block for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Microsecond delay backend
///
/// Implemented for every `FnMut(u32)`, so a plain function binds directly.
pub trait DelayUs {
    /// Block for at least `us` microseconds
    fn delay_us(&mut self, us: u32);
}

impl<F: FnMut(u32)> DelayMs for F {
    #[inline(always)]
    fn delay_ms(&mut self, ms: u32) {
        self(ms)
    }
}

impl<F: FnMut(u32)> DelayUs for F {
    #[inline(always)]
    fn delay_us(&mut self, us: u32) {
        self(us)
    }
}

/// Delay unit bound to a millisecond and a microsecond backend
///
/// ```
/// fn wait_ms(_ms: u32) {}
/// fn wait_us(_us: u32) {}
///
/// let mut delay = tortilla::Delay::new(wait_ms, wait_us);
/// delay.ms(54);
/// delay.us(1);
/// ```
pub struct Delay<Ms, Us> {
    ms: Ms,
    us: Us,
}

impl<Ms: DelayMs, Us: DelayUs> Delay<Ms, Us> {
    /// Bind the two delay backends
    pub const fn new(ms: Ms, us: Us) -> Self {
        Self { ms, us }
    }

    /// Wait `value` milliseconds
    #[inline]
    pub fn ms(&mut self, value: u32) {
        #[cfg(feature = "defmt")]
        defmt::trace!("delay {=u32} ms", value);
        self.ms.delay_ms(value);
    }

    /// Wait `value` microseconds
    #[inline]
    pub fn us(&mut self, value: u32) {
        #[cfg(feature = "defmt")]
        defmt::trace!("delay {=u32} us", value);
        self.us.delay_us(value);
    }

    /// Release the bound backends
    pub fn release(self) -> (Ms, Us) {
        (self.ms, self.us)
    }
}
