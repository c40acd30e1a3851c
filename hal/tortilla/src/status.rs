//! Transfer status interpretation
//!
//! The channels never look at the status a bound callback returns; they
//! hand it back untouched. The [`Status`] trait is only used where an API
//! demands a `Result`, such as the `embedded-hal` implementations in
//! [`crate::ehal`].

use core::convert::Infallible;
use core::fmt;

/// A callback status that can be read as success or failure
pub trait Status {
    /// Error produced for a failing status
    type Error: fmt::Debug;

    /// Convert the status into a `Result`
    fn into_result(self) -> Result<(), Self::Error>;
}

/// Non-zero status code returned by a C-style transfer function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusCode(pub i32);

impl StatusCode {
    /// The raw code as returned by the callback
    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer failed with status {}", self.0)
    }
}

impl core::error::Error for StatusCode {}

/// `0` means success; every other value is a failure
impl Status for i32 {
    type Error = StatusCode;

    fn into_result(self) -> Result<(), StatusCode> {
        match self {
            0 => Ok(()),
            code => Err(StatusCode(code)),
        }
    }
}

/// Callbacks that cannot fail
impl Status for () {
    type Error = Infallible;

    fn into_result(self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl<E: fmt::Debug> Status for Result<(), E> {
    type Error = E;

    fn into_result(self) -> Result<(), E> {
        self
    }
}
