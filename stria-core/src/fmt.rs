//! Logging shims
//!
//! With the `defmt` feature the macros below are `defmt`'s own; without it
//! they expand to nothing, so host builds carry no logging dependency.

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, error, info, trace, warn};

#[cfg(not(feature = "defmt"))]
macro_rules! trace_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! info_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! error_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "defmt"))]
pub(crate) use error_noop as error;
#[cfg(not(feature = "defmt"))]
pub(crate) use info_noop as info;
#[cfg(not(feature = "defmt"))]
pub(crate) use trace_noop as trace;
#[cfg(not(feature = "defmt"))]
pub(crate) use warn_noop as warn;
