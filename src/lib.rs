pub mod buffer;
pub mod charset;
pub mod col;
pub mod constant;
pub mod error;
mod opts;
pub mod protocol;
pub mod session;
pub mod sink;
pub mod value;

pub use opts::{DEFAULT_CAPABILITIES, Opts};
pub use protocol::{Protocol, ResultEncoder};

#[cfg(test)]
mod buffer_test;
#[cfg(test)]
mod constant_test;
#[cfg(test)]
mod opts_test;
