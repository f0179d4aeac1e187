//! Library parts of the `elr` command line tool.

#![deny(unsafe_code)]

pub mod logging;
pub mod records;
