//! Library components of the `asdp` command-line client.

pub mod cli;
pub mod logging;
pub mod summary;
