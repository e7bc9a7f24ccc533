//! Library side of the `overlay-viewer` binary.

pub mod cli;
pub mod filter;
pub mod logging;
pub mod render;
pub mod session;
