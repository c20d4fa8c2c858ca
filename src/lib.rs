//! Windows maintenance panel core: a scan-then-clean pipeline over a fixed
//! set of cleanup targets, and polling plus toggling of network adapters
//! and radios. All state lives in a [`session::Session`]; the GUI only
//! sends inputs and renders events.

pub mod categories;
pub mod cleaner;
pub mod config;
pub mod device;
pub mod disk_info;
pub mod errors;
pub mod pipeline;
pub mod probe;
pub mod runtime;
pub mod scan;
pub mod scheduler;
pub mod session;
pub mod shell;
pub mod utils;

#[cfg(test)]
mod testing;
