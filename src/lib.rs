//! Averages a sequence of values and narrates every step through a logger
//! that writes to the console and to a file.

pub mod config;
pub mod logging;
pub mod processor;

pub use config::Config;
pub use logging::{Logger, Registry, Severity};
pub use processor::{Processor, ValidationFailure, Value};
