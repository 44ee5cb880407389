pub mod classify;
pub mod error;
pub mod imap;
pub mod logging;
pub mod manager;
pub mod message;
pub mod secrets;
pub mod settings;
pub mod smtp;
pub mod sorter;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use error::{Error, Result};
