//! API key secrets.

pub mod secret;

pub use secret::{ApikeySecret, GeneratedApikey};
