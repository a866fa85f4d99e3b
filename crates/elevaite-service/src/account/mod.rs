//! Account management and account membership services.

pub mod service;

pub use service::{AccountService, AccountUser, AccountUserFilter};
