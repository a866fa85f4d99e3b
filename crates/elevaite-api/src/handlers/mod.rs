//! Route handlers organized by domain.

pub mod account;
pub mod apikey;
pub mod application;
pub mod auth;
pub mod dataset;
pub mod health;
pub mod project;
pub mod role;
pub mod user;
