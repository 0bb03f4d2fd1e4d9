//! overtun command implementations.

pub mod capture;
pub mod create;
pub mod show;
