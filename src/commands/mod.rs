//! Command implementations for the bundlepath CLI

pub mod acquire;
pub mod cache;
pub mod helpers;
pub mod manifest;
pub mod update;
pub mod verify;
pub mod version;
