//! Core modules: addressing, namespace storage, resolution and output.
//!
//! Everything a command needs between parsing its arguments and writing its
//! result lives here.

pub mod address;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod purge;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod tui;
