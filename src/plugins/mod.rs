//! Optional subsystems layered on top of the core store.

pub mod remote;
