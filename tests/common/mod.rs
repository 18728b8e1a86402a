//! Shared integration test infrastructure: object store fixtures, a scripted
//! execution backend and proptest strategies.

#![allow(dead_code)] // Each test binary uses a different subset

pub mod fixtures;
pub mod scripted_backend;
pub mod strategies;

pub use fixtures::*;
pub use scripted_backend::*;
