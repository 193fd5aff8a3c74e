//! Test utilities and fixtures for bundleit
//!
//! This crate provides shared test helpers that can be used by the
//! integration tests of every workspace crate.

pub mod fixtures;
pub mod lua;

pub use fixtures::ProjectFixture;
pub use lua::{LuaInterpreter, LuaOutput};
