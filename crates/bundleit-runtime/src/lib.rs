//! Runtime support code for bundleit.
//! Provides the Lua loader fragments the assembler writes into every bundle.

pub mod module;
