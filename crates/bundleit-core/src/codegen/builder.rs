//! Builder pattern for BundleAssembler configuration
//!
//! # Example
//!
//! ```rust
//! use bundleit_core::codegen::{BundleAssemblerBuilder, LuaTarget};
//! use bundleit_core::module::EntryModule;
//! use bundleit_core::registry::Registry;
//!
//! let assembler = BundleAssemblerBuilder::new()
//!     .target(LuaTarget::Lua53)
//!     .detect_cycles(true)
//!     .build();
//!
//! let entry = EntryModule {
//!     path: "main.lua".into(),
//!     source: "print('hello')".to_string(),
//! };
//! let bundle = assembler.assemble(&Registry::new(), &entry);
//! assert!(bundle.ends_with("print('hello')"));
//! ```

use super::{BundleAssembler, LuaTarget};
use crate::config::BundleOptions;
use crate::escape::Escaper;

/// Builder for configuring and constructing a [`BundleAssembler`] instance.
///
/// # Optional Configuration
///
/// - `target`: Lua version target (defaults to Lua 5.4)
/// - `escaper`: string literal escaper (defaults to the target's own)
/// - `detect_cycles`: emit the cyclic require guard (defaults to off)
#[derive(Default)]
pub struct BundleAssemblerBuilder {
    target: LuaTarget,
    escaper: Option<Box<dyn Escaper>>,
    detect_cycles: bool,
}

impl BundleAssemblerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the assembly-related fields of `options`.
    pub fn from_options(options: &BundleOptions) -> Self {
        Self::new()
            .target(options.target.into())
            .detect_cycles(options.detect_cycles)
    }

    pub fn target(mut self, target: LuaTarget) -> Self {
        self.target = target;
        self
    }

    /// Overrides the escaper picked from the target.
    pub fn escaper(mut self, escaper: Box<dyn Escaper>) -> Self {
        self.escaper = Some(escaper);
        self
    }

    pub fn detect_cycles(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    pub fn build(self) -> BundleAssembler {
        let mut assembler =
            BundleAssembler::new(self.target).with_cycle_detection(self.detect_cycles);

        if let Some(escaper) = self.escaper {
            assembler = assembler.with_escaper(escaper);
        }

        assembler
    }
}
