pub mod bundler;
pub mod codegen;
pub mod config;
pub mod discovery;
pub mod entry;
pub mod errors;
pub mod escape;
pub mod module;
pub mod registry;

pub use bundler::{Bundle, BundleSummary, Bundler};
pub use codegen::{BundleAssembler, BundleAssemblerBuilder, LuaTarget};
pub use config::{BundleConfig, BundleOptions, CliOverrides, LuaVersion};
pub use discovery::ModuleDiscoverer;
pub use entry::separate_entry;
pub use errors::{BundleError, Result};
pub use escape::{EscapeError, Escaper, LuaEscaper};
pub use module::{EntryModule, ModuleId, SourceModule};
pub use registry::{CollisionPolicy, Insertion, Registry};
