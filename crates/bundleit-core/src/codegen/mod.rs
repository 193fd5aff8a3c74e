pub mod builder;

pub use builder::BundleAssemblerBuilder;

use bundleit_runtime::module;

use crate::config::LuaVersion;
use crate::escape::{Escaper, LuaEscaper};
use crate::module::EntryModule;
use crate::registry::Registry;

/// Target Lua version for code generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LuaTarget {
    /// Lua 5.1 (`load` only takes functions, strings go through `loadstring`)
    Lua51,
    /// Lua 5.2 (`load` accepts strings and a mode)
    Lua52,
    Lua53,
    #[default]
    Lua54,
}

impl LuaTarget {
    /// Check if `load` compiles source strings on this target
    pub fn load_accepts_strings(self) -> bool {
        !matches!(self, LuaTarget::Lua51)
    }

    /// Loader fragment that compiles `module_code` into `chunk`
    pub fn compile_fragment(self) -> &'static str {
        if self.load_accepts_strings() {
            module::COMPILE_WITH_LOAD
        } else {
            module::COMPILE_WITH_LOADSTRING
        }
    }

    /// Escaper matching this target's string literal grammar.
    ///
    /// Every supported Lua version shares the short string escapes we emit.
    pub fn escaper(self) -> Box<dyn Escaper> {
        Box::new(LuaEscaper)
    }
}

impl From<LuaVersion> for LuaTarget {
    fn from(version: LuaVersion) -> Self {
        match version {
            LuaVersion::Lua51 => LuaTarget::Lua51,
            LuaVersion::Lua52 => LuaTarget::Lua52,
            LuaVersion::Lua53 => LuaTarget::Lua53,
            LuaVersion::Lua54 => LuaTarget::Lua54,
        }
    }
}

/// Writes the single-file bundle: loader state, registry, loader function,
/// `require` rebinding and finally the entry source, untouched.
pub struct BundleAssembler {
    output: String,
    indent_level: usize,
    indent_str: String,
    target: LuaTarget,
    escaper: Box<dyn Escaper>,
    detect_cycles: bool,
}

impl BundleAssembler {
    pub fn new(target: LuaTarget) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_str: "    ".to_string(),
            target,
            escaper: target.escaper(),
            detect_cycles: false,
        }
    }

    pub fn with_escaper(mut self, escaper: Box<dyn Escaper>) -> Self {
        self.escaper = escaper;
        self
    }

    pub fn with_cycle_detection(mut self, detect_cycles: bool) -> Self {
        self.detect_cycles = detect_cycles;
        self
    }

    pub fn assemble(mut self, registry: &Registry, entry: &EntryModule) -> String {
        self.write_header();
        self.write_loader_state();
        self.writeln("");
        self.write_registry(registry);
        self.writeln("");
        self.write_loader();
        self.writeln("");
        self.write(module::REBIND_REQUIRE);
        self.writeln("");
        self.write(&entry.source);
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn writeln(&mut self, s: &str) {
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str(&self.indent_str);
        }
    }

    fn write_header(&mut self) {
        self.writeln(&format!(
            "-- Bundled by bundleit {}. Regenerate instead of editing.",
            env!("CARGO_PKG_VERSION")
        ));
        self.writeln("");
    }

    fn write_loader_state(&mut self) {
        self.writeln(&format!("local {} = {{", module::NAMESPACE));
        self.indent();
        self.write_indent();
        self.writeln("modules = {},");
        self.write_indent();
        self.writeln("loaded = {},");
        if self.detect_cycles {
            self.write_indent();
            self.writeln("resolving = {},");
        }
        self.dedent();
        self.writeln("}");
    }

    fn write_registry(&mut self, registry: &Registry) {
        self.writeln(&format!("{}.modules = {{", module::NAMESPACE));
        self.indent();
        for (id, source) in registry.iter() {
            let key = self.escaper.quote(id.as_str());
            let value = self.escaper.quote(source);
            self.write_indent();
            self.write("[");
            self.write(&key);
            self.write("] = ");
            self.write(&value);
            self.writeln(",");
        }
        self.dedent();
        self.writeln("}");
    }

    fn write_loader(&mut self) {
        self.write(module::REQUIRE_PROLOGUE);
        self.write(self.target.compile_fragment());
        self.write(module::COMPILE_CHECK);
        if self.detect_cycles {
            self.write(module::EXECUTE_GUARDED);
        } else {
            self.write(module::EXECUTE);
        }
        self.write(module::REQUIRE_EPILOGUE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleId, SourceModule};
    use std::path::PathBuf;

    fn registry(modules: &[(&str, &str)]) -> Registry {
        let mut registry = Registry::new();
        for (id, source) in modules {
            registry.insert(SourceModule {
                id: ModuleId::new(*id),
                path: PathBuf::from(format!("{}.lua", id.replace('.', "/"))),
                source: source.to_string(),
            });
        }
        registry
    }

    fn entry(source: &str) -> EntryModule {
        EntryModule {
            path: PathBuf::from("main.lua"),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_sections_appear_in_order() {
        let output = BundleAssembler::new(LuaTarget::Lua54).assemble(
            &registry(&[("utils.math", "return {}")]),
            &entry("print(require(\"utils.math\"))"),
        );

        let state = output.find("local __bundleit__ = {").unwrap();
        let modules = output.find("__bundleit__.modules = {").unwrap();
        let loader = output.find("function __bundleit__.require(module_name)").unwrap();
        let rebind = output.find("require = __bundleit__.require").unwrap();
        let entry_pos = output.find("print(require(\"utils.math\"))").unwrap();

        assert!(state < modules);
        assert!(modules < loader);
        assert!(loader < rebind);
        assert!(rebind < entry_pos);
    }

    #[test]
    fn test_registry_entries_are_escaped() {
        let output = BundleAssembler::new(LuaTarget::Lua54).assemble(
            &registry(&[("greet", "return function(n)\n  return \"hi \" .. n\nend")]),
            &entry(""),
        );

        assert!(output.contains(
            r#"    ["greet"] = "return function(n)\n  return \"hi \" .. n\nend","#
        ));
    }

    #[test]
    fn test_entry_is_verbatim_at_end() {
        let main = "local s = \"quote\\\"d\"\nprint(s)\n";
        let output = BundleAssembler::new(LuaTarget::Lua54).assemble(&Registry::new(), &entry(main));
        assert!(output.ends_with(main));
    }

    #[test]
    fn test_target_selects_compile_call() {
        let output_54 = BundleAssembler::new(LuaTarget::Lua54).assemble(&Registry::new(), &entry(""));
        assert!(output_54.contains("load(module_code, module_name, \"t\")"));
        assert!(!output_54.contains("loadstring"));

        let output_51 = BundleAssembler::new(LuaTarget::Lua51).assemble(&Registry::new(), &entry(""));
        assert!(output_51.contains("loadstring(module_code, module_name)"));
    }

    #[test]
    fn test_cycle_guard_is_opt_in() {
        let plain = BundleAssembler::new(LuaTarget::Lua54).assemble(&Registry::new(), &entry(""));
        assert!(!plain.contains("resolving"));
        assert!(!plain.contains("CyclicRequire"));

        let guarded = BundleAssembler::new(LuaTarget::Lua54)
            .with_cycle_detection(true)
            .assemble(&Registry::new(), &entry(""));
        assert!(guarded.contains("    resolving = {},"));
        assert!(guarded.contains("CyclicRequire"));
        assert!(guarded.contains("pcall(chunk, module_name)"));
    }

    #[test]
    fn test_lua_version_maps_to_target() {
        assert_eq!(LuaTarget::from(LuaVersion::Lua51), LuaTarget::Lua51);
        assert_eq!(LuaTarget::from(LuaVersion::Lua54), LuaTarget::Lua54);
        assert!(!LuaTarget::Lua51.load_accepts_strings());
        assert!(LuaTarget::Lua52.load_accepts_strings());
    }
}
