//! Running bundles in an embedded Lua 5.4 state.
//!
//! Bundles are plain Lua, so their run-time behavior is checked by executing
//! them. Every run gets a fresh state with `print` redirected into a buffer.

use mlua::Lua;
use std::path::Path;

const CAPTURE_PRINT: &str = r##"
__captured_stdout = {}
print = function(...)
    local parts = {}
    for i = 1, select("#", ...) do
        parts[i] = tostring((select(i, ...)))
    end
    __captured_stdout[#__captured_stdout + 1] = table.concat(parts, "\t") .. "\n"
end
"##;

const READ_CAPTURED: &str = "return table.concat(__captured_stdout)";

#[derive(Debug, Clone)]
pub struct LuaInterpreter {
    version: String,
}

#[derive(Debug, Clone)]
pub struct LuaOutput {
    pub stdout: String,
    /// Error message of a failed run, empty on success
    pub stderr: String,
    pub success: bool,
}

impl LuaInterpreter {
    pub fn new() -> Self {
        let banner: String = Lua::new()
            .load("return _VERSION")
            .eval()
            .expect("failed to read _VERSION");
        let version = parse_version(&banner).expect("unrecognized _VERSION");
        Self { version }
    }

    /// Language version as `"5.x"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn run_file(&self, script: &Path) -> LuaOutput {
        let source = std::fs::read_to_string(script).expect("failed to read Lua script");
        self.run_source(&source)
    }

    /// Execute `source` as the main chunk of a new state.
    pub fn run_source(&self, source: &str) -> LuaOutput {
        let lua = Lua::new();
        lua.load(CAPTURE_PRINT)
            .set_name("capture")
            .exec()
            .expect("failed to install print capture");

        let result = lua.load(source).set_name("bundle").exec();
        let stdout: String = lua
            .load(READ_CAPTURED)
            .eval()
            .expect("failed to read captured output");

        match result {
            Ok(()) => LuaOutput {
                stdout,
                stderr: String::new(),
                success: true,
            },
            Err(err) => LuaOutput {
                stdout,
                stderr: err.to_string(),
                success: false,
            },
        }
    }
}

impl Default for LuaInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_version(banner: &str) -> Option<String> {
    let rest = &banner[banner.find("Lua ")? + 4..];
    let mut parts = rest.split(|c: char| c == '.' || c.is_whitespace());
    let major = parts.next()?;
    let minor = parts.next()?;
    if major.parse::<u32>().is_err() || minor.parse::<u32>().is_err() {
        return None;
    }
    Some(format!("{}.{}", major, minor))
}
