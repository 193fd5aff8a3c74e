//! Test fixtures - Lua project trees and source snippets

use indoc::indoc;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A Lua project laid out in a temporary directory.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Builder-style [`ProjectFixture::write`].
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        self.write(relative, content);
        self
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture directory");
        }
        fs::write(&path, content).expect("failed to write fixture file");
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.join(relative)).expect("failed to read fixture file")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// `main.lua` and `utils/math.lua`; running the bundle prints `3`.
pub fn math_project() -> ProjectFixture {
    ProjectFixture::new()
        .with_file("main.lua", math_main())
        .with_file("utils/math.lua", math_module())
}

pub fn math_main() -> &'static str {
    indoc! {r#"
        x = require("utils.math")
        print(x.add(1,2))
    "#}
}

pub fn math_module() -> &'static str {
    indoc! {r#"
        local M = {}

        function M.add(a, b)
            return a + b
        end

        return M
    "#}
}

/// Increments a global on every evaluation.
pub fn counter_module() -> &'static str {
    indoc! {r#"
        load_count = (load_count or 0) + 1
        return { value = load_count }
    "#}
}

/// Runs top-level code but returns nothing.
pub fn side_effect_module() -> &'static str {
    indoc! {r#"
        side_effects = (side_effects or 0) + 1
    "#}
}

/// Returns `false` explicitly.
pub fn false_module() -> &'static str {
    indoc! {r#"
        false_loads = (false_loads or 0) + 1
        return false
    "#}
}

/// Fails to compile.
pub fn syntax_error_module() -> &'static str {
    "local function broken(\n    return 1\nend\n"
}

/// A source full of characters that need escaping.
pub fn tricky_strings_module() -> &'static str {
    indoc! {r#"
        local M = {}
        M.quote = "she said \"hi\""
        M.backslash = "C:\\lua\\bin"
        M.long = [[line one
        line two]]
        M.single = 'it\'s'
        return M
    "#}
}
