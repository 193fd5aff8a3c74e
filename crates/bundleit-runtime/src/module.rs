//! Module system runtime for bundled output.
//!
//! The loader is stitched together from the fragments below. All of them
//! refer to the loader table by [`NAMESPACE`]; the assembler writes the
//! table itself and the registry block before the first fragment.

/// Name of the local table holding the loader state inside a bundle.
pub const NAMESPACE: &str = "__bundleit__";

/// Cache lookup and registry check. Opens the `require` function body.
pub const REQUIRE_PROLOGUE: &str = r#"function __bundleit__.require(module_name)
    local cached = __bundleit__.loaded[module_name]
    if cached ~= nil then
        return cached
    end

    local module_code = __bundleit__.modules[module_name]
    if module_code == nil then
        error("ModuleNotFound: module '" .. tostring(module_name) .. "' not found in bundle", 2)
    end
"#;

/// Compile step for Lua 5.2 and later.
pub const COMPILE_WITH_LOAD: &str = r#"
    local chunk, err = load(module_code, module_name, "t")
"#;

/// Compile step for Lua 5.1, where `load` does not accept strings.
pub const COMPILE_WITH_LOADSTRING: &str = r#"
    local chunk, err = loadstring(module_code, module_name)
"#;

/// Compile failures are not cached; the next require compiles again.
pub const COMPILE_CHECK: &str = r#"    if not chunk then
        error("ModuleLoadError: error loading module '" .. module_name .. "':\n" .. tostring(err), 2)
    end
"#;

/// Run the chunk with no reentrancy tracking.
pub const EXECUTE: &str = r#"
    local result = chunk(module_name)
"#;

/// Run the chunk while the module is marked as resolving.
pub const EXECUTE_GUARDED: &str = r#"
    if __bundleit__.resolving[module_name] then
        error("CyclicRequire: module '" .. module_name .. "' is already being loaded", 2)
    end

    __bundleit__.resolving[module_name] = true
    local ok, result = pcall(chunk, module_name)
    __bundleit__.resolving[module_name] = nil

    if not ok then
        error(result, 0)
    end
"#;

/// Cache the result (or the `true` sentinel) and close the function body.
pub const REQUIRE_EPILOGUE: &str = r#"
    if result == nil then
        result = true
    end

    __bundleit__.loaded[module_name] = result
    return result
end
"#;

/// Points the global `require` at the bundle loader.
pub const REBIND_REQUIRE: &str = "require = __bundleit__.require\n";
