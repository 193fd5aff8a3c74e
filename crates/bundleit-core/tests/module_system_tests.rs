//! Run-time behavior of the embedded loader.
//!
//! Every test assembles a bundle and executes it in an embedded Lua state.

use bundleit_core::{BundleConfig, Bundler, LuaVersion};
use bundleit_test_helpers::fixtures::{
    counter_module, false_module, math_project, side_effect_module, syntax_error_module,
    tricky_strings_module,
};
use bundleit_test_helpers::{LuaInterpreter, LuaOutput, ProjectFixture};

fn run_bundle(project: &ProjectFixture, lua: &LuaInterpreter, detect_cycles: bool) -> LuaOutput {
    let mut config = BundleConfig::default();
    config.bundle_options.target = lua.version().parse::<LuaVersion>().unwrap();
    config.bundle_options.detect_cycles = detect_cycles;
    config.bundle_options.output = project.join("bundle.lua");

    let bundle = Bundler::new(project.path(), config).build().unwrap();
    lua.run_source(&bundle.code)
}

fn run_ok(project: &ProjectFixture, lua: &LuaInterpreter) -> String {
    let output = run_bundle(project, lua, false);
    assert!(output.success, "bundle failed: {}", output.stderr);
    output.stdout
}

// ============================================================================
// END-TO-END
// ============================================================================

#[test]
fn test_require_nested_module_prints_sum() {
    let lua = LuaInterpreter::new();

    assert_eq!(run_ok(&math_project(), &lua), "3\n");
}

#[test]
fn test_bundle_runs_outside_project_layout() {
    let lua = LuaInterpreter::new();

    let project = math_project();
    let mut config = BundleConfig::default();
    config.bundle_options.target = lua.version().parse().unwrap();
    let elsewhere = ProjectFixture::new();
    config.bundle_options.output = elsewhere.join("dist/app.lua");

    Bundler::new(project.path(), config).run().unwrap();
    drop(project);

    let output = lua.run_file(&elsewhere.join("dist/app.lua"));
    assert!(output.success, "bundle failed: {}", output.stderr);
    assert_eq!(output.stdout, "3\n");
}

// ============================================================================
// CACHING
// ============================================================================

#[test]
fn test_require_twice_evaluates_once() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("counter.lua", counter_module())
        .with_file(
            "main.lua",
            r#"
local a = require("counter")
local b = require("counter")
print(rawequal(a, b), load_count, a.value)
"#,
        );

    assert_eq!(run_ok(&project, &lua), "true\t1\t1\n");
}

#[test]
fn test_module_without_return_caches_sentinel() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("effects.lua", side_effect_module())
        .with_file(
            "main.lua",
            r#"
local first = require("effects")
local second = require("effects")
print(first, second, side_effects)
"#,
        );

    assert_eq!(run_ok(&project, &lua), "true\ttrue\t1\n");
}

#[test]
fn test_module_returning_false_is_cached() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("flag.lua", false_module())
        .with_file(
            "main.lua",
            r#"print(require("flag"), require("flag"), false_loads)"#,
        );

    assert_eq!(run_ok(&project, &lua), "false\tfalse\t1\n");
}

#[test]
fn test_modules_load_lazily_in_require_order() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("a.lua", "order = (order or '') .. 'a'\nreturn require('b')")
        .with_file("b.lua", "order = (order or '') .. 'b'\nreturn 'from b'")
        .with_file("unused.lua", "order = (order or '') .. 'unused'")
        .with_file(
            "main.lua",
            r#"
print(order)
print(require("a"))
print(order)
"#,
        );

    assert_eq!(run_ok(&project, &lua), "nil\nfrom b\nab\n");
}

#[test]
fn test_module_receives_its_identifier() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("pkg/name.lua", "return (...)")
        .with_file("main.lua", r#"print(require("pkg.name"))"#);

    assert_eq!(run_ok(&project, &lua), "pkg.name\n");
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_missing_module_raises_module_not_found() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new().with_file(
        "main.lua",
        r#"
local ok, err = pcall(require, "missing.module")
print(ok)
print(err)
"#,
    );

    let stdout = run_ok(&project, &lua);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("false"));
    let message = lines.next().unwrap();
    assert!(message.contains("ModuleNotFound"), "{message}");
    assert!(message.contains("missing.module"), "{message}");
}

#[test]
fn test_unprotected_missing_module_aborts_bundle() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new().with_file("main.lua", "require('nowhere')\nprint('unreachable')");

    let output = run_bundle(&project, &lua, false);
    assert!(!output.success);
    assert!(output.stderr.contains("ModuleNotFound"));
    assert!(output.stderr.contains("nowhere"));
    assert!(!output.stdout.contains("unreachable"));
}

#[test]
fn test_syntax_error_raises_module_load_error_every_time() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("broken.lua", syntax_error_module())
        .with_file("fine.lua", "return 'fine'")
        .with_file(
            "main.lua",
            r#"
for _ = 1, 2 do
    local ok, err = pcall(require, "broken")
    print(ok)
    print((string.gsub(err, "\n", " ")))
end
print(require("fine"))
"#,
        );

    let stdout = run_ok(&project, &lua);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5, "{stdout}");
    for pair in lines[..4].chunks(2) {
        assert_eq!(pair[0], "false");
        assert!(pair[1].contains("ModuleLoadError"), "{}", pair[1]);
        assert!(pair[1].contains("broken"), "{}", pair[1]);
    }
    assert_eq!(lines[4], "fine");
}

#[test]
fn test_runtime_error_in_module_is_not_cached() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file(
            "flaky.lua",
            "attempts = (attempts or 0) + 1\nif attempts == 1 then error('first try') end\nreturn attempts",
        )
        .with_file(
            "main.lua",
            r#"
print(pcall(require, "flaky"))
print(require("flaky"), require("flaky"))
"#,
        );

    let stdout = run_ok(&project, &lua);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with("false"), "{stdout}");
    assert!(lines[0].contains("first try"), "{stdout}");
    assert_eq!(lines[1], "2\t2");
}

// ============================================================================
// CYCLES
// ============================================================================

#[test]
fn test_cycle_guard_raises_cyclic_require() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("a.lua", "return require('b')")
        .with_file("b.lua", "return require('a')")
        .with_file(
            "main.lua",
            r#"
for _ = 1, 2 do
    local ok, err = pcall(require, "a")
    print(ok)
    print((string.gsub(err, "\n", " ")))
end
"#,
        );

    let output = run_bundle(&project, &lua, true);
    assert!(output.success, "bundle failed: {}", output.stderr);
    let lines: Vec<&str> = output.stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{}", output.stdout);
    for pair in lines.chunks(2) {
        assert_eq!(pair[0], "false");
        assert!(pair[1].contains("CyclicRequire"), "{}", pair[1]);
        assert!(pair[1].contains("'a'"), "{}", pair[1]);
    }
}

#[test]
fn test_cycle_guard_allows_diamonds() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("base.lua", "base_loads = (base_loads or 0) + 1\nreturn 1")
        .with_file("left.lua", "return require('base') + 1")
        .with_file("right.lua", "return require('base') + 2")
        .with_file(
            "main.lua",
            r#"print(require("left") + require("right"), base_loads)"#,
        );

    let output = run_bundle(&project, &lua, true);
    assert!(output.success, "bundle failed: {}", output.stderr);
    assert_eq!(output.stdout, "5\t1\n");
}

// ============================================================================
// SOURCE FIDELITY
// ============================================================================

#[test]
fn test_escaped_sources_round_trip_through_lua() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("tricky.lua", tricky_strings_module())
        .with_file(
            "main.lua",
            r#"
local m = require("tricky")
print(m.quote == 'she said "hi"')
print(m.backslash == "C:\\lua\\bin")
print(m.long == "line one\nline two")
print(m.single == "it's")
"#,
        );

    assert_eq!(run_ok(&project, &lua), "true\ntrue\ntrue\ntrue\n");
}

#[test]
fn test_crlf_sources_load() {
    let lua = LuaInterpreter::new();

    let project = ProjectFixture::new()
        .with_file("windows.lua", "local t = {\r\n  v = 7\r\n}\r\nreturn t\r\n")
        .with_file("main.lua", r#"print(require("windows").v)"#);

    assert_eq!(run_ok(&project, &lua), "7\n");
}

#[test]
fn test_identifier_collision_last_write_wins() {
    let lua = LuaInterpreter::new();

    // `a/b.lua` is visited before `a.b.lua`, so the flat file wins.
    let project = ProjectFixture::new()
        .with_file("a/b.lua", "return 'nested'")
        .with_file("a.b.lua", "return 'flat'")
        .with_file("main.lua", r#"print(require("a.b"))"#);

    assert_eq!(run_ok(&project, &lua), "flat\n");
}
