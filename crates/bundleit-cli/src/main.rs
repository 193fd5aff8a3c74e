use anyhow::Context;
use bundleit_core::config::{BundleConfig, CliOverrides, CONFIG_FILE_NAME, DEFAULT_ENTRY, LUA_EXTENSION};
use bundleit_core::{Bundler, CollisionPolicy, LuaVersion};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// bundleit - Pack a multi-file Lua project into one self-contained file
#[derive(Parser, Debug, Clone)]
#[command(name = "bundleit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the Lua project
    #[arg(value_name = "PROJECT_DIR", default_value = ".")]
    project_dir: PathBuf,

    /// Output file [default: bundle.lua]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// File name of the entry module [default: main.lua]
    #[arg(short, long, value_name = "NAME")]
    main: Option<String>,

    /// Path to a bundleit.yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target Lua version (5.1, 5.2, 5.3, 5.4)
    #[arg(long, value_name = "VERSION")]
    target: Option<String>,

    /// Identifier collision handling (overwrite, warn, error)
    #[arg(long, value_name = "POLICY")]
    on_collision: Option<String>,

    /// Fail cyclic requires at run time instead of recursing
    #[arg(long, overrides_with = "no_detect_cycles")]
    detect_cycles: bool,

    /// Let cyclic requires recurse, even if the config file enables the guard
    #[arg(long, overrides_with = "detect_cycles")]
    no_detect_cycles: bool,

    /// Leave out files matching this glob (relative to PROJECT_DIR, repeatable)
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Rebuild the bundle whenever a source file changes
    #[arg(short, long)]
    watch: bool,

    /// Initialize a new bundleit project in PROJECT_DIR
    #[arg(long)]
    init: bool,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for detailed logs, RUST_LOG=info for pipeline milestones
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.init {
        init_project(&cli.project_dir)?;
        return Ok(());
    }

    let config = load_config(&cli)?;
    debug!("Resolved configuration: {:?}", config);

    let bundler = Bundler::new(&cli.project_dir, config);
    if cli.watch {
        watch_mode(&bundler)
    } else {
        bundle(&bundler)
    }
}

/// Initialize a new bundleit project with a configuration file
fn init_project(dir: &Path) -> anyhow::Result<()> {
    println!("Initializing new bundleit project in {}...", dir.display());
    std::fs::create_dir_all(dir)?;

    let config = r#"# bundleit configuration

bundleOptions:
  entry: main.lua        # File name of the entry module
  output: bundle.lua     # Relative to this file
  target: "5.4"          # Lua version: 5.1, 5.2, 5.3, 5.4
  onCollision: warn      # overwrite, warn or error
  detectCycles: false    # Raise CyclicRequire instead of recursing

exclude: []              # Glob patterns of files to leave out
"#;

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        println!("Kept existing {}", CONFIG_FILE_NAME);
    } else {
        std::fs::write(&config_path, config)?;
        println!("Created {}", CONFIG_FILE_NAME);
    }

    let sample = r#"-- Entry point: runs first when the bundle executes.
-- Other .lua files are available through require("dir.file").

print("Hello from bundleit!")
"#;

    let entry_path = dir.join(DEFAULT_ENTRY);
    if entry_path.exists() {
        println!("Kept existing {}", DEFAULT_ENTRY);
    } else {
        std::fs::write(&entry_path, sample)?;
        println!("Created {}", DEFAULT_ENTRY);
    }

    println!("\nProject initialized successfully!");
    println!("Run 'bundleit {}' to build your first bundle.", dir.display());

    Ok(())
}

/// Load the configuration file (explicit or discovered) and apply CLI flags
fn load_config(cli: &Cli) -> anyhow::Result<BundleConfig> {
    let mut config = match cli.config {
        Some(ref path) => BundleConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => BundleConfig::discover(&cli.project_dir)
            .with_context(|| format!("Failed to load {}", CONFIG_FILE_NAME))?,
    };

    let overrides = CliOverrides {
        entry: cli.main.clone(),
        output: cli.output.clone(),
        target: cli
            .target
            .as_deref()
            .map(str::parse::<LuaVersion>)
            .transpose()?,
        on_collision: cli
            .on_collision
            .as_deref()
            .map(str::parse::<CollisionPolicy>)
            .transpose()?,
        detect_cycles: match (cli.detect_cycles, cli.no_detect_cycles) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        },
        exclude: cli.exclude.clone(),
    };
    config.merge(&overrides);

    Ok(config)
}

/// Build and write the bundle once
fn bundle(bundler: &Bundler) -> anyhow::Result<()> {
    info!("Bundling {}", bundler.project_dir().display());

    let summary = bundler.run()?;
    println!(
        "Bundled {} module(s) into {}",
        summary.module_count,
        summary.output.display()
    );
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Watch mode - rebuild on source changes
fn watch_mode(bundler: &Bundler) -> anyhow::Result<()> {
    use notify::{Event, EventKind, RecursiveMode, Watcher};
    use std::sync::mpsc::channel;
    use std::time::{Duration, Instant};

    println!(
        "Watching {} for changes... (Press Ctrl+C to stop)",
        bundler.project_dir().display()
    );

    println!("\nInitial build:");
    if let Err(e) = bundle(bundler) {
        eprintln!("Error: {:#}", e);
    }

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;
    watcher.watch(&absolute(bundler.project_dir()), RecursiveMode::Recursive)?;

    let output = absolute(bundler.output_path());
    let is_output = |path: &Path| {
        if path == output.as_path() {
            return true;
        }
        match (path.canonicalize(), output.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    };
    let is_source = |path: &Path| {
        let is_lua = path
            .extension()
            .map(|ext| ext == LUA_EXTENSION)
            .unwrap_or(false);
        is_lua && !is_output(path)
    };

    // Trailing-edge debounce: rebuild once events have been quiet for this long.
    let debounce_duration = Duration::from_millis(100);
    let mut pending: Option<Instant> = None;

    loop {
        match rx.recv_timeout(Duration::from_millis(25)) {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) && event.paths.iter().any(|path| is_source(path));

                if relevant {
                    pending = Some(Instant::now() + debounce_duration);
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                return Err(anyhow::anyhow!("File watcher disconnected"));
            }
        }

        if pending.is_some_and(|deadline| Instant::now() >= deadline) {
            pending = None;
            println!("\n\nSource changed, rebuilding...");
            if let Err(e) = bundle(bundler) {
                eprintln!("Error: {:#}", e);
            }
        }
    }
}
