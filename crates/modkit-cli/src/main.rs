use clap::Parser;
use modkit_core::bundle::BuildOutcome;
use modkit_core::{CliOverrides, Container, ModkitConfig, ModuleId, Url};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Config files looked up in the working directory when --project is absent
const DEFAULT_CONFIG_FILES: &[&str] = &["modkit.json", "modkit.yaml", "modkit.yml"];

/// modkit - bundle HTML modules for file:// pages and resolve module markup
#[derive(Parser, Debug, Clone)]
#[command(name = "modkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Modules to bundle (overrides the configured list)
    #[arg(value_name = "MODULE")]
    modules: Vec<String>,

    /// Path to a modkit.json or modkit.yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,

    /// Directory containing one sub-directory per module
    #[arg(long, value_name = "DIR")]
    modules_dir: Option<PathBuf>,

    /// Bundle every module found under the modules directory
    #[arg(long, conflicts_with = "modules")]
    all: bool,

    /// Report bundles that are missing or out of date instead of building
    #[arg(long, conflicts_with = "watch")]
    check: bool,

    /// Rebuild bundles when module HTML changes
    #[arg(short, long)]
    watch: bool,

    /// Write a default modkit.json in the working directory
    #[arg(long)]
    init: bool,

    /// Resolve a module's markup and print it
    #[arg(long, value_name = "MODULE", conflicts_with_all = ["check", "watch", "all"])]
    resolve: Option<String>,

    /// Page URL the module is resolved against (default: file://<cwd>/index.html)
    #[arg(long, value_name = "URL", requires = "resolve")]
    origin: Option<String>,

    /// Resolve from bundles even when the origin is served over HTTP
    #[arg(long)]
    development: bool,

    /// Disable colored diagnostics
    #[arg(long)]
    no_pretty: bool,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for detailed logs; INFO when unset. Logs go to
    // stderr, stdout carries the build report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.init {
        init_project()?;
        return Ok(());
    }

    let config = load_config(&cli)?;
    debug!("Configuration: {:?}", config);
    let container = Container::new(config);

    if let Some(ref module) = cli.resolve {
        let code = resolve(&container, module, cli.origin.as_deref())?;
        std::process::exit(code);
    }

    if cli.check {
        std::process::exit(check(&container));
    }

    if cli.watch {
        return watch_mode(&container);
    }

    std::process::exit(build(&container));
}

/// Write a default configuration file
fn init_project() -> anyhow::Result<()> {
    let path = Path::new("modkit.json");
    if path.exists() {
        anyhow::bail!("modkit.json already exists");
    }

    ModkitConfig::init_file(path)?;
    println!("Created modkit.json");
    Ok(())
}

/// Load configuration from file (if any) and apply command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<ModkitConfig> {
    let mut config = if let Some(ref project_path) = cli.project {
        ModkitConfig::from_file(project_path)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {}", e))?
    } else {
        match DEFAULT_CONFIG_FILES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(path) => ModkitConfig::from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?,
            None => ModkitConfig::default(),
        }
    };

    let mut overrides = CliOverrides::default();
    if let Some(ref dir) = cli.modules_dir {
        overrides.modules_dir = Some(dir.to_string_lossy().to_string());
    }
    if cli.no_pretty {
        overrides.pretty = Some(false);
    }
    if cli.development {
        overrides.development = Some(true);
    }
    config.merge(&overrides);

    // The module list depends on the merged modules directory
    let modules = if let Some(ref module) = cli.resolve {
        Some(vec![module.clone()])
    } else if cli.all {
        Some(discover_modules(Path::new(&config.bundler.modules_dir)))
    } else if !cli.modules.is_empty() {
        Some(cli.modules.clone())
    } else {
        None
    };
    if modules.is_some() {
        config.merge(&CliOverrides {
            modules,
            ..CliOverrides::default()
        });
    }

    Ok(config)
}

/// Every `<dir>/<id>/<id>.html`, sorted by id
fn discover_modules(modules_dir: &Path) -> Vec<String> {
    use walkdir::WalkDir;

    let mut modules: Vec<String> = WalkDir::new(modules_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let id = e.file_name().to_str()?.to_string();
            let html = e.path().join(ModuleId::new(id.as_str()).html_file_name());
            html.is_file().then_some(id)
        })
        .collect();

    modules.sort();
    info!(
        "Discovered {} module(s) under {}",
        modules.len(),
        modules_dir.display()
    );
    modules
}

/// Build every configured module, print the report and return the exit code
fn build(container: &Container) -> i32 {
    let generator = container.bundle_generator();
    let report = generator.build_all(&container.modules());

    for outcome in &report.outcomes {
        println!("{}", outcome);
    }
    println!("\n{}", report.summary());

    report.exit_code()
}

/// Print the freshness of every configured bundle; 1 if any is not fresh
fn check(container: &Container) -> i32 {
    let generator = container.bundle_generator();
    let results = generator.check_all(&container.modules());

    let mut stale = 0;
    for (module, freshness) in &results {
        println!("{}: {}", module, freshness);
        if !freshness.is_fresh() {
            stale += 1;
        }
    }
    println!(
        "\nCheck complete: {} up to date, {} need rebuilding",
        results.len() - stale,
        stale
    );

    if stale == 0 {
        0
    } else {
        1
    }
}

/// Resolve one module with the runtime resolver and print its markup
fn resolve(container: &Container, module: &str, origin: Option<&str>) -> anyhow::Result<i32> {
    let origin = match origin {
        Some(origin) => Url::parse(origin)
            .map_err(|e| anyhow::anyhow!("Invalid origin '{}': {}", origin, e))?,
        None => default_origin()?,
    };

    let resolver = container.resolver_builder(origin)?.build();
    info!(
        "Resolving module {} from {} ({:?})",
        module,
        resolver.origin(),
        resolver.environment()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(resolver.load_module(module)) {
        Ok(loaded) => {
            println!("{}", loaded.markup);
            Ok(0)
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            Ok(1)
        }
    }
}

/// `file://<cwd>/index.html`
fn default_origin() -> anyhow::Result<Url> {
    let cwd = std::env::current_dir()?;
    Url::from_file_path(cwd.join("index.html"))
        .map_err(|_| anyhow::anyhow!("Cannot express {} as a file URL", cwd.display()))
}

/// Watch mode - rebuild a module's bundle when its HTML changes
fn watch_mode(container: &Container) -> anyhow::Result<()> {
    use indexmap::IndexSet;
    use notify::{
        event::{EventKind, ModifyKind},
        Event, RecursiveMode, Watcher,
    };
    use std::collections::HashMap;
    use std::sync::mpsc::{channel, RecvTimeoutError};
    use std::time::{Duration, Instant};

    println!("Watching for changes... (Press Ctrl+C to stop)");

    println!("\nInitial build:");
    build(container);

    let generator = container.bundle_generator();
    let sources: HashMap<String, ModuleId> = container
        .modules()
        .into_iter()
        .map(|m| (m.html_file_name(), m))
        .collect();

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;
    watcher.watch(generator.modules_dir(), RecursiveMode::Recursive)?;

    // Rebuild once a module's events have been quiet for the debounce window,
    // so a file is never read half-written
    let debounce_duration = Duration::from_millis(100);
    let mut pending: IndexSet<ModuleId> = IndexSet::new();
    let mut last_event = Instant::now();

    loop {
        match rx.recv_timeout(debounce_duration) {
            Ok(event) => {
                // Other events (e.g. reads of the bundles) must still fall
                // through to the flush below
                let should_rebuild = matches!(
                    event.kind,
                    EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) | EventKind::Create(_)
                );
                if should_rebuild {
                    let changed = event.paths.iter().filter_map(|path| {
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .and_then(|n| sources.get(n))
                    });
                    for module in changed {
                        debug!("Change detected in module {}", module);
                        pending.insert(module.clone());
                        last_event = Instant::now();
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Err(anyhow::anyhow!("File watcher disconnected"));
            }
        }

        if pending.is_empty() || last_event.elapsed() < debounce_duration {
            continue;
        }

        for module in pending.drain(..) {
            println!("\n{} changed, rebuilding...", module.html_file_name());
            let outcome = BuildOutcome {
                result: generator.try_build_module(&module),
                module,
            };
            if outcome.result.is_err() {
                warn!("Rebuild of {} failed", outcome.module);
            }
            println!("{}", outcome);
        }
    }
}
