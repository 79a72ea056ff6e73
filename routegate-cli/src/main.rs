//! routegate CLI - inspect and test public route configuration offline

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use routegate_core::catalog::{CatalogEndpoint, NamespaceView};
use routegate_core::{
    split_form_field, AccessDecision, AccessEngine, FileSettingsStore, GateConfig, Grant,
    PublicRouteSet, RouteCatalog, RouteDiscovery, RouteNormalizer, SettingsService,
    StaticRouteDiscovery,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Exit status of `check` when the request would be denied
const EXIT_DENIED: i32 = 2;

#[derive(Parser)]
#[command(name = "routegate")]
#[command(about = "routegate - public route bypass for authenticated HTTP APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (root prefix, settings key)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a request path may proceed
    Check {
        /// Request path, e.g. /wp-json/wp/v2/posts/1
        path: String,

        /// Treat the caller as authenticated
        #[arg(short, long)]
        authenticated: bool,

        /// JSON settings file holding the public route list
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Public route (repeatable), added after those from --settings
        #[arg(short, long = "route")]
        routes: Vec<String>,
    },

    /// Print the canonical form of routes
    Normalize {
        /// Routes to normalize
        #[arg(required = true)]
        routes: Vec<String>,
    },

    /// Sanitize a comma-joined form field into the stored route list
    Sanitize {
        /// Form field value, e.g. "wp/v2/posts, /wp-json/wp/v2/pages"
        field: String,
    },

    /// Show the admin route catalog for a route manifest
    Routes {
        /// JSON route manifest
        manifest: PathBuf,

        /// JSON settings file holding the public route list
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Fuzzy search term
        #[arg(long)]
        search: Option<String>,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        file: PathBuf,
    },

    /// Run benchmark tests
    Benchmark {
        /// Number of decisions to run
        #[arg(short, long, default_value = "100000")]
        requests: usize,

        /// Number of parallel threads
        #[arg(short, long, default_value = "8")]
        threads: usize,

        /// Number of public routes configured
        #[arg(long, default_value = "100")]
        public_routes: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("routegate=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let config = load_config(cli.config.as_deref())?;
    let format = cli.format;

    match cli.command {
        Commands::Check {
            path,
            authenticated,
            settings,
            routes,
        } => check_command(&config, format, &path, authenticated, settings, routes),
        Commands::Normalize { routes } => normalize_command(&config, format, &routes),
        Commands::Sanitize { field } => sanitize_command(&config, format, &field),
        Commands::Routes {
            manifest,
            settings,
            search,
        } => routes_command(&config, format, &manifest, settings, search),
        Commands::Validate { file } => validate_command(&file),
        Commands::Benchmark {
            requests,
            threads,
            public_routes,
        } => benchmark_command(&config, requests, threads, public_routes),
    }
}

fn load_config(path: Option<&Path>) -> Result<GateConfig> {
    match path {
        Some(path) => GateConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(GateConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Engine seeded from an optional settings file plus extra raw routes
fn build_engine(
    config: &GateConfig,
    settings: Option<PathBuf>,
    extra: Vec<String>,
) -> Result<Arc<AccessEngine>> {
    let engine = Arc::new(AccessEngine::new(config.normalizer()));

    let mut raw: Vec<String> = Vec::new();
    if let Some(path) = settings {
        let service = SettingsService::with_key(
            engine.clone(),
            Arc::new(FileSettingsStore::new(&path)),
            &config.gate.settings_key,
        );
        let loaded = service
            .load_into_engine()
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        debug!(routes = loaded.len(), "Loaded settings file");
        raw.extend(loaded.entries().iter().cloned());
    }
    raw.extend(extra);

    engine.set_public_routes(raw);
    Ok(engine)
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    path: &'a str,
    canonical_path: String,
    authenticated: bool,
    #[serde(flatten)]
    decision: AccessDecision,
}

fn check_command(
    config: &GateConfig,
    format: OutputFormat,
    path: &str,
    authenticated: bool,
    settings: Option<PathBuf>,
    routes: Vec<String>,
) -> Result<()> {
    let engine = build_engine(config, settings, routes)?;
    let start = Instant::now();
    let decision = engine.decide(path, authenticated);
    let elapsed = start.elapsed();
    let allowed = decision.is_allowed();

    let output = CheckOutput {
        path,
        canonical_path: engine.normalizer().canonicalize_path(path),
        authenticated,
        decision,
    };

    match format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Text => {
            let status = if allowed {
                "ALLOWED".green()
            } else {
                "DENIED".red()
            };

            println!("\n{} Access Decision", "═".blue().bold());
            println!("{} Status: {}", "▸".blue(), status);
            println!("{} Path: {}", "▸".blue(), output.path);
            println!("{} Canonical: {}", "▸".blue(), output.canonical_path);
            match &output.decision {
                AccessDecision::Allow(Grant::Authenticated) => {
                    println!("{} Reason: caller is authenticated", "▸".blue())
                }
                AccessDecision::Allow(Grant::PublicRoute { prefix }) => {
                    println!("{} Reason: public route {}", "▸".blue(), prefix)
                }
                AccessDecision::Deny(denied) => {
                    println!("{} Error: {} {}", "▸".blue(), denied.status, denied.code);
                    println!("{} Message: {}", "▸".blue(), denied.message);
                }
            }
            println!(
                "{} Public routes: {}",
                "▸".blue(),
                engine.snapshot().len()
            );
            println!(
                "{} Evaluation time: {:.3}ms",
                "▸".blue(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
    }

    if !allowed {
        std::process::exit(EXIT_DENIED);
    }
    Ok(())
}

#[derive(Serialize)]
struct NormalizedRoute<'a> {
    input: &'a str,
    canonical: Option<String>,
}

fn normalize_command(config: &GateConfig, format: OutputFormat, routes: &[String]) -> Result<()> {
    let normalizer = config.normalizer();
    let results: Vec<NormalizedRoute> = routes
        .iter()
        .map(|input| NormalizedRoute {
            input,
            canonical: normalizer.normalize(input),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Text => {
            for result in &results {
                match &result.canonical {
                    Some(canonical) => println!("{:?} {} {}", result.input, "→".blue(), canonical),
                    None => println!("{:?} {} {}", result.input, "→".blue(), "(empty, dropped)".yellow()),
                }
            }
        }
    }

    Ok(())
}

fn sanitize_command(config: &GateConfig, format: OutputFormat, field: &str) -> Result<()> {
    let normalizer = config.normalizer();
    let tokens = split_form_field(field);
    let routes = PublicRouteSet::from_raw(&normalizer, &tokens);

    match format {
        OutputFormat::Json => print_json(&routes)?,
        OutputFormat::Text => {
            println!(
                "{} {} input token(s), {} public route(s)",
                "→".blue(),
                tokens.len(),
                routes.len()
            );
            if routes.is_empty() {
                println!("{} Nothing is public; every route requires authentication", "!".yellow());
            }
            for route in &routes {
                println!("  {}", route);
            }
        }
    }

    Ok(())
}

fn routes_command(
    config: &GateConfig,
    format: OutputFormat,
    manifest: &Path,
    settings: Option<PathBuf>,
    search: Option<String>,
) -> Result<()> {
    let discovery = StaticRouteDiscovery::from_file(manifest)
        .with_context(|| format!("Failed to load route manifest {}", manifest.display()))?;
    let engine = build_engine(config, settings, Vec::new())?;

    let catalog = RouteCatalog::build(
        engine.normalizer(),
        discovery.routes()?,
        &engine.snapshot(),
        search.as_deref(),
    );

    match format {
        OutputFormat::Json => print_json(&catalog)?,
        OutputFormat::Text => print_catalog(&catalog),
    }

    Ok(())
}

fn print_catalog(catalog: &RouteCatalog) {
    if catalog.namespaces.is_empty() {
        println!("{} No routes found", "!".yellow());
        return;
    }

    for namespace in &catalog.namespaces {
        print_namespace(namespace);
    }
    println!(
        "\n{} {} endpoint(s) listed",
        "✓".green(),
        catalog.endpoint_count()
    );
}

fn print_namespace(view: &NamespaceView) {
    let marker = if view.all_private {
        "all private".dimmed()
    } else {
        "has public routes".green()
    };
    println!("\n{} {} ({})", "═".blue().bold(), view.namespace.bold(), marker);

    for group in &view.groups {
        println!("  {} {}", "▸".blue(), group.name);
        for endpoint in &group.endpoints {
            print_endpoint(endpoint, "    ");
        }
    }
    for endpoint in &view.ungrouped {
        print_endpoint(endpoint, "  ");
    }
}

fn print_endpoint(endpoint: &CatalogEndpoint, indent: &str) {
    let methods: Vec<&str> = endpoint.methods.iter().map(String::as_str).collect();
    let flag = if endpoint.public {
        "[public]".green()
    } else if endpoint.exposed_by.is_some() {
        "[exposed]".yellow()
    } else {
        "[private]".normal()
    };

    println!("{}{} {} {}", indent, flag, endpoint.route, methods.join(",").dimmed());
    if let Some(prefix) = &endpoint.exposed_by {
        println!("{}  {} by prefix {}", indent, "↳".yellow(), prefix);
    }
}

fn validate_command(file: &Path) -> Result<()> {
    println!("{} Validating {}...", "→".blue(), file.display());

    match GateConfig::load(file) {
        Ok(config) => {
            println!("{} Configuration is valid!", "✓".green());
            println!("  Root prefix: {}", config.normalizer().root_prefix());
            println!("  Settings key: {}", config.gate.settings_key);
            match &config.settings.path {
                Some(path) => println!(
                    "  Settings file: {} (watch: {})",
                    path.display(),
                    config.settings.watch
                ),
                None => println!("  Settings file: none (in-memory)"),
            }
            println!("  Bearer tokens: {}", config.auth.bearer_tokens.len());
        }
        Err(e) => {
            println!("{} Configuration is invalid:", "✗".red());
            println!("  {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn benchmark_command(
    config: &GateConfig,
    requests: usize,
    threads: usize,
    public_routes: usize,
) -> Result<()> {
    use rayon::prelude::*;

    println!("{} Running benchmark...", "→".blue());
    println!("  Requests: {}", requests);
    println!("  Threads: {}", threads);
    println!("  Public routes: {}", public_routes);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build thread pool")?;

    let normalizer: RouteNormalizer = config.normalizer();
    let engine = AccessEngine::new(normalizer);
    engine.set_public_routes((0..public_routes).map(|i| format!("bench/v1/resource_{}", i)));

    // Half the paths hit a public route, half miss
    let paths: Vec<String> = (0..requests)
        .map(|i| {
            if i % 2 == 0 {
                format!("bench/v1/resource_{}/item", i % public_routes.max(1))
            } else {
                format!("private/v1/resource_{}", i % 100)
            }
        })
        .collect();

    let start = Instant::now();
    let allowed = pool.install(|| {
        paths
            .par_iter()
            .filter(|path| engine.decide(path, false).is_allowed())
            .count()
    });
    let duration = start.elapsed();

    let throughput = requests as f64 / duration.as_secs_f64();
    let metrics = engine.metrics().snapshot();

    println!("\n{} Benchmark Results", "═".blue().bold());
    println!("{} Total decisions: {}", "▸".blue(), metrics.total_decisions);
    println!("{} Allowed: {}", "▸".blue(), allowed);
    println!("{} Denied: {}", "▸".blue(), metrics.denied);
    println!("{} Duration: {:.3}s", "▸".blue(), duration.as_secs_f64());
    println!("{} Throughput: {:.0} decisions/sec", "▸".blue(), throughput);
    println!(
        "{} Avg latency: {:.3}µs",
        "▸".blue(),
        duration.as_secs_f64() * 1_000_000.0 / requests.max(1) as f64
    );

    Ok(())
}
