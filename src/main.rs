use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use subdex::engine::Engine;
use subdex::index::Dictionary;
use subdex::output::{print_results, ResultLine};
use subdex::utils::app_data::AppConfig;
use subdex::utils::progress::follow_run;

#[derive(Parser)]
#[command(name = "subdex")]
#[command(about = "Concurrent substring index over a directory tree")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for values read from the config file
#[derive(Args, Clone, Default)]
struct IndexArgs {
    /// Number of import workers (0 = one per CPU core)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Shortest indexed substring; shorter queries scan every line
    #[arg(long)]
    min_len: Option<usize>,

    /// Line-delimited dictionary file
    #[arg(short, long)]
    dictionary: Option<PathBuf>,

    /// Skip dot-files while enumerating
    #[arg(long)]
    skip_hidden: bool,
}

impl IndexArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(min_len) = self.min_len {
            config.min_substr_len = min_len;
        }
        if let Some(dictionary) = &self.dictionary {
            config.dictionary_path = dictionary.clone();
        }
        if self.skip_hidden {
            config.skip_hidden = true;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Index a tree in this process, then run one query against it
    Search {
        /// Root directory to index
        path: PathBuf,

        /// Substring to look for
        query: String,

        #[command(flatten)]
        index: IndexArgs,

        /// Print the matching line after each location
        #[arg(short, long)]
        content: bool,

        /// Suppress the progress bar and timing
        #[arg(short, long)]
        quiet: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Start indexing a tree in the daemon
    #[cfg(all(unix, feature = "daemon"))]
    Index {
        /// Root directory to index
        path: PathBuf,

        /// Block until the run has finished
        #[arg(short, long)]
        wait: bool,
    },
    /// Query the daemon's current index
    #[cfg(all(unix, feature = "daemon"))]
    Query {
        /// Substring to look for
        q: String,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Print whether the daemon's current run has finished
    #[cfg(all(unix, feature = "daemon"))]
    IsIndexed,
    /// Check that the daemon loaded its dictionary
    #[cfg(all(unix, feature = "daemon"))]
    Health,
    /// Show progress of the daemon's current run
    #[cfg(all(unix, feature = "daemon"))]
    Status,
    /// Stop the daemon's current run from importing further files
    #[cfg(all(unix, feature = "daemon"))]
    Cancel,
    /// Manage the index server daemon
    #[cfg(all(unix, feature = "daemon"))]
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,

        #[command(flatten)]
        index: IndexArgs,
    },
}

#[cfg(all(unix, feature = "daemon"))]
#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon in background
    Start,
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
    /// Run daemon in foreground (for debugging)
    Foreground,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match &cli.command {
        #[cfg(all(unix, feature = "daemon"))]
        Commands::Daemon { .. } => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Search {
            path,
            query,
            index,
            content,
            quiet,
            no_color,
        } => {
            run_search(path, &query, &index, content, quiet, no_color)?;
        }
        #[cfg(all(unix, feature = "daemon"))]
        Commands::Daemon { action, index } => {
            handle_daemon_command(action, &index)?;
        }
        #[cfg(all(unix, feature = "daemon"))]
        command => {
            handle_client_command(command)?;
        }
    }

    Ok(())
}

fn load_config(overrides: &IndexArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load()?;
    overrides.apply(&mut config);
    Ok(config)
}

fn run_search(
    path: PathBuf,
    query: &str,
    overrides: &IndexArgs,
    content: bool,
    quiet: bool,
    no_color: bool,
) -> Result<()> {
    let config = load_config(overrides)?;
    let dictionary = Dictionary::load(&config.dictionary_path)?;
    let engine = Engine::new(dictionary, config.index_config());

    engine.start_indexing(&path)?;
    let run = engine.current_run().context("Index run was not registered")?;

    if !follow_run(&run, quiet) {
        bail!("Indexing stopped before every file was processed");
    }

    let start = Instant::now();
    let results = engine.query_run(&run, query);
    let elapsed = start.elapsed();

    let lines: Vec<ResultLine> = results
        .iter()
        .filter_map(|r| ResultLine::parse(r))
        .map(|mut line| {
            if content {
                line.content = run
                    .paths()
                    .id_of(&line.path)
                    .and_then(|id| run.line_cache().get(id, line.line_number));
            }
            line
        })
        .collect();

    print_results(&lines, query, !no_color)?;

    if !quiet {
        eprintln!(
            "{} results in {:.2} ms",
            lines.len(),
            elapsed.as_secs_f64() * 1000.0
        );
    }

    Ok(())
}

#[cfg(all(unix, feature = "daemon"))]
fn connect() -> Result<subdex::server::IndexClient> {
    use subdex::server::{ClientError, IndexClient};

    IndexClient::connect_required().map_err(|e| match e {
        ClientError::NotRunning => {
            anyhow::anyhow!("Daemon is not running. Start it with 'subdex daemon start'")
        }
        e => e.into(),
    })
}

#[cfg(all(unix, feature = "daemon"))]
fn handle_client_command(command: Commands) -> Result<()> {
    use std::time::Duration;

    let mut client = connect()?;

    match command {
        Commands::Index { path, wait } => {
            // The daemon runs from `/`, so send an absolute root
            let root = std::path::absolute(&path)?;
            let files_total = client.index(&root)?;
            println!("Indexing {} paths under {}", files_total, root.display());

            if wait {
                let mut status = client.status()?;
                while status.index.running {
                    std::thread::sleep(Duration::from_millis(100));
                    status = client.status()?;
                }
                if !status.index.finished {
                    bail!(
                        "Run ended incomplete: {}/{} paths imported",
                        status.index.files_done - status.index.files_skipped,
                        status.index.files_total
                    );
                }
                println!(
                    "Indexed {} paths ({} failed) in {:.1} ms",
                    status.index.files_done,
                    status.index.files_failed,
                    status.index.elapsed_ms.unwrap_or_default()
                );
            }
        }

        Commands::Query { q, no_color } => {
            let response = client.query(&q)?;
            let lines: Vec<ResultLine> = response
                .results
                .iter()
                .filter_map(|r| ResultLine::parse(r))
                .collect();
            print_results(&lines, &q, !no_color)?;
            eprintln!(
                "{} results in {:.2} ms{}",
                lines.len(),
                response.duration_ms,
                if response.cached { " (cached)" } else { "" }
            );
        }

        Commands::IsIndexed => {
            println!("{}", client.is_indexed()?);
        }

        Commands::Health => {
            let (success, message) = client.health_check()?;
            if !success {
                bail!(
                    "Daemon is unhealthy: {}",
                    message.unwrap_or_else(|| "unknown error".to_string())
                );
            }
            println!("ok");
        }

        Commands::Status => {
            let status = client.status()?;
            let index = &status.index;
            match &status.root {
                Some(root) => println!("Root: {}", root.display()),
                None => println!("Root: (nothing indexed yet)"),
            }
            println!(
                "  State: {}",
                if index.finished {
                    "finished"
                } else if index.running {
                    "indexing"
                } else if index.cancelled {
                    "cancelled (incomplete)"
                } else if status.root.is_some() {
                    "stopped (incomplete)"
                } else {
                    "idle"
                }
            );
            println!("  Paths: {}/{}", index.files_done, index.files_total);
            println!("  Failed: {}", index.files_failed);
            if index.files_skipped > 0 {
                println!("  Skipped: {}", index.files_skipped);
            }
            println!("  Terms indexed: {}", index.terms_indexed);
            println!("  Records applied: {}", index.records_applied);
            println!("  Lines cached: {}", index.lines_cached);
            if let Some(ms) = index.elapsed_ms {
                println!("  Elapsed: {:.1} ms", ms);
            }
        }

        Commands::Cancel => {
            if client.cancel()? {
                println!("Cancelling current run");
            } else {
                println!("Nothing is being indexed");
            }
        }

        Commands::Search { .. } | Commands::Daemon { .. } => unreachable!(),
    }

    Ok(())
}

#[cfg(all(unix, feature = "daemon"))]
fn handle_daemon_command(action: DaemonAction, overrides: &IndexArgs) -> Result<()> {
    use std::time::Duration;
    use subdex::server::{get_socket_path, is_daemon_running, IndexClient};

    match action {
        DaemonAction::Start => {
            if is_daemon_running() {
                println!("Daemon is already running");
                return Ok(());
            }

            let config = load_config(overrides)?;
            println!("Starting subdex daemon...");
            subdex::server::daemon::daemonize(config)?;

            // Wait a moment for daemon to start
            std::thread::sleep(Duration::from_millis(500));

            if is_daemon_running() {
                println!("Daemon started (socket: {})", get_socket_path().display());
            } else {
                println!("Daemon may have failed to start. Check /tmp/subdex-error.log");
            }
        }

        DaemonAction::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            println!("Stopping daemon...");

            // Try graceful shutdown via client first
            if let Some(mut client) = IndexClient::connect() {
                let _ = client.shutdown();
                std::thread::sleep(Duration::from_millis(500));
            }

            // Force stop if still running
            if is_daemon_running() {
                subdex::server::daemon::stop_daemon()?;
            }

            println!("Daemon stopped");
        }

        DaemonAction::Status => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            match IndexClient::connect() {
                Some(mut client) => match client.status() {
                    Ok(status) => {
                        println!("subdex daemon status:");
                        println!("  Uptime: {}s", status.uptime_secs);
                        println!("  Dictionary terms: {}", status.dictionary_terms);
                        println!("  Queries served: {}", status.queries_served);
                        println!("  Cache hit rate: {:.1}%", status.cache_hit_rate * 100.0);
                        if let Some(root) = &status.root {
                            println!(
                                "  Current root: {} ({}/{} paths{})",
                                root.display(),
                                status.index.files_done,
                                status.index.files_total,
                                if status.index.finished { ", finished" } else { "" }
                            );
                        }
                    }
                    Err(e) => {
                        println!("Failed to get status: {}", e);
                    }
                },
                None => {
                    println!("Daemon is running but not responding");
                }
            }
        }

        DaemonAction::Foreground => {
            if is_daemon_running() {
                println!("Daemon is already running in background. Stop it first with 'subdex daemon stop'");
                return Ok(());
            }

            let config = load_config(overrides)?;
            println!("Running daemon in foreground (Ctrl+C to stop)...");
            subdex::server::daemon::run_foreground(&config)?;
        }
    }

    Ok(())
}
