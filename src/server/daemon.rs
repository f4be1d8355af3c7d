//! Unix index server daemon
//!
//! Owns the engine and serves requests over a Unix socket, one thread per
//! connection.

use crate::engine::Engine;
use crate::server::protocol::{
    read_message, write_message, QueryResponse, Request, Response, StatusResponse,
};
use crate::server::{get_pid_path, get_socket_path};
use crate::utils::app_data::AppConfig;
use anyhow::{Context, Result};
use lru::LruCache;
use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::num::NonZeroUsize;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Connection timeout
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Statistics for the server
struct ServerStats {
    start_time: Instant,
    queries_served: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            queries_served: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    fn cache_hit_rate(&self) -> f32 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    }
}

/// The index server daemon
pub struct IndexServer {
    engine: Engine,
    socket_path: PathBuf,
    /// Results of finished runs, keyed by (run generation, query)
    query_cache: Mutex<LruCache<(u64, String), Vec<String>>>,
    /// Server statistics
    stats: ServerStats,
    /// Shutdown flag
    shutdown: AtomicBool,
}

impl IndexServer {
    /// Create a new index server wrapped in Arc
    pub fn new(engine: Engine, socket_path: PathBuf, cache_size: usize) -> Arc<Self> {
        let cache_size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Arc::new(Self {
            engine,
            socket_path,
            query_cache: Mutex::new(LruCache::new(cache_size)),
            stats: ServerStats::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Build a server from configuration, loading the dictionary
    pub fn from_config(config: &AppConfig) -> Arc<Self> {
        let engine = Engine::with_dictionary_file(&config.dictionary_path, config.index_config());
        Self::new(engine, get_socket_path(), config.query_cache_size)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Bind the socket, write the PID file and serve until shutdown (blocking)
    pub fn run(self: &Arc<Self>) -> Result<()> {
        let pid_path = get_pid_path();
        let listener = bind_socket(&self.socket_path)?;

        // Write PID file
        fs::write(&pid_path, format!("{}", std::process::id()))?;

        log::info!("subdex: listening on {}", self.socket_path.display());
        self.serve(listener);

        // Cleanup
        let _ = fs::remove_file(&self.socket_path);
        let _ = fs::remove_file(&pid_path);

        Ok(())
    }

    /// Accept connections on an already bound listener until shutdown
    pub fn serve(self: &Arc<Self>, listener: UnixListener) {
        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match stream {
                Ok(stream) => {
                    // Set timeout
                    let _ = stream.set_read_timeout(Some(CONNECTION_TIMEOUT));
                    let _ = stream.set_write_timeout(Some(CONNECTION_TIMEOUT));

                    // Handle in new thread
                    let server = Arc::clone(self);
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream) {
                            log::warn!("subdex: connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    log::warn!("subdex: accept error: {}", e);
                }
            }
        }
    }

    /// Handle a single client connection
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        loop {
            // Read request
            let request: Request = match read_message(&mut reader) {
                Ok(req) => req,
                Err(e) => {
                    match e.kind() {
                        // Client disconnected, or sent a truncated frame
                        ErrorKind::UnexpectedEof => {}
                        ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                            log::debug!("subdex: closing idle connection");
                        }
                        // The stream may be mid-frame, so answer once and hang up
                        _ => {
                            let resp = Response::Error {
                                kind: "InvalidRequest".to_string(),
                                message: format!("Invalid request: {}", e),
                            };
                            write_message(&mut writer, &resp)?;
                        }
                    }
                    break;
                }
            };

            let response = self.handle_request(request);
            write_message(&mut writer, &response)?;

            if matches!(response, Response::ShuttingDown) {
                // Wake the accept loop so it sees the flag
                let _ = UnixStream::connect(&self.socket_path);
                break;
            }
        }

        Ok(())
    }

    /// Handle a single request
    pub fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::Index { root_path } => self.handle_index(&root_path),

            Request::IsIndexed => Response::Indexed {
                finished: self.engine.is_indexing_complete(),
            },

            Request::Query { q } => self.handle_query(q),

            Request::HealthCheck => Response::Health {
                success: self.engine.health_check(),
                message: self.engine.startup_error().map(str::to_string),
            },

            Request::Status => self.handle_status(),

            Request::Cancel => Response::Cancelled {
                cancelled: self.engine.cancel_indexing(),
            },

            Request::Shutdown => {
                self.shutdown.store(true, Ordering::Relaxed);
                Response::ShuttingDown
            }

            Request::Ping => Response::Pong,
        }
    }

    fn handle_index(&self, root_path: &Path) -> Response {
        match self.engine.start_indexing(root_path) {
            Ok(started) => Response::Accepted {
                accepted: true,
                files_total: started.files_total,
            },
            Err(e) => {
                log::warn!("subdex: index request for {} rejected: {}", root_path.display(), e);
                Response::Error {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                }
            }
        }
    }

    /// Only queries against a finished run are cached
    fn handle_query(&self, q: String) -> Response {
        let start = Instant::now();
        self.stats.queries_served.fetch_add(1, Ordering::Relaxed);

        let run = self.engine.current_run();
        let cache_key = run
            .as_ref()
            .filter(|r| r.is_finished())
            .map(|r| (r.generation(), q.clone()));

        if let Some(key) = &cache_key
            && let Ok(mut cache) = self.query_cache.lock()
            && let Some(results) = cache.get(key)
        {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Response::Query(QueryResponse {
                success: true,
                results: results.clone(),
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                cached: true,
            });
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let results = match &run {
            Some(run) => self.engine.query_run(run, &q),
            None => Vec::new(),
        };

        if let Some(key) = cache_key
            && let Ok(mut cache) = self.query_cache.lock()
        {
            cache.put(key, results.clone());
        }

        Response::Query(QueryResponse {
            success: true,
            results,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            cached: false,
        })
    }

    /// Handle status request
    fn handle_status(&self) -> Response {
        Response::Status(StatusResponse {
            uptime_secs: self.stats.start_time.elapsed().as_secs(),
            queries_served: self.stats.queries_served.load(Ordering::Relaxed),
            cache_hit_rate: self.stats.cache_hit_rate(),
            dictionary_terms: self.engine.dictionary().len(),
            root: self
                .engine
                .current_run()
                .map(|run| run.paths().root().to_path_buf()),
            index: self.engine.status(),
        })
    }
}

/// Bind a user-only socket, replacing a stale socket file
pub fn bind_socket(socket_path: &Path) -> Result<UnixListener> {
    // Ensure parent directory exists
    if let Some(parent) = socket_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Remove stale socket file
    if socket_path.exists() {
        fs::remove_file(socket_path)?;
    }

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind to {}", socket_path.display()))?;

    // Set socket permissions (user only)
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(socket_path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(listener)
}

/// Daemonize the current process
pub fn daemonize(config: AppConfig) -> Result<()> {
    // Resolve before chdir("/") below
    let mut config = config;
    if config.dictionary_path.is_relative() {
        config.dictionary_path = std::env::current_dir()?.join(&config.dictionary_path);
    }

    // Fork using double-fork technique for proper daemonization
    match unsafe { libc::fork() } {
        -1 => anyhow::bail!("First fork failed"),
        0 => {
            // Child process
            // Create new session
            if unsafe { libc::setsid() } == -1 {
                anyhow::bail!("setsid failed");
            }

            // Second fork to prevent acquiring a controlling terminal
            match unsafe { libc::fork() } {
                -1 => anyhow::bail!("Second fork failed"),
                0 => {
                    // Grandchild - this becomes the daemon
                    // Close standard file descriptors
                    unsafe {
                        libc::close(0);
                        libc::close(1);
                        libc::close(2);

                        // Redirect to /dev/null
                        let null = libc::open(
                            c"/dev/null".as_ptr(),
                            libc::O_RDWR,
                        );
                        if null != -1 {
                            libc::dup2(null, 0);
                            libc::dup2(null, 1);
                            libc::dup2(null, 2);
                            if null > 2 {
                                libc::close(null);
                            }
                        }
                    }

                    // Change to root directory to avoid holding mounts
                    let _ = std::env::set_current_dir("/");

                    let server = IndexServer::from_config(&config);
                    if let Err(e) = server.run() {
                        // Can't really report this since stdout is closed
                        let _ = fs::write("/tmp/subdex-error.log", format!("{}", e));
                    }
                    std::process::exit(0);
                }
                _ => {
                    // First child exits immediately
                    std::process::exit(0);
                }
            }
        }
        _ => {
            // Parent process - wait for first child then exit
            unsafe {
                let mut status: libc::c_int = 0;
                libc::wait(&mut status);
            }
            Ok(())
        }
    }
}

/// Start the daemon in foreground (for debugging)
pub fn run_foreground(config: &AppConfig) -> Result<()> {
    let server = IndexServer::from_config(config);
    server.run()
}

/// Stop the running daemon
pub fn stop_daemon() -> Result<bool> {
    let pid_path = get_pid_path();

    if !pid_path.exists() {
        return Ok(false);
    }

    let pid_str = fs::read_to_string(&pid_path)?;
    let pid: i32 = pid_str.trim().parse()?;

    // Send SIGTERM
    unsafe {
        if libc::kill(pid, libc::SIGTERM) == 0 {
            // Wait a bit for graceful shutdown
            thread::sleep(Duration::from_millis(500));

            // Check if still running, send SIGKILL if needed
            if libc::kill(pid, 0) == 0 {
                thread::sleep(Duration::from_secs(1));
                if libc::kill(pid, 0) == 0 {
                    libc::kill(pid, libc::SIGKILL);
                }
            }
        }
    }

    // Clean up socket and pid files
    let _ = fs::remove_file(get_socket_path());
    let _ = fs::remove_file(&pid_path);

    Ok(true)
}
