//! Client for connecting to the index server daemon

use crate::server::get_socket_path;
use crate::server::protocol::{
    read_message, write_message, QueryResponse, Request, Response, StatusResponse,
};
use std::io::{BufReader, BufWriter};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

/// Read/write timeout
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Server is not running
    #[error("Index server is not running")]
    NotRunning,
    /// Communication error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Server returned an error
    #[error("{kind}: {message}")]
    ServerError { kind: String, message: String },
    /// Invalid response
    #[error("Invalid response from server")]
    InvalidResponse,
}

/// Client for the index server
pub struct IndexClient {
    reader: BufReader<UnixStream>,
    writer: BufWriter<UnixStream>,
}

impl IndexClient {
    /// Try to connect to the running daemon
    /// Returns None if daemon is not running
    pub fn connect() -> Option<Self> {
        Self::connect_to(&get_socket_path())
    }

    /// Connect to a daemon listening on an explicit socket
    pub fn connect_to(socket_path: &Path) -> Option<Self> {
        // Quick check if socket exists
        if !socket_path.exists() {
            return None;
        }

        let stream = UnixStream::connect(socket_path).ok()?;

        // Set timeouts
        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        let reader = BufReader::new(stream.try_clone().ok()?);
        let writer = BufWriter::new(stream);

        Some(Self { reader, writer })
    }

    /// Connect or return an error (for when daemon is required)
    pub fn connect_required() -> ClientResult<Self> {
        Self::connect().ok_or(ClientError::NotRunning)
    }

    fn call(&mut self, request: &Request) -> ClientResult<Response> {
        write_message(&mut self.writer, request)?;
        match read_message(&mut self.reader)? {
            Response::Error { kind, message } => Err(ClientError::ServerError { kind, message }),
            response => Ok(response),
        }
    }

    /// Start indexing `root_path`; returns the number of enumerated paths
    pub fn index(&mut self, root_path: &Path) -> ClientResult<usize> {
        let request = Request::Index {
            root_path: root_path.to_path_buf(),
        };

        match self.call(&request)? {
            Response::Accepted { files_total, .. } => Ok(files_total),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn is_indexed(&mut self) -> ClientResult<bool> {
        match self.call(&Request::IsIndexed)? {
            Response::Indexed { finished } => Ok(finished),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Execute a query
    pub fn query(&mut self, q: &str) -> ClientResult<QueryResponse> {
        let request = Request::Query { q: q.to_string() };

        match self.call(&request)? {
            Response::Query(qr) => Ok(qr),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Health probe; the message explains a failure
    pub fn health_check(&mut self) -> ClientResult<(bool, Option<String>)> {
        match self.call(&Request::HealthCheck)? {
            Response::Health { success, message } => Ok((success, message)),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Get server status
    pub fn status(&mut self) -> ClientResult<StatusResponse> {
        match self.call(&Request::Status)? {
            Response::Status(status) => Ok(status),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn cancel(&mut self) -> ClientResult<bool> {
        match self.call(&Request::Cancel)? {
            Response::Cancelled { cancelled } => Ok(cancelled),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request graceful shutdown
    pub fn shutdown(&mut self) -> ClientResult<()> {
        match self.call(&Request::Shutdown)? {
            Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Ping the server
    pub fn ping(&mut self) -> ClientResult<()> {
        match self.call(&Request::Ping)? {
            Response::Pong => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }
}
