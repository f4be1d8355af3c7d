//! Protocol messages for client-server communication
//!
//! Uses a simple length-prefixed JSON protocol:
//! - 4 bytes (little-endian u32): message length
//! - N bytes: JSON-encoded message

use crate::index::types::IndexStatus;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Largest frame accepted from the peer
const MAX_MESSAGE_LEN: usize = 100 * 1024 * 1024;

/// Request from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Start a fresh indexing run rooted at `root_path`
    Index { root_path: PathBuf },

    /// Has the current run finished?
    IsIndexed,

    /// Substring query
    Query { q: String },

    /// Liveness probe
    HealthCheck,

    /// Progress counters of the current run
    Status,

    /// Stop importing further files in the current run
    Cancel,

    /// Graceful shutdown request
    Shutdown,

    /// Ping for connection testing
    Ping,
}

/// Response from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Indexing run started
    Accepted { accepted: bool, files_total: usize },

    /// Completion flag of the current run
    Indexed { finished: bool },

    /// Query results
    Query(QueryResponse),

    /// Health probe result
    Health {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Server status
    Status(StatusResponse),

    /// Cancellation requested (false if nothing was running)
    Cancelled { cancelled: bool },

    /// Shutdown acknowledged
    ShuttingDown,

    /// Pong response
    Pong,

    /// Error response; `kind` names the failure (e.g. `ConcurrentIndexConflict`)
    Error { kind: String, message: String },
}

/// Query results response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    /// Sorted, unique `path:line` strings
    pub results: Vec<String>,
    /// Time taken in milliseconds
    pub duration_ms: f64,
    /// Whether results came from cache
    pub cached: bool,
}

/// Server status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Total queries served
    pub queries_served: u64,
    /// Cache hit rate (0.0 - 1.0)
    pub cache_hit_rate: f32,
    /// Terms in the loaded dictionary
    pub dictionary_terms: usize,
    /// Root of the current run, if any
    pub root: Option<PathBuf>,
    /// Counters of the current run
    pub index: IndexStatus,
}

/// Write a message to a stream with length prefix
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })?;

    let len = json.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read a message from a stream with length prefix
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    serde_json::from_slice(&buf).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_query_request_frame() {
        let req = Request::Query {
            q: "hell".to_string(),
        };

        let mut buf = Vec::new();
        write_message(&mut buf, &req).unwrap();

        let body = &buf[4..];
        assert_eq!(u32::from_le_bytes(buf[..4].try_into().unwrap()) as usize, body.len());
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(body).unwrap(),
            serde_json::json!({"type": "Query", "q": "hell"})
        );

        let mut cursor = Cursor::new(buf);
        match read_message::<_, Request>(&mut cursor).unwrap() {
            Request::Query { q } => assert_eq!(q, "hell"),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_error_response_shape() {
        let resp = Response::Error {
            kind: "ConcurrentIndexConflict".to_string(),
            message: "An indexing run is already in progress".to_string(),
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["type"], "Error");
        assert_eq!(value["kind"], "ConcurrentIndexConflict");
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((MAX_MESSAGE_LEN + 1) as u32).to_le_bytes());
        let mut cursor = Cursor::new(buf);
        let err = read_message::<_, Request>(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_frame() {
        let mut cursor = Cursor::new(vec![10u8, 0, 0, 0, b'{']);
        let err = read_message::<_, Request>(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
