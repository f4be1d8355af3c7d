//! Query execution: linear scan for short queries, index lookup otherwise
//!
//! Both paths end in [`dedup`], so results are always sorted and unique.

pub mod dedup;
pub mod executor;

pub use dedup::dedup;
pub use executor::{QueryExecutor, QueryPlan};

use serde::{Deserialize, Serialize};

/// Outcome of a query as seen by the boundary layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub success: bool,
    pub results: Vec<String>,
}
