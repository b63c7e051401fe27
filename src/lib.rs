//! # suiteql - SuiteQL Command-Line Client
//!
//! Runs SuiteQL queries against the NetSuite REST query service, either as a
//! one-shot piped command or as an interactive shell with paging.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  credentials  ┌──────────────┐  signed POST  ┌─────────────┐
//! │  profile   │──────────────▶│   executor   │──────────────▶│  REST API   │
//! │ (ini, env) │               │ oauth, paging│◀──────────────│             │
//! └────────────┘               └──────────────┘  rows / error └─────────────┘
//!                                 ▲        │
//!                          window │        │ QueryResult
//!                                 │        ▼
//!                       ┌──────────────────────────┐
//!                       │  repl (session) / piped  │──▶ render ──▶ stdout
//!                       └──────────────────────────┘
//! ```

pub mod cmd_args;
pub mod config;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod history;
pub mod oauth;
pub mod pagination;
pub mod piped;
pub mod profile;
pub mod render;
pub mod repl;

pub use error::QueryError;
pub use executor::{ExecutorConfig, QueryExecutor, QueryResult, Row};
pub use pagination::{PageWindow, PaginationError};
pub use profile::{ConfigError, Credentials};
