//! # Interactive Session
//!
//! Line-oriented SuiteQL shell:
//!
//! ```text
//! ┌─────────────┐   Input    ┌─────────────┐   Effect   ┌──────────────┐
//! │ Line editor │───────────▶│   Session   │───────────▶│  Controller  │
//! │ (rustyline) │            │ (pure state)│◀───────────│ - executor   │
//! └─────────────┘            └─────────────┘   result   │ - renderer   │
//!                                                       └──────────────┘
//! ```

pub mod command;
pub mod controller;
pub mod helper;
pub mod session;

pub use command::{Command, Input};
pub use controller::ReplController;
pub use session::{Effect, PendingQuery, Session};
