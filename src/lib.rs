//! # Vidflow - Schema-Driven Question Forms
//!
//! Vidflow turns declarative question steps (produced by a workflow planner)
//! into interactive forms. The same engine backs the terminal renderer in this
//! crate and the browser renderer in `vidflow-ui`.
//!
//! ## Features
//!
//! - **Path resolution**: dot/bracket paths into arbitrary JSON
//! - **Parameter templates**: `{{field_id}}` and `{{USER_ID}}` substitution
//! - **Response mapping**: backend payloads to selectable options
//! - **Dependency gating**: fields stay disabled until their inputs are answered
//! - **Validation**: required, length, range and pattern rules
//! - **Form sessions**: answers, option loading and submission without I/O
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use vidflow::domain::{Field, FieldKind, QuestionStep};
//! use vidflow::engine::FormSession;
//!
//! let steps = vec![QuestionStep::new(
//!     0,
//!     "Read the sheet",
//!     vec![Field::new("spreadsheet_id", "Spreadsheet ID", FieldKind::Text).required()],
//! )];
//!
//! let mut session = FormSession::new(steps, "user-1");
//! session.set_value("spreadsheet_id", json!("1Bxi")).unwrap();
//!
//! let mut answers = None;
//! session.submit(|values| answers = Some(values)).unwrap();
//! assert_eq!(answers.unwrap()["spreadsheet_id"], json!("1Bxi"));
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: question step and field types
//! - **Engine**: pure form interpretation
//! - **Adapters**: HTTP enrichment client and terminal renderer (`native`)
//! - **Config**: settings layering and steps file loading (`native`)

pub mod domain;
pub mod engine;

#[cfg(feature = "native")]
pub mod adapters;
#[cfg(feature = "native")]
pub mod cli;
#[cfg(feature = "native")]
pub mod config;
