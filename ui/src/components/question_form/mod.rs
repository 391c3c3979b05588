//! Schema-driven question forms
//!
//! Renders question steps produced by the workflow planner:
//! - One input per field kind, gated by `disabled_until`
//! - Option pickers that load their options from the backend on request
//! - Inline validation errors and a submit that only fires when the form is valid

pub mod fields;
pub mod form;

pub use form::QuestionForm;
