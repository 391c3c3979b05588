//! Domain types for question forms

pub mod form;
pub mod wire;

pub use form::*;
pub use wire::{check_envelope, endpoint_url, BackendFailure, StepsDocument};
