//! Core data types shared by the Garnet dispatch crates.
//!
//! This crate provides:
//! - The tagged runtime [`Value`] and its dispatch [`ValueShape`]
//! - The error taxonomy reported by coercion, storage and table registration
//! - Loop control signals and the [`Interrupt`] channel they travel on

pub mod control;
pub mod error;
pub mod value;

pub use control::{Completion, ControlSignal, Interrupt, SignalKind};
pub use error::{CoercionError, ConfigurationError, Result, RuntimeError, StorageError};
pub use value::{Object, ObjectRef, Value, ValueShape};
