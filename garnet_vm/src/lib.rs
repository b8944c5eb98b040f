//! Self-specializing call-site nodes for the Garnet interpreter.
//!
//! This crate provides:
//! - [`specialize`]: the generic framework, bounded per-site specialization
//!   lists built from validated rule tables
//! - [`coerce`]: implicit integer coercion (`to_int`)
//! - [`storage`]: storage-strategy resolution for array reads and copies
//! - [`loops`]: loop executors consuming `next` / `break` / `redo`
//! - [`literal`]: literal nodes with unboxed execution paths
//! - [`NodeFactory`]: builds and registers nodes from a [`DispatchConfig`]

pub mod coerce;
pub mod config;
pub mod factory;
pub mod invoke;
pub mod literal;
pub mod loops;
pub mod specialize;
pub mod storage;

pub use coerce::{CoerceToInteger, IntWidth, ToIntegerNode, coercion_table};
pub use config::DispatchConfig;
pub use factory::{NodeFactory, SiteNode};
pub use invoke::{Invocation, MethodInvoker, NoMethods};
pub use literal::{ExpressionNode, UnexpectedResult, literal};
pub use loops::{LoopOutcome, each, rescue, while_loop};
pub use specialize::{CallSiteArena, CallSiteId, Classification, Dispatch, SiteProfile};
pub use storage::{StorageResolver, storage_table};
