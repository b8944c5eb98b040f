//! Array storage for the Garnet runtime.
//!
//! This crate provides:
//! - [`Collection`]: logical size plus an interchangeable backing [`Storage`]
//! - Compact unboxed stores for homogeneous numeric arrays
//! - [`StorageStrategy`] implementations per representation, and a generic one

pub mod array;
pub mod strategy;

pub use array::{Collection, SharedStore, Storage, StorageKind};
pub use strategy::{
    DoubleStrategy, EmptyStrategy, GenericStrategy, IntStrategy, LongStrategy, ObjectStrategy,
    SharedStrategy, StorageStrategy, strategy_for,
};
