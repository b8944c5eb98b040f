//! The specializing-node framework.
//!
//! - [`SpecializationTable`]: validated, priority-ordered rules plus a fallback
//! - [`SpecializingNode`]: per-site, bounded, append-only specialization list
//! - [`CallSiteArena`]: stable call-site ids for registered nodes

pub mod arena;
pub mod node;
pub mod shape;
pub mod table;

pub use arena::{CallSiteArena, CallSiteId, SiteProfile};
pub use node::{Classification, Dispatch, NodeStats, Selection, Specialization, SpecializingNode};
pub use shape::Shape;
pub use table::{Guard, Rule, SpecializationTable};
