//! Self-specializing dispatch nodes.
//!
//! A node starts with no specializations. Each time it sees a shape none of
//! its installed specializations accept, it looks the shape up in its rule
//! table and installs a specialization for it, until it reaches its limit.
//! After that it is megamorphic and every unseen shape runs the generic
//! fallback, uncached.
//!
//! ```text
//!                    ┌───────────────┐
//!                    │ Uninitialized │
//!                    └───────┬───────┘
//!                            │ first shape
//!                    ╔═══════▼═══════╗
//!                    ║  Monomorphic  ║
//!                    ╚═══════╤═══════╝
//!                            │ new shape
//!                    ╔═══════▼═══════╗
//!                    ║  Polymorphic  ║  (up to `limit` shapes)
//!                    ╚═══════╤═══════╝
//!                            │ new shape, list full
//!                    ┌───────▼───────┐
//!                    │  Megamorphic  │  installed shapes still hit
//!                    └───────────────┘
//! ```
//!
//! # Thread Safety
//!
//! The specialization list is a fixed array of `limit` write-once slots plus
//! an atomic count. Readers load the count (Acquire) and scan the published
//! prefix without locking. Installation takes a node-scoped lock, re-scans
//! for a specialization another thread installed while it waited, and only
//! then writes the next slot and publishes the new count (Release). At most
//! one specialization per shape is ever retained. A node whose slots are all
//! published never takes the lock again.
//!
//! The lock is held only while choosing and writing the slot, never while an
//! implementation runs, so implementations may re-enter the same node.

use super::arena::CallSiteId;
use super::shape::Shape;
use super::table::SpecializationTable;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

// =============================================================================
// Specialization
// =============================================================================

/// An installed, shape-specific implementation.
#[derive(Debug, Clone, Copy)]
pub struct Specialization<S, I> {
    shape: S,
    rule: &'static str,
    order: usize,
    implementation: I,
}

impl<S: Copy, I: Copy> Specialization<S, I> {
    /// The shape this specialization accepts.
    #[inline]
    pub fn shape(&self) -> S {
        self.shape
    }

    /// Name of the rule it was synthesized from.
    #[inline]
    pub fn rule(&self) -> &'static str {
        self.rule
    }

    /// Position in installation order, starting at 0.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn implementation(&self) -> I {
        self.implementation
    }
}

// =============================================================================
// Dispatch Result
// =============================================================================

/// How a call was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Matched an already installed specialization.
    Cached(usize),
    /// Installed a new specialization at this position for the call.
    Installed(usize),
    /// Ran the generic fallback.
    Generic,
}

/// Implementation chosen for one call.
#[derive(Debug, Clone, Copy)]
pub struct Selection<I> {
    pub implementation: I,
    pub dispatch: Dispatch,
}

/// Classification of a node for profiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Never specialized.
    Uninitialized,
    /// Exactly one specialization.
    Monomorphic,
    /// More than one, below the limit or not yet overflowed.
    Polymorphic,
    /// Hit the limit; unseen shapes use the generic fallback.
    Megamorphic,
}

// =============================================================================
// Statistics
// =============================================================================

/// Relaxed per-node counters.
///
/// Installs and generic dispatches are always counted; both are off the
/// cached path. Cache hits are counted only with the `stats` feature, since
/// every hit would otherwise write a counter shared by all threads on the node.
#[derive(Debug, Default)]
pub struct NodeStats {
    #[cfg(feature = "stats")]
    hits: AtomicU64,
    installs: AtomicU64,
    generic: AtomicU64,
}

impl NodeStats {
    #[inline(always)]
    fn record_hit(&self) {
        #[cfg(feature = "stats")]
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns (hits, installs, generic dispatches).
    ///
    /// Hits read as zero unless the `stats` feature is enabled.
    pub fn snapshot(&self) -> (u64, u64, u64) {
        #[cfg(feature = "stats")]
        let hits = self.hits.load(Ordering::Relaxed);
        #[cfg(not(feature = "stats"))]
        let hits = 0;
        (
            hits,
            self.installs.load(Ordering::Relaxed),
            self.generic.load(Ordering::Relaxed),
        )
    }

    /// Cache hits as a percentage of all dispatches.
    #[cfg(feature = "stats")]
    pub fn hit_rate(&self) -> f64 {
        let (hits, installs, generic) = self.snapshot();
        let total = hits + installs + generic;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

// =============================================================================
// Specializing Node
// =============================================================================

/// A call-site node that installs specializations as it observes shapes.
pub struct SpecializingNode<S: Shape, I> {
    site: CallSiteId,
    table: Arc<SpecializationTable<S, I>>,
    slots: Box<[OnceLock<Specialization<S, I>>]>,
    installed: AtomicUsize,
    install_lock: Mutex<()>,
    megamorphic: AtomicBool,
    stats: NodeStats,
}

impl<S, I> SpecializingNode<S, I>
where
    S: Shape,
    I: Copy + Send + Sync + 'static,
{
    /// Create a node for `site` holding at most `limit` specializations.
    pub fn new(site: CallSiteId, table: Arc<SpecializationTable<S, I>>, limit: usize) -> Self {
        Self {
            site,
            table,
            slots: (0..limit).map(|_| OnceLock::new()).collect(),
            installed: AtomicUsize::new(0),
            install_lock: Mutex::new(()),
            megamorphic: AtomicBool::new(false),
            stats: NodeStats::default(),
        }
    }

    /// Choose the implementation for a call with the given shape.
    ///
    /// This is the hot path: a scan of the installed shapes.
    #[inline]
    pub fn select(&self, shape: S) -> Selection<I> {
        if let Some(entry) = self.find_installed(shape) {
            self.stats.record_hit();
            return Selection {
                implementation: entry.implementation,
                dispatch: Dispatch::Cached(entry.order),
            };
        }
        self.select_slow(shape)
    }

    #[inline(always)]
    fn find_installed(&self, shape: S) -> Option<&Specialization<S, I>> {
        let installed = self.installed.load(Ordering::Acquire);
        self.slots[..installed]
            .iter()
            .filter_map(OnceLock::get)
            .find(|entry| entry.shape == shape)
    }

    #[cold]
    fn select_slow(&self, shape: S) -> Selection<I> {
        let Some((_, rule)) = self.table.rule_for(shape) else {
            // No rule accepts this shape; it never specializes.
            return self.generic();
        };

        // The count never shrinks, so a full node stays full and generic
        // dispatch never needs the lock.
        if self.installed.load(Ordering::Acquire) >= self.slots.len() {
            return self.saturated(shape);
        }

        let guard = self.install_lock.lock();

        // Another thread may have installed this shape while we waited.
        if let Some(entry) = self.find_installed(shape) {
            self.stats.record_hit();
            return Selection {
                implementation: entry.implementation,
                dispatch: Dispatch::Cached(entry.order),
            };
        }

        let order = self.installed.load(Ordering::Acquire);
        if order >= self.slots.len() {
            drop(guard);
            return self.saturated(shape);
        }

        let entry = self.slots[order].get_or_init(|| Specialization {
            shape,
            rule: rule.name,
            order,
            implementation: rule.implementation,
        });
        self.installed.store(order + 1, Ordering::Release);
        drop(guard);

        self.stats.installs.fetch_add(1, Ordering::Relaxed);
        debug!(site = %self.site, rule = entry.rule, %shape, order, "specialization installed");

        Selection {
            implementation: entry.implementation,
            dispatch: Dispatch::Installed(order),
        }
    }

    fn saturated(&self, shape: S) -> Selection<I> {
        if !self.megamorphic.swap(true, Ordering::Relaxed) {
            debug!(
                site = %self.site,
                limit = self.slots.len(),
                %shape,
                "specialization limit reached, using generic fallback"
            );
        }
        self.generic()
    }

    #[inline]
    fn generic(&self) -> Selection<I> {
        self.stats.generic.fetch_add(1, Ordering::Relaxed);
        Selection {
            implementation: self.table.fallback(),
            dispatch: Dispatch::Generic,
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    #[inline]
    pub fn site(&self) -> CallSiteId {
        self.site
    }

    #[inline]
    pub fn table(&self) -> &Arc<SpecializationTable<S, I>> {
        &self.table
    }

    /// Maximum number of specializations.
    #[inline]
    pub fn limit(&self) -> usize {
        self.slots.len()
    }

    /// Number of installed specializations.
    #[inline]
    pub fn len(&self) -> usize {
        self.installed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Installed specializations in installation order.
    pub fn specializations(&self) -> impl Iterator<Item = &Specialization<S, I>> {
        self.slots[..self.len()].iter().filter_map(OnceLock::get)
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub fn classification(&self) -> Classification {
        if self.megamorphic.load(Ordering::Relaxed) {
            return Classification::Megamorphic;
        }
        match self.len() {
            0 => Classification::Uninitialized,
            1 => Classification::Monomorphic,
            _ => Classification::Polymorphic,
        }
    }
}

impl<S: Shape, I> std::fmt::Debug for SpecializingNode<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecializingNode")
            .field("site", &self.site)
            .field("installed", &self.installed.load(Ordering::Relaxed))
            .field("limit", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialize::table::Rule;
    use garnet_core::ValueShape;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn is_bool(s: ValueShape) -> bool {
        s == ValueShape::Bool
    }

    fn is_fixnum(s: ValueShape) -> bool {
        s.is_fixnum()
    }

    fn is_float(s: ValueShape) -> bool {
        s == ValueShape::Float
    }

    fn node(limit: usize) -> SpecializingNode<ValueShape, &'static str> {
        let table = SpecializationTable::new(
            [
                Rule::new("bool", is_bool, "bool"),
                Rule::new("fixnum", is_fixnum, "fixnum"),
                Rule::new("float", is_float, "float"),
            ],
            "generic",
        )
        .unwrap();
        SpecializingNode::new(CallSiteId::new(0), Arc::new(table), limit)
    }

    #[test]
    fn test_first_call_installs_then_hits() {
        let node = node(4);
        assert_eq!(node.classification(), Classification::Uninitialized);

        let first = node.select(ValueShape::Bool);
        assert_eq!(first.dispatch, Dispatch::Installed(0));
        assert_eq!(first.implementation, "bool");

        let second = node.select(ValueShape::Bool);
        assert_eq!(second.dispatch, Dispatch::Cached(0));
        assert_eq!(node.len(), 1);
        assert_eq!(node.classification(), Classification::Monomorphic);
    }

    #[test]
    fn test_one_rule_installs_per_shape() {
        let node = node(4);
        node.select(ValueShape::Int);
        node.select(ValueShape::Long);

        let rules: Vec<_> = node.specializations().map(|s| (s.shape(), s.rule())).collect();
        assert_eq!(
            rules,
            vec![(ValueShape::Int, "fixnum"), (ValueShape::Long, "fixnum")]
        );
        assert_eq!(node.classification(), Classification::Polymorphic);
    }

    #[test]
    fn test_unaccepted_shape_goes_generic_without_installing() {
        let node = node(4);
        let selection = node.select(ValueShape::Nil);
        assert_eq!(selection.dispatch, Dispatch::Generic);
        assert_eq!(selection.implementation, "generic");
        assert!(node.is_empty());
        assert_eq!(node.classification(), Classification::Uninitialized);
    }

    #[test]
    fn test_limit_makes_node_megamorphic() {
        let node = node(2);
        node.select(ValueShape::Bool);
        node.select(ValueShape::Int);
        assert_eq!(node.select(ValueShape::Float).dispatch, Dispatch::Generic);
        assert_eq!(node.len(), 2);
        assert_eq!(node.classification(), Classification::Megamorphic);

        // Installed shapes keep hitting.
        assert_eq!(node.select(ValueShape::Int).dispatch, Dispatch::Cached(1));
    }

    #[test]
    fn test_zero_limit_is_always_generic() {
        let node = node(0);
        assert_eq!(node.select(ValueShape::Bool).dispatch, Dispatch::Generic);
        assert_eq!(node.classification(), Classification::Megamorphic);
    }

    #[test]
    fn test_stats() {
        let node = node(1);
        node.select(ValueShape::Bool);
        node.select(ValueShape::Bool);
        node.select(ValueShape::Bool);
        node.select(ValueShape::Float);

        let (_, installs, generic) = node.stats().snapshot();
        assert_eq!((installs, generic), (1, 1));
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_hit_stats() {
        let node = node(1);
        node.select(ValueShape::Bool);
        node.select(ValueShape::Bool);
        node.select(ValueShape::Bool);
        node.select(ValueShape::Float);

        assert_eq!(node.stats().snapshot(), (2, 1, 1));
        assert!((node.stats().hit_rate() - 50.0).abs() < 0.1);
    }

    #[cfg(not(feature = "stats"))]
    #[test]
    fn test_hits_not_counted_without_stats_feature() {
        let node = node(1);
        node.select(ValueShape::Bool);
        node.select(ValueShape::Bool);
        assert_eq!(node.stats().snapshot(), (0, 1, 0));
    }

    /// Runs `select` on another thread while this one holds the install lock.
    fn select_while_locked(
        node: &Arc<SpecializingNode<ValueShape, &'static str>>,
        shape: ValueShape,
    ) -> Option<Dispatch> {
        let guard = node.install_lock.lock();
        let (tx, rx) = mpsc::channel();
        let worker = Arc::clone(node);
        let handle = thread::spawn(move || {
            let _ = tx.send(worker.select(shape).dispatch);
        });
        let dispatch = rx.recv_timeout(Duration::from_millis(500)).ok();
        drop(guard);
        handle.join().unwrap();
        dispatch
    }

    #[test]
    fn test_full_node_dispatches_generic_without_install_lock() {
        let node = Arc::new(node(1));
        node.select(ValueShape::Bool);
        assert_eq!(node.select(ValueShape::Float).dispatch, Dispatch::Generic);

        assert_eq!(
            select_while_locked(&node, ValueShape::Float),
            Some(Dispatch::Generic)
        );
        assert_eq!(node.len(), 1);
    }

    #[test]
    fn test_uncached_node_dispatches_without_install_lock() {
        let node = Arc::new(node(0));
        assert_eq!(
            select_while_locked(&node, ValueShape::Long),
            Some(Dispatch::Generic)
        );
        assert_eq!(node.classification(), Classification::Megamorphic);
    }
}
