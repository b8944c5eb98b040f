//! Call-site arena.
//!
//! Nodes are created once per syntactic operation and live as long as the
//! code unit that owns them. The arena hands out a stable [`CallSiteId`] per
//! node. Registration takes the arena's lock; dispatch never does, because
//! callers hold the node itself.

use super::node::Classification;
use garnet_core::ConfigurationError;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;

/// Stable identity of a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSiteId(u32);

impl CallSiteId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The id for arena position `index`, if it fits.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CallSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site#{}", self.0)
    }
}

/// Anything that can report its specialization state.
pub trait SiteProfile {
    fn classification(&self) -> Classification;
}

/// Append-only arena of call-site nodes.
#[derive(Debug)]
pub struct CallSiteArena<N> {
    nodes: RwLock<Vec<N>>,
}

impl<N: Clone> CallSiteArena<N> {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(Vec::new()),
        }
    }

    /// Create a node with the next site id and register it.
    ///
    /// The arena stores the node converted to `N`; the caller gets it back
    /// with its concrete type. Fails without calling `build` once every site
    /// id is in use.
    pub fn allocate<T>(
        &self,
        build: impl FnOnce(CallSiteId) -> T,
    ) -> Result<(CallSiteId, T), ConfigurationError>
    where
        T: Clone + Into<N>,
    {
        let mut nodes = self.nodes.write();
        let site = CallSiteId::from_index(nodes.len())
            .ok_or(ConfigurationError::TooManySites { count: nodes.len() })?;
        let node = build(site);
        nodes.push(node.clone().into());
        Ok((site, node))
    }

    /// Look up a registered node.
    pub fn get(&self, site: CallSiteId) -> Option<N> {
        self.nodes.read().get(site.index()).cloned()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<N: Clone + SiteProfile> CallSiteArena<N> {
    /// Number of sites in each classification.
    pub fn classification_counts(&self) -> FxHashMap<Classification, usize> {
        let mut counts = FxHashMap::default();
        for node in self.nodes.read().iter() {
            *counts.entry(node.classification()).or_insert(0) += 1;
        }
        counts
    }
}

impl<N: Clone> Default for CallSiteArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone)]
    struct Fake(Classification);

    impl SiteProfile for Fake {
        fn classification(&self) -> Classification {
            self.0
        }
    }

    #[test]
    fn test_sites_are_sequential_and_stable() {
        let arena: CallSiteArena<Arc<u32>> = CallSiteArena::new();
        let (a, _) = arena.allocate(|site| Arc::new(site.index() as u32 * 10)).unwrap();
        let (b, _) = arena.allocate(|site| Arc::new(site.index() as u32 * 10)).unwrap();

        assert_eq!(a, CallSiteId::new(0));
        assert_eq!(b, CallSiteId::new(1));
        assert_eq!(*arena.get(b).unwrap(), 10);
        assert!(arena.get(CallSiteId::new(2)).is_none());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_classification_counts() {
        let arena: CallSiteArena<Fake> = CallSiteArena::new();
        arena.allocate(|_| Fake(Classification::Monomorphic)).unwrap();
        arena.allocate(|_| Fake(Classification::Monomorphic)).unwrap();
        arena.allocate(|_| Fake(Classification::Megamorphic)).unwrap();

        let counts = arena.classification_counts();
        assert_eq!(counts.get(&Classification::Monomorphic), Some(&2));
        assert_eq!(counts.get(&Classification::Megamorphic), Some(&1));
        assert_eq!(counts.get(&Classification::Polymorphic), None);
    }

    #[test]
    fn test_site_id_range() {
        assert_eq!(CallSiteId::from_index(3), Some(CallSiteId::new(3)));
        assert_eq!(
            CallSiteId::from_index(u32::MAX as usize),
            Some(CallSiteId::new(u32::MAX))
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_site_id_past_u32_is_rejected() {
        assert_eq!(CallSiteId::from_index(u32::MAX as usize + 1), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CallSiteId::new(7).to_string(), "site#7");
    }
}
