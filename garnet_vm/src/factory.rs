//! Call-site node construction.
//!
//! The factory validates a [`DispatchConfig`] and builds every rule table
//! once. A table with overlapping guards fails here, before any node that
//! would use it exists. Each node it creates is registered in the factory's
//! [`CallSiteArena`] under a fresh [`CallSiteId`].

use crate::coerce::{CoerceToInteger, CoercionTable, IntWidth, coercion_table};
use crate::config::DispatchConfig;
use crate::specialize::{CallSiteArena, CallSiteId, Classification, SiteProfile};
use crate::storage::{StorageResolver, StorageTable, storage_table};
use garnet_core::RuntimeError;
use std::sync::Arc;
use tracing::debug;

/// A registered call-site node.
#[derive(Debug, Clone)]
pub enum SiteNode {
    Coercion(Arc<CoerceToInteger>),
    Storage(Arc<StorageResolver>),
}

impl From<Arc<CoerceToInteger>> for SiteNode {
    fn from(node: Arc<CoerceToInteger>) -> Self {
        SiteNode::Coercion(node)
    }
}

impl From<Arc<StorageResolver>> for SiteNode {
    fn from(node: Arc<StorageResolver>) -> Self {
        SiteNode::Storage(node)
    }
}

impl SiteProfile for SiteNode {
    fn classification(&self) -> Classification {
        match self {
            SiteNode::Coercion(node) => node.classification(),
            SiteNode::Storage(node) => node.classification(),
        }
    }
}

/// Builds call-site nodes from one validated configuration.
#[derive(Debug)]
pub struct NodeFactory {
    config: DispatchConfig,
    coerce_32: Arc<CoercionTable>,
    coerce_64: Arc<CoercionTable>,
    storage: Arc<StorageTable>,
    sites: CallSiteArena<SiteNode>,
}

impl NodeFactory {
    /// Validate `config` and build the rule tables.
    pub fn new(config: DispatchConfig) -> Result<Self, RuntimeError> {
        config.validate()?;

        let factory = Self {
            coerce_32: Arc::new(coercion_table(IntWidth::Bits32)?),
            coerce_64: Arc::new(coercion_table(IntWidth::Bits64)?),
            storage: Arc::new(storage_table()?),
            sites: CallSiteArena::new(),
            config,
        };
        debug!(
            specialization_limit = factory.config.specialization_limit,
            storage_strategy_limit = factory.config.storage_strategy_limit,
            "node factory ready"
        );
        Ok(factory)
    }

    /// Create a coercion node for a new call site.
    pub fn coerce_to_integer(
        &self,
        width: IntWidth,
    ) -> Result<Arc<CoerceToInteger>, RuntimeError> {
        let table = match width {
            IntWidth::Bits32 => &self.coerce_32,
            IntWidth::Bits64 => &self.coerce_64,
        };
        let (site, node) = self.sites.allocate(|site| {
            Arc::new(CoerceToInteger::new(
                site,
                width,
                Arc::clone(table),
                self.config.specialization_limit,
                Arc::clone(&self.config.conversion_method),
            ))
        })?;
        debug!(%site, bits = width.bits(), "coercion site created");
        Ok(node)
    }

    /// Create a storage resolver for a new call site.
    pub fn storage_resolver(&self) -> Result<Arc<StorageResolver>, RuntimeError> {
        let (site, node) = self.sites.allocate(|site| {
            Arc::new(StorageResolver::new(
                site,
                Arc::clone(&self.storage),
                self.config.storage_strategy_limit,
            ))
        })?;
        debug!(%site, "storage site created");
        Ok(node)
    }

    /// Look up the node registered for `site`.
    pub fn site(&self, site: CallSiteId) -> Option<SiteNode> {
        self.sites.get(site)
    }

    pub fn sites(&self) -> &CallSiteArena<SiteNode> {
        &self.sites
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}
