//! Shared asset templates and the host-side instancing seam.
//!
//! The host loads one template per structure type before the simulation
//! starts and registers it in an [`AssetCache`]. Structures hold `Arc`
//! clones of their template, so the cache can report how many live
//! structures use each one and drop templates nobody references. The core
//! never touches model data: an injected [`AssetInstancer`] turns templates
//! into renderer objects.

use std::collections::HashMap;
use std::sync::Arc;

use campworld_logic::settlement::AssetType;
use serde::{Deserialize, Serialize};

use crate::components::{Transform, Vec3};

/// Opaque reference to a host-loaded template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTemplate {
    pub asset: AssetType,
    pub name: String,
    /// Host identifier (path, mesh id, ...). Not interpreted here.
    pub source_id: String,
}

impl AssetTemplate {
    pub fn new(asset: AssetType, name: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            asset,
            name: name.into(),
            source_id: source_id.into(),
        }
    }
}

/// Handle returned by the host instancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceHandle(pub u64);

/// Host renderer hooks for placed structures.
pub trait AssetInstancer {
    /// Create an empty parent node for one settlement.
    fn create_group(&mut self, name: &str, position: Vec3) -> Option<InstanceHandle>;

    fn create_instance(
        &mut self,
        template: &AssetTemplate,
        name: &str,
        transform: &Transform,
        parent: Option<InstanceHandle>,
    ) -> Option<InstanceHandle>;

    fn release_instance(&mut self, handle: InstanceHandle);
}

/// Reference-counted template registry.
#[derive(Debug, Default, Clone)]
pub struct AssetCache {
    templates: HashMap<AssetType, Arc<AssetTemplate>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the template for its asset type.
    pub fn register(&mut self, template: AssetTemplate) {
        self.templates.insert(template.asset, Arc::new(template));
    }

    pub fn with_template(mut self, template: AssetTemplate) -> Self {
        self.register(template);
        self
    }

    /// Shared handle to a template, if one is registered.
    pub fn get(&self, asset: AssetType) -> Option<Arc<AssetTemplate>> {
        self.templates.get(&asset).cloned()
    }

    pub fn contains(&self, asset: AssetType) -> bool {
        self.templates.contains_key(&asset)
    }

    /// Number of outstanding clones besides the cache's own.
    pub fn live_instances(&self, asset: AssetType) -> usize {
        self.templates
            .get(&asset)
            .map(|t| Arc::strong_count(t) - 1)
            .unwrap_or(0)
    }

    /// Drop templates with no outstanding clones. Returns how many were dropped.
    pub fn release_unused(&mut self) -> usize {
        let before = self.templates.len();
        self.templates.retain(|_, t| Arc::strong_count(t) > 1);
        before - self.templates.len()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_instance_counting() {
        let mut cache = AssetCache::new();
        cache.register(AssetTemplate::new(AssetType::Tent, "tent", "models/tent.glb"));
        assert_eq!(cache.live_instances(AssetType::Tent), 0);

        let a = cache.get(AssetType::Tent).unwrap();
        let b = cache.get(AssetType::Tent).unwrap();
        assert_eq!(cache.live_instances(AssetType::Tent), 2);
        drop(a);
        assert_eq!(cache.live_instances(AssetType::Tent), 1);
        drop(b);
        assert_eq!(cache.live_instances(AssetType::Rock), 0);
    }

    #[test]
    fn test_release_unused_keeps_referenced() {
        let mut cache = AssetCache::new()
            .with_template(AssetTemplate::new(AssetType::Tent, "tent", "t"))
            .with_template(AssetTemplate::new(AssetType::Rock, "rock", "r"));
        let held = cache.get(AssetType::Rock);
        assert_eq!(cache.release_unused(), 1);
        assert!(cache.contains(AssetType::Rock));
        assert!(!cache.contains(AssetType::Tent));
        drop(held);
        assert_eq!(cache.release_unused(), 1);
        assert!(cache.is_empty());
    }
}
