//! Settlement and structure components.

use std::collections::BTreeMap;
use std::sync::Arc;

use campworld_logic::settlement::{AssetType, PlacementSlot, SettlementLayout};
use hecs::Entity;

use super::common::Vec3;
use crate::assets::{AssetTemplate, InstanceHandle};

/// One project's settlement. Owns its structure entities by slot index.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub project_id: u32,
    pub anchor: Vec3,
    pub completed_tasks: u32,
    pub layout: SettlementLayout,
    pub group: Option<InstanceHandle>,
    pub structures: BTreeMap<usize, Entity>,
}

/// A placed structure.
#[derive(Debug, Clone)]
pub struct Structure {
    pub project_id: u32,
    pub slot_index: usize,
    pub slot: PlacementSlot,
    pub template: Option<Arc<AssetTemplate>>,
    pub instance: Option<InstanceHandle>,
}

impl Structure {
    pub fn asset(&self) -> AssetType {
        self.slot.asset
    }
}
