//! Settlement system - turns layouts into structure entities
//!
//! A settlement entity owns one structure entity per visible slot. Syncing
//! regenerates the layout (identical slots, new level), spawns newly
//! unlocked slots and despawns slots whose threshold is no longer met.
//! Existing structures never move. When a project's position changes the
//! whole settlement is torn down and rebuilt at the new anchor.

use std::collections::BTreeMap;

use campworld_logic::progress::ProjectProgress;
use campworld_logic::settlement::{generate_camp_layout_with, LayoutConfig, PlacementSlot};
use campworld_logic::terrain::TerrainSource;
use hecs::{Entity, World};

use crate::assets::{AssetCache, AssetInstancer, InstanceHandle};
use crate::components::{Settlement, Structure, Transform, Vec3};
use crate::events::{EventLog, SimEvent};

/// Shared inputs for settlement mutations.
pub struct SettlementContext<'a> {
    pub terrain: &'a dyn TerrainSource,
    pub layout: &'a LayoutConfig,
    pub assets: &'a AssetCache,
    pub instancer: &'a mut Option<Box<dyn AssetInstancer>>,
    pub events: &'a mut EventLog,
}

pub fn find_settlement(world: &World, project_id: u32) -> Option<Entity> {
    world
        .query::<&Settlement>()
        .iter()
        .find(|(_, s)| s.project_id == project_id)
        .map(|(e, _)| e)
}

/// Create or update the settlement for `progress`. Returns its entity.
pub fn sync_settlement(world: &mut World, progress: &ProjectProgress, ctx: &mut SettlementContext) -> Entity {
    let moved = find_settlement(world, progress.project_id).filter(|&e| {
        world
            .get::<&Settlement>(e)
            .map(|s| s.anchor.x != progress.position_x || s.anchor.z != progress.position_z)
            .unwrap_or(false)
    });
    if moved.is_some() {
        log::info!("settlement {} moved; rebuilding", progress.project_id);
        remove_settlement(world, progress.project_id, ctx);
    }

    let entity = match find_settlement(world, progress.project_id) {
        Some(e) => e,
        None => create_settlement(world, progress, ctx),
    };

    let layout = generate_camp_layout_with(progress.project_id, progress.completed_tasks, ctx.layout);
    let (anchor, group, mut structures) = match world.get::<&mut Settlement>(entity) {
        Ok(mut s) => {
            s.completed_tasks = progress.completed_tasks;
            s.layout = layout.clone();
            (s.anchor, s.group, std::mem::take(&mut s.structures))
        }
        Err(_) => return entity,
    };

    let hidden: Vec<usize> = structures
        .keys()
        .copied()
        .filter(|idx| {
            layout
                .slots
                .get(*idx)
                .map(|slot| !slot.is_visible(progress.completed_tasks))
                .unwrap_or(true)
        })
        .collect();
    for idx in hidden {
        if let Some(e) = structures.remove(&idx) {
            despawn_structure(world, e, ctx);
        }
    }

    for (idx, slot) in layout.slots.iter().enumerate() {
        if slot.is_visible(progress.completed_tasks) && !structures.contains_key(&idx) {
            let e = spawn_structure(world, progress.project_id, anchor, group, idx, slot, ctx);
            structures.insert(idx, e);
        }
    }

    let count = structures.len();
    if let Ok(mut s) = world.get::<&mut Settlement>(entity) {
        s.structures = structures;
    }
    log::info!(
        "settlement {} synced: {} tasks, level {:?}, {} structures",
        progress.project_id,
        progress.completed_tasks,
        layout.level,
        count
    );
    entity
}

fn create_settlement(world: &mut World, progress: &ProjectProgress, ctx: &mut SettlementContext) -> Entity {
    let (x, z) = (progress.position_x, progress.position_z);
    let anchor = Vec3::new(x, ctx.terrain.height(x, z), z);
    let name = format!("settlement-{}", progress.project_id);
    let group = ctx
        .instancer
        .as_mut()
        .and_then(|inst| inst.create_group(&name, anchor));
    let layout = generate_camp_layout_with(progress.project_id, progress.completed_tasks, ctx.layout);

    world.spawn((
        Transform::at(anchor),
        Settlement {
            project_id: progress.project_id,
            anchor,
            completed_tasks: progress.completed_tasks,
            layout,
            group,
            structures: BTreeMap::new(),
        },
    ))
}

/// World transform of a slot placed around `anchor`.
pub fn slot_transform(terrain: &dyn TerrainSource, anchor: Vec3, slot: &PlacementSlot) -> Transform {
    let x = anchor.x + slot.local_x;
    let z = anchor.z + slot.local_z;
    Transform::at(Vec3::new(x, terrain.height(x, z), z))
        .with_yaw(slot.rotation)
        .with_scale(slot.scale)
}

fn spawn_structure(
    world: &mut World,
    project_id: u32,
    anchor: Vec3,
    group: Option<InstanceHandle>,
    slot_index: usize,
    slot: &PlacementSlot,
    ctx: &mut SettlementContext,
) -> Entity {
    let transform = slot_transform(ctx.terrain, anchor, slot);
    let template = ctx.assets.get(slot.asset);

    let instance = match (ctx.instancer.as_mut(), &template) {
        (Some(inst), Some(t)) => {
            let name = format!("{}-{}-{}", project_id, slot.asset.name(), slot_index);
            inst.create_instance(t, &name, &transform, group)
        }
        (Some(_), None) => {
            log::warn!("no template registered for {:?}; structure has no instance", slot.asset);
            None
        }
        (None, _) => None,
    };

    let entity = world.spawn((
        transform,
        Structure {
            project_id,
            slot_index,
            slot: *slot,
            template,
            instance,
        },
    ));
    ctx.events.push(SimEvent::StructurePlaced {
        project_id,
        entity,
        asset: slot.asset,
    });
    entity
}

fn despawn_structure(world: &mut World, entity: Entity, ctx: &mut SettlementContext) {
    let info = world
        .get::<&Structure>(entity)
        .ok()
        .map(|s| (s.project_id, s.asset(), s.instance));
    if world.despawn(entity).is_err() {
        return;
    }
    if let Some((project_id, asset, instance)) = info {
        if let (Some(handle), Some(inst)) = (instance, ctx.instancer.as_mut()) {
            inst.release_instance(handle);
        }
        ctx.events.push(SimEvent::StructureRemoved {
            project_id,
            entity,
            asset,
        });
    }
}

/// Tear down one settlement and all of its structures.
pub fn remove_settlement(world: &mut World, project_id: u32, ctx: &mut SettlementContext) -> bool {
    let Some(entity) = find_settlement(world, project_id) else {
        return false;
    };
    let (structures, group) = match world.get::<&mut Settlement>(entity) {
        Ok(mut s) => (std::mem::take(&mut s.structures), s.group),
        Err(_) => return false,
    };
    for (_, e) in structures {
        despawn_structure(world, e, ctx);
    }
    if let (Some(handle), Some(inst)) = (group, ctx.instancer.as_mut()) {
        inst.release_instance(handle);
    }
    let _ = world.despawn(entity);
    log::info!("settlement {} removed", project_id);
    true
}

/// Remove every settlement. Returns how many were removed.
pub fn remove_all_settlements(world: &mut World, ctx: &mut SettlementContext) -> usize {
    let ids: Vec<u32> = world
        .query::<&Settlement>()
        .iter()
        .map(|(_, s)| s.project_id)
        .collect();
    ids.into_iter()
        .filter(|&id| remove_settlement(world, id, ctx))
        .count()
}
