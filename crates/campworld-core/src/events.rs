//! Discrete signals for the presentation layer.
//!
//! Systems push [`SimEvent`]s while they run; the host drains them after
//! each `update`. The log is bounded: when the host stops draining, the
//! oldest events are dropped first.

use std::collections::VecDeque;

use campworld_logic::settlement::AssetType;
use hecs::Entity;

use crate::components::{BirdVisuals, CreatureState, HerdState, Species};

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    StateChanged {
        entity: Entity,
        from: CreatureState,
        to: CreatureState,
    },
    /// A bird switched which renderable is shown.
    VisualSwap {
        entity: Entity,
        visuals: BirdVisuals,
    },
    HerdStateChanged {
        herd: Entity,
        from: HerdState,
        to: HerdState,
    },
    /// A point search ran out of retries; the entity stays where it is.
    AvoidanceExhausted {
        entity: Option<Entity>,
        species: Species,
    },
    StructurePlaced {
        project_id: u32,
        entity: Entity,
        asset: AssetType,
    },
    StructureRemoved {
        project_id: u32,
        entity: Entity,
        asset: AssetType,
    },
}

#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<SimEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: SimEvent) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events discarded because the log was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn test_bounded_log_drops_oldest() {
        let mut world = World::new();
        let e = world.spawn(());
        let mut log = EventLog::new(2);
        for species in Species::ALL {
            log.push(SimEvent::AvoidanceExhausted {
                entity: Some(e),
                species,
            });
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 1);
        let drained = log.drain();
        assert_eq!(
            drained[0],
            SimEvent::AvoidanceExhausted {
                entity: Some(e),
                species: Species::Fish
            }
        );
        assert!(log.is_empty());
    }
}
