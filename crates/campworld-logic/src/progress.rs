//! Project progress as seen by the world: a position and a done-task count.

use serde::{Deserialize, Serialize};

use crate::settlement::{settlement_level, SettlementLevel};

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

/// Everything the world needs to know about one project.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub project_id: u32,
    pub position_x: f32,
    pub position_z: f32,
    pub completed_tasks: u32,
}

impl ProjectProgress {
    pub fn new(project_id: u32, position_x: f32, position_z: f32, completed_tasks: u32) -> Self {
        Self {
            project_id,
            position_x,
            position_z,
            completed_tasks,
        }
    }

    /// Count `Done` entries among a project's task statuses.
    pub fn from_tasks<'a>(
        project_id: u32,
        position_x: f32,
        position_z: f32,
        statuses: impl IntoIterator<Item = &'a TaskStatus>,
    ) -> Self {
        let completed_tasks = statuses.into_iter().filter(|s| s.is_done()).count() as u32;
        Self::new(project_id, position_x, position_z, completed_tasks)
    }

    pub fn level(&self) -> SettlementLevel {
        settlement_level(self.completed_tasks)
    }
}
