//! Delayed effects keyed to game time
//!
//! Tasks only come due as the simulation clock advances, so pausing the game
//! also pauses them. A round reset clears the list.

use glam::Vec2;

use super::tuning::{EnemyKind, PowerUpKind, Rarity};

/// Work deferred to a later tick
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledTask {
    SpawnPowerUp {
        pos: Vec2,
        kind: PowerUpKind,
        rarity: Rarity,
    },
    SpawnEnemy {
        kind: EnemyKind,
        pos: Vec2,
    },
}

#[derive(Debug, Clone)]
struct Entry {
    due_at: f64,
    task: ScheduledTask,
}

/// Tasks sorted by due time; equal due times keep insertion order
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn schedule(&mut self, due_at: f64, task: ScheduledTask) {
        let index = self.entries.partition_point(|e| e.due_at <= due_at);
        self.entries.insert(index, Entry { due_at, task });
    }

    /// Next task whose due time has been reached
    pub fn pop_due(&mut self, now: f64) -> Option<ScheduledTask> {
        if self.entries.first().is_some_and(|e| e.due_at <= now) {
            return Some(self.entries.remove(0).task);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
