//! Feedback events and the queue that delivers them one per tick

use std::collections::VecDeque;
use std::collections::vec_deque::Drain;

use glam::Vec2;
use serde::Serialize;

use super::frenzy::{FrenzyEndReason, FrenzySource};
use super::tuning::{EnemyKind, PowerUpKind, Rarity};
use crate::consts::EVENT_QUEUE_CAPACITY;

/// Something a renderer, audio engine or scoring layer may react to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameEvent {
    Collect {
        pos: Vec2,
        color: u32,
        value: u64,
        combo: u32,
        multiplier: f32,
    },
    /// The player lost a life
    Hit {
        pos: Vec2,
        lives: u32,
    },
    EnemyKilled {
        pos: Vec2,
        kind: EnemyKind,
        color: u32,
        score: u64,
        kill_streak: u32,
        /// Killed by an explosive chain rather than a bullet
        chained: bool,
    },
    BossKilled {
        pos: Vec2,
        score: u64,
    },
    BossSpawned {
        pos: Vec2,
        health: f32,
    },
    LevelUp {
        level: u32,
    },
    PowerUp {
        pos: Vec2,
        kind: PowerUpKind,
        rarity: Rarity,
        color: u32,
        refreshed: bool,
    },
    KillstreakMilestone {
        pos: Vec2,
        streak: u32,
    },
    FrenzyStart {
        tier: u8,
        source: FrenzySource,
    },
    FrenzyExtend {
        tier: u8,
        expires_at: f64,
    },
    FrenzyEnd {
        tier: u8,
        reason: FrenzyEndReason,
    },
    GameOver {
        score: u64,
        level: u32,
    },
    Error {
        message: String,
    },
}

/// Bounded FIFO of undelivered events
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<GameEvent>,
    capacity: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append an event; the oldest one is dropped when full
    pub fn push(&mut self, event: GameEvent) {
        if self.events.len() >= self.capacity {
            if let Some(dropped) = self.events.pop_front() {
                log::warn!("Event queue full, dropping {:?}", dropped);
            }
        }
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.events.pop_front()
    }

    pub fn peek(&self) -> Option<&GameEvent> {
        self.events.front()
    }

    /// Take every queued event in order
    pub fn drain(&mut self) -> Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(level: u32) -> GameEvent {
        GameEvent::LevelUp { level }
    }

    #[test]
    fn test_fifo_order() {
        let mut q = EventQueue::default();
        q.push(level(1));
        q.push(level(2));
        assert_eq!(q.peek(), Some(&level(1)));
        assert_eq!(q.pop(), Some(level(1)));
        assert_eq!(q.pop(), Some(level(2)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let mut q = EventQueue::with_capacity(2);
        q.push(level(1));
        q.push(level(2));
        q.push(level(3));
        let all: Vec<_> = q.drain().collect();
        assert_eq!(all, vec![level(2), level(3)]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let json = serde_json::to_value(GameEvent::KillstreakMilestone {
            pos: Vec2::new(1.0, 2.0),
            streak: 5,
        })
        .unwrap();
        assert_eq!(json["type"], "killstreakMilestone");
        assert_eq!(json["streak"], 5);
    }
}
