//! Arena simulation module
//!
//! All gameplay logic lives here. It has no rendering or platform
//! dependencies:
//! - Time only advances through [`tick`]
//! - Randomness comes from the state's seeded generator
//! - Delayed effects run on game time, so pausing pauses them

pub mod collision;
pub mod combat;
pub mod enemy;
pub mod events;
pub mod frenzy;
pub mod pickup;
pub mod pool;
pub mod powerup;
pub mod schedule;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod tuning;
pub mod weapon;

pub use events::{EventQueue, GameEvent};
pub use frenzy::{Frenzy, FrenzyEndReason, FrenzySource};
pub use pool::{Pool, PoolHandle, PoolStats, Poolable};
pub use powerup::PowerUpEffect;
pub use schedule::{ScheduledTask, Scheduler};
pub use state::{
    AllPoolStats, Bullet, CanvasBounds, Collectible, Enemy, GamePhase, GameState, Player,
    PowerUpItem,
};
pub use tick::{MouseState, TickInput, tick};
pub use tuning::{EnemyKind, PowerUpKind, Rarity};
pub use weapon::{Weapon, WeaponKind};
