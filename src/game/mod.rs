//! # Game Module
//!
//! Game-level data that outlives a single world or battle.
//!
//! - [`PartyManager`]: the player's party and its progression
//! - [`CustomizationManager`]: name, class and tint picked before a run
//! - [`EntityFactory`]: turns character templates into entities
//! - [`HighScoreTable`]: the persistent top-ten list
//! - [`GameStatistics`]: counters for the current run

pub mod customization;
pub mod factory;
pub mod party;
pub mod scores;
pub mod statistics;

pub use customization::{CustomizationManager, DEFAULT_PLAYER_NAME, MAX_NAME_LENGTH, TINT_PALETTE};
pub use factory::{Difficulty, EntityFactory};
pub use party::{experience_to_next, PartyManager, PartyMember, MAX_PARTY_SIZE};
pub use scores::{now_timestamp, HighScore, HighScoreTable, MAX_HIGH_SCORES};
pub use statistics::{GameEvent, GameStatistics};
