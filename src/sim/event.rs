/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound.

use crate::domain::grid::Pos;
use super::world::Avatar;

/// Countdown events start this many seconds before time runs out.
pub const COUNTDOWN_SECS: u64 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Moved { light: Pos, shadow: Pos },
    /// Direction input was held but the border stopped both avatars.
    Blocked,
    Countdown { remaining_secs: u64 },
    Collision { avatar: Avatar, at: Pos },
    IdleTimeout,
    TimeUp,
}
