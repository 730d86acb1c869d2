/// Events emitted while handling input or advancing a frame.
/// The presentation layer consumes these for sound and status text.

/// Why a life was lost.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    /// Overlapped a road vehicle.
    Vehicle,
    /// In the river with nothing (or a diving turtle) underneath.
    Drowned,
    /// Carried off the edge of the screen by a platform.
    SweptAway,
    /// Reached the home row between slots.
    MissedHome,
    /// Reached a home slot that was already filled.
    OccupiedHome,
    /// The per-life timer ran out.
    Timeout,
    /// Tried to hop off the screen (only with the lethal policy).
    OutOfBounds,
}

impl DeathCause {
    pub fn label(self) -> &'static str {
        match self {
            DeathCause::Vehicle => "SPLAT!",
            DeathCause::Drowned => "Drowned",
            DeathCause::SweptAway => "Swept away",
            DeathCause::MissedHome => "Missed the home",
            DeathCause::OccupiedHome => "Home already taken",
            DeathCause::Timeout => "Out of time",
            DeathCause::OutOfBounds => "Out of bounds",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Hopped,
    HomeFilled { slot: usize, points: u32 },
    LevelCleared { level: u32 },
    PlayerDied { cause: DeathCause },
    GameOver,
    Paused(bool),
}
