use std::time::Duration;

use crate::game_state::GameRound;

pub const ROUND_TICK: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    Running,
    Ended,
}

/// What the round clock wants done for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStep {
    /// Dispatch `Tick`, then report back with [`RoundClock::after_tick`]
    Dispatch,
    /// The round just ended; nothing is dispatched
    End,
    /// Already ended or torn down
    Idle,
}

/// Counts the song down one second at a time and decides when the round is over
#[derive(Debug, Clone)]
pub struct RoundClock {
    phase: ClockPhase,
    ticks: u32,
}

impl RoundClock {
    pub fn new() -> Self {
        Self {
            phase: ClockPhase::Running,
            ticks: 0,
        }
    }

    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == ClockPhase::Running
    }

    /// Number of `Tick` actions dispatched so far
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn on_tick(&mut self, round: &GameRound) -> ClockStep {
        if !self.is_running() {
            return ClockStep::Idle;
        }
        if round.remaining_duration_ms <= 0 {
            self.phase = ClockPhase::Ended;
            return ClockStep::End;
        }
        self.ticks += 1;
        ClockStep::Dispatch
    }

    /// Observe the state after a dispatched tick. Returns true on the tick
    /// that ends the round.
    pub fn after_tick(&mut self, round: &GameRound) -> bool {
        if self.is_running() && round.remaining_duration_ms <= 0 {
            self.phase = ClockPhase::Ended;
            return true;
        }
        false
    }

    /// Stop without reporting anything, e.g. when the player walks away.
    pub fn cancel(&mut self) {
        self.phase = ClockPhase::Ended;
    }
}

impl Default for RoundClock {
    fn default() -> Self {
        Self::new()
    }
}
