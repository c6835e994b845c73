use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::evaluation::ClassifierResponse;

/// Unified event type consumed by the game loop
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    /// One second of song time
    RoundTick,
    /// One animation frame
    ConveyorTick,
    Classified(ClassifierResponse),
}

impl From<ClassifierResponse> for GameEvent {
    fn from(response: ClassifierResponse) -> Self {
        GameEvent::Classified(response)
    }
}

/// Source of external events (keyboard, resize, classifier answers)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<GameEvent>,
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if input.send(GameEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if input.send(GameEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    /// Handle for other producers, e.g. the classifier worker
    pub fn sender(&self) -> Sender<GameEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the game one event/tick at a time.
///
/// The round and conveyor ticks run on their own deadlines. Round ticks are
/// never dropped, so a slow frame catches up on song time; conveyor ticks
/// that fell behind are coalesced into one.
pub struct Runner<E: GameEventSource, R: Ticker, C: Ticker> {
    event_source: E,
    round_ticker: R,
    conveyor_ticker: C,
    next_round: Instant,
    next_conveyor: Instant,
}

impl<E: GameEventSource, R: Ticker, C: Ticker> Runner<E, R, C> {
    pub fn new(event_source: E, round_ticker: R, conveyor_ticker: C) -> Self {
        let now = Instant::now();
        Self {
            next_round: now + round_ticker.interval(),
            next_conveyor: now + conveyor_ticker.interval(),
            event_source,
            round_ticker,
            conveyor_ticker,
        }
    }

    /// Restart both tick schedules from `now`, e.g. when a new round begins.
    pub fn reset(&mut self, now: Instant) {
        self.next_round = now + self.round_ticker.interval();
        self.next_conveyor = now + self.conveyor_ticker.interval();
    }

    /// Blocks until the next event or tick and returns it
    pub fn step(&mut self) -> GameEvent {
        loop {
            let now = Instant::now();
            if let Some(tick) = self.due(now) {
                return tick;
            }

            let deadline = self.next_round.min(self.next_conveyor);
            let timeout = deadline.saturating_duration_since(now);
            match self.event_source.recv_timeout(timeout) {
                Ok(ev) => return ev,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => std::thread::sleep(timeout),
            }
        }
    }

    fn due(&mut self, now: Instant) -> Option<GameEvent> {
        if self.next_round <= now && self.next_round <= self.next_conveyor {
            self.next_round += self.round_ticker.interval();
            return Some(GameEvent::RoundTick);
        }
        if self.next_conveyor <= now {
            self.next_conveyor += self.conveyor_ticker.interval();
            if self.next_conveyor <= now {
                self.next_conveyor = now + self.conveyor_ticker.interval();
            }
            return Some(GameEvent::ConveyorTick);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn ticker(ms: u64) -> FixedTicker {
        FixedTicker::new(Duration::from_millis(ms))
    }

    #[test]
    fn step_returns_conveyor_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let mut runner = Runner::new(TestEventSource::new(rx), ticker(10_000), ticker(1));

        match runner.step() {
            GameEvent::ConveyorTick => {}
            other => panic!("expected ConveyorTick, got {other:?}"),
        }
    }

    #[test]
    fn step_returns_round_tick_when_it_is_earliest() {
        let (_tx, rx) = mpsc::channel();
        let mut runner = Runner::new(TestEventSource::new(rx), ticker(1), ticker(10_000));

        match runner.step() {
            GameEvent::RoundTick => {}
            other => panic!("expected RoundTick, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        let mut runner = Runner::new(TestEventSource::new(rx), ticker(10_000), ticker(10_000));

        match runner.step() {
            GameEvent::Resize => {}
            other => panic!("expected Resize event, got {other:?}"),
        }
    }

    #[test]
    fn step_keeps_ticking_after_disconnect() {
        let (tx, rx) = mpsc::channel::<GameEvent>();
        drop(tx);
        let mut runner = Runner::new(TestEventSource::new(rx), ticker(10_000), ticker(2));

        for _ in 0..3 {
            match runner.step() {
                GameEvent::ConveyorTick => {}
                other => panic!("expected ConveyorTick, got {other:?}"),
            }
        }
    }

    #[test]
    fn round_ticks_interleave_with_conveyor_ticks() {
        let (_tx, rx) = mpsc::channel();
        let mut runner = Runner::new(TestEventSource::new(rx), ticker(20), ticker(2));

        let mut rounds = 0;
        let mut frames = 0;
        while rounds < 2 {
            match runner.step() {
                GameEvent::RoundTick => rounds += 1,
                GameEvent::ConveyorTick => frames += 1,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(frames >= 2);
    }

    #[test]
    fn reset_pushes_deadlines_out() {
        let (_tx, rx) = mpsc::channel();
        let mut runner = Runner::new(TestEventSource::new(rx), ticker(1), ticker(10_000));
        std::thread::sleep(Duration::from_millis(5));
        runner.reset(Instant::now() + Duration::from_secs(60));
        assert!(runner.due(Instant::now()).is_none());
    }
}
