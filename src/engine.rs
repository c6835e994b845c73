use std::time::Instant;

use crate::conveyor::{Conveyor, ConveyorEvent};
use crate::device::DeviceClass;
use crate::evaluation::{reconcile, ClassifierResponse, EvaluationTicket, Verdict};
use crate::game_state::{reduce, GameAction, GameRound};
use crate::rating::RatingLabel;
use crate::round_clock::{ClockPhase, ClockStep, RoundClock};
use crate::score::Difficulty;
use crate::song::Song;

/// Round-level news for the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// Song time ran out; show the results
    Ended { final_score: u32, song_title: String },
    /// The last entry has passed. The round keeps running until the clock ends it.
    EntriesComplete,
}

/// Side effects requested by the engine, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    /// New cue position for the presentation layer
    Position(f64),
    /// Send this ticket to the classifier
    Classify(EvaluationTicket),
    Round(RoundEvent),
}

/// One round of play.
///
/// Owns the round state and is the only thing that dispatches actions on it,
/// so actions apply strictly one after another in the order the host feeds
/// events in.
#[derive(Debug)]
pub struct Engine {
    round: u64,
    song_id: String,
    song_title: String,
    song_duration_ms: i64,
    difficulty: Difficulty,
    device: DeviceClass,
    state: GameRound,
    clock: RoundClock,
    conveyor: Conveyor,
    position: f64,
    last_event_id: u64,
    started: bool,
    journal: Vec<GameAction>,
}

impl Engine {
    pub fn new(song: &Song, device: DeviceClass, round: u64) -> Self {
        Self {
            round,
            song_id: song.id.clone(),
            song_title: song.title.clone(),
            song_duration_ms: song.duration_ms,
            difficulty: song.difficulty,
            device,
            state: GameRound::default(),
            clock: RoundClock::new(),
            conveyor: Conveyor::new(song.entries.clone(), device.geometry()),
            position: 0.0,
            last_event_id: 0,
            started: false,
            journal: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameRound {
        &self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn song_id(&self) -> &str {
        &self.song_id
    }

    pub fn song_title(&self) -> &str {
        &self.song_title
    }

    pub fn current_entry_index(&self) -> Option<usize> {
        self.conveyor.active().map(|a| a.index)
    }

    pub fn entry_count(&self) -> usize {
        self.conveyor.entries().len()
    }

    pub fn entries_complete(&self) -> bool {
        self.conveyor.is_complete()
    }

    pub fn has_finished(&self) -> bool {
        self.clock.phase() == ClockPhase::Ended
    }

    /// Every action applied so far, oldest first
    pub fn journal(&self) -> &[GameAction] {
        &self.journal
    }

    pub fn start(&mut self, now: Instant) -> Vec<EngineOutput> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        log::info!(
            "round {} starting: {} ({} entries, {}ms) on {}",
            self.round,
            self.song_id,
            self.entry_count(),
            self.song_duration_ms,
            self.device
        );
        self.dispatch(GameAction::StartRound {
            total_duration_ms: self.song_duration_ms,
        });
        let events = self.conveyor.start(now);
        self.apply(events, now)
    }

    /// One second of song time has passed.
    pub fn on_round_tick(&mut self) -> Vec<EngineOutput> {
        if !self.started {
            return Vec::new();
        }
        match self.clock.on_tick(&self.state) {
            ClockStep::Dispatch => {
                self.dispatch(GameAction::Tick);
                if self.clock.after_tick(&self.state) {
                    vec![self.finish()]
                } else {
                    Vec::new()
                }
            }
            ClockStep::End => vec![self.finish()],
            ClockStep::Idle => Vec::new(),
        }
    }

    /// Animation frame.
    pub fn on_conveyor_tick(&mut self, now: Instant) -> Vec<EngineOutput> {
        if !self.started || self.has_finished() {
            return Vec::new();
        }
        let events = self.conveyor.tick(now);
        self.apply(events, now)
    }

    pub fn on_classification(&mut self, response: &ClassifierResponse) -> Verdict {
        let ticket = &response.ticket;
        let verdict = reconcile(
            ticket,
            &response.classification,
            self.round,
            self.conveyor.active(),
        );

        match &verdict {
            Verdict::Stale => {
                log::debug!(
                    "discarding stale classification for round {} entry {}",
                    ticket.round,
                    ticket.entry_index
                );
            }
            Verdict::NoSignal => {
                self.conveyor.reopen(ticket.entry_index);
            }
            Verdict::Correct => {
                self.conveyor.mark_judged(ticket.entry_index);
                let rating = self.judge(self.position);
                self.dispatch(GameAction::AwardScore {
                    rating,
                    difficulty: self.difficulty,
                });
                log::debug!(
                    "entry {} signed {} at {:.1} (asked at {:.1}, {:?} ago): {}",
                    ticket.entry_index,
                    ticket.expected_sign,
                    self.position,
                    ticket.requested_position,
                    ticket.requested_at.elapsed(),
                    rating
                );
            }
            Verdict::Wrong { label } => {
                self.conveyor.mark_judged(ticket.entry_index);
                self.judge(0.0);
                log::debug!(
                    "entry {} expected {} but saw {}",
                    ticket.entry_index,
                    ticket.expected_sign,
                    label
                );
            }
        }
        verdict
    }

    /// Stop both clocks. Anything still in flight for this round is stale
    /// from here on.
    pub fn teardown(&mut self) {
        self.clock.cancel();
        self.conveyor.stop();
    }

    fn finish(&mut self) -> EngineOutput {
        self.teardown();
        log::info!(
            "round {} ended: {} scored {}",
            self.round,
            self.song_title,
            self.state.score
        );
        EngineOutput::Round(RoundEvent::Ended {
            final_score: self.state.score,
            song_title: self.song_title.clone(),
        })
    }

    fn apply(&mut self, events: Vec<ConveyorEvent>, now: Instant) -> Vec<EngineOutput> {
        let mut outputs = Vec::new();
        for event in events {
            match event {
                ConveyorEvent::EntryBegan { index } => {
                    let Some(entry) = self.conveyor.entries().get(index).cloned() else {
                        continue;
                    };
                    log::debug!("entry {index}: {} ({}ms)", entry.expected_sign, entry.duration_ms);
                    self.dispatch(GameAction::BeginEntry {
                        sign: entry.expected_sign,
                        lyric_fragment: entry.lyric_fragment,
                        prompt: entry.prompt,
                    });
                }
                ConveyorEvent::Position(position) => {
                    self.position = position;
                    outputs.push(EngineOutput::Position(position));
                }
                ConveyorEvent::EvaluationDue { index, position } => {
                    let Some(entry) = self.conveyor.entries().get(index) else {
                        continue;
                    };
                    outputs.push(EngineOutput::Classify(EvaluationTicket {
                        round: self.round,
                        entry_index: index,
                        expected_sign: entry.expected_sign.clone(),
                        requested_position: position,
                        requested_at: now,
                    }));
                }
                ConveyorEvent::MissForced { index } => {
                    self.judge(0.0);
                    log::debug!("entry {index} missed");
                }
                ConveyorEvent::Complete => {
                    outputs.push(EngineOutput::Round(RoundEvent::EntriesComplete));
                }
            }
        }
        outputs
    }

    fn judge(&mut self, position: f64) -> RatingLabel {
        self.last_event_id += 1;
        self.dispatch(GameAction::Judge {
            new_position: position,
            target_position: self.device.perfect_zone_distance(),
            device: self.device,
            event_id: self.last_event_id,
        });
        self.state.current_rating.unwrap_or(RatingLabel::Miss)
    }

    fn dispatch(&mut self, action: GameAction) {
        self.state = reduce(&self.state, &action);
        self.journal.push(action);
    }
}
