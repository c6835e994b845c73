use std::time::{Duration, Instant};

use crate::device::Geometry;
use crate::song::SongEntry;

/// Animation step of the conveyor (about 60Hz)
pub const CONVEYOR_TICK: Duration = Duration::from_millis(16);

/// Judgment progress of the active entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    /// Not judged and no classification in flight
    Open,
    /// A classification request is in flight
    Pending,
    Judged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntry {
    pub index: usize,
    pub started_at: Instant,
    pub judgment: Judgment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConveyorPhase {
    Idle,
    Running(ActiveEntry),
    /// Every entry has been played
    Complete,
    /// Torn down before completion
    Stopped,
}

/// Things the conveyor asks its owner to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ConveyorEvent {
    EntryBegan { index: usize },
    Position(f64),
    EvaluationDue { index: usize, position: f64 },
    MissForced { index: usize },
    Complete,
}

/// Walks the song's entries one at a time, moving each cue from the origin to
/// the perfect zone over the entry's duration.
#[derive(Debug, Clone)]
pub struct Conveyor {
    entries: Vec<SongEntry>,
    geometry: Geometry,
    phase: ConveyorPhase,
}

impl Conveyor {
    pub fn new(entries: Vec<SongEntry>, geometry: Geometry) -> Self {
        Self {
            entries,
            geometry,
            phase: ConveyorPhase::Idle,
        }
    }

    pub fn phase(&self) -> &ConveyorPhase {
        &self.phase
    }

    pub fn active(&self) -> Option<&ActiveEntry> {
        match &self.phase {
            ConveyorPhase::Running(active) => Some(active),
            _ => None,
        }
    }

    pub fn entries(&self) -> &[SongEntry] {
        &self.entries
    }

    pub fn is_complete(&self) -> bool {
        self.phase == ConveyorPhase::Complete
    }

    pub fn start(&mut self, now: Instant) -> Vec<ConveyorEvent> {
        if self.phase != ConveyorPhase::Idle {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.enter(0, now, &mut events);
        events
    }

    /// Advance the animation to `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<ConveyorEvent> {
        let ConveyorPhase::Running(active) = &mut self.phase else {
            return Vec::new();
        };
        let Some(entry) = self.entries.get(active.index) else {
            return Vec::new();
        };

        let progress = progress(entry, active.started_at, now);
        let position = progress * self.geometry.perfect_zone_distance;
        let mut events = vec![ConveyorEvent::Position(position)];

        if progress < 1.0
            && active.judgment == Judgment::Open
            && position > self.geometry.evaluation_threshold
        {
            active.judgment = Judgment::Pending;
            events.push(ConveyorEvent::EvaluationDue {
                index: active.index,
                position,
            });
        }

        if progress >= 1.0 {
            let index = active.index;
            if active.judgment != Judgment::Judged {
                active.judgment = Judgment::Judged;
                events.push(ConveyorEvent::MissForced { index });
            }
            events.push(ConveyorEvent::Position(0.0));
            self.enter(index + 1, now, &mut events);
        }

        events
    }

    /// Record that `index` has been judged. False if `index` is no longer
    /// the active entry or was already judged.
    pub fn mark_judged(&mut self, index: usize) -> bool {
        match &mut self.phase {
            ConveyorPhase::Running(active)
                if active.index == index && active.judgment != Judgment::Judged =>
            {
                active.judgment = Judgment::Judged;
                true
            }
            _ => false,
        }
    }

    /// Let a later tick request evaluation again, after the classifier had
    /// nothing to say.
    pub fn reopen(&mut self, index: usize) -> bool {
        match &mut self.phase {
            ConveyorPhase::Running(active)
                if active.index == index && active.judgment == Judgment::Pending =>
            {
                active.judgment = Judgment::Open;
                true
            }
            _ => false,
        }
    }

    pub fn stop(&mut self) {
        if self.phase != ConveyorPhase::Complete {
            self.phase = ConveyorPhase::Stopped;
        }
    }

    fn enter(&mut self, index: usize, now: Instant, events: &mut Vec<ConveyorEvent>) {
        if index >= self.entries.len() {
            self.phase = ConveyorPhase::Complete;
            events.push(ConveyorEvent::Complete);
            return;
        }
        self.phase = ConveyorPhase::Running(ActiveEntry {
            index,
            started_at: now,
            judgment: Judgment::Open,
        });
        events.push(ConveyorEvent::EntryBegan { index });
    }
}

/// Fraction of the entry elapsed at `now`, clamped to 1.0. A zero-length
/// entry is immediately done.
pub fn progress(entry: &SongEntry, started_at: Instant, now: Instant) -> f64 {
    if entry.duration_ms == 0 {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(started_at).as_micros() as f64 / 1000.0;
    (elapsed / entry.duration_ms as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceClass;

    fn entry(duration_ms: u64, sign: &str) -> SongEntry {
        SongEntry {
            duration_ms,
            prompt: format!("Sign {sign}"),
            expected_sign: sign.to_string(),
            lyric_fragment: String::new(),
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_empty_entries_complete_immediately() {
        let mut conveyor = Conveyor::new(vec![], DeviceClass::Pc.geometry());
        let events = conveyor.start(Instant::now());
        assert_eq!(events, vec![ConveyorEvent::Complete]);
        assert!(conveyor.is_complete());
        assert!(conveyor.tick(Instant::now()).is_empty());
    }

    #[test]
    fn test_position_follows_progress() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(vec![entry(1000, "A")], DeviceClass::Pc.geometry());
        assert_eq!(
            conveyor.start(t0),
            vec![ConveyorEvent::EntryBegan { index: 0 }]
        );

        let events = conveyor.tick(t0 + ms(250));
        assert_eq!(events, vec![ConveyorEvent::Position(150.0)]);
    }

    #[test]
    fn test_evaluation_requested_once_past_threshold() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(vec![entry(1000, "A")], DeviceClass::Pc.geometry());
        conveyor.start(t0);

        // just short of the threshold
        let events = conveyor.tick(t0 + ms(333));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ConveyorEvent::EvaluationDue { .. })));

        let events = conveyor.tick(t0 + ms(500));
        assert!(events.contains(&ConveyorEvent::EvaluationDue {
            index: 0,
            position: 300.0
        }));
        assert_eq!(conveyor.active().unwrap().judgment, Judgment::Pending);

        let events = conveyor.tick(t0 + ms(750));
        assert_eq!(events, vec![ConveyorEvent::Position(450.0)]);
    }

    #[test]
    fn test_reopen_allows_retry() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(vec![entry(1000, "A")], DeviceClass::Pc.geometry());
        conveyor.start(t0);
        conveyor.tick(t0 + ms(500));
        assert!(conveyor.reopen(0));
        assert!(!conveyor.reopen(0));

        let events = conveyor.tick(t0 + ms(750));
        assert!(events.contains(&ConveyorEvent::EvaluationDue {
            index: 0,
            position: 450.0
        }));
    }

    #[test]
    fn test_unjudged_entry_is_forced_to_miss_before_next_begins() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(
            vec![entry(500, "A"), entry(300, "B")],
            DeviceClass::Pc.geometry(),
        );
        conveyor.start(t0);

        let events = conveyor.tick(t0 + ms(500));
        assert_eq!(
            events,
            vec![
                ConveyorEvent::Position(600.0),
                ConveyorEvent::MissForced { index: 0 },
                ConveyorEvent::Position(0.0),
                ConveyorEvent::EntryBegan { index: 1 },
            ]
        );
        let active = conveyor.active().unwrap();
        assert_eq!(active.index, 1);
        assert_eq!(active.started_at, t0 + ms(500));
        assert_eq!(active.judgment, Judgment::Open);
    }

    #[test]
    fn test_sixty_hertz_ticks_keep_entry_timing() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(
            vec![entry(500, "A"), entry(300, "B")],
            DeviceClass::Pc.geometry(),
        );
        conveyor.start(t0);

        let tick_ms = CONVEYOR_TICK.as_millis() as u64;
        let mut second_began = None;
        let mut completed = None;
        for k in 1..100 {
            let t = tick_ms * k;
            for event in conveyor.tick(t0 + ms(t)) {
                match event {
                    ConveyorEvent::EntryBegan { index: 1 } => second_began = Some(t),
                    ConveyorEvent::Complete => completed = Some(t),
                    _ => {}
                }
            }
            if completed.is_some() {
                break;
            }
        }

        // each boundary lands on the first tick at or past it
        let second_began = second_began.unwrap();
        assert!((500..500 + tick_ms).contains(&second_began));
        let completed = completed.unwrap();
        assert!((second_began + 300..second_began + 300 + tick_ms).contains(&completed));
        assert!((800..800 + 2 * tick_ms).contains(&completed));
    }

    #[test]
    fn test_judged_entry_is_not_forced() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(vec![entry(500, "A")], DeviceClass::Pc.geometry());
        conveyor.start(t0);
        conveyor.tick(t0 + ms(300));
        assert!(conveyor.mark_judged(0));
        assert!(!conveyor.mark_judged(0));

        let events = conveyor.tick(t0 + ms(520));
        assert_eq!(
            events,
            vec![
                ConveyorEvent::Position(600.0),
                ConveyorEvent::Position(0.0),
                ConveyorEvent::Complete,
            ]
        );
        assert!(conveyor.is_complete());
    }

    #[test]
    fn test_zero_duration_entry_finishes_on_first_tick() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(
            vec![entry(0, "A"), entry(100, "B")],
            DeviceClass::Mobile.geometry(),
        );
        conveyor.start(t0);
        let events = conveyor.tick(t0);
        assert_eq!(
            events,
            vec![
                ConveyorEvent::Position(200.0),
                ConveyorEvent::MissForced { index: 0 },
                ConveyorEvent::Position(0.0),
                ConveyorEvent::EntryBegan { index: 1 },
            ]
        );
    }

    #[test]
    fn test_stale_index_is_rejected() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(
            vec![entry(100, "A"), entry(100, "B")],
            DeviceClass::Pc.geometry(),
        );
        conveyor.start(t0);
        conveyor.tick(t0 + ms(100));
        assert!(!conveyor.mark_judged(0));
        assert!(!conveyor.reopen(0));
    }

    #[test]
    fn test_stop_silences_ticks() {
        let t0 = Instant::now();
        let mut conveyor = Conveyor::new(vec![entry(100, "A")], DeviceClass::Pc.geometry());
        conveyor.start(t0);
        conveyor.stop();
        assert_eq!(conveyor.phase(), &ConveyorPhase::Stopped);
        assert!(conveyor.tick(t0 + ms(50)).is_empty());
        assert!(conveyor.active().is_none());
    }
}
