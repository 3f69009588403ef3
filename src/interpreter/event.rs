//! Event stream produced by the interpreter

use crate::error::Result;
use serde::Serialize;

/// A timed event on a track.
///
/// `tick_delta` values are delta-times in ticks, never absolute positions.
/// Channels are 1-based (1-16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ProgramChange {
        channel: u8,
        program: u8,
    },
    NoteOn {
        channel: u8,
        pitch: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        pitch: u8,
        tick_delta: u32,
    },
    Rest {
        tick_delta: u32,
    },
}

impl Event {
    /// Delta-time carried by this event
    pub fn tick_delta(&self) -> u32 {
        match self {
            Event::ProgramChange { .. } | Event::NoteOn { .. } => 0,
            Event::NoteOff { tick_delta, .. } | Event::Rest { tick_delta } => *tick_delta,
        }
    }
}

/// One output track, identified by the number given to TRACK
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: u32,
    pub events: Vec<Event>,
}

impl Track {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            events: Vec::new(),
        }
    }

    /// Total length of the track in ticks
    pub fn duration_ticks(&self) -> u64 {
        self.events.iter().map(|e| e.tick_delta() as u64).sum()
    }
}

/// Destination for an interpreted event stream
pub trait EventSink {
    fn begin_track(&mut self, id: u32) -> Result<()>;
    fn program_change(&mut self, channel: u8, program: u8, delta: u32) -> Result<()>;
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8, delta: u32) -> Result<()>;
    fn note_off(&mut self, channel: u8, pitch: u8, delta: u32) -> Result<()>;
    fn rest(&mut self, delta: u32) -> Result<()>;
    fn end_track(&mut self) -> Result<()>;
}

/// A tempo taking effect at an absolute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TempoChange {
    pub tick: u64,
    pub bpm: u32,
}

/// Complete interpretation result: tracks in order of first reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Song {
    pub ticks_per_beat: u16,
    /// Tempo map in declaration order; always holds an entry at tick 0
    pub tempo_changes: Vec<TempoChange>,
    pub tracks: Vec<Track>,
}

impl Song {
    pub fn new(ticks_per_beat: u16, tempo_bpm: u32) -> Self {
        Self {
            ticks_per_beat,
            tempo_changes: vec![TempoChange {
                tick: 0,
                bpm: tempo_bpm,
            }],
            tracks: Vec::new(),
        }
    }

    /// Record a tempo at `tick`; a later change at the same tick wins
    pub(crate) fn set_tempo_at(&mut self, tick: u64, bpm: u32) {
        match self.tempo_changes.iter_mut().find(|c| c.tick == tick) {
            Some(change) => change.bpm = bpm,
            None => self.tempo_changes.push(TempoChange { tick, bpm }),
        }
    }

    /// Tempo in effect at the start of the song
    pub fn initial_tempo(&self) -> u32 {
        self.tempo_changes
            .iter()
            .find(|c| c.tick == 0)
            .map_or(crate::interpreter::state::DEFAULT_TEMPO, |c| c.bpm)
    }

    /// Tempo changes sorted by tick
    pub fn tempo_map(&self) -> Vec<TempoChange> {
        let mut map = self.tempo_changes.clone();
        map.sort_by_key(|c| c.tick);
        map
    }

    pub fn track(&self, id: u32) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Index of track `id`, creating it at the end if unseen
    pub(crate) fn ensure_track(&mut self, id: u32) -> (usize, bool) {
        match self.tracks.iter().position(|t| t.id == id) {
            Some(idx) => (idx, false),
            None => {
                self.tracks.push(Track::new(id));
                (self.tracks.len() - 1, true)
            }
        }
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(|t| t.events.len()).sum()
    }

    /// Replay every track into `sink`
    pub fn emit<S: EventSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        for track in &self.tracks {
            sink.begin_track(track.id)?;
            for event in &track.events {
                match *event {
                    Event::ProgramChange { channel, program } => {
                        sink.program_change(channel, program, 0)?
                    }
                    Event::NoteOn {
                        channel,
                        pitch,
                        velocity,
                    } => sink.note_on(channel, pitch, velocity, 0)?,
                    Event::NoteOff {
                        channel,
                        pitch,
                        tick_delta,
                    } => sink.note_off(channel, pitch, tick_delta)?,
                    Event::Rest { tick_delta } => sink.rest(tick_delta)?,
                }
            }
            sink.end_track()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl EventSink for Recorder {
        fn begin_track(&mut self, id: u32) -> Result<()> {
            self.calls.push(format!("begin {}", id));
            Ok(())
        }
        fn program_change(&mut self, channel: u8, program: u8, delta: u32) -> Result<()> {
            self.calls.push(format!("pc {} {} {}", channel, program, delta));
            Ok(())
        }
        fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8, delta: u32) -> Result<()> {
            self.calls
                .push(format!("on {} {} {} {}", channel, pitch, velocity, delta));
            Ok(())
        }
        fn note_off(&mut self, channel: u8, pitch: u8, delta: u32) -> Result<()> {
            self.calls.push(format!("off {} {} {}", channel, pitch, delta));
            Ok(())
        }
        fn rest(&mut self, delta: u32) -> Result<()> {
            self.calls.push(format!("rest {}", delta));
            Ok(())
        }
        fn end_track(&mut self) -> Result<()> {
            self.calls.push("end".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_ensure_track_keeps_first_seen_order() {
        let mut song = Song::new(480, 120);
        assert_eq!(song.ensure_track(3), (0, true));
        assert_eq!(song.ensure_track(1), (1, true));
        assert_eq!(song.ensure_track(3), (0, false));
        let ids: Vec<u32> = song.tracks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_emit_order() {
        let mut song = Song::new(480, 120);
        let mut track = Track::new(2);
        track.events = vec![
            Event::ProgramChange {
                channel: 1,
                program: 40,
            },
            Event::NoteOn {
                channel: 1,
                pitch: 60,
                velocity: 64,
            },
            Event::NoteOff {
                channel: 1,
                pitch: 60,
                tick_delta: 480,
            },
            Event::Rest { tick_delta: 240 },
        ];
        song.tracks.push(track);

        let mut rec = Recorder::default();
        song.emit(&mut rec).unwrap();
        assert_eq!(
            rec.calls,
            vec![
                "begin 2",
                "pc 1 40 0",
                "on 1 60 64 0",
                "off 1 60 480",
                "rest 240",
                "end"
            ]
        );
        assert_eq!(song.tracks[0].duration_ticks(), 720);
    }

    #[test]
    fn test_tempo_map() {
        let mut song = Song::new(480, 120);
        song.set_tempo_at(0, 90);
        song.set_tempo_at(960, 140);
        song.set_tempo_at(480, 100);
        song.set_tempo_at(960, 150);
        assert_eq!(song.initial_tempo(), 90);
        let ticks: Vec<(u64, u32)> = song.tempo_map().iter().map(|c| (c.tick, c.bpm)).collect();
        assert_eq!(ticks, vec![(0, 90), (480, 100), (960, 150)]);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(Event::Rest { tick_delta: 960 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "rest", "tick_delta": 960}));
    }
}
