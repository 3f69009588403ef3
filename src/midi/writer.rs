//! Standard MIDI File writer

use crate::error::{Error, Result};
use crate::interpreter::event::{EventSink, Song, TempoChange};
use crate::interpreter::timing::{bpm_to_micros, MAX_DELTA_TICKS};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A track being assembled
struct PendingTrack {
    name: String,
    events: Vec<TrackEvent<'static>>,
}

/// SMF format 1 writer fed through [`EventSink`]
///
/// Tempo meta events are merged into the first track at their absolute ticks.
pub struct SmfWriter {
    ticks_per_beat: u16,
    tempo_map: Vec<TempoChange>,
    next_tempo: usize,
    tracks: Vec<PendingTrack>,
    /// Absolute tick of the last event written to the current track
    written: u64,
    /// Rest ticks not yet attached to an event
    pending_delta: u32,
}

impl SmfWriter {
    /// Writer with a single tempo for the whole file
    pub fn new(ticks_per_beat: u16, tempo_bpm: u32) -> Self {
        Self::with_tempo_map(
            ticks_per_beat,
            vec![TempoChange {
                tick: 0,
                bpm: tempo_bpm,
            }],
        )
    }

    pub fn with_tempo_map(ticks_per_beat: u16, mut tempo_map: Vec<TempoChange>) -> Self {
        tempo_map.sort_by_key(|c| c.tick);
        Self {
            ticks_per_beat,
            tempo_map,
            next_tempo: 0,
            tracks: Vec::new(),
            written: 0,
            pending_delta: 0,
        }
    }

    /// Writer matching a song's resolution and tempo map, with the song emitted
    pub fn from_song(song: &Song) -> Result<Self> {
        let mut writer = Self::with_tempo_map(song.ticks_per_beat, song.tempo_map());
        song.emit(&mut writer)?;
        Ok(writer)
    }

    /// Serialize all tracks to SMF bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.ticks_per_beat == 0 || self.ticks_per_beat > 0x7FFF {
            return Err(Error::Midi(format!(
                "ticks per beat {} outside 1-32767",
                self.ticks_per_beat
            )));
        }

        let mut smf = Smf::new(Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(self.ticks_per_beat)),
        ));
        for track in &self.tracks {
            let mut events = Vec::with_capacity(track.events.len() + 1);
            events.push(TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::TrackName(track.name.as_bytes())),
            });
            for event in &track.events {
                events.push(*event);
            }
            smf.tracks.push(events);
        }

        let mut buf = Vec::new();
        smf.write_std(&mut buf)?;
        Ok(buf)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&data)?;
        Ok(())
    }

    fn current(&mut self) -> Result<&mut PendingTrack> {
        self.tracks
            .last_mut()
            .ok_or_else(|| Error::Midi("event outside of a track".to_string()))
    }

    /// Fold pending rest time into `delta`, flushing tempo changes due first
    fn take_delta(&mut self, delta: u32) -> Result<u28> {
        let target = self.written + self.pending_delta as u64 + delta as u64;
        self.pending_delta = 0;
        self.flush_tempos(target)?;
        let delta = checked_delta(target - self.written)?;
        self.written = target;
        Ok(delta)
    }

    /// Write every tempo change at or before `limit` into the first track
    fn flush_tempos(&mut self, limit: u64) -> Result<()> {
        if self.tracks.len() != 1 {
            return Ok(());
        }
        while let Some(&change) = self.tempo_map.get(self.next_tempo) {
            if change.tick > limit {
                break;
            }
            let delta = checked_delta(change.tick.saturating_sub(self.written))?;
            let micros = bpm_to_micros(change.bpm.max(1)).min(0xFF_FFFF);
            self.current()?.events.push(TrackEvent {
                delta,
                kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros))),
            });
            self.written = self.written.max(change.tick);
            self.next_tempo += 1;
        }
        Ok(())
    }

    fn push_midi(&mut self, delta: u32, channel: u8, message: MidiMessage) -> Result<()> {
        let channel = wire_channel(channel)?;
        let delta = self.take_delta(delta)?;
        self.current()?.events.push(TrackEvent {
            delta,
            kind: TrackEventKind::Midi { channel, message },
        });
        Ok(())
    }
}

fn checked_delta(ticks: u64) -> Result<u28> {
    if ticks > MAX_DELTA_TICKS as u64 {
        return Err(Error::Midi(format!("delta-time {} overflows 28 bits", ticks)));
    }
    Ok(u28::new(ticks as u32))
}

/// Convert a 1-based channel to the 4-bit wire channel
fn wire_channel(channel: u8) -> Result<u4> {
    if (1..=16).contains(&channel) {
        Ok(u4::new(channel - 1))
    } else {
        Err(Error::Midi(format!("channel {} outside 1-16", channel)))
    }
}

fn data_byte(value: u8, what: &str) -> Result<u7> {
    if value <= 127 {
        Ok(u7::new(value))
    } else {
        Err(Error::Midi(format!("{} {} outside 0-127", what, value)))
    }
}

impl EventSink for SmfWriter {
    fn begin_track(&mut self, id: u32) -> Result<()> {
        self.written = 0;
        self.pending_delta = 0;
        self.tracks.push(PendingTrack {
            name: format!("Track {}", id),
            events: Vec::new(),
        });
        Ok(())
    }

    fn program_change(&mut self, channel: u8, program: u8, delta: u32) -> Result<()> {
        let program = data_byte(program, "program")?;
        self.push_midi(delta, channel, MidiMessage::ProgramChange { program })
    }

    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8, delta: u32) -> Result<()> {
        let key = data_byte(pitch, "pitch")?;
        let vel = data_byte(velocity, "velocity")?;
        self.push_midi(delta, channel, MidiMessage::NoteOn { key, vel })
    }

    fn note_off(&mut self, channel: u8, pitch: u8, delta: u32) -> Result<()> {
        let key = data_byte(pitch, "pitch")?;
        self.push_midi(delta, channel, MidiMessage::NoteOff { key, vel: u7::new(0) })
    }

    fn rest(&mut self, delta: u32) -> Result<()> {
        self.current()?;
        self.pending_delta = self.pending_delta.saturating_add(delta);
        Ok(())
    }

    fn end_track(&mut self) -> Result<()> {
        let target = self.written + self.pending_delta as u64;
        self.pending_delta = 0;
        // Changes past the last event still belong in the file
        self.flush_tempos(u64::MAX)?;
        let delta = checked_delta(target.saturating_sub(self.written))?;
        self.written = self.written.max(target);
        self.current()?.events.push(TrackEvent {
            delta,
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        Ok(())
    }
}

/// Write `song` as a Standard MIDI File at `path`
pub fn write_song(song: &Song, path: &Path) -> Result<()> {
    SmfWriter::from_song(song)?.save(path)
}
