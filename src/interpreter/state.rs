//! Musical context carried from line to line

use super::note::{PitchClass, ScaleMode};
use super::timing::{bpm_to_micros, DEFAULT_TICKS_PER_BEAT};

/// Default tempo (BPM)
pub const DEFAULT_TEMPO: u32 = 120;

/// Default note and rest length (beats)
pub const DEFAULT_DURATION: f64 = 1.0;

/// Default note-on velocity
pub const DEFAULT_VELOCITY: u8 = 64;

/// Channel selected by TRACK and at start
pub const DEFAULT_CHANNEL: u8 = 1;

/// Track used for content before any TRACK command
pub const DEFAULT_TRACK: u32 = 1;

/// Interpreter state, mutated in place by each command
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterState {
    /// Current tempo (BPM)
    pub tempo: u32,
    /// Beat length derived from tempo, recomputed on TEMPO
    pub micros_per_beat: u32,
    /// Tick resolution, fixed for one interpretation
    pub ticks_per_beat: u16,
    /// Declared root; informational only
    pub root: PitchClass,
    /// Declared mode; informational only
    pub mode: ScaleMode,
    /// Default note and rest length in beats
    pub duration: f64,
    /// Default note-on velocity (0-127)
    pub velocity: u8,
    pub track: u32,
    /// Current channel (1-16)
    pub channel: u8,
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS_PER_BEAT)
    }
}

impl InterpreterState {
    pub fn new(ticks_per_beat: u16) -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            micros_per_beat: bpm_to_micros(DEFAULT_TEMPO),
            ticks_per_beat,
            root: PitchClass::C,
            mode: ScaleMode::Major,
            duration: DEFAULT_DURATION,
            velocity: DEFAULT_VELOCITY,
            track: DEFAULT_TRACK,
            channel: DEFAULT_CHANNEL,
        }
    }

    pub fn set_tempo(&mut self, bpm: u32) {
        self.tempo = bpm;
        self.micros_per_beat = bpm_to_micros(bpm);
    }

    /// Switch track; the channel falls back to the default
    pub fn select_track(&mut self, id: u32) {
        self.track = id;
        self.channel = DEFAULT_CHANNEL;
    }
}
