//! Text notation interpreter - turns command lines into per-track events
//!
//! Lines are consumed in order. Setting commands mutate the interpreter
//! state, content lines emit events into the current track, and LOOP/END
//! capture a block of lines and replay it through the same dispatch.

pub mod command;
pub mod event;
pub mod line;
pub mod note;
pub mod state;
pub mod timing;

use crate::error::{path_error, Error, InterpretError, Result};
use crate::instruments::{InstrumentTables, PERCUSSION_CHANNEL};
use command::{Command, Keyword};
use event::{Event, Song};
use state::InterpreterState;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Upper bound on loop body lines executed by one END
pub const MAX_REPLAYED_LINES: u64 = 1 << 20;

/// A line kept for later replay, with its position in the source
#[derive(Debug, Clone)]
struct BufferedLine {
    number: usize,
    text: String,
}

/// Lines captured between LOOP and END
#[derive(Debug, Clone)]
struct LoopBuffer {
    /// Line number of the opening LOOP
    opened_at: usize,
    opening: String,
    repeat: u32,
    lines: Vec<BufferedLine>,
}

#[derive(Debug, Clone)]
enum Mode {
    Normal,
    InLoop(LoopBuffer),
}

/// Line-by-line interpreter.
///
/// Owns the single [`InterpreterState`] for one run and borrows the
/// read-only instrument tables.
pub struct Interpreter<'t> {
    tables: &'t InstrumentTables,
    state: InterpreterState,
    mode: Mode,
    song: Song,
}

impl<'t> Interpreter<'t> {
    pub fn new(tables: &'t InstrumentTables) -> Self {
        Self::with_ticks_per_beat(tables, timing::DEFAULT_TICKS_PER_BEAT)
    }

    pub fn with_ticks_per_beat(tables: &'t InstrumentTables, ticks_per_beat: u16) -> Self {
        let state = InterpreterState::new(ticks_per_beat);
        let song = Song::new(ticks_per_beat, state.tempo);
        Self {
            tables,
            state,
            mode: Mode::Normal,
            song,
        }
    }

    /// Current musical context
    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    /// Read the whole input, then interpret it
    pub fn interpret_reader<R: Read>(self, mut input: R) -> Result<Song> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        self.interpret(&text)
    }

    /// Interpret the notation file at `path`
    pub fn interpret_file(self, path: &Path) -> Result<Song> {
        let text = std::fs::read_to_string(path).map_err(|e| path_error(path, e))?;
        self.interpret(&text)
    }

    /// Interpret a complete text and return the resulting tracks
    pub fn interpret(mut self, text: &str) -> Result<Song> {
        info!("Starting interpretation");

        for (idx, raw) in text.lines().enumerate() {
            self.feed_line(idx + 1, raw)?;
        }
        self.finish()
    }

    /// Interpret one raw source line
    pub fn feed_line(&mut self, number: usize, raw: &str) -> Result<()> {
        let tokens = line::tokenize(raw);
        if tokens.is_empty() {
            return Ok(());
        }
        self.dispatch(number, line::strip_comment(raw), &tokens)
    }

    /// Finish interpretation; fails if a loop is still open
    pub fn finish(mut self) -> Result<Song> {
        if let Mode::InLoop(buffer) = &self.mode {
            return Err(Error::Line {
                line: buffer.opened_at,
                content: buffer.opening.clone(),
                source: InterpretError::UnterminatedLoop,
            });
        }
        info!(
            tracks = self.song.tracks.len(),
            events = self.song.event_count(),
            "Interpretation complete"
        );
        Ok(self.song)
    }

    fn dispatch(&mut self, number: usize, content: &str, tokens: &[&str]) -> Result<()> {
        let fail = |source: InterpretError| Error::Line {
            line: number,
            content: content.to_string(),
            source,
        };
        let keyword = Keyword::of(tokens[0]);

        // Inside a loop only LOOP and END run eagerly
        if let Mode::InLoop(buffer) = &mut self.mode {
            match keyword {
                Some(Keyword::Loop) => return Err(fail(InterpretError::NestedLoop)),
                Some(Keyword::End) => {}
                _ => {
                    buffer.lines.push(BufferedLine {
                        number,
                        text: content.to_string(),
                    });
                    return Ok(());
                }
            }
        }

        match Command::parse(tokens).map_err(fail)? {
            Command::Loop(repeat) => {
                debug!("Starting loop block");
                self.mode = Mode::InLoop(LoopBuffer {
                    opened_at: number,
                    opening: content.to_string(),
                    repeat,
                    lines: Vec::new(),
                });
                Ok(())
            }
            Command::End => match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::InLoop(buffer) => self.replay(buffer),
                Mode::Normal => Err(fail(InterpretError::UnmatchedEnd)),
            },
            command => self.execute(command).map_err(fail),
        }
    }

    /// Replay a closed loop body through the live state.
    ///
    /// State is not snapshotted: changes made by the body carry into
    /// the following repetitions.
    fn replay(&mut self, buffer: LoopBuffer) -> Result<()> {
        debug!(repeat = buffer.repeat, "Ending loop block");

        let replayed = buffer.repeat as u64 * buffer.lines.len() as u64;
        if replayed > MAX_REPLAYED_LINES {
            return Err(Error::Line {
                line: buffer.opened_at,
                content: buffer.opening,
                source: InterpretError::InvalidNumericArgument {
                    command: "LOOP",
                    message: format!(
                        "{} repetitions of {} lines exceed {} replayed lines",
                        buffer.repeat,
                        buffer.lines.len(),
                        MAX_REPLAYED_LINES
                    ),
                },
            });
        }

        self.current_track();
        if buffer.lines.is_empty() {
            return Ok(());
        }
        for _ in 0..buffer.repeat {
            for line in &buffer.lines {
                let fail = |source: InterpretError| Error::Line {
                    line: line.number,
                    content: line.text.clone(),
                    source,
                };
                let tokens: Vec<&str> = line.text.split_whitespace().collect();
                match Command::parse(&tokens).map_err(fail)? {
                    Command::Loop(_) | Command::End => {
                        return Err(fail(InterpretError::NestedLoop))
                    }
                    command => self.execute(command).map_err(fail)?,
                }
            }
        }
        Ok(())
    }

    /// Run a non-loop command against the live state
    fn execute(&mut self, command: Command<'_>) -> std::result::Result<(), InterpretError> {
        match command {
            Command::Tempo(bpm) => {
                self.state.set_tempo(bpm);
                // Takes effect at the current position of the current track
                let tick = self
                    .song
                    .track(self.state.track)
                    .map_or(0, |t| t.duration_ticks());
                self.song.set_tempo_at(tick, bpm);
                debug!(tick, "Setting tempo: {} BPM", bpm);
            }
            Command::Scale { root, mode } => {
                // Informational only; pitches are never quantized to the scale
                self.state.root = root;
                self.state.mode = mode;
                debug!(degrees = ?mode.intervals(), "Setting scale: {} {}", root, mode);
            }
            Command::Track(id) => {
                self.state.select_track(id);
                if self.song.ensure_track(id).1 {
                    debug!("Created new track {}", id);
                }
            }
            Command::Channel(channel) => {
                self.state.channel = channel;
                debug!("Setting channel: {}", channel);
            }
            Command::Instrument(name) => {
                let program = self.tables.resolve(name, self.state.channel)?;
                let channel = self.state.channel;
                self.push(Event::ProgramChange { channel, program });
                debug!(
                    "Setting track {} to instrument {} ({})",
                    self.state.track, name, program
                );
            }
            Command::Velocity(velocity) => {
                self.state.velocity = velocity;
                debug!("Setting velocity: {}", velocity);
            }
            Command::Duration(beats) => {
                self.ticks_for("DURATION", beats)?;
                self.state.duration = beats;
                debug!("Setting duration: {}", beats);
            }
            Command::Rest(beats) => {
                let beats = beats.unwrap_or(self.state.duration);
                let tick_delta = self.ticks_for("REST", beats)?;
                self.push(Event::Rest { tick_delta });
                debug!("Adding rest: {} beats", beats);
            }
            Command::Notes(tokens) => self.play_notes(tokens)?,
            Command::Loop(_) | Command::End => {}
        }
        Ok(())
    }

    /// Emit a note-on/note-off pair for every resolvable token
    fn play_notes(&mut self, tokens: &[&str]) -> std::result::Result<(), InterpretError> {
        let channel = self.state.channel;
        let mut pitches = Vec::with_capacity(tokens.len());

        for &token in tokens {
            if channel == PERCUSSION_CHANNEL && token.bytes().all(|b| b.is_ascii_digit()) {
                match token.parse::<u8>() {
                    Ok(code) if self.tables.is_percussion_code(code) => pitches.push(code),
                    _ => debug!("Skipping unknown percussion code {}", token),
                }
            } else if note::looks_like_note(token) {
                pitches.push(note::note_to_pitch(token)?);
            }
        }

        let velocity = self.state.velocity;
        let tick_delta = self.ticks_for("DURATION", self.state.duration)?;
        debug!(
            "Adding notes {:?} with duration {} and velocity {}",
            pitches, self.state.duration, velocity
        );

        self.current_track();
        for pitch in pitches {
            self.push(Event::NoteOn {
                channel,
                pitch,
                velocity,
            });
            self.push(Event::NoteOff {
                channel,
                pitch,
                tick_delta,
            });
        }
        Ok(())
    }

    fn ticks_for(
        &self,
        command: &'static str,
        beats: f64,
    ) -> std::result::Result<u32, InterpretError> {
        timing::beats_to_ticks(beats, self.state.ticks_per_beat).ok_or_else(|| {
            InterpretError::InvalidNumericArgument {
                command,
                message: format!("{} beats exceeds the maximum delta-time", beats),
            }
        })
    }

    /// Index of the current track, creating it lazily
    fn current_track(&mut self) -> usize {
        let (idx, created) = self.song.ensure_track(self.state.track);
        if created {
            debug!("Created new track {}", self.state.track);
        }
        idx
    }

    fn push(&mut self, event: Event) {
        let idx = self.current_track();
        self.song.tracks[idx].events.push(event);
    }
}

/// Interpret `text` with the given tables using default settings
pub fn interpret(text: &str, tables: &InstrumentTables) -> Result<Song> {
    Interpreter::new(tables).interpret(text)
}
