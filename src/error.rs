use std::fmt;
use std::io;
use std::path::Path;

/// Which instrument table a lookup consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentClass {
    Melodic,
    Percussion,
}

impl fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentClass::Melodic => f.write_str("melodic"),
            InstrumentClass::Percussion => f.write_str("percussion"),
        }
    }
}

/// Failure raised while interpreting a single line
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpretError {
    #[error("Invalid note name: {0}")]
    InvalidNoteName(String),

    #[error("Unknown {class} instrument: {name}")]
    UnknownInstrument { class: InstrumentClass, name: String },

    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    #[error("Nested loops are not supported")]
    NestedLoop,

    #[error("Invalid argument to {command}: {message}")]
    InvalidNumericArgument {
        command: &'static str,
        message: String,
    },

    #[error("END without a matching LOOP")]
    UnmatchedEnd,

    #[error("LOOP is never closed by END")]
    UnterminatedLoop,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Line {line}: {source} (in `{content}`)")]
    Line {
        line: usize,
        content: String,
        #[source]
        source: InterpretError,
    },

    #[error("Instrument table error: {0}")]
    Instruments(String),

    #[error("MIDI write error: {0}")]
    Midi(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// The interpretation failure behind a line error, if any
    pub fn interpret_error(&self) -> Option<&InterpretError> {
        match self {
            Error::Line { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Attach the offending path to an IO failure
pub(crate) fn path_error(path: &Path, e: io::Error) -> Error {
    Error::Io(io::Error::new(
        e.kind(),
        format!("Failed to open '{}': {}", path.display(), e),
    ))
}

pub type Result<T> = std::result::Result<T, Error>;
