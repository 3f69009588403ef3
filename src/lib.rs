pub mod error;
pub mod instruments;
pub mod interpreter;
pub mod midi;

pub use error::{Error, InterpretError};
pub use instruments::InstrumentTables;
pub use interpreter::event::{Event, EventSink, Song, Track};
pub use interpreter::{interpret, Interpreter};
pub use midi::SmfWriter;
