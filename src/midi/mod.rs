pub mod writer;

pub use writer::{write_song, SmfWriter};
