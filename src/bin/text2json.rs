//! Notation to JSON event dump

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use text_to_midi::{InstrumentTables, Interpreter};

#[derive(Parser, Debug)]
#[command(name = "text2json")]
#[command(version = "0.1.0")]
#[command(about = "Print the interpreted event stream of a notation file as JSON", long_about = None)]
struct Args {
    /// Input notation file
    input: PathBuf,

    /// Output JSON file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML file with `instruments` and `percussion` tables
    #[arg(long)]
    instruments: Option<PathBuf>,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long)]
    compact: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let tables = match &args.instruments {
        Some(path) => InstrumentTables::from_path(path)?,
        None => InstrumentTables::general_midi()?,
    };
    let song = Interpreter::new(&tables).interpret_file(&args.input)?;

    let json_string = if args.compact {
        serde_json::to_string(&song)?
    } else {
        serde_json::to_string_pretty(&song)?
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(json_string.as_bytes())?;
            file.write_all(b"\n")?;
        }
        None => {
            println!("{}", json_string);
        }
    }

    Ok(())
}
