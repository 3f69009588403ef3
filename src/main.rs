use clap::Parser;
use std::path::PathBuf;
use text_to_midi::{InstrumentTables, Interpreter, SmfWriter};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "text2midi")]
#[command(version = "0.1.0")]
#[command(about = "Convert a text file of musical notes to a MIDI file", long_about = None)]
struct Args {
    /// Input notation file (`-` reads from stdin)
    input: PathBuf,

    /// Output MIDI file
    #[arg(short, long, default_value = "output.mid")]
    output: PathBuf,

    /// YAML file with `instruments` and `percussion` tables
    #[arg(long)]
    instruments: Option<PathBuf>,

    /// Tick resolution of the output file
    #[arg(long, default_value_t = text_to_midi::interpreter::timing::DEFAULT_TICKS_PER_BEAT)]
    ticks_per_beat: u16,

    /// Log every state change
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), text_to_midi::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let tables = match &args.instruments {
        Some(path) => InstrumentTables::from_path(path)?,
        None => InstrumentTables::general_midi()?,
    };

    let interpreter = Interpreter::with_ticks_per_beat(&tables, args.ticks_per_beat);
    let song = if args.input.as_os_str() == "-" {
        interpreter.interpret_reader(std::io::stdin())?
    } else {
        interpreter.interpret_file(&args.input)?
    };

    // Nothing is written unless interpretation succeeded
    SmfWriter::from_song(&song)?.save(&args.output)?;
    info!("Successfully created MIDI file: {}", args.output.display());

    Ok(())
}
