//! Command keywords and argument parsing

use super::note::{PitchClass, ScaleMode};
use crate::error::InterpretError;
use std::str::FromStr;

/// Recognized leading keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Tempo,
    Scale,
    Track,
    Channel,
    Instrument,
    Velocity,
    Duration,
    Loop,
    End,
    Rest,
}

impl Keyword {
    /// Match a leading token (case-insensitive)
    pub fn of(token: &str) -> Option<Self> {
        let keyword = match token.to_ascii_uppercase().as_str() {
            "TEMPO" => Keyword::Tempo,
            "SCALE" => Keyword::Scale,
            "TRACK" => Keyword::Track,
            "CHANNEL" => Keyword::Channel,
            "INSTRUMENT" => Keyword::Instrument,
            "VELOCITY" => Keyword::Velocity,
            "DURATION" => Keyword::Duration,
            "LOOP" => Keyword::Loop,
            "END" => Keyword::End,
            "REST" => Keyword::Rest,
            _ => return None,
        };
        Some(keyword)
    }

    fn name(self) -> &'static str {
        match self {
            Keyword::Tempo => "TEMPO",
            Keyword::Scale => "SCALE",
            Keyword::Track => "TRACK",
            Keyword::Channel => "CHANNEL",
            Keyword::Instrument => "INSTRUMENT",
            Keyword::Velocity => "VELOCITY",
            Keyword::Duration => "DURATION",
            Keyword::Loop => "LOOP",
            Keyword::End => "END",
            Keyword::Rest => "REST",
        }
    }
}

/// Instrument selected when INSTRUMENT has no argument
pub const DEFAULT_INSTRUMENT: &str = "acoustic_grand_piano";

/// A fully parsed line
#[derive(Debug, Clone, PartialEq)]
pub enum Command<'a> {
    Tempo(u32),
    Scale { root: PitchClass, mode: ScaleMode },
    Track(u32),
    Channel(u8),
    Instrument(&'a str),
    Velocity(u8),
    Duration(f64),
    Loop(u32),
    End,
    /// Rest for an explicit length, or the default duration
    Rest(Option<f64>),
    /// Anything else: note tokens, possibly mixed with annotations
    Notes(&'a [&'a str]),
}

impl<'a> Command<'a> {
    /// Parse a non-empty token line
    pub fn parse(tokens: &'a [&'a str]) -> Result<Self, InterpretError> {
        let Some((&first, args)) = tokens.split_first() else {
            return Ok(Command::Notes(tokens));
        };
        let Some(keyword) = Keyword::of(first) else {
            return Ok(Command::Notes(tokens));
        };
        let arg = args.first().copied();

        let command = match keyword {
            Keyword::Tempo => {
                let bpm: u32 = required(keyword, arg)?;
                if bpm == 0 {
                    return Err(invalid(keyword, "tempo must be positive"));
                }
                Command::Tempo(bpm)
            }
            Keyword::Scale => {
                let root = arg.ok_or_else(|| {
                    InterpretError::InvalidScale("missing root note".to_string())
                })?;
                let root = PitchClass::parse(root).ok_or_else(|| {
                    InterpretError::InvalidScale(format!("invalid root note: {}", root))
                })?;
                let mode = match args.get(1) {
                    Some(&name) => ScaleMode::parse(name).ok_or_else(|| {
                        InterpretError::InvalidScale(format!("invalid scale mode: {}", name))
                    })?,
                    None => ScaleMode::Major,
                };
                Command::Scale { root, mode }
            }
            Keyword::Track => {
                let id: u32 = required(keyword, arg)?;
                if id == 0 {
                    return Err(invalid(keyword, "track number must be positive"));
                }
                Command::Track(id)
            }
            Keyword::Channel => {
                let channel: u8 = required(keyword, arg)?;
                if !(1..=16).contains(&channel) {
                    return Err(invalid(keyword, format!("channel {} outside 1-16", channel)));
                }
                Command::Channel(channel)
            }
            Keyword::Instrument => Command::Instrument(arg.unwrap_or(DEFAULT_INSTRUMENT)),
            Keyword::Velocity => {
                let velocity: u8 = required(keyword, arg)?;
                if velocity > 127 {
                    return Err(invalid(keyword, format!("velocity {} outside 0-127", velocity)));
                }
                Command::Velocity(velocity)
            }
            Keyword::Duration => Command::Duration(beats(keyword, required(keyword, arg)?)?),
            Keyword::Loop => match arg {
                Some(_) => Command::Loop(required(keyword, arg)?),
                None => Command::Loop(1),
            },
            Keyword::End => Command::End,
            Keyword::Rest => match arg {
                Some(_) => Command::Rest(Some(beats(keyword, required(keyword, arg)?)?)),
                None => Command::Rest(None),
            },
        };
        Ok(command)
    }
}

fn invalid(keyword: Keyword, message: impl Into<String>) -> InterpretError {
    InterpretError::InvalidNumericArgument {
        command: keyword.name(),
        message: message.into(),
    }
}

fn required<T: FromStr>(keyword: Keyword, arg: Option<&str>) -> Result<T, InterpretError> {
    let arg = arg.ok_or_else(|| invalid(keyword, "missing argument"))?;
    arg.parse()
        .map_err(|_| invalid(keyword, format!("malformed number '{}'", arg)))
}

fn beats(keyword: Keyword, value: f64) -> Result<f64, InterpretError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(keyword, format!("duration {} must be positive", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<'a>(tokens: &'a [&'a str]) -> Result<Command<'a>, InterpretError> {
        Command::parse(tokens)
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(Keyword::of("tempo"), Some(Keyword::Tempo));
        assert_eq!(Keyword::of("Loop"), Some(Keyword::Loop));
        assert_eq!(Keyword::of("C4"), None);
    }

    #[test]
    fn test_settings() {
        assert_eq!(parse(&["TEMPO", "100"]), Ok(Command::Tempo(100)));
        assert_eq!(parse(&["track", "3"]), Ok(Command::Track(3)));
        assert_eq!(parse(&["CHANNEL", "10"]), Ok(Command::Channel(10)));
        assert_eq!(parse(&["VELOCITY", "0"]), Ok(Command::Velocity(0)));
        assert_eq!(parse(&["DURATION", "0.5"]), Ok(Command::Duration(0.5)));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            parse(&["INSTRUMENT"]),
            Ok(Command::Instrument("acoustic_grand_piano"))
        );
        assert_eq!(parse(&["LOOP"]), Ok(Command::Loop(1)));
        assert_eq!(parse(&["REST"]), Ok(Command::Rest(None)));
        assert_eq!(parse(&["REST", "2"]), Ok(Command::Rest(Some(2.0))));
    }

    #[test]
    fn test_scale() {
        assert_eq!(
            parse(&["SCALE", "a", "Minor"]),
            Ok(Command::Scale {
                root: PitchClass::parse("A").unwrap(),
                mode: ScaleMode::Minor,
            })
        );
        assert_eq!(
            parse(&["SCALE", "D"]),
            Ok(Command::Scale {
                root: PitchClass::parse("D").unwrap(),
                mode: ScaleMode::Major,
            })
        );
        assert!(matches!(
            parse(&["SCALE", "H"]),
            Err(InterpretError::InvalidScale(_))
        ));
        assert!(matches!(
            parse(&["SCALE", "C", "lydian"]),
            Err(InterpretError::InvalidScale(_))
        ));
        assert!(matches!(
            parse(&["SCALE"]),
            Err(InterpretError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_bad_numbers() {
        let cases: [&[&str]; 10] = [
            &["TEMPO"],
            &["TEMPO", "fast"],
            &["TEMPO", "0"],
            &["TRACK", "0"],
            &["CHANNEL", "17"],
            &["CHANNEL", "0"],
            &["VELOCITY", "128"],
            &["DURATION", "-1"],
            &["LOOP", "twice"],
            &["REST", "nan"],
        ];
        for tokens in cases {
            assert!(
                matches!(
                    parse(tokens),
                    Err(InterpretError::InvalidNumericArgument { .. })
                ),
                "{:?}",
                tokens
            );
        }
    }

    #[test]
    fn test_content_fallthrough() {
        let tokens = ["C4", "E4", "G4"];
        assert_eq!(parse(&tokens), Ok(Command::Notes(&tokens)));
        let tokens = ["verse", "C4"];
        assert_eq!(parse(&tokens), Ok(Command::Notes(&tokens)));
    }
}
