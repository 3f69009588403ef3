//! Beat to tick conversion

/// Ticks per beat used when none is configured
pub const DEFAULT_TICKS_PER_BEAT: u16 = 480;

/// Largest delta-time the container can encode (28-bit)
pub const MAX_DELTA_TICKS: u32 = 0x0FFF_FFFF;

/// Microseconds per beat for a tempo in BPM
pub fn bpm_to_micros(bpm: u32) -> u32 {
    (60_000_000.0 / bpm as f64).round() as u32
}

/// Convert a duration in beats to ticks.
///
/// Returns `None` when the result does not fit a container delta.
/// Tick counts depend only on the beat count and resolution; tempo
/// only affects how ticks map to wall-clock time.
pub fn beats_to_ticks(beats: f64, ticks_per_beat: u16) -> Option<u32> {
    let ticks = (beats * ticks_per_beat as f64).round();
    if ticks.is_finite() && ticks >= 0.0 && ticks <= MAX_DELTA_TICKS as f64 {
        Some(ticks as u32)
    } else {
        None
    }
}
