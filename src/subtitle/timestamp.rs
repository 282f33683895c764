//! Subtitle timestamp formatting and parsing.

use crate::error::{Result, TekstingError};

/// Format for SRT (`00:00:00,000`).
pub fn format_srt(ms: u64) -> String {
    let (h, m, s, millis) = split(ms);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, millis)
}

/// Format for WebVTT (`00:00:00.000`).
pub fn format_vtt(ms: u64) -> String {
    let (h, m, s, millis) = split(ms);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, millis)
}

/// Format for ASS (`0:00:00.00`), truncating to centiseconds.
pub fn format_ass(ms: u64) -> String {
    let (h, m, s, millis) = split(ms);
    format!("{}:{:02}:{:02}.{:02}", h, m, s, millis / 10)
}

fn split(ms: u64) -> (u64, u64, u64, u64) {
    (
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1000,
        ms % 1000,
    )
}

/// Parse an SRT, WebVTT or ASS timestamp into milliseconds.
///
/// Accepts `HH:MM:SS,mmm`, `HH:MM:SS.mmm`, `MM:SS.mmm` (WebVTT short form)
/// and `H:MM:SS.cc`.
pub fn parse(timestamp: &str) -> Result<u64> {
    let invalid = || TekstingError::Format(format!("invalid timestamp: {:?}", timestamp));

    let ts = timestamp.trim();
    let (clock, fraction) = ts.rsplit_once([',', '.']).ok_or_else(invalid)?;

    if fraction.is_empty() || fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    // ".5" is 500ms, ".05" is 50ms, ".005" is 5ms
    let fraction_ms = fraction.parse::<u64>().map_err(|_| invalid())? * 10u64.pow(3 - fraction.len() as u32);

    let parts: Vec<u64> = clock
        .split(':')
        .map(|p| p.parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<_>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(invalid()),
    };
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + fraction_ms)
}
