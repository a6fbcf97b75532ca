//! Time-indexed caption track.
//!
//! Caption resources are plain text, one cue per line:
//!
//! ```text
//! # comment
//! 0        Long ago, in a distant sector...
//! 2500     The fleet gathered.
//! 4:05.250-4:09 A timestamp may carry an explicit end.
//! 6000
//! ```
//!
//! Times are milliseconds or `[h:]m:ss[.mmm]`. A cue without an explicit end
//! lasts until the next cue starts; a line holding only a time ends the
//! previous cue without starting a new one. `\n` in the text is a line
//! break.

use std::io::Read;

use crate::error::{ReelError, Result};

/// One caption and the interval it is shown for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    /// Exclusive end; `None` means the cue stays up until the track ends.
    pub end_ms: Option<u64>,
    pub text: String,
}

impl Cue {
    pub fn contains(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.start_ms && self.end_ms.map_or(true, |end| elapsed_ms < end)
    }
}

/// Immutable, start-ordered caption track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleTrack {
    cues: Vec<Cue>,
}

struct Entry {
    start_ms: u64,
    end_ms: Option<u64>,
    text: Option<String>,
}

impl SubtitleTrack {
    pub fn parse(source: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (number, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let number = number + 1;

            let (timing, text) = match line.split_once(char::is_whitespace) {
                Some((timing, text)) => (timing, text.trim()),
                None => (line, ""),
            };
            let (start_ms, end_ms) = match timing.split_once('-') {
                Some((start, end)) => (
                    parse_time(start, number)?,
                    Some(parse_time(end, number)?),
                ),
                None => (parse_time(timing, number)?, None),
            };
            if let Some(end) = end_ms {
                if end <= start_ms {
                    return Err(ReelError::Subtitle {
                        line: number,
                        reason: format!("cue ends at {}ms before it starts at {}ms", end, start_ms),
                    });
                }
            }

            entries.push(Entry {
                start_ms,
                end_ms,
                text: (!text.is_empty()).then(|| text.replace("\\n", "\n")),
            });
        }

        entries.sort_by_key(|entry| entry.start_ms);

        let mut cues = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let Some(text) = &entry.text else {
                continue;
            };
            let next_start = entries.get(index + 1).map(|next| next.start_ms);
            let end_ms = match (entry.end_ms, next_start) {
                (Some(end), Some(next)) => Some(end.min(next)),
                (Some(end), None) => Some(end),
                (None, next) => next,
            };
            if end_ms == Some(entry.start_ms) {
                // Shadowed entirely by a cue starting at the same instant.
                continue;
            }
            cues.push(Cue {
                start_ms: entry.start_ms,
                end_ms,
                text: text.clone(),
            });
        }

        Ok(Self { cues })
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Self::parse(&source)
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Cue shown at `elapsed_ms`, if any. Binary search over start times.
    pub fn cue_at(&self, elapsed_ms: u64) -> Option<&Cue> {
        let index = self.cues.partition_point(|cue| cue.start_ms <= elapsed_ms);
        let cue = self.cues.get(index.checked_sub(1)?)?;
        cue.contains(elapsed_ms).then_some(cue)
    }

    pub fn text_at(&self, elapsed_ms: u64) -> Option<&str> {
        self.cue_at(elapsed_ms).map(|cue| cue.text.as_str())
    }
}

fn parse_time(value: &str, line: usize) -> Result<u64> {
    let invalid = |reason: &str| ReelError::Subtitle {
        line,
        reason: format!("{} in '{}'", reason, value),
    };

    if !value.contains(':') {
        return value
            .parse::<u64>()
            .map_err(|_| invalid("invalid millisecond timestamp"));
    }

    let (clock, millis) = match value.split_once('.') {
        Some((clock, fraction)) => {
            if fraction.is_empty() || fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("invalid fractional seconds"));
            }
            let padded = format!("{:0<3}", fraction);
            (clock, padded.parse::<u64>().map_err(|_| invalid("invalid fractional seconds"))?)
        }
        None => (value, 0),
    };

    let parts = clock
        .split(':')
        .map(|part| part.parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| invalid("invalid clock timestamp"))?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0, *minutes, *seconds),
        [hours, minutes, seconds] => (*hours, *minutes, *seconds),
        _ => return Err(invalid("expected [h:]m:ss")),
    };
    if seconds >= 60 || (parts.len() == 3 && minutes >= 60) {
        return Err(invalid("clock field out of range"));
    }

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "\
# opening crawl
0 Long ago...
2500 The fleet gathered.
0:04.000
0:05.5-0:07 Brief\\nline
";

    #[test]
    fn cues_run_until_the_next_start() {
        let track = SubtitleTrack::parse(SCRIPT).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.text_at(0), Some("Long ago..."));
        assert_eq!(track.text_at(2499), Some("Long ago..."));
        assert_eq!(track.text_at(2500), Some("The fleet gathered."));
    }

    #[test]
    fn bare_timestamp_clears_the_previous_cue() {
        let track = SubtitleTrack::parse(SCRIPT).unwrap();
        assert_eq!(track.text_at(3999), Some("The fleet gathered."));
        assert_eq!(track.text_at(4000), None);
        assert_eq!(track.text_at(5499), None);
    }

    #[test]
    fn explicit_end_and_line_breaks() {
        let track = SubtitleTrack::parse(SCRIPT).unwrap();
        assert_eq!(track.text_at(5500), Some("Brief\nline"));
        assert_eq!(track.text_at(6999), Some("Brief\nline"));
        assert_eq!(track.text_at(7000), None);
    }

    #[test]
    fn last_open_cue_never_ends() {
        let track = SubtitleTrack::parse("100 forever").unwrap();
        assert_eq!(track.text_at(99), None);
        assert_eq!(track.text_at(u64::MAX), Some("forever"));
    }

    #[test]
    fn out_of_order_lines_are_sorted() {
        let track = SubtitleTrack::parse("2000 second\n1000 first").unwrap();
        assert_eq!(track.text_at(1500), Some("first"));
        assert_eq!(track.text_at(2500), Some("second"));
    }

    #[test]
    fn clock_formats() {
        assert_eq!(parse_time("1:02", 1).unwrap(), 62_000);
        assert_eq!(parse_time("1:00:00.5", 1).unwrap(), 3_600_500);
        assert_eq!(parse_time("0:00.05", 1).unwrap(), 50);
        assert!(parse_time("0:61", 1).is_err());
        assert!(parse_time("abc", 1).is_err());
    }

    #[test]
    fn reports_line_of_bad_cue() {
        let err = SubtitleTrack::parse("0 ok\n\n3000-2000 backwards").unwrap_err();
        assert!(matches!(err, ReelError::Subtitle { line: 3, .. }));
    }

    #[test]
    fn empty_source_has_no_cues() {
        let track = SubtitleTrack::parse("# nothing\n\n").unwrap();
        assert!(track.is_empty());
        assert_eq!(track.cue_at(0), None);
    }
}
