//! Format-string languages for the `{..._custom="FMT"}` tokens.
//!
//! Dates follow the usual custom date pattern letters (`yyyy-MM-dd`,
//! `dddd`, `HH:mm`, ...) rendered with invariant English names. Durations
//! follow the stricter time-span rules, where every literal has to be quoted
//! or escaped, plus `H` for total hours without rolling over into days.

use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc};

use crate::core::error::FormatError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    /// A run of the same ASCII letter, e.g. `yyyy`.
    Run(char, usize),
    /// Quoted or escaped text, always copied verbatim.
    Literal(String),
    /// Any other character that appeared unescaped.
    Bare(char),
}

fn tokenize(format: &str) -> Result<Vec<Piece>, FormatError> {
    let mut pieces = Vec::new();
    let mut chars = format.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == ch => break,
                        Some('\\') => match chars.next() {
                            Some(c) => literal.push(c),
                            None => return Err(FormatError::UnterminatedQuote(ch)),
                        },
                        Some(c) => literal.push(c),
                        None => return Err(FormatError::UnterminatedQuote(ch)),
                    }
                }
                pieces.push(Piece::Literal(literal));
            }
            '\\' => match chars.next() {
                Some(c) => pieces.push(Piece::Literal(c.to_string())),
                None => return Err(FormatError::DanglingEscape('\\')),
            },
            // `%x` forces `x` to be read as a lone specifier
            '%' => match chars.next() {
                Some('%') => return Err(FormatError::DoublePercent),
                Some(c) if c.is_ascii_alphabetic() => pieces.push(Piece::Run(c, 1)),
                Some(c) => pieces.push(Piece::Bare(c)),
                None => return Err(FormatError::DanglingEscape('%')),
            },
            c if c.is_ascii_alphabetic() => {
                let mut count = 1;
                while chars.next_if_eq(&c).is_some() {
                    count += 1;
                }
                pieces.push(Piece::Run(c, count));
            }
            c => pieces.push(Piece::Bare(c)),
        }
    }

    Ok(pieces)
}

fn push_padded(out: &mut String, value: i64, width: usize) {
    out.push_str(&format!("{value:0width$}"));
}

/// Leading `count` digits of a seven digit, 100ns resolution fraction.
fn fraction_digits(ticks: i64, count: usize, trim_zeros: bool) -> String {
    let digits = format!("{ticks:07}");
    let digits = &digits[..count.min(digits.len())];
    if trim_zeros {
        digits.trim_end_matches('0').to_owned()
    } else {
        digits.to_owned()
    }
}

/// Formats `date` with a date pattern such as `yyyy-MM-dd` or a single
/// standard format letter such as `s`. An empty pattern behaves like `G`.
pub fn format_date(date: &DateTime<Utc>, format: &str) -> Result<String, FormatError> {
    let pattern = date_pattern(format)?;
    let mut out = String::with_capacity(pattern.len() + 8);

    for piece in tokenize(pattern)? {
        match piece {
            Piece::Literal(text) => out.push_str(&text),
            Piece::Bare(ch) => out.push(ch),
            Piece::Run(spec, count) => write_date_part(&mut out, date, spec, count)?,
        }
    }

    Ok(out)
}

fn date_pattern(format: &str) -> Result<&str, FormatError> {
    let mut chars = format.chars();
    match (chars.next(), chars.next()) {
        (None, _) => standard_date_pattern('G'),
        (Some(spec), None) => standard_date_pattern(spec),
        _ => Ok(format),
    }
}

fn standard_date_pattern(spec: char) -> Result<&'static str, FormatError> {
    let pattern = match spec {
        'd' => "MM/dd/yyyy",
        'D' => "dddd, dd MMMM yyyy",
        'f' => "dddd, dd MMMM yyyy HH:mm",
        'F' | 'U' => "dddd, dd MMMM yyyy HH:mm:ss",
        'g' => "MM/dd/yyyy HH:mm",
        'G' => "MM/dd/yyyy HH:mm:ss",
        'm' | 'M' => "MMMM dd",
        'o' | 'O' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss'.'fffffffK",
        'r' | 'R' => "ddd, dd MMM yyyy HH':'mm':'ss 'GMT'",
        's' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss",
        't' => "HH:mm",
        'T' => "HH:mm:ss",
        'u' => "yyyy'-'MM'-'dd HH':'mm':'ss'Z'",
        'y' | 'Y' => "yyyy MMMM",
        other => return Err(FormatError::UnknownStandardFormat(other)),
    };
    Ok(pattern)
}

fn write_date_part(
    out: &mut String,
    date: &DateTime<Utc>,
    spec: char,
    count: usize,
) -> Result<(), FormatError> {
    // Runs longer than the longest form fall back to that form
    let short = count.min(2);

    match spec {
        'd' => match count {
            1 | 2 => push_padded(out, i64::from(date.day()), count),
            3 => out.push_str(&date.format("%a").to_string()),
            _ => out.push_str(&date.format("%A").to_string()),
        },
        'M' => match count {
            1 | 2 => push_padded(out, i64::from(date.month()), count),
            3 => out.push_str(&date.format("%b").to_string()),
            _ => out.push_str(&date.format("%B").to_string()),
        },
        'y' => match count {
            1 | 2 => push_padded(out, i64::from(date.year().rem_euclid(100)), count),
            _ => push_padded(out, i64::from(date.year()), count),
        },
        'h' => push_padded(out, i64::from(date.hour12().1), short),
        'H' => push_padded(out, i64::from(date.hour()), short),
        'm' => push_padded(out, i64::from(date.minute()), short),
        's' => push_padded(out, i64::from(date.second()), short),
        'f' | 'F' => {
            if count > 7 {
                return Err(FormatError::TooManySpecifiers { specifier: spec, count });
            }
            // nanosecond() goes past 1e9 during a leap second
            let ticks = i64::from(date.nanosecond().min(999_999_999) / 100);
            let digits = fraction_digits(ticks, count, spec == 'F');
            if digits.is_empty() && out.ends_with('.') {
                out.pop();
            }
            out.push_str(&digits);
        }
        't' => {
            let designator = if date.hour() < 12 { "AM" } else { "PM" };
            out.push_str(if count == 1 { &designator[..1] } else { designator });
        }
        'g' => out.push_str(if date.year() > 0 { "A.D." } else { "B.C." }),
        'z' => out.push_str(match count {
            1 => "+0",
            2 => "+00",
            _ => "+00:00",
        }),
        'K' => (0..count).for_each(|_| out.push('Z')),
        other => (0..count).for_each(|_| out.push(other)),
    }

    Ok(())
}

/// A time span broken into the fields the pattern letters refer to. All
/// fields hold the magnitude; `negative` carries the sign.
struct SpanParts {
    negative: bool,
    total_hours: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
    ticks: i64,
}

impl SpanParts {
    fn new(span: TimeDelta) -> Self {
        let negative = span < TimeDelta::zero();
        let magnitude = if negative {
            TimeDelta::zero().checked_sub(&span).unwrap_or(TimeDelta::MAX)
        } else {
            span
        };
        let secs = magnitude.num_seconds();

        Self {
            negative,
            total_hours: secs / 3600,
            days: secs / 86_400,
            hours: secs / 3600 % 24,
            minutes: secs / 60 % 60,
            seconds: secs % 60,
            ticks: i64::from(magnitude.subsec_nanos()) / 100,
        }
    }

    fn sign(&self) -> &'static str {
        if self.negative {
            "-"
        } else {
            ""
        }
    }

    fn write_total_hours(&self, out: &mut String, width: usize) {
        out.push_str(self.sign());
        push_padded(out, self.total_hours, width);
    }

    fn write(&self, out: &mut String, spec: char, count: usize) -> Result<(), FormatError> {
        let too_many = || FormatError::TooManySpecifiers { specifier: spec, count };

        match spec {
            'H' => self.write_total_hours(out, count),
            'd' if count <= 8 => push_padded(out, self.days, count),
            'h' if count <= 2 => push_padded(out, self.hours, count),
            'm' if count <= 2 => push_padded(out, self.minutes, count),
            's' if count <= 2 => push_padded(out, self.seconds, count),
            'f' | 'F' if count <= 7 => {
                out.push_str(&fraction_digits(self.ticks, count, spec == 'F'));
            }
            'd' | 'h' | 'm' | 's' | 'f' | 'F' => return Err(too_many()),
            other => return Err(FormatError::UnescapedLiteral(other)),
        }

        Ok(())
    }

    /// `[-][d.]hh:mm:ss[.fffffff]`
    fn constant(&self) -> String {
        let mut out = String::from(self.sign());
        if self.days > 0 {
            out.push_str(&format!("{}.", self.days));
        }
        out.push_str(&format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds));
        if self.ticks > 0 {
            out.push_str(&format!(".{:07}", self.ticks));
        }
        out
    }

    /// `[-][d:]h:mm:ss[.FFFFFFF]`
    fn general_short(&self) -> String {
        let mut out = String::from(self.sign());
        if self.days > 0 {
            out.push_str(&format!("{}:", self.days));
        }
        out.push_str(&format!("{}:{:02}:{:02}", self.hours, self.minutes, self.seconds));
        let fraction = fraction_digits(self.ticks, 7, true);
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        out
    }

    /// `[-]d:hh:mm:ss.fffffff`
    fn general_long(&self) -> String {
        format!(
            "{}{}:{:02}:{:02}:{:02}.{:07}",
            self.sign(),
            self.days,
            self.hours,
            self.minutes,
            self.seconds,
            self.ticks
        )
    }
}

/// Formats `span` with a time-span pattern such as `hh\:mm\:ss` or
/// `HH'h'mm'm'`, or a standard format letter (`c`, `g`, `G`). An empty
/// pattern behaves like `c`.
///
/// `H` is total hours and is the only field that shows the sign of a
/// negative span; the other fields show its magnitude.
pub fn format_duration(span: TimeDelta, format: &str) -> Result<String, FormatError> {
    let parts = SpanParts::new(span);

    let mut chars = format.chars();
    match (chars.next(), chars.next()) {
        (None, _) => return Ok(parts.constant()),
        (Some('H'), None) => {}
        (Some(spec), None) => {
            return match spec {
                'c' | 't' | 'T' => Ok(parts.constant()),
                'g' => Ok(parts.general_short()),
                'G' => Ok(parts.general_long()),
                other => Err(FormatError::UnknownStandardFormat(other)),
            };
        }
        _ => {}
    }

    let mut out = String::with_capacity(format.len());
    for piece in tokenize(format)? {
        match piece {
            Piece::Literal(text) => out.push_str(&text),
            Piece::Bare(ch) => return Err(FormatError::UnescapedLiteral(ch)),
            Piece::Run(spec, count) => parts.write(&mut out, spec, count)?,
        }
    }

    Ok(out)
}

/// `HH-mm-ss` with total hours, as used by the plain `{trim_start}`,
/// `{trim_end}` and `{length}` tokens.
pub fn hours_minutes_seconds(span: TimeDelta) -> String {
    let parts = SpanParts::new(span);
    let mut out = String::with_capacity(8);
    parts.write_total_hours(&mut out, 2);
    out.push_str(&format!("-{:02}-{:02}", parts.minutes, parts.seconds));
    out
}
