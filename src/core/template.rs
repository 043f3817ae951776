use std::fmt;

use chrono::Datelike;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use tracing::{debug, trace};

use crate::core::error::{FilenameError, FormatError};
use crate::core::format::{format_date, format_duration, hours_minutes_seconds};
use crate::core::metadata::VideoMetadata;
use crate::core::path::{split_path, OutputPath};
use crate::utils::sanitize_filename;

const RANDOM_STRING_LEN: usize = 8;
const RANDOM_STRING_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// The `{..._custom="FMT"}` token families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomKind {
    Date,
    TrimStart,
    TrimEnd,
    Length,
}

static DATE_CUSTOM: Lazy<Regex> = Lazy::new(|| custom_pattern(CustomKind::Date));
static TRIM_START_CUSTOM: Lazy<Regex> = Lazy::new(|| custom_pattern(CustomKind::TrimStart));
static TRIM_END_CUSTOM: Lazy<Regex> = Lazy::new(|| custom_pattern(CustomKind::TrimEnd));
static LENGTH_CUSTOM: Lazy<Regex> = Lazy::new(|| custom_pattern(CustomKind::Length));

fn custom_pattern(kind: CustomKind) -> Regex {
    Regex::new(&format!(r#"\{{{}="(.*?)"\}}"#, kind.name())).expect("custom token pattern is valid")
}

impl CustomKind {
    pub const ALL: [CustomKind; 4] = [Self::Date, Self::TrimStart, Self::TrimEnd, Self::Length];

    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date_custom",
            Self::TrimStart => "trim_start_custom",
            Self::TrimEnd => "trim_end_custom",
            Self::Length => "length_custom",
        }
    }

    /// Cheap substring check done before running the pattern at all.
    fn trigger(self) -> &'static str {
        match self {
            Self::Date => "{date_custom=",
            Self::TrimStart => "{trim_start_custom=",
            Self::TrimEnd => "{trim_end_custom=",
            Self::Length => "{length_custom=",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Date => &*DATE_CUSTOM,
            Self::TrimStart => &*TRIM_START_CUSTOM,
            Self::TrimEnd => &*TRIM_END_CUSTOM,
            Self::Length => &*LENGTH_CUSTOM,
        }
    }

    fn format(self, metadata: &VideoMetadata, format: &str) -> Result<String, FormatError> {
        match self {
            Self::Date => format_date(&metadata.created_at, format),
            Self::TrimStart => format_duration(metadata.trim_start, format),
            Self::TrimEnd => format_duration(metadata.trim_end, format),
            Self::Length => format_duration(metadata.length(), format),
        }
    }
}

impl fmt::Display for CustomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds the output path for `metadata` from `template`.
///
/// Fixed tokens are replaced first, then custom tokens, and only then is
/// the result split on `/` and `\`. Every inserted value is sanitized, so
/// folders come only from separators written in the template itself.
pub fn get_filename(template: &str, metadata: &VideoMetadata) -> Result<OutputPath, FilenameError> {
    let substituted = substitute_tokens(template, metadata);
    let expanded = expand_custom_tokens(template, substituted, metadata)?;
    let output = split_path(&expanded);

    debug!("Template {:?} produced {}", template, output);
    Ok(output)
}

/// Replaces the fixed `{name}` tokens, one token at a time in a fixed order.
///
/// Each step is a plain global replace over the whole working string, so a
/// value inserted by an earlier step is searched again by the later ones.
/// A value is only computed when its token is still present.
pub fn substitute_tokens(template: &str, metadata: &VideoMetadata) -> String {
    let text = |value: &Option<String>| sanitize_filename(value.as_deref().unwrap_or_default()).into_owned();
    let date = &metadata.created_at;

    let steps: [(&str, &dyn Fn() -> String); 13] = [
        ("{title}", &|| text(&metadata.title)),
        ("{id}", &|| text(&metadata.id)),
        ("{channel}", &|| text(&metadata.channel)),
        ("{channel_id}", &|| text(&metadata.channel_id)),
        ("{clipper}", &|| text(&metadata.clipper)),
        ("{clipper_id}", &|| text(&metadata.clipper_id)),
        ("{date}", &|| format!("{}-{}-{:02}", date.month(), date.day(), date.year().rem_euclid(100))),
        ("{random_string}", &random_string),
        ("{trim_start}", &|| hours_minutes_seconds(metadata.trim_start)),
        ("{trim_end}", &|| hours_minutes_seconds(metadata.trim_end)),
        ("{length}", &|| hours_minutes_seconds(metadata.length())),
        ("{views}", &|| metadata.view_count.to_string()),
        ("{game}", &|| text(&metadata.game)),
    ];

    let mut working = template.to_owned();
    for (token, value) in steps {
        if working.contains(token) {
            working = working.replace(token, &value());
        }
    }
    working
}

/// Expands every `{kind="FMT"}` token in `working`.
///
/// A kind is only looked for when `template` itself mentions it. Each pass
/// searches from the start of the current string again, formats the first
/// match with its own format string and splices the sanitized result in.
/// Sanitized output never contains `"`, so a splice cannot create a new
/// match and the loop ends.
pub fn expand_custom_tokens(
    template: &str,
    mut working: String,
    metadata: &VideoMetadata,
) -> Result<String, FilenameError> {
    for kind in CustomKind::ALL {
        if !template.contains(kind.trigger()) {
            continue;
        }

        loop {
            let Some((range, format)) = kind.pattern().captures(&working).and_then(|captures| {
                Some((captures.get(0)?.range(), captures.get(1)?.as_str().to_owned()))
            }) else {
                break;
            };

            let formatted = kind
                .format(metadata, &format)
                .map_err(|source| FilenameError::CustomFormat {
                    kind,
                    format: format.clone(),
                    source,
                })?;
            let replacement = sanitize_filename(&formatted);

            trace!("Expanded {:?} to {:?}", &working[range.clone()], replacement);
            working.replace_range(range, &replacement);
        }
    }

    Ok(working)
}

fn random_string() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_STRING_LEN)
        .filter_map(|_| RANDOM_STRING_CHARS.choose(&mut rng))
        .map(|&byte| char::from(byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            title: Some("Any% WR: 1:23:45?".to_string()),
            id: Some("123".to_string()),
            channel: Some("Foo/Bar".to_string()),
            channel_id: Some("98765".to_string()),
            game: Some("Celeste".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 7, 18, 30, 0).unwrap(),
            trim_start: TimeDelta::zero(),
            trim_end: TimeDelta::seconds(65),
            view_count: 4321,
            ..Default::default()
        }
    }

    #[test]
    fn test_substitute_fixed_tokens() {
        let metadata = metadata();
        assert_eq!(
            substitute_tokens("{channel}_{id}_{trim_start}-{trim_end}", &metadata),
            "Foo／Bar_123_00-00-00-00-01-05"
        );
        assert_eq!(substitute_tokens("{title}", &metadata), "Any% WR： 1_23_45？");
        assert_eq!(substitute_tokens("{date} {views} {game} {length}", &metadata), "3-7-24 4321 Celeste 00-01-05");
        assert_eq!(substitute_tokens("{channel_id}{clipper}{clipper_id}", &metadata), "98765");
    }

    #[test]
    fn test_unknown_tokens_stay_literal() {
        let metadata = metadata();
        assert_eq!(substitute_tokens("{Title} {nope}", &metadata), "{Title} {nope}");
    }

    #[test]
    fn test_random_string() {
        let metadata = metadata();
        let first = substitute_tokens("{random_string}", &metadata);
        assert_eq!(first.len(), RANDOM_STRING_LEN);
        assert!(first.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));

        let twice = substitute_tokens("{random_string}-{random_string}", &metadata);
        let (a, b) = twice.split_once('-').unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_later_tokens_see_earlier_values() {
        // a value carrying another token's braces is expanded by the later pass
        let metadata = VideoMetadata {
            title: Some("{game}".to_string()),
            game: Some("Celeste".to_string()),
            ..Default::default()
        };
        assert_eq!(substitute_tokens("{title}", &metadata), "Celeste");

        // but not by an earlier one
        let metadata = VideoMetadata {
            game: Some("{title}".to_string()),
            title: Some("Speedrun".to_string()),
            ..Default::default()
        };
        assert_eq!(substitute_tokens("{game}", &metadata), "{title}");
    }

    #[test]
    fn test_expand_custom_tokens() {
        let metadata = metadata();
        let template = r#"{date_custom="yyyy-MM-dd"} {date_custom="HH:mm"} {length_custom="mm\:ss"}"#;
        let expanded = expand_custom_tokens(template, template.to_string(), &metadata).unwrap();
        assert_eq!(expanded, "2024-03-07 18_30 01_05");
    }

    #[test]
    fn test_custom_tokens_only_expand_when_template_asks() {
        let metadata = metadata();
        let working = r#"{date_custom="yyyy"}"#.to_string();
        let expanded = expand_custom_tokens("{title}", working.clone(), &metadata).unwrap();
        assert_eq!(expanded, working);
    }

    #[test]
    fn test_malformed_custom_tokens_stay_literal() {
        let metadata = metadata();
        for template in [r#"{date_custom="yyyy"#, r#"{date_custom=yyyy}"#, r#"{trim_end_custom="hh}"#] {
            let expanded = expand_custom_tokens(template, template.to_string(), &metadata).unwrap();
            assert_eq!(expanded, template);
        }
    }

    #[test]
    fn test_custom_format_error_propagates() {
        let metadata = metadata();
        let template = r#"{trim_start_custom="HH-mm"}"#;
        let err = expand_custom_tokens(template, template.to_string(), &metadata).unwrap_err();

        let FilenameError::CustomFormat { kind, format, source } = err;
        assert_eq!(kind, CustomKind::TrimStart);
        assert_eq!(format, "HH-mm");
        assert_eq!(source, FormatError::UnescapedLiteral('-'));
    }

    #[test]
    fn test_get_filename() {
        let metadata = metadata();
        let output = get_filename(
            r#"{channel}/{date_custom="yyyy"}\{title} [{id}]"#,
            &metadata,
        )
        .unwrap();

        assert_eq!(output.subfolders, vec!["Foo／Bar".to_string(), "2024".to_string()]);
        assert_eq!(output.filename, "Any% WR： 1_23_45？ [123]");
    }

    #[test]
    fn test_far_apart_trims_do_not_panic() {
        let metadata = VideoMetadata {
            title: Some("Marathon".to_string()),
            trim_start: TimeDelta::MIN,
            trim_end: TimeDelta::MAX,
            ..Default::default()
        };

        let output = get_filename("{title}", &metadata).unwrap();
        assert_eq!(output.filename, "Marathon");

        let output = get_filename(r#"{length} {length_custom="H"}"#, &metadata).unwrap();
        assert!(!output.filename.is_empty());
        assert!(!output.filename.starts_with('-'));
    }

    #[test]
    fn test_empty_template() {
        let output = get_filename("", &metadata()).unwrap();
        assert!(output.subfolders.is_empty());
        assert_eq!(output.filename, "");
    }
}
