use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Everything a filename template can refer to for one VOD or clip.
///
/// Text fields that are `None` render as empty strings. `trim_end` is
/// expected to be at or after `trim_start` but that is not checked; a
/// reversed range just produces a negative [`length`](Self::length).
/// Trims far enough apart to overflow saturate instead of panicking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub id: Option<String>,
    pub channel: Option<String>,
    pub channel_id: Option<String>,
    pub clipper: Option<String>,
    pub clipper_id: Option<String>,
    pub game: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(with = "seconds")]
    pub trim_start: TimeDelta,
    #[serde(with = "seconds")]
    pub trim_end: TimeDelta,
    pub view_count: u64,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self {
            title: None,
            id: None,
            channel: None,
            channel_id: None,
            clipper: None,
            clipper_id: None,
            game: None,
            created_at: DateTime::<Utc>::default(),
            trim_start: TimeDelta::zero(),
            trim_end: TimeDelta::zero(),
            view_count: 0,
        }
    }
}

impl VideoMetadata {
    pub fn length(&self) -> TimeDelta {
        self.trim_end.checked_sub(&self.trim_start).unwrap_or(if self.trim_end < self.trim_start {
            TimeDelta::MIN
        } else {
            TimeDelta::MAX
        })
    }
}

/// (De)serializes a `TimeDelta` as fractional seconds, millisecond precision.
pub(crate) mod seconds {
    use chrono::TimeDelta;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(span: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(span.num_milliseconds() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        from_secs(secs).ok_or_else(|| de::Error::custom(format!("{secs} is not a usable number of seconds")))
    }

    pub fn from_secs(secs: f64) -> Option<TimeDelta> {
        if !secs.is_finite() || secs.abs() > 1e13 {
            return None;
        }
        TimeDelta::try_milliseconds((secs * 1000.0).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_length_may_be_negative() {
        let metadata = VideoMetadata {
            trim_start: TimeDelta::seconds(90),
            trim_end: TimeDelta::seconds(30),
            ..Default::default()
        };
        assert_eq!(metadata.length(), TimeDelta::seconds(-60));
    }

    #[test]
    fn test_length_saturates_instead_of_overflowing() {
        let metadata = VideoMetadata {
            trim_start: TimeDelta::MIN,
            trim_end: TimeDelta::MAX,
            ..Default::default()
        };
        assert_eq!(metadata.length(), TimeDelta::MAX);

        let metadata = VideoMetadata {
            trim_start: TimeDelta::MAX,
            trim_end: TimeDelta::MIN,
            ..Default::default()
        };
        assert_eq!(metadata.length(), TimeDelta::MIN);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let metadata: VideoMetadata = serde_json::from_str(
            r#"{
                "title": "Speedrun",
                "created_at": "2024-03-07T12:00:00Z",
                "trim_start": 1.5,
                "trim_end": 65,
                "view_count": 1200
            }"#,
        )
        .unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Speedrun"));
        assert_eq!(metadata.channel, None);
        assert_eq!(metadata.created_at, Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap());
        assert_eq!(metadata.trim_start, TimeDelta::milliseconds(1500));
        assert_eq!(metadata.length(), TimeDelta::milliseconds(63_500));
        assert_eq!(metadata.view_count, 1200);
    }

    #[test]
    fn test_rejects_unusable_seconds() {
        assert!(seconds::from_secs(f64::NAN).is_none());
        assert!(seconds::from_secs(f64::INFINITY).is_none());
        assert_eq!(seconds::from_secs(-2.0), Some(TimeDelta::seconds(-2)));
    }
}
