use serde::{Deserialize, Deserializer, Serialize, de};
use time::OffsetDateTime;
use time::macros::format_description;

/// Size at which the active log file is rotated by default (100 MB).
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;
/// Number of rotated backups kept by default.
pub const DEFAULT_MAX_BACKUPS: usize = 10;

/// Parse a size string with optional units (K/M/G, case-insensitive), defaulting to KB if no unit.
fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err("empty size string".to_string());
    };

    let (num_str, unit) = if last.is_alphabetic() {
        (&s[..s.len() - last.len_utf8()], last.to_ascii_uppercase())
    } else {
        (s, 'K')
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    let multiplier = match unit {
        'K' => 1024,
        'M' => 1024 * 1024,
        'G' => 1024 * 1024 * 1024,
        _ => return Err(format!("invalid unit: {}, supported: K/M/G", unit)),
    };

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Size value that can be a number or string with units.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(u64),
    String(String),
}

impl SizeValue {
    fn to_bytes(&self) -> Result<u64, String> {
        match self {
            SizeValue::Number(n) => parse_size(&n.to_string()),
            SizeValue::String(s) => parse_size(s),
        }
    }
}

/// When the active log file is rotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RotationTrigger {
    /// Never rotate.
    #[default]
    Never,
    /// Start a new file every period; the file name carries the period suffix.
    Time {
        period: RotationPeriod,
    },
    /// Rotate once the file would grow past `max_size` bytes.
    Size {
        /// Numbers are read as KB, strings may carry a K/M/G unit ("100M").
        max_size: u64,
        /// Rotated copies kept next to the active file.
        max_backups: usize,
    },
    /// Rotate on period change or size, whichever comes first.
    Both {
        period: RotationPeriod,
        max_size: u64,
        max_backups: usize,
    },
}

impl<'de> Deserialize<'de> for RotationTrigger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RotationInput {
            Simple(String),
            Complex {
                #[serde(rename = "type")]
                rotation_type: Option<String>,
                period: Option<RotationPeriod>,
                max_size: Option<SizeValue>,
                max_backups: Option<usize>,
            },
        }

        let size_of = |value: Option<SizeValue>, what: &str| -> Result<u64, D::Error> {
            match value {
                Some(v) => v.to_bytes().map_err(de::Error::custom),
                None if what == "size" => Ok(DEFAULT_MAX_SIZE),
                None => Err(de::Error::custom(format!(
                    "max_size is required for {} rotation",
                    what
                ))),
            }
        };

        match RotationInput::deserialize(deserializer)? {
            RotationInput::Simple(rotation_type) => match rotation_type.as_str() {
                "never" => Ok(RotationTrigger::Never),
                "size" => Ok(RotationTrigger::default_size()),
                "time" => Ok(RotationTrigger::time(RotationPeriod::Daily)),
                "both" => Ok(RotationTrigger::both(
                    RotationPeriod::Daily,
                    DEFAULT_MAX_SIZE,
                    DEFAULT_MAX_BACKUPS,
                )),
                other => Err(de::Error::custom(format!(
                    "unknown rotation type: {}",
                    other
                ))),
            },
            RotationInput::Complex {
                rotation_type,
                period,
                max_size,
                max_backups,
            } => {
                let max_backups = max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
                match rotation_type.as_deref() {
                    Some("never") | None => Ok(RotationTrigger::Never),
                    Some("time") => {
                        let period = period.ok_or_else(|| {
                            de::Error::custom("period is required for time-based rotation")
                        })?;
                        Ok(RotationTrigger::Time { period })
                    }
                    Some("size") => Ok(RotationTrigger::Size {
                        max_size: size_of(max_size, "size")?,
                        max_backups,
                    }),
                    Some("both") => {
                        let period = period.ok_or_else(|| {
                            de::Error::custom("period is required for time+size rotation")
                        })?;
                        Ok(RotationTrigger::Both {
                            period,
                            max_size: size_of(max_size, "time+size")?,
                            max_backups,
                        })
                    }
                    Some(other) => Err(de::Error::custom(format!(
                        "unknown rotation type: {}",
                        other
                    ))),
                }
            }
        }
    }
}

impl RotationTrigger {
    /// Create a size-based rotation trigger.
    pub fn size(max_size: u64, max_backups: usize) -> Self {
        Self::Size {
            max_size,
            max_backups,
        }
    }

    /// Size rotation at 100 MB keeping 10 backups.
    pub fn default_size() -> Self {
        Self::size(DEFAULT_MAX_SIZE, DEFAULT_MAX_BACKUPS)
    }

    /// Create a time-based rotation trigger.
    pub fn time(period: RotationPeriod) -> Self {
        Self::Time { period }
    }

    /// Create a hybrid rotation trigger.
    pub fn both(period: RotationPeriod, max_size: u64, max_backups: usize) -> Self {
        Self::Both {
            period,
            max_size,
            max_backups,
        }
    }

    /// Number of rotated backups to keep, for triggers that rotate by size.
    pub fn max_backups(&self) -> Option<usize> {
        match self {
            Self::Never | Self::Time { .. } => None,
            Self::Size { max_backups, .. } | Self::Both { max_backups, .. } => Some(*max_backups),
        }
    }

    pub fn max_size(&self) -> Option<u64> {
        match self {
            Self::Never | Self::Time { .. } => None,
            Self::Size { max_size, .. } | Self::Both { max_size, .. } => Some(*max_size),
        }
    }

    pub fn period(&self) -> Option<RotationPeriod> {
        match self {
            Self::Time { period } | Self::Both { period, .. } => Some(*period),
            _ => None,
        }
    }
}

/// Time periods for log rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPeriod {
    Never,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl RotationPeriod {
    /// Suffix naming the period that contains the current local time.
    pub fn current_suffix(&self) -> String {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.suffix_at(now)
    }

    /// Suffix naming the period that contains `at`.
    pub fn suffix_at(&self, at: OffsetDateTime) -> String {
        let formatted = match self {
            Self::Never => return String::new(),
            Self::Hourly => at.format(format_description!("[year]-[month]-[day]T[hour]")),
            Self::Daily => at.format(format_description!("[year]-[month]-[day]")),
            Self::Weekly => {
                let week_start =
                    at - time::Duration::days(at.weekday().number_days_from_monday() as i64);
                week_start.format(format_description!("[year]-[month]-[day]"))
            }
            Self::Monthly => at.format(format_description!("[year]-[month]")),
        };
        formatted.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("10"), Ok(10 * 1024));
        assert_eq!(parse_size("5K"), Ok(5 * 1024));
        assert_eq!(parse_size("100m"), Ok(100 * 1024 * 1024));
        assert_eq!(parse_size(" 2G "), Ok(2 * 1024 * 1024 * 1024));
        assert!(parse_size("").is_err());
        assert!(parse_size("12T").is_err());
        assert!(parse_size("abcM").is_err());
        assert!(parse_size("99999999999999G").is_err());
    }

    #[test]
    fn test_rotation_trigger_accessors() {
        assert_eq!(RotationTrigger::Never.max_backups(), None);
        assert_eq!(RotationTrigger::size(1024, 5).max_backups(), Some(5));
        assert_eq!(RotationTrigger::size(1024, 5).max_size(), Some(1024));
        assert_eq!(
            RotationTrigger::time(RotationPeriod::Daily).max_backups(),
            None
        );
        assert_eq!(
            RotationTrigger::both(RotationPeriod::Daily, 1024, 3).max_backups(),
            Some(3)
        );
        assert_eq!(
            RotationTrigger::both(RotationPeriod::Hourly, 1024, 3).period(),
            Some(RotationPeriod::Hourly)
        );
        assert_eq!(RotationTrigger::size(1, 1).period(), None);
    }

    #[test]
    fn test_default_size_matches_server_defaults() {
        assert_eq!(
            RotationTrigger::default_size(),
            RotationTrigger::Size {
                max_size: 100 * 1024 * 1024,
                max_backups: 10
            }
        );
    }

    #[test]
    fn test_rotation_trigger_deserialize_simple() {
        let trigger: RotationTrigger = serde_yaml::from_str("never").unwrap();
        assert_eq!(trigger, RotationTrigger::Never);

        let trigger: RotationTrigger = serde_yaml::from_str("size").unwrap();
        assert_eq!(trigger, RotationTrigger::default_size());

        let trigger: RotationTrigger = serde_yaml::from_str("time").unwrap();
        assert_eq!(trigger, RotationTrigger::time(RotationPeriod::Daily));

        assert!(serde_yaml::from_str::<RotationTrigger>("weekly-ish").is_err());
    }

    #[test]
    fn test_rotation_trigger_deserialize_size() {
        let yaml = r#"
type: size
max_size: 10
max_backups: 5
"#;
        let trigger: RotationTrigger = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(trigger, RotationTrigger::size(10 * 1024, 5));

        let yaml = r#"
type: size
max_size: "2M"
"#;
        let trigger: RotationTrigger = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(trigger, RotationTrigger::size(2 * 1024 * 1024, 10));

        let yaml = r#"
type: size
max_backups: 3
"#;
        let trigger: RotationTrigger = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(trigger, RotationTrigger::size(DEFAULT_MAX_SIZE, 3));
    }

    #[test]
    fn test_rotation_trigger_deserialize_time_and_both() {
        let yaml = r#"
type: time
period: daily
"#;
        let trigger: RotationTrigger = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(trigger, RotationTrigger::time(RotationPeriod::Daily));

        let yaml = r#"
type: both
period: hourly
max_size: "512K"
max_backups: 4
"#;
        let trigger: RotationTrigger = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            trigger,
            RotationTrigger::both(RotationPeriod::Hourly, 512 * 1024, 4)
        );

        let missing_size = r#"
type: both
period: hourly
"#;
        assert!(serde_yaml::from_str::<RotationTrigger>(missing_size).is_err());

        let missing_period = "type: time\n";
        assert!(serde_yaml::from_str::<RotationTrigger>(missing_period).is_err());
    }

    #[test]
    fn test_rotation_period_suffixes() {
        let at = datetime!(2026-01-15 13:45:00 UTC);
        assert_eq!(RotationPeriod::Never.suffix_at(at), "");
        assert_eq!(RotationPeriod::Hourly.suffix_at(at), "2026-01-15T13");
        assert_eq!(RotationPeriod::Daily.suffix_at(at), "2026-01-15");
        // 2026-01-15 is a Thursday
        assert_eq!(RotationPeriod::Weekly.suffix_at(at), "2026-01-12");
        assert_eq!(RotationPeriod::Monthly.suffix_at(at), "2026-01");
    }

    #[test]
    fn test_current_suffix_shape() {
        let daily = RotationPeriod::Daily.current_suffix();
        assert_eq!(daily.chars().filter(|c| *c == '-').count(), 2);
        assert!(RotationPeriod::Hourly.current_suffix().contains('T'));
    }
}
