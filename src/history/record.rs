use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shell::is_regular_file;

/// Metadata about one completed conversion.
///
/// Nothing here is edited after construction. `file_size_bytes` is the size of
/// the output when the record was made, not a live probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: String,
    pub input_file_name: String,
    pub input_format: String,
    pub output_format: String,
    pub output_file_name: String,
    pub output_file_location: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub file_size_bytes: u64,
    pub thumbnail_data: Option<Vec<u8>>,
}

impl ConversionRecord {
    pub fn new(
        input_file_name: &str,
        input_format: &str,
        output_format: &str,
        output_file_location: &Path,
        timestamp: DateTime<Utc>,
        file_size_bytes: u64,
    ) -> Self {
        let output_file_name = output_file_location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            input_file_name: input_file_name.to_string(),
            input_format: input_format.to_string(),
            output_format: output_format.to_string(),
            output_file_name,
            output_file_location: output_file_location.to_path_buf(),
            timestamp,
            file_size_bytes,
            thumbnail_data: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail_data: Option<Vec<u8>>) -> Self {
        self.thumbnail_data = thumbnail_data;
        self
    }

    /// True iff a regular file currently exists at the output location.
    pub fn is_file_accessible(&self) -> bool {
        is_regular_file(&self.output_file_location)
    }

    pub fn formatted_file_size(&self) -> String {
        format_file_size(self.file_size_bytes)
    }

    /// Local-time timestamp, e.g. `Mar 5, 2026 at 3:07 PM`.
    pub fn formatted_date(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%b %-d, %Y at %-I:%M %p")
            .to_string()
    }

    pub fn relative_time(&self) -> String {
        self.relative_time_from(Utc::now())
    }

    /// Short "N units ago" text, falling back to the full date after a week.
    pub fn relative_time_from(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.timestamp);
        let minutes = elapsed.num_minutes();
        let hours = elapsed.num_hours();
        let days = elapsed.num_days();

        if minutes < 1 {
            "just now".to_string()
        } else if hours < 1 {
            plural_ago(minutes, "minute")
        } else if days < 1 {
            plural_ago(hours, "hour")
        } else if days < 7 {
            plural_ago(days, "day")
        } else {
            self.formatted_date()
        }
    }

    /// Decode the stored thumbnail. A corrupt blob reads as no thumbnail.
    pub fn thumbnail_image(&self) -> Option<image::DynamicImage> {
        let data = self.thumbnail_data.as_deref()?;
        match image::load_from_memory(data) {
            Ok(img) => Some(img),
            Err(e) => {
                log::debug!("Undecodable thumbnail for {}: {}", self.id, e);
                None
            }
        }
    }
}

fn plural_ago(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Human-readable size using decimal units.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    match bytes {
        0 => return "Zero KB".to_string(),
        1 => return "1 byte".to_string(),
        2..=999 => return format!("{} bytes", bytes),
        _ => {}
    }

    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Hands out record timestamps that never go backwards within one component.
///
/// Equal timestamps are allowed; callers keep insertion order for ties.
#[derive(Debug, Default)]
pub(crate) struct HistoryClock {
    last: Option<DateTime<Utc>>,
}

impl HistoryClock {
    /// Seed the clock from the newest timestamp already held.
    pub(crate) fn starting_at(last: Option<DateTime<Utc>>) -> Self {
        Self { last }
    }

    pub(crate) fn now(&mut self) -> DateTime<Utc> {
        // Stored as microseconds, so truncate now to keep reloads identical.
        let now = Utc::now().trunc_subsecs(6);
        let ts = match self.last {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last = Some(ts);
        ts
    }
}

// ── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Cursor;

    fn sample(at: DateTime<Utc>) -> ConversionRecord {
        ConversionRecord::new(
            "test.md",
            "markdown",
            "pdf",
            Path::new("/tmp/out/test.pdf"),
            at,
            12,
        )
    }

    #[test]
    fn test_output_file_name_from_location() {
        let r = sample(Utc::now());
        assert_eq!(r.output_file_name, "test.pdf");
        assert_eq!(r.input_file_name, "test.md");
        assert_eq!(r.file_size_bytes, 12);
        assert!(r.thumbnail_data.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let now = Utc::now();
        assert_ne!(sample(now).id, sample(now).id);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "Zero KB");
        assert_eq!(format_file_size(1), "1 byte");
        assert_eq!(format_file_size(12), "12 bytes");
        assert_eq!(format_file_size(1_500), "1.5 KB");
        assert_eq!(format_file_size(2_300_000), "2.3 MB");
        assert_eq!(format_file_size(7_000_000_000), "7.0 GB");
    }

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(sample(now).relative_time_from(now), "just now");
        assert_eq!(
            sample(now - Duration::minutes(1)).relative_time_from(now),
            "1 minute ago"
        );
        assert_eq!(
            sample(now - Duration::minutes(42)).relative_time_from(now),
            "42 minutes ago"
        );
        assert_eq!(
            sample(now - Duration::hours(5)).relative_time_from(now),
            "5 hours ago"
        );
        assert_eq!(
            sample(now - Duration::days(3)).relative_time_from(now),
            "3 days ago"
        );

        let old = sample(now - Duration::days(30));
        assert_eq!(old.relative_time_from(now), old.formatted_date());
    }

    #[test]
    fn test_missing_file_is_not_accessible() {
        let r = ConversionRecord::new(
            "a.png",
            "png",
            "jpeg",
            Path::new("/definitely/not/here/a.jpg"),
            Utc::now(),
            0,
        );
        assert!(!r.is_file_accessible());
    }

    #[test]
    fn test_thumbnail_decoding() {
        let img = image::DynamicImage::new_rgb8(4, 4);
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let r = sample(Utc::now()).with_thumbnail(Some(png));
        let decoded = r.thumbnail_image().unwrap();
        assert_eq!(decoded.width(), 4);

        let corrupt = sample(Utc::now()).with_thumbnail(Some(vec![1, 2, 3]));
        assert!(corrupt.thumbnail_image().is_none());
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let future = Utc::now() + Duration::hours(1);
        let mut clock = HistoryClock::starting_at(Some(future));
        assert_eq!(clock.now(), future);
        assert_eq!(clock.now(), future);

        let mut fresh = HistoryClock::default();
        let a = fresh.now();
        let b = fresh.now();
        assert!(b >= a);
    }
}
