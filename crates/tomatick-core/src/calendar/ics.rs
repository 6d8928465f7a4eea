use chrono::{DateTime, Duration, Utc};

use crate::error::ValidationError;

pub const ICS_FILE_NAME: &str = "pomodoro-today.ics";

const PRODUCT_ID: &str = "-//Tomatick//Pomodoro Timer//EN";
const UID_DOMAIN: &str = "tomatick.local";

/// One calendar event covering a day's focus sessions.
///
/// The event starts at `exported_at` and lasts `pomodoros` focus
/// intervals back to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusDayExport {
    pub pomodoros: u64,
    pub focus_secs: u64,
    pub exported_at: DateTime<Utc>,
}

impl FocusDayExport {
    pub fn new(
        pomodoros: u64,
        focus_secs: u64,
        exported_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if pomodoros == 0 {
            return Err(ValidationError::EmptyCollection(
                "no pomodoros completed today to export".into(),
            ));
        }
        Ok(Self {
            pomodoros,
            focus_secs,
            exported_at,
        })
    }

    pub fn end(&self) -> DateTime<Utc> {
        let secs = self.pomodoros.saturating_mul(self.focus_secs);
        let span = Duration::try_seconds(i64::try_from(secs).unwrap_or(i64::MAX))
            .unwrap_or(Duration::MAX);
        self.exported_at
            .checked_add_signed(span)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Render as an iCalendar document with CRLF line endings.
    pub fn to_ics(&self) -> String {
        let stamp = ics_timestamp(self.exported_at);
        [
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{PRODUCT_ID}"),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{stamp}@{UID_DOMAIN}"),
            format!("DTSTAMP:{stamp}"),
            format!("DTSTART:{stamp}"),
            format!("DTEND:{}", ics_timestamp(self.end())),
            "SUMMARY:Pomodoro Focus Sessions".to_string(),
            format!("DESCRIPTION:Completed {} pomodoros today.", self.pomodoros),
            "END:VEVENT".to_string(),
            "END:VCALENDAR".to_string(),
        ]
        .join("\r\n")
    }
}

/// UTC timestamp in iCalendar basic format, e.g. `20260302T091500Z`.
pub fn ics_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}
