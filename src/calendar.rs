//! "Add to calendar" links for shareholder meetings and other events.

use crate::error::CalendarError;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Url;
use serde::Deserialize;

const GOOGLE_CALENDAR_URL: &str = "https://calendar.google.com/calendar/render";
const DATES_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM, 24-hour
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl CalendarEvent {
    /// Event start as a floating local time.
    pub fn starts_at(&self) -> Result<NaiveDateTime, CalendarError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| CalendarError::InvalidDate(self.date.clone()))?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .map_err(|_| CalendarError::InvalidTime(self.time.clone()))?;
        Ok(date.and_time(time))
    }
}

/// Build a Google Calendar template link for a one-hour event.
///
/// `timezone` is an IANA name (e.g. "Asia/Ho_Chi_Minh"); without it the
/// calendar interprets the times in the viewer's own zone.
pub fn google_calendar_link(
    event: &CalendarEvent,
    timezone: Option<&str>,
) -> Result<String, CalendarError> {
    let start = event.starts_at()?;
    let end = start + Duration::hours(1);
    let dates = format!(
        "{}/{}",
        start.format(DATES_FORMAT),
        end.format(DATES_FORMAT)
    );

    let mut params = vec![
        ("action", "TEMPLATE"),
        ("text", event.title.as_str()),
        ("dates", dates.as_str()),
        ("location", event.location.as_str()),
    ];
    if let Some(details) = event.details.as_deref() {
        params.push(("details", details));
    }
    if let Some(tz) = timezone {
        params.push(("ctz", tz));
    }

    template_link(GOOGLE_CALENDAR_URL, &params)
}

fn template_link(base: &str, params: &[(&str, &str)]) -> Result<String, CalendarError> {
    let url = Url::parse_with_params(base, params)
        .map_err(|e| CalendarError::InvalidLink(e.to_string()))?;
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_base_url_is_an_error() {
        let err = template_link("not a url", &[("action", "TEMPLATE")]).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidLink(_)));
    }

    fn meeting() -> CalendarEvent {
        CalendarEvent {
            title: "Annual Meeting".to_string(),
            date: "2025-06-01".to_string(),
            time: "10:00".to_string(),
            location: "HQ".to_string(),
            details: None,
        }
    }

    fn query(link: &str) -> Vec<(String, String)> {
        Url::parse(link)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_link_encodes_all_fields_with_one_hour_window() {
        let link = google_calendar_link(&meeting(), None).unwrap();

        assert!(link.starts_with("https://calendar.google.com/calendar/render?"));
        assert!(link.contains("action=TEMPLATE"));
        assert!(link.contains("text=Annual+Meeting"));
        assert!(link.contains("dates=20250601T100000%2F20250601T110000"));
        assert!(link.contains("location=HQ"));
        assert!(!link.contains("ctz="));
    }

    #[test]
    fn test_special_characters_round_trip() {
        let event = CalendarEvent {
            title: "Q&A: Đại hội cổ đông".to_string(),
            location: "Tầng 5, 12 Lê Lợi".to_string(),
            details: Some("Agenda #1 = results".to_string()),
            ..meeting()
        };

        let link = google_calendar_link(&event, Some("Asia/Ho_Chi_Minh")).unwrap();
        let pairs = query(&link);

        assert!(pairs.contains(&("text".to_string(), "Q&A: Đại hội cổ đông".to_string())));
        assert!(pairs.contains(&("location".to_string(), "Tầng 5, 12 Lê Lợi".to_string())));
        assert!(pairs.contains(&("details".to_string(), "Agenda #1 = results".to_string())));
        assert!(pairs.contains(&("ctz".to_string(), "Asia/Ho_Chi_Minh".to_string())));
    }

    #[test]
    fn test_window_rolls_over_midnight() {
        let event = CalendarEvent {
            date: "2025-12-31".to_string(),
            time: "23:30".to_string(),
            ..meeting()
        };

        let link = google_calendar_link(&event, None).unwrap();
        let pairs = query(&link);

        assert!(pairs.contains(&(
            "dates".to_string(),
            "20251231T233000/20260101T003000".to_string()
        )));
    }

    #[test]
    fn test_invalid_date() {
        let event = CalendarEvent {
            date: "01/06/2025".to_string(),
            ..meeting()
        };
        assert_eq!(
            google_calendar_link(&event, None),
            Err(CalendarError::InvalidDate("01/06/2025".to_string()))
        );
    }

    #[test]
    fn test_invalid_time() {
        let event = CalendarEvent {
            time: "25:00".to_string(),
            ..meeting()
        };
        assert_eq!(
            google_calendar_link(&event, None),
            Err(CalendarError::InvalidTime("25:00".to_string()))
        );
    }
}
