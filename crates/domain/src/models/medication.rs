//! Medication entry domain models.
//!
//! "Taken today" is never stored: it is derived by comparing the last-taken
//! timestamp's calendar date against the viewer's current date, so entries
//! self-reset at midnight without a nightly job.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

lazy_static::lazy_static! {
    /// Fixed-width zero-padded 24h time. Lexicographic order on this format
    /// equals chronological order, which the board listing relies on.
    static ref TIME_REGEX: regex::Regex =
        regex::Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
}

/// One scheduled medicine, belonging to exactly one hub. The creator owns
/// edit/delete; any hub member may mark it taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MedicationEntry {
    pub id: Uuid,
    pub hub_id: Uuid,
    pub name: String,
    pub dosage: String,
    /// Scheduled time of day, "HH:mm".
    pub time: String,
    pub assigned_to: Uuid,
    pub created_by: Uuid,
    pub remarks: Option<String>,
    pub image_url: Option<String>,
    pub last_taken: Option<DateTime<Utc>>,
    pub notified_on_time: bool,
    pub notified_5_min: bool,
    pub notified_10_min: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derives whether an entry counts as taken on the given calendar date.
pub fn taken_today(last_taken: Option<DateTime<Utc>>, today: NaiveDate) -> bool {
    match last_taken {
        Some(ts) => ts.date_naive() == today,
        None => false,
    }
}

impl MedicationEntry {
    pub fn taken_on(&self, today: NaiveDate) -> bool {
        taken_today(self.last_taken, today)
    }
}

/// Returns true for a well-formed "HH:mm" time of day.
pub fn is_valid_time_of_day(time: &str) -> bool {
    TIME_REGEX.is_match(time)
}

fn validate_time_of_day(time: &str) -> Result<(), validator::ValidationError> {
    if is_valid_time_of_day(time) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("time_of_day");
        err.message = Some("Time must be in HH:mm format".into());
        Err(err)
    }
}

/// Request payload for adding a medication.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateMedicationRequest {
    #[validate(length(min = 1, max = 200, message = "Medication name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Dosage is required"))]
    pub dosage: String,

    #[validate(custom(function = "validate_time_of_day"))]
    pub time: String,

    pub assigned_to: Uuid,

    #[validate(length(max = 1000, message = "Remarks must be at most 1000 characters"))]
    pub remarks: Option<String>,

    #[validate(length(max = 2000, message = "Image URL must be at most 2000 characters"))]
    pub image_url: Option<String>,
}

/// Request payload for editing a medication. Absent fields are unchanged.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateMedicationRequest {
    #[validate(length(min = 1, max = 200, message = "Medication name must not be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Dosage must not be empty"))]
    pub dosage: Option<String>,

    #[validate(custom(function = "validate_time_of_day_opt"))]
    pub time: Option<String>,

    pub assigned_to: Option<Uuid>,

    #[validate(length(max = 1000, message = "Remarks must be at most 1000 characters"))]
    pub remarks: Option<String>,

    #[validate(length(max = 2000, message = "Image URL must be at most 2000 characters"))]
    pub image_url: Option<String>,
}

fn validate_time_of_day_opt(time: &str) -> Result<(), validator::ValidationError> {
    validate_time_of_day(time)
}

/// Board listing item: the stored entry plus the derived taken flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MedicationResponse {
    #[serde(flatten)]
    pub entry: MedicationEntry,
    pub taken_today: bool,
}

impl MedicationResponse {
    pub fn derived(entry: MedicationEntry, today: NaiveDate) -> Self {
        let taken_today = entry.taken_on(today);
        Self { entry, taken_today }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_taken_today_null_is_not_taken() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert!(!taken_today(None, today));
    }

    #[test]
    fn test_taken_today_same_date() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 8, 30, 7, 45, 0).unwrap();
        assert!(taken_today(Some(ts), today));
    }

    #[test]
    fn test_taken_yesterday_reports_not_taken_with_no_write() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2026, 8, 29, 21, 0, 0).unwrap();
        assert!(!taken_today(Some(yesterday), today));
    }

    #[test]
    fn test_taken_today_recomputes_across_midnight() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 29, 23, 59, 0).unwrap();
        let before = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let after = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert!(taken_today(Some(ts), before));
        assert!(!taken_today(Some(ts), after));
    }

    #[test]
    fn test_is_valid_time_of_day() {
        assert!(is_valid_time_of_day("08:00"));
        assert!(is_valid_time_of_day("00:00"));
        assert!(is_valid_time_of_day("23:59"));
        assert!(!is_valid_time_of_day("24:00"));
        assert!(!is_valid_time_of_day("8:00")); // not zero-padded
        assert!(!is_valid_time_of_day("08:60"));
        assert!(!is_valid_time_of_day("0800"));
    }

    #[test]
    fn test_fixed_width_times_sort_chronologically() {
        let mut times = vec!["08:00", "07:30", "22:15", "07:05"];
        times.sort();
        assert_eq!(times, vec!["07:05", "07:30", "08:00", "22:15"]);
    }

    #[test]
    fn test_create_medication_request_validation() {
        let valid = CreateMedicationRequest {
            name: "Metformin".to_string(),
            dosage: "500mg".to_string(),
            time: "08:00".to_string(),
            assigned_to: Uuid::new_v4(),
            remarks: Some("After breakfast".to_string()),
            image_url: None,
        };
        assert!(valid.validate().is_ok());

        let empty_name = CreateMedicationRequest {
            name: String::new(),
            dosage: "500mg".to_string(),
            time: "08:00".to_string(),
            assigned_to: Uuid::new_v4(),
            remarks: None,
            image_url: None,
        };
        assert!(empty_name.validate().is_err());

        let bad_time = CreateMedicationRequest {
            name: "Metformin".to_string(),
            dosage: "500mg".to_string(),
            time: "8am".to_string(),
            assigned_to: Uuid::new_v4(),
            remarks: None,
            image_url: None,
        };
        assert!(bad_time.validate().is_err());
    }
}
