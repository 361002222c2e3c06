//! Input validation for the acquisition and processing workflows.
//!
//! Every check runs independently and all violations are collected, so the caller can
//! show one aggregated, multi-line notification.
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::core::query::SearchCriteria;
use crate::types::ProductLevel;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date pattern"));

/// One or more rejected inputs, in the order they were checked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("\n"))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// Raw search inputs as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RawSearchInputs {
    pub level: ProductLevel,
    pub date_from: String,
    pub date_to: String,
    pub cloud_cover: String,
    pub aoi_path: PathBuf,
    pub output_dir: PathBuf,
}

/// Validate raw search inputs against `today`.
pub fn validate_search_inputs(
    raw: &RawSearchInputs,
    today: NaiveDate,
) -> Result<SearchCriteria, ValidationErrors> {
    let mut errors = Vec::new();

    let start = check_date("date_from", &raw.date_from, today, &mut errors);
    let end = check_date("date_to", &raw.date_to, today, &mut errors);

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.push("Start date 'date_from' cannot be later than end date 'date_to'.".into());
        }
    }

    let cloud_cover = match parse_cloud_cover(&raw.cloud_cover) {
        Some(value) if (0.0..=100.0).contains(&value) => Some(value),
        Some(_) => {
            errors.push("Cloud cover must be between 0 and 100.".into());
            None
        }
        None => {
            errors.push("Cloud cover is not a valid number.".into());
            None
        }
    };

    if raw.aoi_path.as_os_str().is_empty() || !raw.aoi_path.exists() {
        errors.push(format!("Invalid AOI file: {:?}", raw.aoi_path));
    }

    if raw.output_dir.as_os_str().is_empty() || !raw.output_dir.is_dir() {
        errors.push(format!("Invalid output folder: {:?}", raw.output_dir));
    }

    match (start, end, cloud_cover) {
        (Some(start), Some(end), Some(cloud_cover)) if errors.is_empty() => Ok(SearchCriteria {
            level: raw.level,
            cloud_cover,
            start,
            end,
            aoi_path: raw.aoi_path.clone(),
            output_dir: raw.output_dir.clone(),
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

fn check_date(
    label: &str,
    value: &str,
    today: NaiveDate,
    errors: &mut Vec<String>,
) -> Option<NaiveDate> {
    let parsed = if DATE_PATTERN.is_match(value) {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
    } else {
        None
    };
    match parsed {
        Some(date) if date > today => {
            errors.push(format!("Date in field {} must not be in the future.", label));
            Some(date)
        }
        Some(date) => Some(date),
        None => {
            errors.push(format!(
                "Invalid date format in field {}. Expected YYYY-MM-DD.",
                label
            ));
            None
        }
    }
}

/// Parse a cloud-cover percentage, accepting `,` as decimal separator.
pub fn parse_cloud_cover(value: &str) -> Option<f64> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Check the folders of a processing run before the engine is touched.
pub fn validate_processing_inputs(input_dir: &Path) -> Result<(), ValidationErrors> {
    if input_dir.as_os_str().is_empty() || !input_dir.is_dir() {
        return Err(ValidationErrors(vec![format!(
            "Invalid input folder: {:?}",
            input_dir
        )]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn inputs(from: &str, to: &str, cloud: &str) -> (tempfile::TempDir, RawSearchInputs) {
        let dir = tempfile::tempdir().unwrap();
        let aoi = dir.path().join("aoi.geojson");
        std::fs::write(&aoi, "{}").unwrap();
        let raw = RawSearchInputs {
            level: ProductLevel::Level2A,
            date_from: from.to_string(),
            date_to: to.to_string(),
            cloud_cover: cloud.to_string(),
            aoi_path: aoi,
            output_dir: dir.path().to_path_buf(),
        };
        (dir, raw)
    }

    #[test]
    fn accepts_ordered_past_range() {
        let (_dir, raw) = inputs("2024-05-01", "2024-05-10", "20");
        let criteria = validate_search_inputs(&raw, today()).unwrap();
        assert_eq!(criteria.start, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(criteria.end, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(criteria.cloud_cover, 20.0);
    }

    #[test]
    fn rejects_future_dates() {
        let (_dir, raw) = inputs("2099-01-01", "2099-01-02", "20");
        let err = validate_search_inputs(&raw, today()).unwrap_err();
        assert_eq!(err.messages().len(), 2);
        assert!(err.messages().iter().all(|m| m.contains("future")));
    }

    #[test]
    fn rejects_start_after_end() {
        let (_dir, raw) = inputs("2024-05-10", "2024-05-01", "20");
        let err = validate_search_inputs(&raw, today()).unwrap_err();
        assert_eq!(err.messages().len(), 1);
        assert!(err.messages()[0].contains("later than"));
    }

    #[test]
    fn today_is_not_in_the_future() {
        let (_dir, raw) = inputs("2025-05-01", "2025-06-01", "20");
        assert!(validate_search_inputs(&raw, today()).is_ok());
    }

    #[test]
    fn malformed_date_skips_range_check() {
        let (_dir, raw) = inputs("2024-5-1", "2024-05-01", "20");
        let err = validate_search_inputs(&raw, today()).unwrap_err();
        assert_eq!(err.messages().len(), 1);
        assert!(err.messages()[0].contains("date_from"));
    }

    #[test]
    fn impossible_calendar_date_is_rejected() {
        let (_dir, raw) = inputs("2024-02-30", "2024-03-01", "20");
        let err = validate_search_inputs(&raw, today()).unwrap_err();
        assert!(err.messages()[0].contains("Expected YYYY-MM-DD"));
    }

    #[test]
    fn cloud_cover_parsing() {
        assert_eq!(parse_cloud_cover("20"), Some(20.0));
        assert_eq!(parse_cloud_cover("20,5"), Some(20.5));
        assert_eq!(parse_cloud_cover("abc"), None);
        assert_eq!(parse_cloud_cover("NaN"), None);

        let (_dir, raw) = inputs("2024-05-01", "2024-05-10", "20,5");
        assert_eq!(validate_search_inputs(&raw, today()).unwrap().cloud_cover, 20.5);

        let (_dir, raw) = inputs("2024-05-01", "2024-05-10", "150");
        let err = validate_search_inputs(&raw, today()).unwrap_err();
        assert_eq!(err.messages(), ["Cloud cover must be between 0 and 100."]);

        let (_dir, raw) = inputs("2024-05-01", "2024-05-10", "abc");
        let err = validate_search_inputs(&raw, today()).unwrap_err();
        assert_eq!(err.messages(), ["Cloud cover is not a valid number."]);
    }

    #[test]
    fn collects_every_violation() {
        let raw = RawSearchInputs {
            level: ProductLevel::Level1C,
            date_from: "yesterday".into(),
            date_to: "2099-01-01".into(),
            cloud_cover: "-1".into(),
            aoi_path: PathBuf::from("/definitely/not/here.shp"),
            output_dir: PathBuf::new(),
        };
        let err = validate_search_inputs(&raw, today()).unwrap_err();
        assert_eq!(err.messages().len(), 5);
        assert_eq!(err.to_string().lines().count(), 5);
    }

    #[test]
    fn processing_input_folder_must_exist() {
        assert!(validate_processing_inputs(Path::new("/no/such/folder")).is_err());
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_processing_inputs(dir.path()).is_ok());
    }
}
