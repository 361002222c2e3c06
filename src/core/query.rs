//! OData filter construction for the Sentinel-2 catalog.
//!
//! Inputs are assumed to be validated already (see `core::validate`).
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::types::ProductLevel;

/// Validated search criteria for one search invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub level: ProductLevel,
    /// Upper bound, exclusive
    pub cloud_cover: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub aoi_path: PathBuf,
    pub output_dir: PathBuf,
}

/// Midnight UTC timestamp in the catalog's wire format
fn midnight_utc(date: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

/// Build the `$filter` expression for `criteria` over `collection`, intersecting `aoi_wkt`.
///
/// Both date bounds are exclusive (`gt`/`lt` at midnight UTC): a product whose content
/// start equals either boundary instant is not returned.
pub fn build_filter(collection: &str, criteria: &SearchCriteria, aoi_wkt: &str) -> String {
    let mut clauses = Vec::with_capacity(6);
    clauses.push(format!("Collection/Name eq '{}'", collection));
    clauses.push(format!(
        "Attributes/OData.CSC.StringAttribute/any(att:att/Name eq 'productType' and att/OData.CSC.StringAttribute/Value eq '{}')",
        criteria.level.product_type_code()
    ));
    clauses.push(format!(
        "Attributes/OData.CSC.DoubleAttribute/any(att:att/Name eq 'cloudCover' and att/OData.CSC.DoubleAttribute/Value lt {})",
        criteria.cloud_cover
    ));
    clauses.push(format!(
        "OData.CSC.Intersects(area=geography'SRID=4326;{}')",
        aoi_wkt
    ));
    clauses.push(format!("ContentDate/Start gt {}", midnight_utc(criteria.start)));
    clauses.push(format!("ContentDate/Start lt {}", midnight_utc(criteria.end)));
    clauses.join(" and ")
}

/// Query-string parameters of one search page
pub fn search_parameters(filter: &str, page_size: usize) -> Vec<(&'static str, String)> {
    vec![
        ("$filter", filter.to_string()),
        ("$count", "True".to_string()),
        ("$top", page_size.to_string()),
    ]
}
