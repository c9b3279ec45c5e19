//! One persisted row of the threat log.

use serde::{Deserialize, Serialize};

use crate::url_model::CanonicalUrl;

/// Fixed column order of the log. Written once, as the first line of a new file.
pub const HEADER: [&str; 7] = [
    "Timestamp_Found",
    "Source",
    "Clean_URL",
    "Risk_Score",
    "IP_Address",
    "Hosting_Provider",
    "Original_Raw_Link",
];

/// A discovered tool that survived the pipeline. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatRecord {
    /// RFC 3339 UTC, second precision (sorts lexically).
    #[serde(rename = "Timestamp_Found")]
    pub timestamp_found: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Clean_URL")]
    pub clean_url: CanonicalUrl,
    #[serde(rename = "Risk_Score")]
    pub risk_score: u32,
    #[serde(rename = "IP_Address")]
    pub ip_address: String,
    #[serde(rename = "Hosting_Provider")]
    pub hosting_provider: String,
    #[serde(rename = "Original_Raw_Link")]
    pub original_raw_link: String,
}
