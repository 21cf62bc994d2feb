//! Shared data types for analysis results
//!
//! Two representations of a region's outcome exist deliberately:
//! [`RegionResult`] is the full record written to the per-user snapshot
//! (per-type max confidence retained); [`RegionSummary`] is the reduced view
//! returned by the upload endpoint (per-type counts only).

use crate::analysis::aggregate::LesionTally;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Fixed facial capture zones, in batch processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Left,
    Middle,
    Right,
}

impl Region {
    /// All regions in the fixed batch order
    pub const ALL: [Region; 3] = [Region::Left, Region::Middle, Region::Right];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Left => "left",
            Region::Middle => "middle",
            Region::Right => "right",
        }
    }

    /// Parse a multipart field name into a region
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Region::Left),
            "middle" => Some(Region::Middle),
            "right" => Some(Region::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Region {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Top detection confidence for a region
///
/// Rendered as a two-decimal string ("0.87") or the sentinel "N/A" when no
/// detection ran or none was found. Database rows store "N/A" as 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    Score(f32),
    NotAvailable,
}

impl Confidence {
    /// Numeric value for the database REAL column
    pub fn db_value(&self) -> f64 {
        match self {
            Confidence::Score(score) => *score as f64,
            Confidence::NotAvailable => 0.0,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Score(score) => write!(f, "{score:.2}"),
            Confidence::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Full per-region analysis record, serialized to the snapshot file
#[derive(Debug, Clone, Serialize)]
pub struct RegionResult {
    pub face_part: Region,
    pub filename: String,
    /// Severity grade label, or an error description for degraded regions
    pub severity: String,
    pub confidence: Confidence,
    pub acne_count: u32,
    pub acne_types: LesionTally,
    pub upload_time: String,
}

impl RegionResult {
    /// Reduced view for the upload response
    pub fn summary(&self) -> RegionSummary {
        RegionSummary {
            face_part: self.face_part,
            filename: self.filename.clone(),
            severity: self.severity.clone(),
            confidence: self.confidence,
            acne_count: self.acne_count,
            acne_types: LesionCounts::from_tally(&self.acne_types),
            upload_time: self.upload_time.clone(),
        }
    }
}

/// Reduced per-region view: per-type counts without confidence
#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub face_part: Region,
    pub filename: String,
    pub severity: String,
    pub confidence: Confidence,
    pub acne_count: u32,
    pub acne_types: LesionCounts,
    pub upload_time: String,
}

/// Count-only projection of a [`LesionTally`], same key order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LesionCounts(Vec<(String, u32)>);

impl LesionCounts {
    /// Project a tally down to counts, preserving first-seen order
    pub fn from_tally(tally: &LesionTally) -> Self {
        Self(
            tally
                .iter()
                .map(|(name, aggregate)| (name.to_string(), aggregate.count))
                .collect(),
        )
    }
}

impl Serialize for LesionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct CountOnly {
            count: u32,
        }

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, &CountOnly { count: *count })?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::aggregate;
    use crate::detector::Detection;

    fn detection(class_id: u32, confidence: f32) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: [0.0, 0.0, 1.0, 1.0],
        }
    }

    #[test]
    fn regions_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Region::Left).unwrap(), r#""left""#);
        assert_eq!(
            serde_json::to_string(&Region::Middle).unwrap(),
            r#""middle""#
        );
    }

    #[test]
    fn confidence_renders_two_decimals_or_sentinel() {
        assert_eq!(Confidence::Score(0.8712).to_string(), "0.87");
        assert_eq!(Confidence::NotAvailable.to_string(), "N/A");
        assert_eq!(
            serde_json::to_string(&Confidence::Score(0.5)).unwrap(),
            r#""0.50""#
        );
    }

    #[test]
    fn na_confidence_stores_as_zero() {
        assert_eq!(Confidence::NotAvailable.db_value(), 0.0);
        assert!((Confidence::Score(0.25).db_value() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn summary_drops_per_type_confidence() {
        let tally = aggregate(&[detection(0, 0.5), detection(0, 0.9)]);
        let result = RegionResult {
            face_part: Region::Left,
            filename: "u_left.jpg".to_string(),
            severity: "Grade I: Mild acne with comedones.".to_string(),
            confidence: Confidence::Score(0.9),
            acne_count: 2,
            acne_types: tally,
            upload_time: "2026-01-01 00:00:00".to_string(),
        };

        let full = serde_json::to_value(&result).unwrap();
        assert_eq!(full["acne_types"]["Comedone"]["count"], 2);
        assert!(full["acne_types"]["Comedone"]["max_conf"].is_number());

        let summary = serde_json::to_value(result.summary()).unwrap();
        assert_eq!(summary["acne_types"]["Comedone"]["count"], 2);
        assert!(summary["acne_types"]["Comedone"]
            .get("max_conf")
            .is_none());
        assert_eq!(summary["confidence"], "0.90");
    }
}
