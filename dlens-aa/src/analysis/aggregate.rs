//! Per-type lesion aggregation
//!
//! Groups raw detections into a [`LesionTally`]: one entry per lesion type,
//! ordered by first appearance, carrying the detection count and the running
//! maximum confidence for that type. Pure; no side effects.

use crate::detector::Detection;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Resolve a model class index to a lesion type name
///
/// Indices outside the trained class table get a synthesized label and are
/// aggregated like any other type.
pub fn class_name(class_id: u32) -> String {
    match class_id {
        0 => "Comedone".to_string(),
        1 => "Papule".to_string(),
        2 => "Pustule".to_string(),
        3 => "Nodule".to_string(),
        4 => "Scar".to_string(),
        5 => "Dark Spot".to_string(),
        other => format!("Category {other}"),
    }
}

/// Count and maximum confidence for one lesion type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LesionTypeAggregate {
    /// Number of detections of this type
    pub count: u32,
    /// Highest confidence seen for this type
    pub max_conf: f32,
}

impl Default for LesionTypeAggregate {
    fn default() -> Self {
        Self {
            count: 0,
            max_conf: 0.0,
        }
    }
}

/// Per-type aggregate map, ordered by first appearance
///
/// Serializes as a JSON object, one key per type name, preserving insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LesionTally {
    entries: Vec<(String, LesionTypeAggregate)>,
}

impl LesionTally {
    /// Empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no type has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct lesion types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Aggregate for `type_name`, inserting a zeroed entry on first sight
    pub fn get_or_insert_default(&mut self, type_name: &str) -> &mut LesionTypeAggregate {
        let index = match self.entries.iter().position(|(name, _)| name == type_name) {
            Some(index) => index,
            None => {
                self.entries
                    .push((type_name.to_string(), LesionTypeAggregate::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// Aggregate for `type_name`, if recorded
    pub fn get(&self, type_name: &str) -> Option<&LesionTypeAggregate> {
        self.entries
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, aggregate)| aggregate)
    }

    /// Iterate entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LesionTypeAggregate)> {
        self.entries
            .iter()
            .map(|(name, aggregate)| (name.as_str(), aggregate))
    }

    /// Sum of all per-type counts
    pub fn total_count(&self) -> u32 {
        self.entries.iter().map(|(_, aggregate)| aggregate.count).sum()
    }

    /// Highest confidence across all types, if any detection was recorded
    pub fn top_confidence(&self) -> Option<f32> {
        self.entries
            .iter()
            .map(|(_, aggregate)| aggregate.max_conf)
            .fold(None, |best, conf| match best {
                Some(b) if b >= conf => Some(b),
                _ => Some(conf),
            })
    }
}

impl Serialize for LesionTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, aggregate) in &self.entries {
            map.serialize_entry(name, aggregate)?;
        }
        map.end()
    }
}

/// Aggregate a region's detections by lesion type
///
/// Each detection increments its resolved type's count and raises that
/// type's running maximum confidence. An empty input yields an empty tally.
pub fn aggregate(detections: &[Detection]) -> LesionTally {
    let mut tally = LesionTally::new();
    for detection in detections {
        let entry = tally.get_or_insert_default(&class_name(detection.class_id));
        entry.count += 1;
        entry.max_conf = entry.max_conf.max(detection.confidence);
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_id: u32, confidence: f32) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: [0.0, 0.0, 1.0, 1.0],
        }
    }

    #[test]
    fn aggregates_counts_and_max_confidence_per_type() {
        let detections = vec![detection(0, 0.5), detection(0, 0.9), detection(1, 0.3)];
        let tally = aggregate(&detections);

        assert_eq!(tally.len(), 2);
        assert_eq!(
            tally.get("Comedone"),
            Some(&LesionTypeAggregate {
                count: 2,
                max_conf: 0.9
            })
        );
        assert_eq!(
            tally.get("Papule"),
            Some(&LesionTypeAggregate {
                count: 1,
                max_conf: 0.3
            })
        );
        assert_eq!(tally.total_count(), 3);
    }

    #[test]
    fn aggregation_is_commutative_by_type() {
        let forward = vec![detection(0, 0.5), detection(0, 0.9), detection(1, 0.3)];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        let a = aggregate(&forward);
        let b = aggregate(&reversed);

        assert_eq!(a.total_count(), b.total_count());
        assert_eq!(a.get("Comedone"), b.get("Comedone"));
        assert_eq!(a.get("Papule"), b.get("Papule"));
    }

    #[test]
    fn empty_input_yields_empty_tally() {
        let tally = aggregate(&[]);
        assert!(tally.is_empty());
        assert_eq!(tally.total_count(), 0);
        assert_eq!(tally.top_confidence(), None);
    }

    #[test]
    fn unknown_class_gets_synthesized_label() {
        let tally = aggregate(&[detection(7, 0.4)]);
        assert_eq!(
            tally.get("Category 7"),
            Some(&LesionTypeAggregate {
                count: 1,
                max_conf: 0.4
            })
        );
    }

    #[test]
    fn entries_keep_first_seen_order() {
        let detections = vec![detection(2, 0.2), detection(0, 0.8), detection(2, 0.5)];
        let tally = aggregate(&detections);
        let names: Vec<&str> = tally.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Pustule", "Comedone"]);
    }

    #[test]
    fn top_confidence_spans_types() {
        let tally = aggregate(&[detection(0, 0.5), detection(1, 0.7), detection(0, 0.6)]);
        assert_eq!(tally.top_confidence(), Some(0.7));
    }

    #[test]
    fn serializes_as_ordered_object() {
        let tally = aggregate(&[detection(1, 0.3), detection(0, 0.9)]);
        let json = serde_json::to_string(&tally).unwrap();
        assert_eq!(
            json,
            r#"{"Papule":{"count":1,"max_conf":0.3},"Comedone":{"count":1,"max_conf":0.9}}"#
        );
    }
}
