//! Data transform stages
//!
//! Normalization turns implicit encoding modifiers into explicit stages. Stage
//! order in a unit's `transform` array is significant: bin and timeUnit come
//! before aggregate, aggregate before calculate, and stack/impute last.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fielddef::{AggregateOp, Bin};

/// Stack offset mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackOffset {
    #[default]
    Zero,
    Center,
    Normalize,
    /// Disables stacking
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinTransform {
    pub bin: Bin,
    pub field: String,
    #[serde(rename = "as")]
    pub as_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeUnitTransform {
    pub time_unit: String,
    pub field: String,
    #[serde(rename = "as")]
    pub as_field: String,
}

/// One output column of an aggregate stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedFieldDef {
    pub op: AggregateOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "as")]
    pub as_field: String,
}

impl AggregatedFieldDef {
    pub fn new(op: AggregateOp, field: impl Into<String>, as_field: impl Into<String>) -> Self {
        Self {
            op,
            field: Some(field.into()),
            as_field: as_field.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateTransform {
    pub aggregate: Vec<AggregatedFieldDef>,
    #[serde(default)]
    pub groupby: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateTransform {
    pub calculate: String,
    #[serde(rename = "as")]
    pub as_field: String,
}

impl CalculateTransform {
    pub fn new(calculate: impl Into<String>, as_field: impl Into<String>) -> Self {
        Self {
            calculate: calculate.into(),
            as_field: as_field.into(),
        }
    }
}

/// Output fields of a stack stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackOutput {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackTransform {
    pub groupby: Vec<String>,
    pub field: String,
    pub sortby: Vec<String>,
    pub output: StackOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<StackOffset>,
}

/// Fill missing `impute` values per `key`, within each `groupby` partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputeTransform {
    pub impute: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupby: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// A transform stage. Stages the normalizer does not produce are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transform {
    Bin(BinTransform),
    TimeUnit(TimeUnitTransform),
    Aggregate(AggregateTransform),
    Calculate(CalculateTransform),
    Stack(StackTransform),
    Impute(ImputeTransform),
    Other(Map<String, Value>),
}

impl From<BinTransform> for Transform {
    fn from(t: BinTransform) -> Self {
        Transform::Bin(t)
    }
}

impl From<TimeUnitTransform> for Transform {
    fn from(t: TimeUnitTransform) -> Self {
        Transform::TimeUnit(t)
    }
}

impl From<AggregateTransform> for Transform {
    fn from(t: AggregateTransform) -> Self {
        Transform::Aggregate(t)
    }
}

impl From<CalculateTransform> for Transform {
    fn from(t: CalculateTransform) -> Self {
        Transform::Calculate(t)
    }
}

impl From<StackTransform> for Transform {
    fn from(t: StackTransform) -> Self {
        Transform::Stack(t)
    }
}

impl From<ImputeTransform> for Transform {
    fn from(t: ImputeTransform) -> Self {
        Transform::Impute(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transform_variants_from_json() {
        let transforms: Vec<Transform> = serde_json::from_value(json!([
            {"bin": true, "field": "age", "as": "bin_age"},
            {"timeUnit": "month", "field": "date", "as": "month_date"},
            {"aggregate": [{"op": "q1", "field": "people", "as": "lowerBox_people"}], "groupby": ["age"]},
            {"calculate": "datum.a * 2", "as": "b"},
            {"filter": "datum.a > 0"}
        ]))
        .unwrap();

        assert!(matches!(transforms[0], Transform::Bin(_)));
        assert!(matches!(transforms[1], Transform::TimeUnit(_)));
        match &transforms[2] {
            Transform::Aggregate(t) => {
                assert_eq!(t.aggregate[0].op, AggregateOp::Q1);
                assert_eq!(t.groupby, vec!["age"]);
            }
            other => panic!("expected aggregate, got {:?}", other),
        }
        assert!(matches!(transforms[3], Transform::Calculate(_)));
        assert!(matches!(transforms[4], Transform::Other(_)));
    }

    #[test]
    fn test_stack_transform_serialization() {
        let stack = Transform::Stack(StackTransform {
            groupby: vec!["x".to_string()],
            field: "sum_y".to_string(),
            sortby: vec!["-c".to_string()],
            output: StackOutput {
                start: "sum_y_start".to_string(),
                end: "sum_y_end".to_string(),
            },
            offset: None,
        });
        let value = serde_json::to_value(&stack).unwrap();
        assert_eq!(
            value,
            json!({
                "groupby": ["x"],
                "field": "sum_y",
                "sortby": ["-c"],
                "output": {"start": "sum_y_start", "end": "sum_y_end"}
            })
        );
        let parsed: Transform = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, stack);
    }

    #[test]
    fn test_stack_offset_names() {
        let offset: StackOffset = serde_json::from_value(json!("none")).unwrap();
        assert_eq!(offset, StackOffset::None);
        assert_eq!(StackOffset::default(), StackOffset::Zero);
    }
}
