//! Specification tree
//!
//! A specification is a tree of unit, layer and facet nodes. Properties the
//! normalizer does not interpret (`data`, `title`, `width`, ...) are kept
//! verbatim in each node's `outer` map and written back out unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::encoding::Encoding;
use super::fielddef::FieldDef;
use super::mark::AnyMark;
use super::transform::Transform;

/// A node of the specification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Spec {
    Facet(FacetSpec),
    Layer(LayerSpec),
    Unit(UnitSpec),
}

/// Leaf node: one mark and one encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<Transform>,
    pub mark: AnyMark,
    #[serde(default, skip_serializing_if = "Encoding::is_empty")]
    pub encoding: Encoding,
    #[serde(flatten)]
    pub outer: Map<String, Value>,
}

/// Ordered sibling specifications sharing one coordinate space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<Transform>,
    pub layer: Vec<Spec>,
    #[serde(flatten)]
    pub outer: Map<String, Value>,
}

/// Row/column partition of a facet specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<FieldDef>,
}

/// A specification replicated per facet level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<Transform>,
    pub facet: FacetMapping,
    pub spec: Box<Spec>,
    #[serde(flatten)]
    pub outer: Map<String, Value>,
}

impl UnitSpec {
    pub fn new(mark: impl Into<AnyMark>, encoding: Encoding) -> Self {
        Self {
            transform: Vec::new(),
            mark: mark.into(),
            encoding,
            outer: Map::new(),
        }
    }
}

impl LayerSpec {
    pub fn new(layer: Vec<Spec>) -> Self {
        Self {
            transform: Vec::new(),
            layer,
            outer: Map::new(),
        }
    }
}

impl From<UnitSpec> for Spec {
    fn from(spec: UnitSpec) -> Self {
        Spec::Unit(spec)
    }
}

impl From<LayerSpec> for Spec {
    fn from(spec: LayerSpec) -> Self {
        Spec::Layer(spec)
    }
}

impl From<FacetSpec> for Spec {
    fn from(spec: FacetSpec) -> Self {
        Spec::Facet(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_kinds_from_json() {
        let unit: Spec = serde_json::from_value(json!({
            "data": {"url": "population.json"},
            "mark": "bar",
            "encoding": {"x": {"field": "a", "type": "nominal"}}
        }))
        .unwrap();
        match &unit {
            Spec::Unit(u) => {
                assert_eq!(u.mark.mark_type(), "bar");
                assert_eq!(u.outer.get("data"), Some(&json!({"url": "population.json"})));
            }
            other => panic!("expected unit spec, got {:?}", other),
        }

        let layer: Spec = serde_json::from_value(json!({
            "layer": [{"mark": "point"}, {"mark": "line"}]
        }))
        .unwrap();
        assert!(matches!(layer, Spec::Layer(ref l) if l.layer.len() == 2));

        let facet: Spec = serde_json::from_value(json!({
            "facet": {"row": {"field": "r", "type": "nominal"}},
            "spec": {"mark": "point"}
        }))
        .unwrap();
        match facet {
            Spec::Facet(f) => {
                assert!(f.facet.row.is_some());
                assert!(f.facet.column.is_none());
                assert!(matches!(*f.spec, Spec::Unit(_)));
            }
            other => panic!("expected facet spec, got {:?}", other),
        }
    }

    #[test]
    fn test_unit_spec_serialization_skips_empty() {
        let unit = UnitSpec::new(AnyMark::Tag("point".to_string()), Encoding::new());
        assert_eq!(
            serde_json::to_value(Spec::from(unit)).unwrap(),
            json!({"mark": "point"})
        );
    }
}
