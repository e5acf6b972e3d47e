//! Scale types
//!
//! Scale domains and ranges are resolved downstream; normalization only needs
//! to know a channel's scale *type* (for stacking and bin-suffix policy).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::channel::Channel;
use super::encoding::Encoding;

/// Enum of all scale types for pattern matching and serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleType {
    Linear,
    Log,
    Pow,
    Sqrt,
    Time,
    Utc,
    Sequential,
    Ordinal,
    Point,
    Band,
    BinLinear,
    BinOrdinal,
}

/// Resolved scale type per channel
pub type ScaleMap = HashMap<Channel, ScaleType>;

impl ScaleType {
    /// Canonical name for parsing and display
    pub fn name(&self) -> &'static str {
        match self {
            ScaleType::Linear => "linear",
            ScaleType::Log => "log",
            ScaleType::Pow => "pow",
            ScaleType::Sqrt => "sqrt",
            ScaleType::Time => "time",
            ScaleType::Utc => "utc",
            ScaleType::Sequential => "sequential",
            ScaleType::Ordinal => "ordinal",
            ScaleType::Point => "point",
            ScaleType::Band => "band",
            ScaleType::BinLinear => "bin-linear",
            ScaleType::BinOrdinal => "bin-ordinal",
        }
    }

    /// Continuous domain mapped to a continuous range
    pub fn is_continuous_to_continuous(&self) -> bool {
        matches!(
            self,
            ScaleType::Linear
                | ScaleType::BinLinear
                | ScaleType::Log
                | ScaleType::Pow
                | ScaleType::Sqrt
                | ScaleType::Time
                | ScaleType::Utc
        )
    }

    /// Whether the domain of this scale is discrete
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            ScaleType::Ordinal | ScaleType::Point | ScaleType::Band | ScaleType::BinOrdinal
        )
    }
}

impl std::fmt::Display for ScaleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Collect explicitly requested scale types (`scale.type`) from field definitions.
///
/// Channels without an explicit, recognized scale type are left out; callers that
/// resolve scales themselves can pass their own map instead.
pub fn scale_map_from_encoding(encoding: &Encoding) -> ScaleMap {
    encoding
        .iter()
        .filter_map(|(channel, def)| {
            let scale_type = def
                .as_field_def()?
                .scale
                .as_ref()?
                .get("type")
                .cloned()
                .and_then(|t| serde_json::from_value::<ScaleType>(t).ok())?;
            Some((*channel, scale_type))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scale_type_names() {
        let parsed: ScaleType = serde_json::from_value(json!("bin-ordinal")).unwrap();
        assert_eq!(parsed, ScaleType::BinOrdinal);
        assert_eq!(ScaleType::BinLinear.to_string(), "bin-linear");
    }

    #[test]
    fn test_scale_map_from_encoding() {
        let encoding: Encoding = serde_json::from_value(json!({
            "x": {"field": "a", "type": "quantitative", "scale": {"type": "log"}},
            "y": {"field": "b", "type": "quantitative", "scale": {"zero": false}},
            "color": {"field": "c", "type": "ordinal", "scale": {"type": "ordinal"}},
            "size": {"value": 3}
        }))
        .unwrap();

        let scales = scale_map_from_encoding(&encoding);
        assert_eq!(scales.len(), 2);
        assert_eq!(scales.get(&Channel::X), Some(&ScaleType::Log));
        assert_eq!(scales.get(&Channel::Color), Some(&ScaleType::Ordinal));
        assert!(!scales.contains_key(&Channel::Y));
    }
}
