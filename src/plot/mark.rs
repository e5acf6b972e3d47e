//! Mark types
//!
//! A unit specification carries either a bare mark tag (`"bar"`, `"box-plot"`)
//! or a mark definition object whose `type` names the mark. Primitive marks are
//! a closed enum; composite marks are open-ended and resolved through the
//! composite-mark registry, so the tag itself is kept as a string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Enum of all primitive marks for pattern matching and serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Area,
    Bar,
    Circle,
    Line,
    Point,
    Rect,
    Rule,
    Square,
    Text,
    Tick,
}

impl Mark {
    /// Parse a primitive mark tag
    pub fn parse(tag: &str) -> Option<Mark> {
        match tag {
            "area" => Some(Mark::Area),
            "bar" => Some(Mark::Bar),
            "circle" => Some(Mark::Circle),
            "line" => Some(Mark::Line),
            "point" => Some(Mark::Point),
            "rect" => Some(Mark::Rect),
            "rule" => Some(Mark::Rule),
            "square" => Some(Mark::Square),
            "text" => Some(Mark::Text),
            "tick" => Some(Mark::Tick),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Area => "area",
            Mark::Bar => "bar",
            Mark::Circle => "circle",
            Mark::Line => "line",
            Mark::Point => "point",
            Mark::Rect => "rect",
            Mark::Rule => "rule",
            Mark::Square => "square",
            Mark::Text => "text",
            Mark::Tick => "tick",
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Orientation of a composite mark: which axis carries the measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orient {
    /// Continuous axis is `y`
    Vertical,
    /// Continuous axis is `x`
    Horizontal,
}

impl Orient {
    pub fn flip(&self) -> Orient {
        match self {
            Orient::Vertical => Orient::Horizontal,
            Orient::Horizontal => Orient::Vertical,
        }
    }
}

/// Named extents accepted by composite marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedExtent {
    /// Whiskers span the full data range (box plot)
    #[serde(rename = "min-max")]
    MinMax,
    /// 95% confidence interval of the mean
    Ci,
    /// Interquartile range
    Iqr,
    /// Standard error of the mean
    Stderr,
    /// Standard deviation
    Stdev,
}

/// Extent of a composite mark: a named statistic or an IQR scalar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extent {
    Scalar(f64),
    Named(NamedExtent),
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Extent::Scalar(k) => write!(f, "{}", k),
            Extent::Named(NamedExtent::MinMax) => write!(f, "min-max"),
            Extent::Named(NamedExtent::Ci) => write!(f, "ci"),
            Extent::Named(NamedExtent::Iqr) => write!(f, "iqr"),
            Extent::Named(NamedExtent::Stderr) => write!(f, "stderr"),
            Extent::Named(NamedExtent::Stdev) => write!(f, "stdev"),
        }
    }
}

/// Center statistic of an error bar or error band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Center {
    Mean,
    Median,
}

impl std::fmt::Display for Center {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Center::Mean => write!(f, "mean"),
            Center::Median => write!(f, "median"),
        }
    }
}

/// Toggle or mark configuration for one part of a composite mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartSetting {
    Flag(bool),
    Mark(Map<String, Value>),
}

impl PartSetting {
    /// Whether this setting decides inclusion on its own.
    /// An empty object defers to the next level of defaults.
    pub fn is_explicit(&self) -> bool {
        match self {
            PartSetting::Flag(_) => true,
            PartSetting::Mark(props) => !props.is_empty(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            PartSetting::Flag(enabled) => *enabled,
            PartSetting::Mark(props) => !props.is_empty(),
        }
    }

    /// Mark properties carried by the setting (empty for flags)
    pub fn mark_config(&self) -> Map<String, Value> {
        match self {
            PartSetting::Flag(_) => Map::new(),
            PartSetting::Mark(props) => props.clone(),
        }
    }
}

/// Mark definition object
///
/// Properties the normalizer reads are typed; everything else (part settings,
/// overlay flags, renderer-only properties) is kept verbatim in `props`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orient: Option<Orient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Center>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl MarkDef {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            ..Default::default()
        }
    }

    pub fn with_orient(mut self, orient: Orient) -> Self {
        self.orient = Some(orient);
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_filled(mut self, filled: bool) -> Self {
        self.filled = Some(filled);
        self
    }

    /// Set a pass-through property
    pub fn with_prop(mut self, name: &str, value: Value) -> Self {
        self.props.insert(name.to_string(), value);
        self
    }

    /// Part setting stored under `name`, if it parses as one
    pub fn part(&self, name: &str) -> Option<PartSetting> {
        self.props
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Boolean pass-through property (e.g. the `point` overlay flag)
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.props.get(name).and_then(Value::as_bool)
    }

    /// Shallow-merge `overrides` over this definition; later keys win
    pub fn merged(&self, overrides: &Map<String, Value>) -> Result<MarkDef> {
        if overrides.is_empty() {
            return Ok(self.clone());
        }
        let mut props = match serde_json::to_value(self)? {
            Value::Object(props) => props,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            props.insert(key.clone(), value.clone());
        }
        Ok(serde_json::from_value(Value::Object(props))?)
    }
}

/// Mark of a unit specification: a bare tag or a definition object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnyMark {
    Tag(String),
    Def(MarkDef),
}

impl AnyMark {
    /// Mark type tag, unwrapping definition objects
    pub fn mark_type(&self) -> &str {
        match self {
            AnyMark::Tag(tag) => tag,
            AnyMark::Def(def) => &def.mark_type,
        }
    }

    /// Primitive mark, if the tag names one
    pub fn primitive(&self) -> Option<Mark> {
        Mark::parse(self.mark_type())
    }

    /// Definition object view of this mark
    pub fn to_def(&self) -> MarkDef {
        match self {
            AnyMark::Tag(tag) => MarkDef::new(tag.clone()),
            AnyMark::Def(def) => def.clone(),
        }
    }

    pub fn as_def(&self) -> Option<&MarkDef> {
        match self {
            AnyMark::Tag(_) => None,
            AnyMark::Def(def) => Some(def),
        }
    }
}

impl From<Mark> for AnyMark {
    fn from(mark: Mark) -> Self {
        AnyMark::Tag(mark.as_str().to_string())
    }
}

impl From<MarkDef> for AnyMark {
    fn from(def: MarkDef) -> Self {
        AnyMark::Def(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_any_mark_parsing() {
        let tag: AnyMark = serde_json::from_value(json!("box-plot")).unwrap();
        assert_eq!(tag.mark_type(), "box-plot");
        assert_eq!(tag.primitive(), None);

        let def: AnyMark = serde_json::from_value(json!({
            "type": "errorbar",
            "extent": "ci",
            "ticks": {"color": "red"},
            "rule": false
        }))
        .unwrap();
        assert_eq!(def.mark_type(), "errorbar");
        let def = def.to_def();
        assert_eq!(def.extent, Some(Extent::Named(NamedExtent::Ci)));
        assert_eq!(def.part("rule"), Some(PartSetting::Flag(false)));
        assert!(def.part("ticks").unwrap().is_enabled());
        assert_eq!(def.part("point"), None);
    }

    #[test]
    fn test_extent_parsing() {
        let scalar: Extent = serde_json::from_value(json!(1.5)).unwrap();
        assert_eq!(scalar, Extent::Scalar(1.5));
        let min_max: Extent = serde_json::from_value(json!("min-max")).unwrap();
        assert_eq!(min_max, Extent::Named(NamedExtent::MinMax));
        assert_eq!(min_max.to_string(), "min-max");
        assert!(serde_json::from_value::<Extent>(json!("wide")).is_err());
    }

    #[test]
    fn test_part_setting_explicitness() {
        assert!(PartSetting::Flag(false).is_explicit());
        assert!(!PartSetting::Flag(false).is_enabled());
        assert!(!PartSetting::Mark(Map::new()).is_explicit());
        let mut props = Map::new();
        props.insert("color".to_string(), json!("red"));
        let setting = PartSetting::Mark(props);
        assert!(setting.is_explicit());
        assert!(setting.is_enabled());
        assert_eq!(setting.mark_config().get("color"), Some(&json!("red")));
    }

    #[test]
    fn test_mark_def_merged() {
        let base = MarkDef::new("tick").with_orient(Orient::Horizontal);
        let mut overrides = Map::new();
        overrides.insert("color".to_string(), json!("black"));
        overrides.insert("thickness".to_string(), json!(2));
        let merged = base.merged(&overrides).unwrap();

        assert_eq!(merged.mark_type, "tick");
        assert_eq!(merged.orient, Some(Orient::Horizontal));
        assert_eq!(merged.color.as_deref(), Some("black"));
        assert_eq!(merged.props.get("thickness"), Some(&json!(2)));
    }

    #[test]
    fn test_mark_def_serialization_skips_unset() {
        let def = MarkDef::new("point").with_filled(true);
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            json!({"type": "point", "filled": true})
        );
    }
}
