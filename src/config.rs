//! Normalization config
//!
//! The built-in defaults live in [`DEFAULT_CONFIG`], initialized once and never
//! written to. A user config is applied by deep-merging it over a serialized
//! copy of the defaults: objects merge key by key, arrays and scalars replace.
//! Keys without a typed section are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

use crate::plot::{Center, Extent, PartSetting, StackOffset};
use crate::{Result, VlnormError};

/// Process-wide built-in defaults
pub static DEFAULT_CONFIG: LazyLock<Config> = LazyLock::new(Config::builtin);

/// Area overlay mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaOverlay {
    /// Add a line along the area's edge
    Line,
    /// Add a line and points along the area's edge
    Linepoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Add points on top of line marks
    #[serde(default)]
    pub line: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<AreaOverlay>,
}

/// `box` section: box-plot parameters plus the box part's mark properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotConfig {
    pub size: f64,
    pub extent: Extent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub mark: Map<String, Value>,
}

impl Default for BoxPlotConfig {
    fn default() -> Self {
        Self {
            size: 14.0,
            extent: Extent::Scalar(1.5),
            color: None,
            mark: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBarConfig {
    pub center: Center,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    pub rule: PartSetting,
    pub ticks: PartSetting,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar: Option<PartSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<PartSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<PartSetting>,
}

impl Default for ErrorBarConfig {
    fn default() -> Self {
        Self {
            center: Center::Mean,
            extent: None,
            rule: PartSetting::Flag(true),
            ticks: PartSetting::Flag(false),
            bar: None,
            line: None,
            point: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBandConfig {
    pub center: Center,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    pub band: PartSetting,
    pub borders: PartSetting,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

impl Default for ErrorBandConfig {
    fn default() -> Self {
        Self {
            center: Center::Mean,
            extent: None,
            band: PartSetting::Flag(true),
            borders: PartSetting::Flag(false),
            interpolate: None,
            tension: None,
        }
    }
}

/// Effective config of one normalization call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Default stack offset; `none` disables stacking
    pub stack: StackOffset,
    pub overlay: OverlayConfig,
    #[serde(rename = "box")]
    pub box_plot: BoxPlotConfig,
    pub box_whisker: PartSetting,
    pub box_mid: PartSetting,
    pub errorbar: ErrorBarConfig,
    pub errorband: ErrorBandConfig,
    /// Sections this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl Config {
    fn builtin() -> Config {
        let mut box_mid = Map::new();
        box_mid.insert("color".to_string(), json!("white"));
        Config {
            stack: StackOffset::Zero,
            overlay: OverlayConfig::default(),
            box_plot: BoxPlotConfig::default(),
            box_whisker: PartSetting::Flag(true),
            box_mid: PartSetting::Mark(box_mid),
            errorbar: ErrorBarConfig::default(),
            errorband: ErrorBandConfig::default(),
            extra: Map::new(),
        }
    }

    /// Deep-merge a user config over the built-in defaults
    pub fn from_user(user: &Value) -> Result<Config> {
        let base = serde_json::to_value(&*DEFAULT_CONFIG)
            .map_err(|e| VlnormError::ConfigError(e.to_string()))?;
        let merged = deep_merge(base, user);
        serde_json::from_value(merged).map_err(|e| VlnormError::ConfigError(e.to_string()))
    }

    /// Config-level setting for one part of a composite mark.
    ///
    /// Composite marks registered outside this crate read `<mark>.<part>`
    /// from the pass-through sections.
    pub fn part(&self, composite: &str, part: &str) -> Option<PartSetting> {
        match (composite, part) {
            ("box-plot", "box") => {
                if self.box_plot.mark.is_empty() {
                    Some(PartSetting::Flag(true))
                } else {
                    Some(PartSetting::Mark(self.box_plot.mark.clone()))
                }
            }
            ("box-plot", "boxWhisker") => Some(self.box_whisker.clone()),
            ("box-plot", "boxMid") => Some(self.box_mid.clone()),
            ("errorbar", "rule") => Some(self.errorbar.rule.clone()),
            ("errorbar", "ticks") => Some(self.errorbar.ticks.clone()),
            ("errorbar", "bar") => self.errorbar.bar.clone(),
            ("errorbar", "line") => self.errorbar.line.clone(),
            ("errorbar", "point") => self.errorbar.point.clone(),
            ("errorband", "band") => Some(self.errorband.band.clone()),
            ("errorband", "borders") => Some(self.errorband.borders.clone()),
            _ => self
                .extra
                .get(composite)
                .and_then(|section| section.get(part))
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        }
    }
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value (arrays included)
/// replaces the base value. `base` is consumed, so callers merge into their
/// own copy.
pub fn deep_merge(base: Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => {
                        let current = existing.take();
                        *existing = deep_merge(current, value);
                    }
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(base)
        }
        (_, overlay) => overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::NamedExtent;

    #[test]
    fn test_builtin_defaults() {
        let config = Config::default();
        assert_eq!(config.stack, StackOffset::Zero);
        assert!(!config.overlay.line);
        assert_eq!(config.box_plot.size, 14.0);
        assert_eq!(config.box_plot.extent, Extent::Scalar(1.5));
        assert_eq!(config.errorbar.center, Center::Mean);
        assert_eq!(config.errorbar.extent, None);
        assert_eq!(config.part("errorbar", "rule"), Some(PartSetting::Flag(true)));
        assert_eq!(config.part("errorbar", "ticks"), Some(PartSetting::Flag(false)));
        assert_eq!(config.part("errorbar", "point"), None);
        assert_eq!(config.part("box-plot", "box"), Some(PartSetting::Flag(true)));
        assert!(config.part("box-plot", "boxMid").unwrap().is_enabled());
    }

    #[test]
    fn test_deep_merge_objects_and_arrays() {
        let base = json!({"a": {"b": 1, "c": [1, 2]}, "d": "x"});
        let merged = deep_merge(base, &json!({"a": {"c": [3], "e": true}}));
        assert_eq!(merged, json!({"a": {"b": 1, "c": [3], "e": true}, "d": "x"}));
    }

    #[test]
    fn test_deep_merge_preserves_key_order() {
        let base = json!({"first": 1, "second": {"x": 1}, "third": 3});
        let merged = deep_merge(base, &json!({"second": {"y": 2}}));
        let keys: Vec<&String> = merged.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_from_user_merges_sections() {
        let config = Config::from_user(&json!({
            "box": {"extent": "min-max", "opacity": 0.5},
            "errorbar": {"extent": "ci", "ticks": {"color": "red"}},
            "overlay": {"area": "linepoint"},
            "axis": {"grid": false}
        }))
        .unwrap();

        assert_eq!(config.box_plot.extent, Extent::Named(NamedExtent::MinMax));
        assert_eq!(config.box_plot.size, 14.0);
        assert_eq!(config.box_plot.mark.get("opacity"), Some(&json!(0.5)));
        assert_eq!(config.errorbar.extent, Some(Extent::Named(NamedExtent::Ci)));
        assert!(config.part("errorbar", "ticks").unwrap().is_enabled());
        assert!(config.part("errorbar", "rule").unwrap().is_enabled());
        assert_eq!(config.overlay.area, Some(AreaOverlay::Linepoint));
        assert_eq!(config.extra.get("axis"), Some(&json!({"grid": false})));
    }

    #[test]
    fn test_from_user_leaves_default_untouched() {
        let _ = Config::from_user(&json!({"stack": "none", "boxMid": {"color": "black"}})).unwrap();
        assert_eq!(DEFAULT_CONFIG.stack, StackOffset::Zero);
        assert_eq!(*DEFAULT_CONFIG, Config::builtin());
    }

    #[test]
    fn test_from_user_rejects_bad_section() {
        let err = Config::from_user(&json!({"stack": "sideways"})).unwrap_err();
        assert!(matches!(err, VlnormError::ConfigError(_)));
    }

    #[test]
    fn test_part_lookup_for_custom_composite() {
        let config = Config::from_user(&json!({"violin": {"outline": true}})).unwrap();
        assert_eq!(config.part("violin", "outline"), Some(PartSetting::Flag(true)));
        assert_eq!(config.part("violin", "body"), None);
    }
}
