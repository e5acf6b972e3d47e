//! Composite marks
//!
//! Composite marks are expanded by plain functions looked up by mark tag in a
//! [`CompositeMarkRegistry`]. New composite marks are added by registering
//! another function; the dispatch call sites never change.

pub mod boxplot;
pub mod common;
pub mod errorband;
pub mod errorbar;

use std::collections::BTreeMap;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::plot::{LayerSpec, UnitSpec};
use crate::{Result, VlnormError};

pub use boxplot::{normalize_box_plot, BOX_PLOT, BOX_PLOT_PARTS};
pub use errorband::{normalize_error_band, ERROR_BAND, ERROR_BAND_PARTS};
pub use errorbar::{normalize_error_bar, ERROR_BAR, ERROR_BAR_PARTS};

/// Expands a composite-mark unit into a layer of primitive units
pub type CompositeNormalizer = fn(&UnitSpec, &Config, &mut Diagnostics) -> Result<LayerSpec>;

#[derive(Debug, Clone)]
struct CompositeMarkEntry {
    normalize: CompositeNormalizer,
    parts: Vec<String>,
}

/// Mark tag to expander lookup
#[derive(Debug, Clone)]
pub struct CompositeMarkRegistry {
    entries: BTreeMap<String, CompositeMarkEntry>,
}

impl Default for CompositeMarkRegistry {
    /// Registry with `box-plot`, `errorbar` and `errorband`
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(BOX_PLOT, normalize_box_plot, BOX_PLOT_PARTS);
        registry.register(ERROR_BAR, normalize_error_bar, ERROR_BAR_PARTS);
        registry.register(ERROR_BAND, normalize_error_band, ERROR_BAND_PARTS);
        registry
    }
}

impl CompositeMarkRegistry {
    /// Registry without any composite marks
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register (or replace) the expander for `mark`
    pub fn register(&mut self, mark: &str, normalize: CompositeNormalizer, parts: &[&str]) {
        self.entries.insert(
            mark.to_string(),
            CompositeMarkEntry {
                normalize,
                parts: parts.iter().map(|p| p.to_string()).collect(),
            },
        );
    }

    /// Remove `mark`; returns whether it was registered
    pub fn unregister(&mut self, mark: &str) -> bool {
        self.entries.remove(mark).is_some()
    }

    pub fn contains(&self, mark: &str) -> bool {
        self.entries.contains_key(mark)
    }

    /// Registered composite mark tags, sorted
    pub fn marks(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Expand `unit` with the expander registered for its mark type
    pub fn dispatch(
        &self,
        unit: &UnitSpec,
        config: &Config,
        diagnostics: &mut Diagnostics,
    ) -> Result<LayerSpec> {
        let mark = unit.mark.mark_type();
        let entry = self
            .entries
            .get(mark)
            .ok_or_else(|| VlnormError::InvalidMark(format!("Invalid mark type \"{}\"", mark)))?;
        tracing::debug!(mark, "dispatching composite mark");
        (entry.normalize)(unit, config, diagnostics)
    }

    /// Part names of a registered composite mark
    pub fn parts_of(&self, mark: &str) -> Result<&[String]> {
        self.entries
            .get(mark)
            .map(|entry| entry.parts.as_slice())
            .ok_or_else(|| {
                VlnormError::InvalidMark(format!("Unregistered composite mark \"{}\"", mark))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{MarkDef, Spec};
    use serde_json::json;

    fn unit(value: serde_json::Value) -> UnitSpec {
        serde_json::from_value(value).unwrap()
    }

    fn single_rule(unit: &UnitSpec, _config: &Config, _diagnostics: &mut Diagnostics) -> Result<LayerSpec> {
        Ok(LayerSpec::new(vec![Spec::Unit(UnitSpec::new(
            MarkDef::new("rule"),
            unit.encoding.clone(),
        ))]))
    }

    #[test]
    fn test_default_registry() {
        let registry = CompositeMarkRegistry::default();
        let marks: Vec<&str> = registry.marks().collect();
        assert_eq!(marks, vec!["box-plot", "errorband", "errorbar"]);
        assert_eq!(
            registry.parts_of("errorbar").unwrap(),
            &["bar", "line", "ticks", "rule", "point"]
        );
        assert_eq!(registry.parts_of("errorband").unwrap(), &["band", "borders"]);
    }

    #[test]
    fn test_dispatch_unwraps_mark_def() {
        let registry = CompositeMarkRegistry::default();
        let spec = unit(json!({
            "mark": {"type": "box-plot", "extent": "min-max"},
            "encoding": {
                "x": {"field": "age", "type": "ordinal"},
                "y": {"field": "people", "type": "quantitative"}
            }
        }));
        let layer = registry
            .dispatch(&spec, &Config::default(), &mut Diagnostics::new())
            .unwrap();
        assert_eq!(layer.layer.len(), 4);
    }

    #[test]
    fn test_dispatch_unregistered_mark() {
        let registry = CompositeMarkRegistry::default();
        let spec = unit(json!({"mark": "violin"}));
        let err = registry
            .dispatch(&spec, &Config::default(), &mut Diagnostics::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid mark type \"violin\"");

        let err = registry.parts_of("violin").unwrap_err();
        assert_eq!(err.to_string(), "Unregistered composite mark \"violin\"");
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = CompositeMarkRegistry::default();
        registry.register("range", single_rule, &["rule"]);
        assert!(registry.contains("range"));

        let spec = unit(json!({
            "mark": "range",
            "encoding": {"y": {"field": "a", "type": "quantitative"}}
        }));
        let layer = registry
            .dispatch(&spec, &Config::default(), &mut Diagnostics::new())
            .unwrap();
        assert_eq!(layer.layer.len(), 1);

        assert!(registry.unregister("errorbar"));
        assert!(!registry.unregister("errorbar"));
        assert!(!registry.contains("errorbar"));
        assert!(registry.parts_of("errorbar").is_err());
    }
}
