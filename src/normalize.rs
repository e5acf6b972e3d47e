//! Top-level specification normalizer
//!
//! Rewrites a specification tree bottom-up into facet, layer and primitive unit
//! nodes only:
//!
//! - `row`/`column` channels of a top-level unit become a facet wrapper
//! - composite marks are expanded through the [`CompositeMarkRegistry`]
//! - `x2`/`y2` without `x`/`y` are promoted to the primary channel
//! - line and area marks gain point/line overlay layers when requested
//!
//! Normalization is a pure function of the specification and the config, and
//! its output is a fixed point: normalizing it again changes nothing.

use serde_json::{Map, Value};

use crate::config::{AreaOverlay, Config};
use crate::diagnostics::{Diagnostics, Warning};
use crate::naming;
use crate::plot::{
    normalize_encoding, AnyMark, Channel, ChannelDef, CompositeMarkRegistry, Encoding,
    FacetMapping, FacetSpec, LayerSpec, Mark, MarkDef, Spec, UnitSpec,
};
use crate::{Result, VlnormError};

/// Outer properties that size or project the individual facet cell
const FACET_INNER_PROPERTIES: &[&str] = &["width", "height", "projection"];

/// Where a node sits in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Top,
    Layer,
    Facet,
}

/// Result of normalization: the rewritten tree and the warnings collected on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub spec: Spec,
    pub warnings: Vec<Warning>,
}

impl Normalized {
    /// Keep the output regardless of warnings
    pub fn into_permissive(self) -> (Spec, Vec<Warning>) {
        (self.spec, self.warnings)
    }

    /// Fail on the first warning
    pub fn into_strict(self) -> Result<Spec> {
        match self.warnings.into_iter().next() {
            Some(warning) => Err(VlnormError::StrictWarning(warning.to_string())),
            None => Ok(self.spec),
        }
    }
}

/// Reusable normalizer holding an effective config and a composite-mark registry
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: Config,
    registry: CompositeMarkRegistry,
}

impl Normalizer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: CompositeMarkRegistry::default(),
        }
    }

    pub fn with_registry(mut self, registry: CompositeMarkRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &CompositeMarkRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CompositeMarkRegistry {
        &mut self.registry
    }

    /// Normalize a specification tree
    pub fn normalize(&self, spec: &Spec) -> Result<Normalized> {
        let mut diagnostics = Diagnostics::new();
        let spec = self.normalize_spec(spec, Scope::Top, &mut diagnostics)?;
        Ok(Normalized {
            spec,
            warnings: diagnostics.into_warnings(),
        })
    }

    fn normalize_spec(&self, spec: &Spec, scope: Scope, diagnostics: &mut Diagnostics) -> Result<Spec> {
        match spec {
            Spec::Facet(facet) => {
                match scope {
                    Scope::Top => {}
                    Scope::Facet => {
                        return Err(VlnormError::ValidationError(
                            "Facet specifications cannot be nested directly inside a facet".to_string(),
                        ))
                    }
                    Scope::Layer => {
                        return Err(VlnormError::ValidationError(
                            "Layer specifications cannot contain facet specifications".to_string(),
                        ))
                    }
                }
                let inner = self.normalize_spec(&facet.spec, Scope::Facet, diagnostics)?;
                Ok(Spec::Facet(FacetSpec {
                    transform: facet.transform.clone(),
                    facet: facet.facet.clone(),
                    spec: Box::new(inner),
                    outer: facet.outer.clone(),
                }))
            }
            Spec::Layer(layer) => {
                let children = layer
                    .layer
                    .iter()
                    .map(|child| self.normalize_spec(child, Scope::Layer, diagnostics))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Spec::Layer(LayerSpec {
                    transform: layer.transform.clone(),
                    layer: children,
                    outer: layer.outer.clone(),
                }))
            }
            Spec::Unit(unit) => self.normalize_unit(unit, scope, diagnostics),
        }
    }

    fn normalize_unit(&self, unit: &UnitSpec, scope: Scope, diagnostics: &mut Diagnostics) -> Result<Spec> {
        let has_facet = unit.encoding.channels().any(|c| c.is_facet());
        if has_facet {
            if scope == Scope::Top {
                return self.normalize_facet_unit(unit, diagnostics);
            }
            let mut unit = unit.clone();
            for channel in [Channel::Row, Channel::Column] {
                if unit.encoding.remove(channel).is_some() {
                    diagnostics.warn(Warning::FacetChannelDropped { channel });
                }
            }
            return self.normalize_unit(&unit, scope, diagnostics);
        }

        let mark_type = unit.mark.mark_type();
        if self.registry.contains(mark_type) {
            let layer = self.registry.dispatch(unit, &self.config, diagnostics)?;
            let children = layer
                .layer
                .iter()
                .map(|child| self.normalize_spec(child, Scope::Layer, diagnostics))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Spec::Layer(LayerSpec {
                layer: children,
                ..layer
            }));
        }

        match unit.mark.primitive() {
            Some(mark) => Ok(self.normalize_primitive(unit, mark, diagnostics)),
            None => Err(VlnormError::InvalidMark(format!(
                "Invalid mark type \"{}\"",
                mark_type
            ))),
        }
    }

    /// Split a unit with `row`/`column` into a facet around the rest of it
    fn normalize_facet_unit(&self, unit: &UnitSpec, diagnostics: &mut Diagnostics) -> Result<Spec> {
        let mut facet = FacetMapping::default();
        for channel in [Channel::Row, Channel::Column] {
            match unit.encoding.get(channel) {
                Some(ChannelDef::Field(def)) if def.has_field() => {
                    let target = if channel == Channel::Row {
                        &mut facet.row
                    } else {
                        &mut facet.column
                    };
                    *target = Some(def.clone());
                }
                Some(_) => diagnostics.warn(Warning::FacetChannelDropped { channel }),
                None => {}
            }
        }

        let mut inner_outer = Map::new();
        let mut outer = Map::new();
        for (key, value) in &unit.outer {
            if FACET_INNER_PROPERTIES.contains(&key.as_str()) {
                inner_outer.insert(key.clone(), value.clone());
            } else {
                outer.insert(key.clone(), value.clone());
            }
        }

        let inner = UnitSpec {
            transform: Vec::new(),
            mark: unit.mark.clone(),
            encoding: unit.encoding.without(&[Channel::Row, Channel::Column]),
            outer: inner_outer,
        };
        tracing::debug!(
            row = facet.row.is_some(),
            column = facet.column.is_some(),
            "extracted facet from unit"
        );
        let inner = self.normalize_unit(&inner, Scope::Facet, diagnostics)?;

        Ok(Spec::Facet(FacetSpec {
            transform: unit.transform.clone(),
            facet,
            spec: Box::new(inner),
            outer,
        }))
    }

    fn normalize_primitive(&self, unit: &UnitSpec, mark: Mark, diagnostics: &mut Diagnostics) -> Spec {
        let encoding = normalize_encoding(&promote_secondary(&unit.encoding), mark, diagnostics);

        let mark_def = unit.mark.as_def();
        let flag = |name: &str| mark_def.and_then(|def| def.flag(name));
        let (line_overlay, point_overlay) = match mark {
            Mark::Line => (false, flag("point").unwrap_or(self.config.overlay.line)),
            Mark::Area => (
                flag("line").unwrap_or(self.config.overlay.area.is_some()),
                flag("point").unwrap_or(self.config.overlay.area == Some(AreaOverlay::Linepoint)),
            ),
            _ => (false, false),
        };

        if !line_overlay && !point_overlay {
            return Spec::Unit(UnitSpec {
                encoding,
                ..unit.clone()
            });
        }

        let mut base = unit.mark.to_def().with_prop("point", Value::Bool(false));
        if mark == Mark::Area {
            base = base.with_prop("line", Value::Bool(false));
        }
        let mut layer = vec![Spec::Unit(UnitSpec::new(base.clone(), encoding.clone()))];

        if line_overlay {
            let mut line = MarkDef::new(Mark::Line.as_str())
                .with_style(naming::LINE_OVERLAY_STYLE)
                .with_prop("point", Value::Bool(false));
            line.color = base.color.clone();
            layer.push(overlay_layer(line, Mark::Line, &encoding));
        }
        if point_overlay {
            let mut point = MarkDef::new(Mark::Point.as_str())
                .with_filled(true)
                .with_style(naming::POINT_OVERLAY_STYLE);
            point.color = base.color.clone();
            layer.push(overlay_layer(point, Mark::Point, &encoding));
        }

        tracing::debug!(mark = %mark, line_overlay, point_overlay, "expanded overlay");

        Spec::Layer(LayerSpec {
            transform: unit.transform.clone(),
            layer,
            outer: unit.outer.clone(),
        })
    }
}

fn overlay_layer(mark_def: MarkDef, mark: Mark, encoding: &Encoding) -> Spec {
    let encoding = encoding.filtered(|channel| channel.supports_mark(mark));
    Spec::Unit(UnitSpec::new(AnyMark::Def(mark_def), encoding))
}

/// Rename `x2`/`y2` to `x`/`y` when the primary channel is missing
fn promote_secondary(encoding: &Encoding) -> Encoding {
    let promote = |channel: Channel| -> Channel {
        match channel {
            Channel::X2 if !encoding.contains(Channel::X) => Channel::X,
            Channel::Y2 if !encoding.contains(Channel::Y) => Channel::Y,
            other => other,
        }
    };
    encoding
        .iter()
        .map(|(channel, def)| (promote(*channel), def.clone()))
        .collect()
}

/// Normalize `spec` under `config`
pub fn normalize(spec: &Spec, config: &Config) -> Result<Normalized> {
    Normalizer::new(config.clone()).normalize(spec)
}

/// Normalize a JSON specification, optionally with a JSON user config merged over
/// the defaults. Returns the normalized specification as JSON and the warnings.
pub fn normalize_json(spec: &str, config: Option<&str>) -> Result<(String, Vec<Warning>)> {
    let spec: Spec = serde_json::from_str(spec)?;
    let config = match config {
        Some(config) => Config::from_user(&serde_json::from_str::<Value>(config)?)?,
        None => Config::default(),
    };
    let (spec, warnings) = normalize(&spec, &config)?.into_permissive();
    Ok((serde_json::to_string(&spec)?, warnings))
}
