//! Error band expansion
//!
//! Same statistics as an error bar, drawn as a filled band between the lower
//! and upper bounds with optional border lines. With a discrete axis the band
//! is an area and the borders are lines; without one (1-D) they degrade to a
//! rect and rules.

use serde_json::Value;

use super::common::{CompositeParams, ForeignAggregatePolicy};
use super::errorbar::ErrorStats;
use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::naming;
use crate::plot::{LayerSpec, MarkDef, UnitSpec};
use crate::Result;

pub const ERROR_BAND: &str = "errorband";

/// Parts of an error band
pub const ERROR_BAND_PARTS: &[&str] = &["band", "borders"];

/// Interpolation properties for the 2-D band and borders
fn interpolation(mark_def: &MarkDef, config: &Config) -> Vec<(&'static str, Value)> {
    let mut props = Vec::new();
    if let Some(interpolate) = mark_def
        .interpolate
        .as_ref()
        .or(config.errorband.interpolate.as_ref())
    {
        props.push(("interpolate", Value::String(interpolate.clone())));
    }
    if let Some(tension) = mark_def.tension.or(config.errorband.tension) {
        props.push(("tension", Value::from(tension)));
    }
    props
}

/// Expand an `errorband` unit into its part layers
pub fn normalize_error_band(
    unit: &UnitSpec,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Result<LayerSpec> {
    let params = CompositeParams::resolve(unit, ForeignAggregatePolicy::Warn, diagnostics)?;
    let stats = ErrorStats::resolve(
        &params.mark_def,
        config.errorband.center,
        config.errorband.extent,
        ERROR_BAND,
        diagnostics,
    );
    let (aggregate, calculates) = stats.aggregates(&params.axis.field, false);

    let is_2d = !params.axis.is_1d;
    let props = interpolation(&params.mark_def, config);
    if !is_2d {
        for (property, _) in &props {
            diagnostics.warn(Warning::ErrorBand1DNotSupported {
                property: property.to_string(),
            });
        }
    }

    let with_interpolation = |mut mark: MarkDef| {
        if is_2d {
            for (property, value) in &props {
                mark = mark.with_prop(property, value.clone());
            }
        }
        mark
    };

    let orient = params.axis.orient;
    let shared = params.shared_encoding();
    let mut layer = Vec::new();

    if params.part_enabled("band", config) {
        let band = if is_2d {
            with_interpolation(MarkDef::new("area").with_orient(orient))
        } else {
            MarkDef::new("rect")
        };
        layer.push(params.make_part(
            "band",
            band,
            naming::LOWER,
            Some(naming::UPPER),
            shared.clone(),
            config,
        )?);
    }
    if params.part_enabled("borders", config) {
        for bound in [naming::LOWER, naming::UPPER] {
            let border = if is_2d {
                with_interpolation(MarkDef::new("line").with_orient(orient))
            } else {
                MarkDef::new("rule")
            };
            layer.push(params.make_part("borders", border, bound, None, shared.clone(), config)?);
        }
    }

    tracing::debug!(layers = layer.len(), is_2d, "expanded error band");

    let transform = params.pipeline(&unit.transform, aggregate, calculates);
    Ok(params.into_layer(unit, transform, layer))
}
