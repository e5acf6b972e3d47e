//! Box plot expansion
//!
//! A box plot becomes up to four primitive layers over one aggregate stage:
//! two whisker rules, a bar spanning the interquartile range, and a tick at
//! the median.

use serde_json::Value;

use super::common::{datum_field, with_value, CompositeParams, ForeignAggregatePolicy};
use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::naming;
use crate::plot::{
    AggregateOp, AggregatedFieldDef, CalculateTransform, Channel, Extent, LayerSpec, MarkDef,
    NamedExtent, UnitSpec,
};
use crate::Result;

pub const BOX_PLOT: &str = "box-plot";

/// Parts of a box plot, in drawing order of their config sections
pub const BOX_PLOT_PARTS: &[&str] = &["box", "boxWhisker", "boxMid"];

/// Whisker extent of a box plot
#[derive(Debug, Clone, Copy, PartialEq)]
enum WhiskerExtent {
    /// Whiskers reach the data minimum and maximum
    MinMax,
    /// Whiskers reach `k` interquartile ranges beyond the box, clamped to the data
    Iqr(f64),
}

fn whisker_extent(mark_def: &MarkDef, config: &Config, diagnostics: &mut Diagnostics) -> WhiskerExtent {
    let resolve = |extent: Extent| match extent {
        Extent::Named(NamedExtent::MinMax) => Some(WhiskerExtent::MinMax),
        Extent::Scalar(k) => Some(WhiskerExtent::Iqr(k)),
        Extent::Named(_) => None,
    };

    let requested = mark_def.extent.unwrap_or(config.box_plot.extent);
    if let Some(extent) = resolve(requested) {
        return extent;
    }
    diagnostics.warn(Warning::InvalidExtent {
        extent: requested.to_string(),
        mark: BOX_PLOT.to_string(),
    });
    resolve(config.box_plot.extent).unwrap_or(WhiskerExtent::Iqr(1.5))
}

/// Expand a `box-plot` unit into its part layers
pub fn normalize_box_plot(
    unit: &UnitSpec,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Result<LayerSpec> {
    let params = CompositeParams::resolve(unit, ForeignAggregatePolicy::Error, diagnostics)?;
    let extent = whisker_extent(&params.mark_def, config, diagnostics);
    let field = params.axis.field.clone();
    let orient = params.axis.orient;

    let stat = |op: AggregateOp, prefix: &str| {
        AggregatedFieldDef::new(op, field.as_str(), naming::prefixed(prefix, &field))
    };

    let mut aggregate = vec![
        stat(AggregateOp::Q1, naming::LOWER_BOX),
        stat(AggregateOp::Q3, naming::UPPER_BOX),
        stat(AggregateOp::Median, naming::MID_BOX),
    ];
    let mut calculates = Vec::new();

    match extent {
        WhiskerExtent::MinMax => {
            aggregate.push(stat(AggregateOp::Min, naming::LOWER_WHISKER));
            aggregate.push(stat(AggregateOp::Max, naming::UPPER_WHISKER));
        }
        WhiskerExtent::Iqr(k) => {
            aggregate.push(stat(AggregateOp::Min, naming::MIN));
            aggregate.push(stat(AggregateOp::Max, naming::MAX));

            let iqr = datum_field(naming::IQR_RANGE, &field);
            calculates.push(CalculateTransform::new(
                format!(
                    "{} - {}",
                    datum_field(naming::UPPER_BOX, &field),
                    datum_field(naming::LOWER_BOX, &field)
                ),
                naming::prefixed(naming::IQR_RANGE, &field),
            ));
            calculates.push(CalculateTransform::new(
                format!(
                    "min({} + {} * {}, {})",
                    datum_field(naming::UPPER_BOX, &field),
                    iqr,
                    k,
                    datum_field(naming::MAX, &field)
                ),
                naming::prefixed(naming::UPPER_WHISKER, &field),
            ));
            calculates.push(CalculateTransform::new(
                format!(
                    "max({} - {} * {}, {})",
                    datum_field(naming::LOWER_BOX, &field),
                    iqr,
                    k,
                    datum_field(naming::MIN, &field)
                ),
                naming::prefixed(naming::LOWER_WHISKER, &field),
            ));
        }
    }

    let shared = params.shared_encoding();
    let size = shared
        .get(Channel::Size)
        .cloned()
        .unwrap_or_else(|| crate::plot::ValueDef::new(config.box_plot.size).into());
    let mut layer = Vec::new();

    if params.part_enabled("boxWhisker", config) {
        let whisker_encoding = shared.without(&[Channel::Color, Channel::Size]);
        layer.push(params.make_part(
            "boxWhisker",
            MarkDef::new("rule"),
            naming::LOWER_WHISKER,
            Some(naming::LOWER_BOX),
            whisker_encoding.clone(),
            config,
        )?);
        layer.push(params.make_part(
            "boxWhisker",
            MarkDef::new("rule"),
            naming::UPPER_BOX,
            Some(naming::UPPER_WHISKER),
            whisker_encoding,
            config,
        )?);
    }

    if params.part_enabled("box", config) {
        let mut box_encoding = shared.clone();
        if !box_encoding.contains(Channel::Color) {
            if let Some(color) = &config.box_plot.color {
                box_encoding = with_value(box_encoding, Channel::Color, Value::String(color.clone()));
            }
        }
        box_encoding.insert(Channel::Size, size.clone());
        layer.push(params.make_part(
            "box",
            MarkDef::new("bar").with_orient(orient),
            naming::LOWER_BOX,
            Some(naming::UPPER_BOX),
            box_encoding,
            config,
        )?);
    }

    if params.part_enabled("boxMid", config) {
        let mid_color = config
            .part(BOX_PLOT, "boxMid")
            .and_then(|setting| setting.mark_config().get("color").cloned())
            .unwrap_or_else(|| Value::String("white".to_string()));
        let mut mid_encoding = with_value(
            shared.without(&[Channel::Size, Channel::Color]),
            Channel::Color,
            mid_color,
        );
        mid_encoding.insert(Channel::Size, size);
        layer.push(params.make_part(
            "boxMid",
            MarkDef::new("tick").with_orient(orient.flip()),
            naming::MID_BOX,
            None,
            mid_encoding,
            config,
        )?);
    }

    tracing::debug!(layers = layer.len(), ?extent, "expanded box plot");

    let transform = params.pipeline(&unit.transform, aggregate, calculates);
    Ok(params.into_layer(unit, transform, layer))
}
