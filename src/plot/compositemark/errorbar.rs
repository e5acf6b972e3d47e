//! Error bar expansion
//!
//! Also hosts the center/extent resolution shared with error bands: both marks
//! summarize the continuous axis with a center statistic and a lower/upper
//! bound computed either directly (`ci`, `iqr`) or as a symmetric offset from
//! the center (`stderr`, `stdev`).

use super::common::{datum_field, CompositeParams, ForeignAggregatePolicy};
use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::naming;
use crate::plot::{
    AggregateOp, AggregatedFieldDef, CalculateTransform, Center, Extent, LayerSpec, MarkDef,
    NamedExtent, UnitSpec,
};
use crate::Result;

pub const ERROR_BAR: &str = "errorbar";

/// Parts of an error bar
pub const ERROR_BAR_PARTS: &[&str] = &["bar", "line", "ticks", "rule", "point"];

/// Statistic spanned by an error bar or band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorExtent {
    Stderr,
    Stdev,
    Ci,
    Iqr,
}

impl ErrorExtent {
    fn from_extent(extent: Extent) -> Option<ErrorExtent> {
        match extent {
            Extent::Named(NamedExtent::Stderr) => Some(ErrorExtent::Stderr),
            Extent::Named(NamedExtent::Stdev) => Some(ErrorExtent::Stdev),
            Extent::Named(NamedExtent::Ci) => Some(ErrorExtent::Ci),
            Extent::Named(NamedExtent::Iqr) => Some(ErrorExtent::Iqr),
            Extent::Named(NamedExtent::MinMax) | Extent::Scalar(_) => None,
        }
    }

    fn default_for(center: Center) -> ErrorExtent {
        match center {
            Center::Mean => ErrorExtent::Stderr,
            Center::Median => ErrorExtent::Iqr,
        }
    }

    /// Bounds come straight from aggregate ops rather than from the center
    fn is_direct(&self) -> bool {
        matches!(self, ErrorExtent::Ci | ErrorExtent::Iqr)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorExtent::Stderr => "stderr",
            ErrorExtent::Stdev => "stdev",
            ErrorExtent::Ci => "ci",
            ErrorExtent::Iqr => "iqr",
        }
    }
}

/// Resolved center and extent of an error bar or band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorStats {
    pub center: Center,
    pub extent: ErrorExtent,
}

impl ErrorStats {
    /// Resolve center and extent from the mark definition, then the config section.
    ///
    /// An extent without an explicit center, from either source, picks the
    /// center that goes with it (`iqr` with median, anything else with mean).
    pub fn resolve(
        mark_def: &MarkDef,
        config_center: Center,
        config_extent: Option<Extent>,
        composite: &str,
        diagnostics: &mut Diagnostics,
    ) -> ErrorStats {
        let requested_extent = mark_def.extent.or(config_extent).and_then(|extent| {
            let resolved = ErrorExtent::from_extent(extent);
            if resolved.is_none() {
                diagnostics.warn(Warning::InvalidExtent {
                    extent: extent.to_string(),
                    mark: composite.to_string(),
                });
            }
            resolved
        });
        let center = match (mark_def.center, requested_extent) {
            (Some(center), _) => center,
            (None, Some(ErrorExtent::Iqr)) => Center::Median,
            (None, Some(_)) => Center::Mean,
            (None, None) => config_center,
        };
        let extent = requested_extent.unwrap_or_else(|| ErrorExtent::default_for(center));

        if extent.is_direct() && mark_def.center.is_some() && mark_def.extent.is_some() {
            diagnostics.warn(Warning::CenterNotNeeded {
                extent: extent.as_str().to_string(),
                mark: composite.to_string(),
            });
        } else if matches!(
            (center, extent),
            (Center::Median, ErrorExtent::Stderr | ErrorExtent::Stdev) | (Center::Mean, ErrorExtent::Iqr)
        ) {
            diagnostics.warn(Warning::CenterExtentMismatch {
                center: center.to_string(),
                extent: extent.as_str().to_string(),
                mark: composite.to_string(),
            });
        }

        ErrorStats { center, extent }
    }

    /// Aggregate entries and post-aggregate calculates producing
    /// `lower_<field>` and `upper_<field>` (and `center_<field>` when needed)
    pub fn aggregates(
        &self,
        field: &str,
        needs_center: bool,
    ) -> (Vec<AggregatedFieldDef>, Vec<CalculateTransform>) {
        let stat =
            |op: AggregateOp, prefix: &str| AggregatedFieldDef::new(op, field, naming::prefixed(prefix, field));
        let center_op = match self.center {
            Center::Mean => AggregateOp::Mean,
            Center::Median => AggregateOp::Median,
        };

        match self.extent {
            ErrorExtent::Stderr | ErrorExtent::Stdev => {
                let extent_op = if self.extent == ErrorExtent::Stderr {
                    AggregateOp::Stderr
                } else {
                    AggregateOp::Stdev
                };
                let center = datum_field(naming::CENTER, field);
                let extent = datum_field(naming::EXTENT, field);
                (
                    vec![stat(center_op, naming::CENTER), stat(extent_op, naming::EXTENT)],
                    vec![
                        CalculateTransform::new(
                            format!("{} + {}", center, extent),
                            naming::prefixed(naming::UPPER, field),
                        ),
                        CalculateTransform::new(
                            format!("{} - {}", center, extent),
                            naming::prefixed(naming::LOWER, field),
                        ),
                    ],
                )
            }
            ErrorExtent::Ci | ErrorExtent::Iqr => {
                let (lower_op, upper_op) = if self.extent == ErrorExtent::Ci {
                    (AggregateOp::Ci0, AggregateOp::Ci1)
                } else {
                    (AggregateOp::Q1, AggregateOp::Q3)
                };
                let mut aggregate = Vec::new();
                if needs_center {
                    aggregate.push(stat(center_op, naming::CENTER));
                }
                aggregate.push(stat(lower_op, naming::LOWER));
                aggregate.push(stat(upper_op, naming::UPPER));
                (aggregate, Vec::new())
            }
        }
    }
}

/// Expand an `errorbar` unit into its part layers
pub fn normalize_error_bar(
    unit: &UnitSpec,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Result<LayerSpec> {
    let params = CompositeParams::resolve(unit, ForeignAggregatePolicy::Warn, diagnostics)?;
    let stats = ErrorStats::resolve(
        &params.mark_def,
        config.errorbar.center,
        config.errorbar.extent,
        ERROR_BAR,
        diagnostics,
    );

    let draws_center = params.part_enabled("line", config) || params.part_enabled("point", config);
    let (aggregate, calculates) = stats.aggregates(&params.axis.field, draws_center);

    let orient = params.axis.orient;
    let shared = params.shared_encoding();
    let mut layer = Vec::new();

    if params.part_enabled("bar", config) {
        layer.push(params.make_part(
            "bar",
            MarkDef::new("bar").with_orient(orient),
            naming::LOWER,
            Some(naming::UPPER),
            shared.clone(),
            config,
        )?);
    }
    if params.part_enabled("line", config) {
        layer.push(params.make_part(
            "line",
            MarkDef::new("line"),
            naming::CENTER,
            None,
            shared.clone(),
            config,
        )?);
    }
    if params.part_enabled("ticks", config) {
        for bound in [naming::LOWER, naming::UPPER] {
            layer.push(params.make_part(
                "ticks",
                MarkDef::new("tick").with_orient(orient.flip()),
                bound,
                None,
                shared.clone(),
                config,
            )?);
        }
    }
    if params.part_enabled("rule", config) {
        layer.push(params.make_part(
            "rule",
            MarkDef::new("rule"),
            naming::LOWER,
            Some(naming::UPPER),
            shared.clone(),
            config,
        )?);
    }
    if params.part_enabled("point", config) {
        layer.push(params.make_part(
            "point",
            MarkDef::new("point").with_filled(true),
            naming::CENTER,
            None,
            shared.clone(),
            config,
        )?);
    }

    tracing::debug!(
        layers = layer.len(),
        center = %stats.center,
        extent = stats.extent.as_str(),
        "expanded error bar"
    );

    let transform = params.pipeline(&unit.transform, aggregate, calculates);
    Ok(params.into_layer(unit, transform, layer))
}
