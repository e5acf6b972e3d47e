//! Shared plumbing for composite marks
//!
//! Every composite mark follows the same skeleton: filter the encoding to the
//! channels composite marks understand, decide which axis is continuous,
//! extract the implicit transforms of the remaining channels, and build one
//! unit layer per enabled part.

use serde_json::{Map, Value};

use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::naming;
use crate::plot::{
    extract_transforms_from_encoding, AggregatedFieldDef, CalculateTransform, Channel,
    ChannelDef, Encoding, ExtractedTransforms, FieldDef, LayerSpec, Mark, MarkDef, Orient,
    Spec, Transform, UnitSpec,
};
use crate::{Result, VlnormError};

/// Channels every composite mark accepts
pub const COMPOSITE_CHANNELS: &[Channel] = &[
    Channel::X,
    Channel::Y,
    Channel::Color,
    Channel::Detail,
    Channel::Opacity,
    Channel::Size,
];

/// What to do with an aggregate on the continuous axis that is not the composite tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignAggregatePolicy {
    /// Drop the aggregate and warn
    Warn,
    /// Fail the whole normalization
    Error,
}

/// Drop channels a composite mark does not accept, warning once per channel
pub fn filter_unsupported_channels(
    encoding: &Encoding,
    composite: &str,
    diagnostics: &mut Diagnostics,
) -> Encoding {
    encoding.filtered(|channel| {
        let supported = COMPOSITE_CHANNELS.contains(&channel);
        if !supported {
            diagnostics.warn(Warning::IncompatibleChannel {
                channel,
                mark: composite.to_string(),
            });
        }
        supported
    })
}

// ============================================================================
// Orientation and continuous axis
// ============================================================================

fn continuous_axis_error(composite: &str) -> VlnormError {
    VlnormError::ValidationError(format!("Need a valid continuous axis for {}s", composite))
}

/// Decide the orientation of a composite mark from its position channels.
///
/// A single continuous axis fixes the orientation. With two continuous axes
/// the one aggregated by the composite tag wins, then the mark's `orient`,
/// then vertical.
pub fn composite_mark_orient(
    encoding: &Encoding,
    mark_def: &MarkDef,
    composite: &str,
) -> Result<Orient> {
    let x = encoding.field_def(Channel::X);
    let y = encoding.field_def(Channel::Y);
    let x_continuous = x.is_some_and(FieldDef::is_continuous);
    let y_continuous = y.is_some_and(FieldDef::is_continuous);

    let forced = match (x_continuous, y_continuous) {
        (true, true) => {
            let x_aggregate = x.and_then(|d| d.aggregate.as_ref());
            let y_aggregate = y.and_then(|d| d.aggregate.as_ref());
            let x_composite = x_aggregate.is_some_and(|a| a.is_composite(composite));
            let y_composite = y_aggregate.is_some_and(|a| a.is_composite(composite));

            if x_composite && y_composite {
                return Err(VlnormError::ValidationError(format!(
                    "Both x and y cannot have aggregate {}",
                    composite
                )));
            }
            if x_aggregate.is_none() && y_composite {
                return Ok(Orient::Vertical);
            }
            if y_aggregate.is_none() && x_composite {
                return Ok(Orient::Horizontal);
            }
            return Ok(mark_def.orient.unwrap_or(Orient::Vertical));
        }
        (true, false) => Orient::Horizontal,
        (false, true) => Orient::Vertical,
        (false, false) => return Err(continuous_axis_error(composite)),
    };

    match mark_def.orient {
        Some(orient) if orient != forced => Err(VlnormError::ValidationError(format!(
            "Orient \"{}\" conflicts with the continuous axis of {}",
            if orient == Orient::Vertical { "vertical" } else { "horizontal" },
            composite
        ))),
        _ => Ok(forced),
    }
}

/// The resolved measure axis of a composite mark
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousAxis {
    pub orient: Orient,
    pub channel: Channel,
    /// Continuous field definition with the composite aggregate stripped
    pub def: FieldDef,
    /// Underlying data field
    pub field: String,
    pub discrete_channel: Channel,
    /// No field on the discrete axis
    pub is_1d: bool,
}

impl ContinuousAxis {
    /// Secondary channel used for ranged parts (`y2` for a vertical mark)
    pub fn secondary(&self) -> Channel {
        match self.channel {
            Channel::X => Channel::X2,
            _ => Channel::Y2,
        }
    }

    /// Field definition pointing the continuous channel at `<prefix>_<field>`
    pub fn part_field_def(&self, prefix: &str) -> FieldDef {
        let mut def = FieldDef::new(naming::prefixed(prefix, &self.field), self.def.field_type)
            .with_title(self.def.title_or_field());
        def.scale = self.def.scale.clone();
        def.axis = self.def.axis.clone();
        def
    }

    /// Plain field definition for the secondary channel
    pub fn end_field_def(&self, prefix: &str) -> FieldDef {
        FieldDef::new(naming::prefixed(prefix, &self.field), self.def.field_type)
    }
}

/// Locate the continuous axis for an already resolved orientation
pub fn resolve_continuous_axis(
    encoding: &Encoding,
    orient: Orient,
    composite: &str,
    policy: ForeignAggregatePolicy,
    diagnostics: &mut Diagnostics,
) -> Result<ContinuousAxis> {
    let (channel, discrete_channel) = match orient {
        Orient::Vertical => (Channel::Y, Channel::X),
        Orient::Horizontal => (Channel::X, Channel::Y),
    };

    let mut def = encoding
        .field_def(channel)
        .cloned()
        .ok_or_else(|| continuous_axis_error(composite))?;
    let field = def.field.clone().ok_or_else(|| continuous_axis_error(composite))?;

    if let Some(aggregate) = def.aggregate.take() {
        if !aggregate.is_composite(composite) {
            match policy {
                ForeignAggregatePolicy::Error => {
                    return Err(VlnormError::ValidationError(format!(
                        "Continuous axis should not have customized aggregation function {}",
                        aggregate
                    )));
                }
                ForeignAggregatePolicy::Warn => diagnostics.warn(Warning::ContinuousAxisCustomAggregate {
                    aggregate: aggregate.to_string(),
                    mark: composite.to_string(),
                }),
            }
        }
    }

    let is_1d = !encoding.channel_has_field(discrete_channel);

    Ok(ContinuousAxis {
        orient,
        channel,
        def,
        field,
        discrete_channel,
        is_1d,
    })
}

// ============================================================================
// Composite parameters
// ============================================================================

/// Everything an expander needs after the shared resolution steps
#[derive(Debug, Clone)]
pub struct CompositeParams {
    pub composite: String,
    pub mark_def: MarkDef,
    pub axis: ContinuousAxis,
    pub extracted: ExtractedTransforms,
}

impl CompositeParams {
    /// Filter channels, resolve orientation and axis, extract transforms
    pub fn resolve(
        unit: &UnitSpec,
        policy: ForeignAggregatePolicy,
        diagnostics: &mut Diagnostics,
    ) -> Result<CompositeParams> {
        let mark_def = unit.mark.to_def();
        let composite = mark_def.mark_type.clone();

        let encoding = filter_unsupported_channels(&unit.encoding, &composite, diagnostics);
        let orient = composite_mark_orient(&encoding, &mark_def, &composite)?;
        let axis = resolve_continuous_axis(&encoding, orient, &composite, policy, diagnostics)?;
        let extracted = extract_transforms_from_encoding(
            &encoding.without(&[axis.channel]),
            &composite,
            diagnostics,
        );

        tracing::debug!(
            composite = %composite,
            continuous = %axis.channel,
            is_1d = axis.is_1d,
            "resolved composite mark axes"
        );

        Ok(CompositeParams {
            composite,
            mark_def,
            axis,
            extracted,
        })
    }

    /// Shared encoding of all parts: every non-continuous channel after extraction
    pub fn shared_encoding(&self) -> &Encoding {
        &self.extracted.encoding
    }

    /// Transform pipeline of the output layer:
    /// unit transforms, bins, time units, one aggregate stage, calculates
    pub fn pipeline(
        &self,
        unit_transform: &[Transform],
        aggregate: Vec<AggregatedFieldDef>,
        calculates: Vec<CalculateTransform>,
    ) -> Vec<Transform> {
        let mut all_aggregates = self.extracted.aggregate.clone();
        all_aggregates.extend(aggregate);

        let mut transform = unit_transform.to_vec();
        transform.extend(self.extracted.bins.iter().cloned().map(Transform::from));
        transform.extend(self.extracted.time_units.iter().cloned().map(Transform::from));
        transform.push(Transform::Aggregate(crate::plot::AggregateTransform {
            aggregate: all_aggregates,
            groupby: self.extracted.groupby.clone(),
        }));
        transform.extend(calculates.into_iter().map(Transform::from));
        transform
    }

    /// Whether a part is drawn.
    ///
    /// An explicit setting on the mark definition wins; otherwise the config
    /// default for the part decides, and parts without one are off.
    pub fn part_enabled(&self, part: &str, config: &Config) -> bool {
        match self.mark_def.part(part).filter(|s| s.is_explicit()) {
            Some(setting) => setting.is_enabled(),
            None => config
                .part(&self.composite, part)
                .is_some_and(|s| s.is_enabled()),
        }
    }

    /// Mark of a part, layered from lowest to highest precedence:
    /// built-in `base`, config part, composite color/opacity, part style,
    /// mark-def part. The type and orientation of `base` always win.
    pub fn part_mark(&self, part: &str, base: MarkDef, config: &Config) -> Result<MarkDef> {
        let mut props = match serde_json::to_value(&base)? {
            Value::Object(props) => props,
            _ => Map::new(),
        };
        if let Some(setting) = config.part(&self.composite, part) {
            props.extend(setting.mark_config());
        }
        if let Some(color) = &self.mark_def.color {
            props.insert("color".to_string(), Value::String(color.clone()));
        }
        if let Some(opacity) = self.mark_def.opacity {
            props.insert("opacity".to_string(), Value::from(opacity));
        }
        props.insert(
            "style".to_string(),
            Value::String(naming::part_style(&self.composite, part)),
        );
        if let Some(setting) = self.mark_def.part(part) {
            props.extend(setting.mark_config());
        }

        props.insert("type".to_string(), Value::String(base.mark_type.clone()));
        if let Some(orient) = base.orient {
            props.insert("orient".to_string(), serde_json::to_value(orient)?);
        }

        let mut mark: MarkDef = serde_json::from_value(Value::Object(props))
            .map_err(|e| VlnormError::ConfigError(format!("Invalid {} mark: {}", part, e)))?;
        stamp_overlay_flags(&mut mark);
        Ok(mark)
    }

    /// Build one part layer.
    ///
    /// The continuous channel points at `<start>_<field>` (and the secondary
    /// channel at `<end>_<field>` for ranged parts), followed by `shared`.
    /// Channels the part's primitive mark does not support are dropped.
    pub fn make_part(
        &self,
        part: &str,
        base: MarkDef,
        start: &str,
        end: Option<&str>,
        shared: Encoding,
        config: &Config,
    ) -> Result<Spec> {
        let mark = self.part_mark(part, base, config)?;

        let mut encoding = Encoding::new();
        encoding.insert(self.axis.channel, self.axis.part_field_def(start));
        if let Some(end) = end {
            encoding.insert(self.axis.secondary(), self.axis.end_field_def(end));
        }
        encoding.extend(shared);

        let encoding = match Mark::parse(&mark.mark_type) {
            Some(primitive) => encoding.filtered(|channel| channel.supports_mark(primitive)),
            None => encoding,
        };

        Ok(Spec::Unit(UnitSpec::new(mark, encoding)))
    }

    /// Wrap the parts into the output layer, keeping the unit's outer properties
    pub fn into_layer(self, unit: &UnitSpec, transform: Vec<Transform>, layer: Vec<Spec>) -> LayerSpec {
        LayerSpec {
            transform,
            layer,
            outer: unit.outer.clone(),
        }
    }
}

/// Shared encoding with a constant bound to `channel`, replacing any field
pub fn with_value(mut encoding: Encoding, channel: Channel, value: Value) -> Encoding {
    encoding.insert(channel, ChannelDef::Value(crate::plot::ValueDef { value }));
    encoding
}

/// Line and area marks never get an overlay of their own once expanded
pub fn stamp_overlay_flags(mark: &mut MarkDef) {
    match Mark::parse(&mark.mark_type) {
        Some(Mark::Line) => {
            mark.props.entry("point").or_insert(Value::Bool(false));
        }
        Some(Mark::Area) => {
            mark.props.entry("point").or_insert(Value::Bool(false));
            mark.props.entry("line").or_insert(Value::Bool(false));
        }
        _ => {}
    }
}

/// `datum["<prefix>_<field>"]` expression for calculate transforms
pub fn datum_field(prefix: &str, field: &str) -> String {
    naming::datum(&naming::prefixed(prefix, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unit(value: Value) -> UnitSpec {
        serde_json::from_value(value).unwrap()
    }

    fn encoding(value: Value) -> Encoding {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_filter_unsupported_channels() {
        let enc = encoding(json!({
            "x": {"field": "a", "type": "nominal"},
            "shape": {"field": "s", "type": "nominal"},
            "y": {"field": "b", "type": "quantitative"}
        }));
        let mut diagnostics = Diagnostics::new();
        let filtered = filter_unsupported_channels(&enc, "box-plot", &mut diagnostics);
        assert!(!filtered.contains(Channel::Shape));
        assert_eq!(filtered.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.warnings()[0].to_string(),
            "shape dropped as it is incompatible with \"box-plot\"."
        );
    }

    #[test]
    fn test_orient_single_continuous_axis() {
        let mark = MarkDef::new("errorbar");
        let vertical = encoding(json!({
            "x": {"field": "a", "type": "nominal"},
            "y": {"field": "b", "type": "quantitative"}
        }));
        assert_eq!(
            composite_mark_orient(&vertical, &mark, "errorbar").unwrap(),
            Orient::Vertical
        );

        let horizontal = encoding(json!({"x": {"field": "b", "type": "temporal"}}));
        assert_eq!(
            composite_mark_orient(&horizontal, &mark, "errorbar").unwrap(),
            Orient::Horizontal
        );
    }

    #[test]
    fn test_orient_both_continuous() {
        let mark = MarkDef::new("box-plot");
        let by_aggregate = encoding(json!({
            "x": {"field": "a", "type": "quantitative", "aggregate": "box-plot"},
            "y": {"field": "b", "type": "quantitative"}
        }));
        assert_eq!(
            composite_mark_orient(&by_aggregate, &mark, "box-plot").unwrap(),
            Orient::Horizontal
        );

        let plain = encoding(json!({
            "x": {"field": "a", "type": "quantitative"},
            "y": {"field": "b", "type": "quantitative"}
        }));
        assert_eq!(
            composite_mark_orient(&plain, &mark, "box-plot").unwrap(),
            Orient::Vertical
        );
        let explicit = MarkDef::new("box-plot").with_orient(Orient::Horizontal);
        assert_eq!(
            composite_mark_orient(&plain, &explicit, "box-plot").unwrap(),
            Orient::Horizontal
        );

        let both = encoding(json!({
            "x": {"field": "a", "type": "quantitative", "aggregate": "box-plot"},
            "y": {"field": "b", "type": "quantitative", "aggregate": "box-plot"}
        }));
        let err = composite_mark_orient(&both, &mark, "box-plot").unwrap_err();
        assert!(err.to_string().contains("Both x and y cannot have aggregate"));
    }

    #[test]
    fn test_orient_errors() {
        let mark = MarkDef::new("errorband");
        let discrete = encoding(json!({
            "x": {"field": "a", "type": "nominal"},
            "y": {"field": "b", "type": "ordinal"}
        }));
        let err = composite_mark_orient(&discrete, &mark, "errorband").unwrap_err();
        assert!(err.to_string().contains("continuous axis"));

        let conflicting = MarkDef::new("errorband").with_orient(Orient::Horizontal);
        let vertical = encoding(json!({
            "x": {"field": "a", "type": "nominal"},
            "y": {"field": "b", "type": "quantitative"}
        }));
        assert!(matches!(
            composite_mark_orient(&vertical, &conflicting, "errorband"),
            Err(VlnormError::ValidationError(_))
        ));
    }

    #[test]
    fn test_resolve_continuous_axis_strips_composite_aggregate() {
        let enc = encoding(json!({
            "x": {"field": "a", "type": "nominal"},
            "y": {"field": "b", "type": "quantitative", "aggregate": "errorbar"}
        }));
        let mut diagnostics = Diagnostics::new();
        let axis = resolve_continuous_axis(
            &enc,
            Orient::Vertical,
            "errorbar",
            ForeignAggregatePolicy::Warn,
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(axis.channel, Channel::Y);
        assert_eq!(axis.field, "b");
        assert!(axis.def.aggregate.is_none());
        assert!(!axis.is_1d);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_resolve_continuous_axis_foreign_aggregate() {
        let enc = encoding(json!({
            "y": {"field": "b", "type": "quantitative", "aggregate": "mean"}
        }));
        let mut diagnostics = Diagnostics::new();
        let axis = resolve_continuous_axis(
            &enc,
            Orient::Vertical,
            "errorbar",
            ForeignAggregatePolicy::Warn,
            &mut diagnostics,
        )
        .unwrap();
        assert!(axis.is_1d);
        assert!(axis.def.aggregate.is_none());
        assert!(matches!(
            diagnostics.warnings()[0],
            Warning::ContinuousAxisCustomAggregate { .. }
        ));

        let err = resolve_continuous_axis(
            &enc,
            Orient::Vertical,
            "box-plot",
            ForeignAggregatePolicy::Error,
            &mut Diagnostics::new(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Continuous axis should not have customized aggregation function mean"
        );
    }

    #[test]
    fn test_part_mark_precedence() {
        let spec = unit(json!({
            "mark": {"type": "errorbar", "color": "red", "ticks": {"color": "blue", "size": 8}},
            "encoding": {"y": {"field": "b", "type": "quantitative"}}
        }));
        let config = Config::from_user(&json!({"errorbar": {"rule": {"opacity": 0.3, "color": "gray"}}}))
            .unwrap();
        let params =
            CompositeParams::resolve(&spec, ForeignAggregatePolicy::Warn, &mut Diagnostics::new())
                .unwrap();

        let rule = params
            .part_mark("rule", MarkDef::new("rule").with_orient(Orient::Vertical), &config)
            .unwrap();
        assert_eq!(rule.color.as_deref(), Some("red"));
        assert_eq!(rule.opacity, Some(0.3));
        assert_eq!(rule.style.as_deref(), Some("errorbar-rule"));

        let ticks = params
            .part_mark("ticks", MarkDef::new("tick"), &config)
            .unwrap();
        assert_eq!(ticks.color.as_deref(), Some("blue"));
        assert_eq!(ticks.props.get("size"), Some(&json!(8)));
    }

    #[test]
    fn test_config_part_overrides_builtin_mark() {
        let spec = unit(json!({
            "mark": {"type": "errorbar", "ticks": {"orient": "vertical", "type": "rule"}},
            "encoding": {"y": {"field": "b", "type": "quantitative"}}
        }));
        let config = Config::from_user(&json!({"errorbar": {"point": {"filled": false}}})).unwrap();
        let params =
            CompositeParams::resolve(&spec, ForeignAggregatePolicy::Warn, &mut Diagnostics::new())
                .unwrap();

        let point = params
            .part_mark("point", MarkDef::new("point").with_filled(true), &config)
            .unwrap();
        assert_eq!(point.filled, Some(false));
        assert_eq!(point.style.as_deref(), Some("errorbar-point"));

        let ticks = params
            .part_mark("ticks", MarkDef::new("tick").with_orient(Orient::Horizontal), &config)
            .unwrap();
        assert_eq!(ticks.mark_type, "tick");
        assert_eq!(ticks.orient, Some(Orient::Horizontal));
    }

    #[test]
    fn test_part_enabled() {
        let spec = unit(json!({
            "mark": {"type": "errorbar", "rule": false, "ticks": {}, "point": {"filled": true}},
            "encoding": {"y": {"field": "b", "type": "quantitative"}}
        }));
        let config = Config::default();
        let params =
            CompositeParams::resolve(&spec, ForeignAggregatePolicy::Warn, &mut Diagnostics::new())
                .unwrap();

        assert!(!params.part_enabled("rule", &config));
        assert!(!params.part_enabled("ticks", &config));
        assert!(params.part_enabled("point", &config));
        assert!(!params.part_enabled("bar", &config));
    }

    #[test]
    fn test_make_part_drops_unsupported_channels() {
        let spec = unit(json!({
            "mark": "errorbar",
            "encoding": {
                "x": {"field": "a", "type": "nominal"},
                "y": {"field": "b", "type": "quantitative", "title": "Bees"},
                "size": {"value": 3}
            }
        }));
        let params =
            CompositeParams::resolve(&spec, ForeignAggregatePolicy::Warn, &mut Diagnostics::new())
                .unwrap();
        let part = params
            .make_part(
                "line",
                MarkDef::new("area"),
                "center",
                None,
                params.shared_encoding().clone(),
                &Config::default(),
            )
            .unwrap();

        match part {
            Spec::Unit(unit) => {
                let y = unit.encoding.field_def(Channel::Y).unwrap();
                assert_eq!(y.field.as_deref(), Some("center_b"));
                assert_eq!(y.title.as_deref(), Some("Bees"));
                assert!(unit.encoding.contains(Channel::X));
                assert!(!unit.encoding.contains(Channel::Size));
                let mark = unit.mark.to_def();
                assert_eq!(mark.flag("point"), Some(false));
                assert_eq!(mark.flag("line"), Some(false));
            }
            other => panic!("expected unit spec, got {:?}", other),
        }
    }
}
