//! Stack properties
//!
//! Decides whether a bar or area unit stacks, along which channel, and by
//! which fields, then synthesizes the stack (and, for areas, impute) stages.
//! The numeric stacking itself is left to whoever runs the transforms.

use serde_json::Value;

use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::naming;
use crate::plot::{
    BinSuffix, Channel, ChannelDef, Encoding, FieldDef, FieldNameOptions, ImputeTransform, Mark,
    ScaleMap, ScaleType, StackOffset, StackOutput, StackTransform, Transform,
    STACK_GROUP_CHANNELS,
};

/// How a unit stacks
#[derive(Debug, Clone, PartialEq)]
pub struct StackProperties {
    /// Dimension channel whose values each form one stack
    pub groupby_channel: Option<Channel>,
    /// Measure channel whose values are stacked
    pub field_channel: Channel,
    /// Fields whose value combinations identify one segment of a stack
    pub stack_fields: Vec<String>,
    pub offset: StackOffset,
    /// Missing segments are filled with zero before drawing (area marks)
    pub impute: bool,
}

fn is_measure(encoding: &Encoding, channel: Channel) -> bool {
    encoding.field_def(channel).is_some_and(FieldDef::is_measure)
}

/// Field names of the stack-by channels (`color`, `detail`) in encoding order
fn stack_fields(encoding: &Encoding, scales: &ScaleMap) -> Vec<String> {
    let mut fields = Vec::new();
    for (channel, def) in encoding.iter() {
        if !STACK_GROUP_CHANNELS.contains(channel) {
            continue;
        }
        match def {
            ChannelDef::Field(field_def) => {
                let suffix = if scales.get(channel) == Some(&ScaleType::Ordinal) {
                    BinSuffix::Range
                } else {
                    BinSuffix::Start
                };
                fields.extend(
                    field_def.canonical_field_name(&FieldNameOptions::with_bin_suffix(suffix)),
                );
            }
            ChannelDef::FieldList(defs) => {
                fields.extend(defs.iter().filter_map(FieldDef::field_expr));
            }
            ChannelDef::Value(_) => {}
        }
    }
    fields
}

/// Stack properties of a primitive unit, or `None` when it does not stack.
///
/// Stacking applies to aggregated bar and area marks with exactly one measure
/// axis and at least one `color`/`detail` field. A non-linear scale or a
/// secondary channel on the measure axis prevents stacking with a warning.
pub fn compute_stack_properties(
    mark: Mark,
    encoding: &Encoding,
    scales: &ScaleMap,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Option<StackProperties> {
    if !matches!(mark, Mark::Bar | Mark::Area) || !encoding.is_aggregate() {
        return None;
    }

    let (field_channel, groupby_channel) =
        match (is_measure(encoding, Channel::X), is_measure(encoding, Channel::Y)) {
            (true, false) => (Channel::X, Channel::Y),
            (false, true) => (Channel::Y, Channel::X),
            _ => return None,
        };

    let offset = encoding
        .field_def(field_channel)
        .and_then(|def| def.stack)
        .unwrap_or(config.stack);
    if offset == StackOffset::None {
        return None;
    }

    let stack_fields = stack_fields(encoding, scales);
    if stack_fields.is_empty() {
        return None;
    }

    if let Some(secondary) = field_channel.secondary() {
        if encoding.contains(secondary) {
            diagnostics.warn(Warning::CannotStackRangedMark {
                channel: field_channel,
            });
            return None;
        }
    }
    if let Some(scale_type) = scales.get(&field_channel) {
        if *scale_type != ScaleType::Linear {
            diagnostics.warn(Warning::CannotStackNonLinearScale {
                scale_type: scale_type.to_string(),
            });
            return None;
        }
    }

    Some(StackProperties {
        groupby_channel: encoding
            .channel_has_field(groupby_channel)
            .then_some(groupby_channel),
        field_channel,
        stack_fields,
        offset,
        impute: mark == Mark::Area,
    })
}

fn sort_field(def: &FieldDef) -> Option<String> {
    let field = def.field_expr()?;
    let descending = def.sort.as_ref().and_then(Value::as_str) == Some("descending");
    Some(if descending { format!("-{}", field) } else { field })
}

impl StackProperties {
    /// Start and end fields the stacked measure is drawn from
    pub fn field_range(&self, encoding: &Encoding) -> Option<(String, String)> {
        let field = encoding.field_def(self.field_channel)?.field_expr()?;
        Some((naming::stack_start(&field), naming::stack_end(&field)))
    }

    /// Stack stage, followed by an impute stage for areas
    pub fn transforms(&self, encoding: &Encoding) -> Vec<Transform> {
        let Some(field) = encoding
            .field_def(self.field_channel)
            .and_then(FieldDef::field_expr)
        else {
            return Vec::new();
        };
        let groupby: Vec<String> = self
            .groupby_channel
            .and_then(|channel| encoding.field_def(channel))
            .and_then(FieldDef::field_expr)
            .into_iter()
            .collect();

        let sortby = match encoding.get(Channel::Order) {
            Some(ChannelDef::Field(def)) => sort_field(def).into_iter().collect(),
            Some(ChannelDef::FieldList(defs)) => defs.iter().filter_map(sort_field).collect(),
            _ => self
                .stack_fields
                .iter()
                .map(|f| format!("-{}", f))
                .collect(),
        };

        let mut transforms = vec![Transform::Stack(StackTransform {
            groupby: groupby.clone(),
            field: field.clone(),
            sortby,
            output: StackOutput {
                start: naming::stack_start(&field),
                end: naming::stack_end(&field),
            },
            offset: (self.offset != StackOffset::Zero).then_some(self.offset),
        })];

        if self.impute {
            if let Some(key) = groupby.into_iter().next() {
                transforms.push(Transform::Impute(ImputeTransform {
                    impute: field,
                    key,
                    groupby: self.stack_fields.clone(),
                    value: Some(Value::from(0)),
                }));
            }
        }

        transforms
    }
}
