//! Transform extraction
//!
//! Splits the implicit bin/timeUnit/aggregate modifiers of an encoding into
//! explicit transform stages plus the residual grouping fields, and rewrites
//! each field reference to the name its transform produces.

use super::encoding::Encoding;
use super::fielddef::{Bin, Binned, ChannelDef, FieldDef, FieldNameOptions};
use super::transform::{AggregatedFieldDef, BinTransform, TimeUnitTransform};
use crate::diagnostics::{Diagnostics, Warning};

/// Explicit pipeline pieces pulled out of an encoding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedTransforms {
    pub bins: Vec<BinTransform>,
    pub time_units: Vec<TimeUnitTransform>,
    pub aggregate: Vec<AggregatedFieldDef>,
    pub groupby: Vec<String>,
    /// Input encoding with modifiers stripped and fields renamed
    pub encoding: Encoding,
}

impl ExtractedTransforms {
    fn extract_field_def(&mut self, def: &FieldDef) -> FieldDef {
        let name = def
            .canonical_field_name(&FieldNameOptions::for_as())
            .unwrap_or_default();

        match def.aggregate.as_ref().and_then(|a| a.op()) {
            Some(op) => self.aggregate.push(AggregatedFieldDef {
                op,
                field: def.field.clone(),
                as_field: name.clone(),
            }),
            None => {
                if let (Some(bin), Some(field)) = (def.bin.as_ref().filter(|b| b.needs_transform()), &def.field) {
                    self.bins.push(BinTransform {
                        bin: bin.clone(),
                        field: field.clone(),
                        as_field: name.clone(),
                    });
                } else if let (Some(time_unit), Some(field)) = (&def.time_unit, &def.field) {
                    self.time_units.push(TimeUnitTransform {
                        time_unit: time_unit.clone(),
                        field: field.clone(),
                        as_field: name.clone(),
                    });
                }
                self.groupby.push(name.clone());
            }
        }

        // Binned fields stay discrete after the rename
        let mut rewritten = def.clone();
        rewritten.field = Some(name);
        rewritten.bin = def
            .bin
            .as_ref()
            .filter(|b| b.is_enabled())
            .map(|_| Bin::Binned(Binned::Binned));
        rewritten.time_unit = None;
        rewritten.aggregate = None;
        rewritten
    }
}

/// Extract transforms from every channel of `encoding`, in declaration order.
///
/// A non-operation aggregate (a composite-mark tag) outside the continuous
/// axis is ignored with a warning and the field becomes a grouping key.
pub fn extract_transforms_from_encoding(
    encoding: &Encoding,
    mark: &str,
    diagnostics: &mut Diagnostics,
) -> ExtractedTransforms {
    let mut extracted = ExtractedTransforms::default();

    for (channel, channel_def) in encoding.iter() {
        let channel = *channel;
        let mut strip_foreign = |def: &FieldDef| -> FieldDef {
            let mut def = def.clone();
            if let Some(aggregate) = def.aggregate.take_if(|a| a.op().is_none()) {
                diagnostics.warn(Warning::NonOpAggregate {
                    channel,
                    aggregate: aggregate.to_string(),
                    mark: mark.to_string(),
                });
            }
            def
        };

        let rewritten = match channel_def {
            ChannelDef::Field(def) => {
                let def = strip_foreign(def);
                ChannelDef::Field(extracted.extract_field_def(&def))
            }
            ChannelDef::FieldList(defs) => {
                let defs: Vec<FieldDef> = defs.iter().map(&mut strip_foreign).collect();
                ChannelDef::FieldList(
                    defs.iter()
                        .map(|def| extracted.extract_field_def(def))
                        .collect(),
                )
            }
            ChannelDef::Value(_) => channel_def.clone(),
        };
        extracted.encoding.insert(channel, rewritten);
    }

    extracted
}
