//! Encoding mapping and per-channel utilities
//!
//! An [`Encoding`] keeps channels in declaration order; every derived transform
//! array is built by walking it, so the order is part of the output format.
//! Edits produce new mappings (projections) rather than deleting in place, so
//! one encoding can be shared safely across the parts of a composite mark.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::channel::Channel;
use super::fielddef::{ChannelDef, FieldDef};
use super::mark::Mark;
use crate::diagnostics::{Diagnostics, Warning};

/// Ordered channel to definition mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoding {
    channels: IndexMap<Channel, ChannelDef>,
}

impl Encoding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: Channel) -> Option<&ChannelDef> {
        self.channels.get(&channel)
    }

    /// Insert or replace a channel; a new channel goes last
    pub fn insert(&mut self, channel: Channel, def: impl Into<ChannelDef>) {
        self.channels.insert(channel, def.into());
    }

    /// Remove a channel, keeping the order of the rest
    pub fn remove(&mut self, channel: Channel) -> Option<ChannelDef> {
        self.channels.shift_remove(&channel)
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Channel, &ChannelDef)> {
        self.channels.iter()
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.channels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Single field definition bound to `channel`
    pub fn field_def(&self, channel: Channel) -> Option<&FieldDef> {
        self.get(channel).and_then(ChannelDef::as_field_def)
    }

    /// Whether `channel` is bound to at least one data field
    pub fn channel_has_field(&self, channel: Channel) -> bool {
        self.get(channel)
            .is_some_and(|def| def.field_defs().iter().any(|d| d.has_field()))
    }

    /// Whether any channel carries an aggregate
    pub fn is_aggregate(&self) -> bool {
        self.channels.values().any(|def| {
            def.field_defs()
                .iter()
                .any(|d| d.aggregate.as_ref().is_some_and(|a| a.op().is_some()))
        })
    }

    /// New mapping with the listed channels removed
    pub fn without(&self, channels: &[Channel]) -> Encoding {
        self.filtered(|channel| !channels.contains(&channel))
    }

    /// New mapping keeping only the listed channels
    pub fn only(&self, channels: &[Channel]) -> Encoding {
        self.filtered(|channel| channels.contains(&channel))
    }

    /// New mapping keeping the channels accepted by `keep`
    pub fn filtered(&self, mut keep: impl FnMut(Channel) -> bool) -> Encoding {
        self.channels
            .iter()
            .filter(|(channel, _)| keep(**channel))
            .map(|(channel, def)| (*channel, def.clone()))
            .collect()
    }

    /// Append all channels of `other`, replacing existing ones in place
    pub fn extend(&mut self, other: Encoding) {
        self.channels.extend(other.channels);
    }
}

impl FromIterator<(Channel, ChannelDef)> for Encoding {
    fn from_iter<I: IntoIterator<Item = (Channel, ChannelDef)>>(iter: I) -> Self {
        Self {
            channels: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Encoding {
    type Item = (Channel, ChannelDef);
    type IntoIter = indexmap::map::IntoIter<Channel, ChannelDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.into_iter()
    }
}

/// Drop channels the mark does not support, field lists on channels that take
/// a single definition, and field definitions that reference no data.
pub fn normalize_encoding(encoding: &Encoding, mark: Mark, diagnostics: &mut Diagnostics) -> Encoding {
    let mut normalized = Encoding::new();

    for (channel, def) in encoding.iter() {
        let channel = *channel;
        if !channel.supports_mark(mark) {
            diagnostics.warn(Warning::IncompatibleChannel {
                channel,
                mark: mark.to_string(),
            });
            continue;
        }

        match def {
            ChannelDef::FieldList(defs) => {
                if !channel.accepts_field_list() {
                    diagnostics.warn(Warning::FieldListNotSupported { channel });
                    continue;
                }
                let kept: Vec<FieldDef> = defs
                    .iter()
                    .filter(|d| {
                        if d.has_field() {
                            true
                        } else {
                            diagnostics.warn(Warning::EmptyFieldDef { channel });
                            false
                        }
                    })
                    .cloned()
                    .collect();
                if !kept.is_empty() {
                    normalized.insert(channel, ChannelDef::FieldList(kept));
                }
            }
            ChannelDef::Field(field_def) => {
                if !field_def.has_field() {
                    diagnostics.warn(Warning::EmptyFieldDef { channel });
                    continue;
                }
                normalized.insert(channel, def.clone());
            }
            ChannelDef::Value(_) => normalized.insert(channel, def.clone()),
        }
    }

    normalized
}
