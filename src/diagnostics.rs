//! Warning side channel for normalization.
//!
//! Recoverable problems (dropped channels, questionable center/extent pairs,
//! unstackable encodings) never alter control flow. They are pushed into a
//! [`Diagnostics`] sink in traversal order and also logged through `tracing`.

use std::fmt;

use crate::plot::Channel;

/// A recoverable problem found while normalizing a specification
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Channel is not supported by the mark and was dropped
    IncompatibleChannel { channel: Channel, mark: String },
    /// Field definition without a field (and not a count) was dropped
    EmptyFieldDef { channel: Channel },
    /// Channel does not accept a list of field definitions
    FieldListNotSupported { channel: Channel },
    /// Facet channel appeared where faceting is not allowed
    FacetChannelDropped { channel: Channel },
    /// Continuous axis of a composite mark carried a different aggregate
    ContinuousAxisCustomAggregate { aggregate: String, mark: String },
    /// Non-positional channel carried an aggregate that is not an aggregate op
    NonOpAggregate {
        channel: Channel,
        aggregate: String,
        mark: String,
    },
    /// Center and extent do not describe the same statistic family
    CenterExtentMismatch {
        center: String,
        extent: String,
        mark: String,
    },
    /// Center was given alongside an extent that does not use it
    CenterNotNeeded { extent: String, mark: String },
    /// Extent value is not valid for the composite mark
    InvalidExtent { extent: String, mark: String },
    /// Property has no effect on a one-dimensional error band
    ErrorBand1DNotSupported { property: String },
    /// Stacking requires a linear scale on the stacked channel
    CannotStackNonLinearScale { scale_type: String },
    /// Stacking is not applied to ranged marks
    CannotStackRangedMark { channel: Channel },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::IncompatibleChannel { channel, mark } => {
                write!(f, "{} dropped as it is incompatible with \"{}\".", channel, mark)
            }
            Warning::EmptyFieldDef { channel } => {
                write!(
                    f,
                    "Dropping field definition from channel \"{}\" since it does not contain any data field.",
                    channel
                )
            }
            Warning::FieldListNotSupported { channel } => {
                write!(f, "Channel \"{}\" does not accept a list of field definitions; dropped.", channel)
            }
            Warning::FacetChannelDropped { channel } => {
                write!(f, "{} dropped as facets cannot be nested inside this specification.", channel)
            }
            Warning::ContinuousAxisCustomAggregate { aggregate, mark } => write!(
                f,
                "Continuous axis should not have customized aggregation function {}; {} already aggregates the axis.",
                aggregate, mark
            ),
            Warning::NonOpAggregate {
                channel,
                aggregate,
                mark,
            } => write!(
                f,
                "Aggregate \"{}\" on channel {} is not an aggregate operation for {}; treated as a grouping field.",
                aggregate, channel, mark
            ),
            Warning::CenterExtentMismatch {
                center,
                extent,
                mark,
            } => write!(
                f,
                "{} is not usually used with {} for {}.",
                center, extent, mark
            ),
            Warning::CenterNotNeeded { extent, mark } => write!(
                f,
                "Center is not needed to be specified in {} when extent is {}.",
                mark, extent
            ),
            Warning::InvalidExtent { extent, mark } => {
                write!(f, "Invalid extent {} for {}; using the default.", extent, mark)
            }
            Warning::ErrorBand1DNotSupported { property } => {
                write!(f, "1D error band does not support {}.", property)
            }
            Warning::CannotStackNonLinearScale { scale_type } => {
                write!(f, "Cannot stack non-linear scale ({}).", scale_type)
            }
            Warning::CannotStackRangedMark { channel } => write!(
                f,
                "Cannot stack \"{}\" if there is already \"{}2\".",
                channel, channel
            ),
        }
    }
}

/// Ordered collection of warnings produced during one normalization call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Warnings in the order they were recorded
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Consume the sink, returning the recorded warnings
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_channel_message() {
        let warning = Warning::IncompatibleChannel {
            channel: Channel::Shape,
            mark: "box-plot".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "shape dropped as it is incompatible with \"box-plot\"."
        );
    }

    #[test]
    fn test_diagnostics_preserve_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(Warning::EmptyFieldDef {
            channel: Channel::Color,
        });
        diagnostics.warn(Warning::CannotStackRangedMark { channel: Channel::Y });

        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            diagnostics.warnings()[0],
            Warning::EmptyFieldDef { .. }
        ));
        assert_eq!(
            diagnostics.warnings()[1].to_string(),
            "Cannot stack \"y\" if there is already \"y2\"."
        );
    }
}
