//! Encoding channel registry
//!
//! Static metadata about every encoding channel: which marks accept it, which
//! roles (dimension/measure) it can play, and which scales it can carry.
//! All lookups are exhaustive matches over the closed [`Channel`] set.

use serde::{Deserialize, Serialize};

use super::mark::Mark;
use super::scale::ScaleType;

/// Closed set of encoding channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Row,
    Column,
    X,
    Y,
    X2,
    Y2,
    Color,
    Opacity,
    Size,
    Shape,
    Detail,
    Text,
    Tooltip,
    Order,
}

/// Every channel, in canonical order
pub const ALL_CHANNELS: &[Channel] = &[
    Channel::Row,
    Channel::Column,
    Channel::X,
    Channel::Y,
    Channel::X2,
    Channel::Y2,
    Channel::Color,
    Channel::Opacity,
    Channel::Size,
    Channel::Shape,
    Channel::Detail,
    Channel::Text,
    Channel::Tooltip,
    Channel::Order,
];

/// Channels whose stack grouping fields define stacked segments
pub const STACK_GROUP_CHANNELS: &[Channel] = &[Channel::Color, Channel::Detail];

const ALL_MARKS: &[Mark] = &[
    Mark::Area,
    Mark::Bar,
    Mark::Circle,
    Mark::Line,
    Mark::Point,
    Mark::Rect,
    Mark::Rule,
    Mark::Square,
    Mark::Text,
    Mark::Tick,
];

const RANGED_MARKS: &[Mark] = &[Mark::Area, Mark::Bar, Mark::Rect, Mark::Rule];

const SIZED_MARKS: &[Mark] = &[
    Mark::Bar,
    Mark::Circle,
    Mark::Line,
    Mark::Point,
    Mark::Rule,
    Mark::Square,
    Mark::Text,
    Mark::Tick,
];

/// Which roles a channel can play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedRole {
    pub dimension: bool,
    pub measure: bool,
}

/// Kind of output range a channel's scale maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeType {
    Continuous,
    Discrete,
    /// Either, depending on the field type (color)
    Flexible,
}

impl Channel {
    /// Canonical channel name
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Row => "row",
            Channel::Column => "column",
            Channel::X => "x",
            Channel::Y => "y",
            Channel::X2 => "x2",
            Channel::Y2 => "y2",
            Channel::Color => "color",
            Channel::Opacity => "opacity",
            Channel::Size => "size",
            Channel::Shape => "shape",
            Channel::Detail => "detail",
            Channel::Text => "text",
            Channel::Tooltip => "tooltip",
            Channel::Order => "order",
        }
    }

    /// Whether this channel partitions the view into facets
    pub fn is_facet(&self) -> bool {
        matches!(self, Channel::Row | Channel::Column)
    }

    /// Whether the channel accepts an ordered list of field definitions
    pub fn accepts_field_list(&self) -> bool {
        matches!(self, Channel::Detail | Channel::Order | Channel::Tooltip)
    }

    /// Secondary (range end) channel of a primary position channel
    pub fn secondary(&self) -> Option<Channel> {
        match self {
            Channel::X => Some(Channel::X2),
            Channel::Y => Some(Channel::Y2),
            _ => None,
        }
    }

    /// Marks that accept this channel
    pub fn supported_marks(&self) -> &'static [Mark] {
        match self {
            Channel::Row
            | Channel::Column
            | Channel::X
            | Channel::Y
            | Channel::Color
            | Channel::Opacity
            | Channel::Detail
            | Channel::Tooltip
            | Channel::Order => ALL_MARKS,
            Channel::X2 | Channel::Y2 => RANGED_MARKS,
            Channel::Size => SIZED_MARKS,
            Channel::Shape => &[Mark::Point],
            Channel::Text => &[Mark::Text],
        }
    }

    /// Whether `mark` accepts this channel
    pub fn supports_mark(&self, mark: Mark) -> bool {
        self.supported_marks().contains(&mark)
    }

    /// Roles this channel can play
    pub fn supported_role(&self) -> SupportedRole {
        match self {
            Channel::X
            | Channel::Y
            | Channel::Color
            | Channel::Opacity
            | Channel::Detail
            | Channel::Text
            | Channel::Tooltip
            | Channel::Order => SupportedRole {
                dimension: true,
                measure: true,
            },
            Channel::Row | Channel::Column | Channel::Shape => SupportedRole {
                dimension: true,
                measure: false,
            },
            Channel::X2 | Channel::Y2 | Channel::Size => SupportedRole {
                dimension: false,
                measure: true,
            },
        }
    }

    /// Whether the channel is mapped through a scale
    pub fn has_scale(&self) -> bool {
        !matches!(
            self,
            Channel::Row
                | Channel::Column
                | Channel::Detail
                | Channel::Text
                | Channel::Tooltip
                | Channel::Order
        )
    }

    /// Whether a scale of `scale_type` can be used on this channel
    pub fn supports_scale_type(&self, scale_type: ScaleType) -> bool {
        if !self.has_scale() {
            return false;
        }
        match self {
            Channel::X
            | Channel::Y
            | Channel::X2
            | Channel::Y2
            | Channel::Size
            | Channel::Opacity => {
                scale_type.is_continuous_to_continuous()
                    || matches!(scale_type, ScaleType::Band | ScaleType::Point)
            }
            Channel::Color => scale_type != ScaleType::Band,
            Channel::Shape => scale_type == ScaleType::Ordinal,
            _ => false,
        }
    }

    /// Kind of range this channel's scale produces; `None` for channels without one
    pub fn range_type(&self) -> Option<RangeType> {
        match self {
            Channel::X
            | Channel::Y
            | Channel::X2
            | Channel::Y2
            | Channel::Size
            | Channel::Opacity => Some(RangeType::Continuous),
            Channel::Row | Channel::Column | Channel::Shape | Channel::Text | Channel::Tooltip => {
                Some(RangeType::Discrete)
            }
            Channel::Color => Some(RangeType::Flexible),
            Channel::Detail | Channel::Order => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_serde_names() {
        assert_eq!(serde_json::to_string(&Channel::X2).unwrap(), "\"x2\"");
        let channel: Channel = serde_json::from_str("\"tooltip\"").unwrap();
        assert_eq!(channel, Channel::Tooltip);
        for channel in ALL_CHANNELS {
            let json = serde_json::to_value(channel).unwrap();
            assert_eq!(json, serde_json::json!(channel.as_str()));
        }
    }

    #[test]
    fn test_supports_mark() {
        assert!(Channel::Shape.supports_mark(Mark::Point));
        assert!(!Channel::Shape.supports_mark(Mark::Bar));
        assert!(Channel::Y2.supports_mark(Mark::Area));
        assert!(!Channel::Y2.supports_mark(Mark::Tick));
        assert!(!Channel::Size.supports_mark(Mark::Area));
        assert!(Channel::Text.supports_mark(Mark::Text));
        assert!(Channel::Detail.supports_mark(Mark::Line));
    }

    #[test]
    fn test_supported_role() {
        assert_eq!(
            Channel::Shape.supported_role(),
            SupportedRole {
                dimension: true,
                measure: false
            }
        );
        assert!(!Channel::Size.supported_role().dimension);
        assert!(Channel::X.supported_role().measure);
    }

    #[test]
    fn test_scale_support() {
        assert!(!Channel::Detail.has_scale());
        assert!(!Channel::Row.has_scale());
        assert!(Channel::X.supports_scale_type(ScaleType::Log));
        assert!(Channel::X.supports_scale_type(ScaleType::Band));
        assert!(!Channel::X.supports_scale_type(ScaleType::Ordinal));
        assert!(Channel::Color.supports_scale_type(ScaleType::Ordinal));
        assert!(!Channel::Color.supports_scale_type(ScaleType::Band));
        assert!(Channel::Shape.supports_scale_type(ScaleType::Ordinal));
        assert!(!Channel::Shape.supports_scale_type(ScaleType::Linear));
        assert!(!Channel::Order.supports_scale_type(ScaleType::Linear));
    }

    #[test]
    fn test_range_type() {
        assert_eq!(Channel::Size.range_type(), Some(RangeType::Continuous));
        assert_eq!(Channel::Shape.range_type(), Some(RangeType::Discrete));
        assert_eq!(Channel::Color.range_type(), Some(RangeType::Flexible));
        assert_eq!(Channel::Detail.range_type(), None);
    }
}
