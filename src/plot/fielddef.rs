//! Channel definitions and field-reference resolution
//!
//! A channel is bound either to a data field (possibly binned, time-unit
//! converted or aggregated), to a constant value, or, on the channels that
//! accept one, to an ordered list of field references. [`ChannelDef`] models
//! the three shapes as a sum type; consumers match exhaustively instead of
//! sniffing object keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::transform::StackOffset;
use crate::naming;

// ============================================================================
// Field modifiers
// ============================================================================

/// Data type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Ordinal,
    Temporal,
    Nominal,
}

/// Marker for fields that already hold bin starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binned {
    Binned,
}

/// Binning request: `true`, a parameter object such as `{"maxbins": 10}`, or
/// `"binned"` for a field produced by an earlier bin transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bin {
    Flag(bool),
    Binned(Binned),
    Params(Map<String, Value>),
}

impl Bin {
    /// The field is binned, either by a pending transform or already
    pub fn is_enabled(&self) -> bool {
        match self {
            Bin::Flag(enabled) => *enabled,
            Bin::Binned(_) | Bin::Params(_) => true,
        }
    }

    /// A bin transform still has to run for this field
    pub fn needs_transform(&self) -> bool {
        match self {
            Bin::Flag(enabled) => *enabled,
            Bin::Binned(_) => false,
            Bin::Params(_) => true,
        }
    }

    /// Function name of a binned field: `bin`, or `bin_<key>_<value>...` for parameters
    pub fn prefix(&self) -> String {
        match self {
            Bin::Flag(_) | Bin::Binned(_) => naming::BIN_PREFIX.to_string(),
            Bin::Params(params) => {
                let mut prefix = naming::BIN_PREFIX.to_string();
                for (key, value) in params {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    prefix.push_str(&naming::var_name(&format!("_{}_{}", key, value)));
                }
                prefix
            }
        }
    }
}

/// Aggregate operations understood by the aggregate transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Count,
    Valid,
    Missing,
    Distinct,
    Sum,
    Mean,
    Average,
    Variance,
    Variancep,
    Stdev,
    Stdevp,
    Stderr,
    Median,
    Q1,
    Q3,
    Ci0,
    Ci1,
    Min,
    Max,
    Argmin,
    Argmax,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Count => "count",
            AggregateOp::Valid => "valid",
            AggregateOp::Missing => "missing",
            AggregateOp::Distinct => "distinct",
            AggregateOp::Sum => "sum",
            AggregateOp::Mean => "mean",
            AggregateOp::Average => "average",
            AggregateOp::Variance => "variance",
            AggregateOp::Variancep => "variancep",
            AggregateOp::Stdev => "stdev",
            AggregateOp::Stdevp => "stdevp",
            AggregateOp::Stderr => "stderr",
            AggregateOp::Median => "median",
            AggregateOp::Q1 => "q1",
            AggregateOp::Q3 => "q3",
            AggregateOp::Ci0 => "ci0",
            AggregateOp::Ci1 => "ci1",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Argmin => "argmin",
            AggregateOp::Argmax => "argmax",
        }
    }
}

impl std::fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate on a field definition
///
/// Besides real operations, a continuous axis may name a composite mark
/// (`"aggregate": "box-plot"`) to say which axis the composite summarizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Aggregate {
    Op(AggregateOp),
    Composite(String),
}

impl Aggregate {
    pub fn as_str(&self) -> &str {
        match self {
            Aggregate::Op(op) => op.as_str(),
            Aggregate::Composite(tag) => tag,
        }
    }

    pub fn op(&self) -> Option<AggregateOp> {
        match self {
            Aggregate::Op(op) => Some(*op),
            Aggregate::Composite(_) => None,
        }
    }

    /// Whether this names the composite mark `tag`
    pub fn is_composite(&self, tag: &str) -> bool {
        matches!(self, Aggregate::Composite(t) if t == tag)
    }
}

impl std::fmt::Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Channel definitions
// ============================================================================

/// Field reference bound to a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<Bin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackOffset>,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

/// Constant bound to a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDef {
    pub value: Value,
}

impl ValueDef {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Anything a channel can be bound to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelDef {
    FieldList(Vec<FieldDef>),
    Field(FieldDef),
    Value(ValueDef),
}

impl ChannelDef {
    /// The single field definition, if this is one
    pub fn as_field_def(&self) -> Option<&FieldDef> {
        match self {
            ChannelDef::Field(def) => Some(def),
            ChannelDef::FieldList(_) | ChannelDef::Value(_) => None,
        }
    }

    /// Every field definition, in order (list elements or the single one)
    pub fn field_defs(&self) -> Vec<&FieldDef> {
        match self {
            ChannelDef::Field(def) => vec![def],
            ChannelDef::FieldList(defs) => defs.iter().collect(),
            ChannelDef::Value(_) => Vec::new(),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, ChannelDef::Value(_))
    }
}

impl From<FieldDef> for ChannelDef {
    fn from(def: FieldDef) -> Self {
        ChannelDef::Field(def)
    }
}

impl From<ValueDef> for ChannelDef {
    fn from(def: ValueDef) -> Self {
        ChannelDef::Value(def)
    }
}

// ============================================================================
// Field reference resolution
// ============================================================================

/// Suffix appended to binned field names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinSuffix {
    Start,
    End,
    /// Ordinal-scaled binned dimensions use the `start-end` label field
    Range,
    /// Point lookups
    Mid,
}

impl BinSuffix {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinSuffix::Start => naming::START,
            BinSuffix::End => naming::END,
            BinSuffix::Range => naming::RANGE,
            BinSuffix::Mid => naming::MID,
        }
    }
}

/// Options for [`FieldDef::canonical_field_name`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldNameOptions {
    /// Suffix for binned fields; defaults to `_start`
    pub bin_suffix: Option<BinSuffix>,
    /// Name the output of the transform itself (no bin suffix)
    pub for_as: bool,
}

impl FieldNameOptions {
    pub fn with_bin_suffix(suffix: BinSuffix) -> Self {
        Self {
            bin_suffix: Some(suffix),
            for_as: false,
        }
    }

    pub fn for_as() -> Self {
        Self {
            bin_suffix: None,
            for_as: true,
        }
    }
}

impl FieldDef {
    pub fn new(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: Some(field.into()),
            field_type,
            bin: None,
            time_unit: None,
            aggregate: None,
            scale: None,
            axis: None,
            legend: None,
            sort: None,
            title: None,
            stack: None,
            props: Map::new(),
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn is_binned(&self) -> bool {
        self.bin.as_ref().is_some_and(Bin::is_enabled)
    }

    pub fn is_count(&self) -> bool {
        self.aggregate == Some(Aggregate::Op(AggregateOp::Count))
    }

    /// Quantitative without binning, or temporal
    pub fn is_continuous(&self) -> bool {
        match self.field_type {
            FieldType::Quantitative => !self.is_binned(),
            FieldType::Temporal => true,
            FieldType::Nominal | FieldType::Ordinal => false,
        }
    }

    pub fn is_discrete(&self) -> bool {
        !self.is_continuous()
    }

    /// Nominal, ordinal, binned, or temporal with a time unit
    pub fn is_dimension(&self) -> bool {
        match self.field_type {
            FieldType::Nominal | FieldType::Ordinal => true,
            FieldType::Temporal => self.is_binned() || self.time_unit.is_some(),
            FieldType::Quantitative => self.is_binned(),
        }
    }

    pub fn is_measure(&self) -> bool {
        !self.is_dimension()
    }

    /// Whether the definition references data at all
    pub fn has_field(&self) -> bool {
        self.field.is_some() || self.is_count()
    }

    /// Generated field name downstream stages read.
    ///
    /// `None` when the definition has no underlying field. Bin takes
    /// precedence over aggregate, which takes precedence over time unit.
    pub fn canonical_field_name(&self, opts: &FieldNameOptions) -> Option<String> {
        if self.is_count() && self.field.is_none() {
            return Some(naming::COUNT_FIELD.to_string());
        }
        let field = self.field.as_deref()?;

        if let Some(bin) = self.bin.as_ref().filter(|b| b.needs_transform()) {
            let name = naming::prefixed(&bin.prefix(), field);
            if opts.for_as {
                return Some(name);
            }
            let suffix = opts.bin_suffix.unwrap_or(BinSuffix::Start);
            return Some(naming::suffixed(&name, suffix.as_str()));
        }
        if let Some(aggregate) = &self.aggregate {
            return Some(naming::prefixed(aggregate.as_str(), field));
        }
        if let Some(time_unit) = &self.time_unit {
            return Some(naming::prefixed(time_unit, field));
        }
        Some(field.to_string())
    }

    /// Canonical name with default options
    pub fn field_expr(&self) -> Option<String> {
        self.canonical_field_name(&FieldNameOptions::default())
    }

    /// Title for derived channels: explicit title, else the raw field name
    pub fn title_or_field(&self) -> Option<String> {
        self.title.clone().or_else(|| self.field.clone())
    }
}
