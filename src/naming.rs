//! Centralized naming conventions for synthesized field names.
//!
//! Downstream consumers read the fields produced by normalization by name, so
//! every suffix, prefix and expression pattern lives here.
//!
//! # Categories
//!
//! - **Range suffixes**: `_start`, `_end`, `_range`, `_mid` for binned and stacked fields
//! - **Function prefixes**: `<aggregate>_<field>`, `<timeUnit>_<field>`, `bin_..._<field>`
//! - **Composite-mark fields**: `lowerBox_<field>`, `center_<field>`, ...
//! - **Expressions**: `datum["<field>"]` access for calculate transforms

use const_format::concatcp;
use regex::Regex;
use std::sync::LazyLock;

// ============================================================================
// Base Building Blocks
// ============================================================================

/// Separator between a function/prefix and a field name
const SEP: &str = "_";

/// Start of a binned or stacked range
pub const START: &str = "start";

/// End of a binned or stacked range
pub const END: &str = "end";

/// Combined "start-end" label of a bin, used by ordinal scales
pub const RANGE: &str = "range";

/// Midpoint of a bin, used for point lookups
pub const MID: &str = "mid";

/// Full `_start` suffix
pub const START_SUFFIX: &str = concatcp!(SEP, START);

/// Full `_end` suffix
pub const END_SUFFIX: &str = concatcp!(SEP, END);

/// Field name produced by a `count` aggregate without an input field
pub const COUNT_FIELD: &str = "count_*";

/// Function name used for binned fields
pub const BIN_PREFIX: &str = "bin";

// ============================================================================
// Composite-mark field prefixes
// ============================================================================

pub const LOWER_BOX: &str = "lowerBox";
pub const UPPER_BOX: &str = "upperBox";
pub const MID_BOX: &str = "midBox";
pub const LOWER_WHISKER: &str = "lowerWhisker";
pub const UPPER_WHISKER: &str = "upperWhisker";
pub const MIN: &str = "min";
pub const MAX: &str = "max";
pub const IQR_RANGE: &str = "iqrRange";

pub const LOWER: &str = "lower";
pub const UPPER: &str = "upper";
pub const CENTER: &str = "center";
pub const EXTENT: &str = "extent";

// ============================================================================
// Styles
// ============================================================================

/// Style stamped on line layers added by the area overlay
pub const LINE_OVERLAY_STYLE: &str = "lineOverlay";

/// Style stamped on point layers added by line/area overlays
pub const POINT_OVERLAY_STYLE: &str = "pointOverlay";

// ============================================================================
// Builders
// ============================================================================

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").unwrap());

/// Join a prefix and a field name: `<prefix>_<field>`
pub fn prefixed(prefix: &str, field: &str) -> String {
    format!("{}{}{}", prefix, SEP, field)
}

/// Join a field name and a suffix: `<field>_<suffix>`
pub fn suffixed(field: &str, suffix: &str) -> String {
    format!("{}{}{}", field, SEP, suffix)
}

/// Start field of a stacked value: `<field>_start`
pub fn stack_start(field: &str) -> String {
    format!("{}{}", field, START_SUFFIX)
}

/// End field of a stacked value: `<field>_end`
pub fn stack_end(field: &str) -> String {
    format!("{}{}", field, END_SUFFIX)
}

/// Replace every non-word character with `_` so the result is usable as an identifier.
///
/// ```
/// use vlnorm::naming;
/// assert_eq!(naming::var_name("extent_[0,100]"), "extent__0_100_");
/// ```
pub fn var_name(s: &str) -> String {
    NON_WORD.replace_all(s, "_").into_owned()
}

/// Expression accessing a field of the current datum: `datum["<field>"]`
pub fn datum(field: &str) -> String {
    format!("datum[\"{}\"]", field.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Style name of a composite-mark part: `<mark>-<part>`
pub fn part_style(mark: &str, part: &str) -> String {
    format!("{}-{}", mark, part)
}
