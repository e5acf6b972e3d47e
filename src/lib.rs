/*!
# vlnorm - Visualization Specification Normalizer

Translates a declarative, high-level visualization specification (marks +
encodings + data transforms) into a normalized tree of primitive-mark unit,
layer and facet specifications that a renderer can consume directly.

## Example

```rust,ignore
use vlnorm::{normalize_json};

let spec = r#"{
    "mark": "box-plot",
    "encoding": {
        "x": {"field": "age", "type": "ordinal"},
        "y": {"field": "people", "type": "quantitative"}
    }
}"#;

let (normalized, warnings) = normalize_json(spec, None)?;
// `normalized` is a layer of rule/bar/tick marks with explicit transforms
```

## Architecture

Normalization is a pure recursive rewrite of the specification tree:

- **Facet extraction** → `row`/`column` channels become a facet wrapper
- **Composite marks** → box plots, error bars and error bands expand into
  layers of primitive marks with explicit aggregate/calculate pipelines
- **Overlays** → line/area marks gain point/line overlay layers on request
- **Ranged marks** → `x2`/`y2` without `x`/`y` are promoted

Warnings are collected into a [`Diagnostics`] sink and returned alongside the
result, so callers decide between strict and permissive handling.

## Core Components

- [`plot`] - Specification tree, channels, field definitions, encodings
- [`plot::compositemark`] - Composite-mark expanders and their registry
- [`stack`] - Stack properties compiler
- [`normalize`] - Top-level normalizer
- [`config`] - Built-in defaults and user config merging
*/

pub mod config;
pub mod diagnostics;
pub mod naming;
pub mod normalize;
pub mod plot;
pub mod stack;

// Re-export key types for convenience
pub use config::Config;
pub use diagnostics::{Diagnostics, Warning};
pub use normalize::{normalize, normalize_json, Normalized, Normalizer};
pub use plot::{
    AnyMark, Channel, ChannelDef, CompositeMarkRegistry, Encoding, FacetSpec, FieldDef,
    LayerSpec, Mark, MarkDef, Spec, Transform, UnitSpec,
};
pub use stack::{compute_stack_properties, StackProperties};

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum VlnormError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    InvalidMark(String),

    #[error("Warning treated as error: {0}")]
    StrictWarning(String),
}

impl From<serde_json::Error> for VlnormError {
    fn from(err: serde_json::Error) -> Self {
        VlnormError::ParseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VlnormError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
