//! Specification types and encoding machinery
//!
//! This module contains the types that represent a visualization
//! specification, together with the per-channel utilities and the
//! composite-mark expanders that rewrite it.
//!
//! # Architecture
//!
//! - `channel` - Channel registry: supported marks, roles and scales per channel
//! - `mark` - Primitive marks, mark definitions, composite-mark parameters
//! - `fielddef` - Field/value channel definitions and field-name resolution
//! - `encoding` - Ordered encoding mapping and channel filtering
//! - `extract` - Bin/timeUnit/aggregate extraction into transform stages
//! - `transform` - Transform stage types
//! - `scale` - Scale types
//! - `types` - Unit, layer and facet specifications
//! - `compositemark` - Box plot, error bar and error band expanders and their registry

pub mod channel;
pub mod compositemark;
pub mod encoding;
pub mod extract;
pub mod fielddef;
pub mod mark;
pub mod scale;
pub mod transform;
pub mod types;

// Re-export all types for convenience
pub use channel::*;
pub use compositemark::CompositeMarkRegistry;
pub use encoding::*;
pub use extract::*;
pub use fielddef::*;
pub use mark::*;
pub use scale::*;
pub use transform::*;
pub use types::*;
