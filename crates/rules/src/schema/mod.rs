//! Ruler rule-group types and their YAML codec.
//!
//! Defines the wire and storage shapes:
//! - `Rule`: one alerting rule (`alert`, `expr`, `for`, `labels`, `annotations`)
//! - `RuleGroup`: the ruler's addressable unit of configuration
//!
//! Decoding fails closed: unknown fields are rejected rather than ignored.
//! Maps are ordered, so encoding is canonical regardless of input order.

mod group;
mod rule;

pub use group::*;
pub use rule::*;
