//! Alert rule templating for the ruler.
//!
//! This crate provides:
//! - Go-style duration parsing and canonical rendering
//! - Placeholder substitution with PromQL validation
//! - YAML schema for rules and rule groups
//! - Builders turning a stored definition template into a rule group

pub mod builder;
pub mod duration;
pub mod error;
pub mod expression;
pub mod schema;

pub use builder::{build_definition_group, build_group, build_rule, decode, encode};
pub use error::{Result, RuleError};
pub use expression::{ExpressionError, TemplateData};
pub use schema::{Rule, RuleGroup};
