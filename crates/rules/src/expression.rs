//! Placeholder substitution and PromQL validation for stored alert expressions.
//!
//! Stored templates write placeholders as `[[ .Threshold ]]` so they do not
//! collide with the ruler's own `{{ $value }}` annotation templating. Before
//! substitution the bracket form is rewritten to `{{ .Threshold }}`; both
//! spellings are therefore accepted and render identically.
//!
//! Only `.Threshold` and `.Duration` may be referenced. Anything else is an
//! [`ExpressionError::UndefinedField`]; nothing is ever replaced by an empty
//! string. Rendering goes through minijinja with strict undefined handling,
//! and the result must parse as PromQL.

use std::collections::BTreeMap;

use minijinja::{Environment, ErrorKind, UndefinedBehavior};

pub const THRESHOLD_FIELD: &str = "Threshold";
pub const DURATION_FIELD: &str = "Duration";

/// Clause appended to the expression of a disabled definition.
///
/// Never validated against the grammar; re-check it by hand if it changes.
pub const DISABLED_CLAUSE: &str = " and false";

/// Errors from rendering or validating an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("undefined template field {field:?} in {template:?}")]
    UndefinedField { field: String, template: String },

    #[error("invalid expression {expr:?}: {reason}")]
    InvalidExpression { expr: String, reason: String },

    #[error("malformed template {template:?}: {reason}")]
    Template { template: String, reason: String },
}

/// Values the placeholders bind to. A `None` field is undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateData {
    pub threshold: Option<String>,
    pub duration: Option<String>,
}

impl TemplateData {
    pub fn new(threshold: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            threshold: Some(threshold.into()),
            duration: Some(duration.into()),
        }
    }

    fn value(&self, field: &str) -> Option<&str> {
        match field {
            THRESHOLD_FIELD => self.threshold.as_deref(),
            DURATION_FIELD => self.duration.as_deref(),
            _ => None,
        }
    }
}

/// Substitute placeholders in `expr` and validate the result as PromQL.
pub fn render(data: &TemplateData, expr: &str) -> Result<String, ExpressionError> {
    let rendered = substitute(data, expr)?;
    validate(&rendered)?;
    Ok(rendered)
}

/// Substitute placeholders without grammar validation.
///
/// Used for non-expression fields such as a templated `for` duration.
pub fn substitute(data: &TemplateData, text: &str) -> Result<String, ExpressionError> {
    let rewritten = rewrite_brackets(text);
    let segments = split_placeholders(&rewritten).map_err(|reason| ExpressionError::Template {
        template: text.to_string(),
        reason,
    })?;

    if !segments.iter().any(|s| matches!(s, Segment::Field(_))) {
        return Ok(rewritten);
    }

    for segment in &segments {
        if let Segment::Field(field) = segment {
            if data.value(field).is_none() {
                return Err(ExpressionError::UndefinedField {
                    field: field.to_string(),
                    template: text.to_string(),
                });
            }
        }
    }

    let (source, ctx) = to_jinja(data, &segments);

    build_env()
        .render_str(&source, ctx)
        .map_err(|e| match e.kind() {
            ErrorKind::UndefinedError => ExpressionError::UndefinedField {
                field: e.detail().unwrap_or("unknown").to_string(),
                template: text.to_string(),
            },
            _ => ExpressionError::Template {
                template: text.to_string(),
                reason: e.to_string(),
            },
        })
}

/// Check that `expr` parses as PromQL.
pub fn validate(expr: &str) -> Result<(), ExpressionError> {
    promql_parser::parser::parse(expr)
        .map(|_| ())
        .map_err(|reason| ExpressionError::InvalidExpression {
            expr: expr.to_string(),
            reason,
        })
}

/// Make a validated expression syntactically present but never firing.
pub fn disable(expr: &str) -> String {
    format!("{expr}{DISABLED_CLAUSE}")
}

/// True if `text` contains a placeholder in either notation.
pub fn has_placeholders(text: &str) -> bool {
    let rewritten = rewrite_brackets(text);
    match split_placeholders(&rewritten) {
        Ok(segments) => segments.iter().any(|s| matches!(s, Segment::Field(_))),
        // Malformed placeholders still count; substitution reports them.
        Err(_) => true,
    }
}

fn build_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(String),
    Field(&'a str),
}

/// Rewrite `[[ .Field ]]` to `{{ .Field }}`.
///
/// Only bracket pairs whose content starts with a `.` field reference are
/// touched, so PromQL range selectors like `x[5m]` and `x[[[.Duration]]]`
/// keep their own brackets.
fn rewrite_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[[") {
        let after = &rest[start + 2..];
        let opens_action = after.trim_start_matches(['-', ' ', '\t']).starts_with('.');
        match after.find("]]") {
            Some(end) if opens_action => {
                out.push_str(&rest[..start]);
                out.push_str("{{");
                out.push_str(&after[..end]);
                out.push_str("}}");
                rest = &after[end + 2..];
            }
            _ => {
                out.push_str(&rest[..start + 1]);
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Split on `{{ ... }}` actions. Each action must be a single `.Field`
/// reference, optionally with `-` whitespace trim markers.
fn split_placeholders(text: &str) -> Result<Vec<Segment<'_>>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut trim_next = false;
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let before = &rest[..start];
        literal.push_str(if trim_next { before.trim_start() } else { before });

        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| "unclosed placeholder".to_string())?;
        let mut action = &after[..end];

        if let Some(stripped) = action.strip_prefix('-') {
            if stripped.starts_with(char::is_whitespace) {
                literal.truncate(literal.trim_end().len());
                action = stripped;
            }
        }
        trim_next = false;
        if let Some(stripped) = action.strip_suffix('-') {
            if stripped.ends_with(char::is_whitespace) {
                trim_next = true;
                action = stripped;
            }
        }

        let field = action
            .trim()
            .strip_prefix('.')
            .filter(|name| is_identifier(name))
            .ok_or_else(|| format!("unsupported placeholder {{{{{action}}}}}"))?;

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Field(field));
        rest = &after[end + 2..];
    }

    literal.push_str(if trim_next { rest.trim_start() } else { rest });
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Template source plus the context it renders against.
///
/// Literal text never becomes template source: each literal segment is bound
/// to its own `lit{n}` variable, so PromQL braces and keywords in the
/// expression cannot be read as template syntax.
fn to_jinja<'a>(
    data: &'a TemplateData,
    segments: &'a [Segment<'a>],
) -> (String, BTreeMap<String, &'a str>) {
    let mut source = String::new();
    let mut ctx = BTreeMap::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(text) => {
                let name = format!("lit{i}");
                source.push_str(&format!("{{{{ {name} }}}}"));
                ctx.insert(name, text.as_str());
            }
            Segment::Field(field) => {
                source.push_str(&format!("{{{{ {field} }}}}"));
                if let Some(value) = data.value(field) {
                    ctx.insert(field.to_string(), value);
                }
            }
        }
    }
    (source, ctx)
}
