use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::error::Violation;

static NUMBER_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?([0-9]*[.])?[0-9]+$").expect("numeric pattern is valid"));

/// A declarative value check.
#[derive(Clone, Copy)]
pub enum Rule {
    /// A string holding a decimal number.
    NumberString,
    /// An absolute http(s) URL with a host.
    Url,
    /// A number strictly greater than zero.
    Positive,
    /// Anything but `""` and `null`.
    NotEmpty,
    IsString,
    IsNumber,
    /// An integral number.
    IsInt,
    IsBoolean,
    /// A number no smaller than the bound.
    Min(f64),
    /// A number no greater than the bound.
    Max(f64),
    /// A string of at least this many characters.
    MinLength(usize),
    Custom {
        name: &'static str,
        check: fn(&Value) -> bool,
    },
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::NumberString => "isNumberString",
            Rule::Url => "isUrl",
            Rule::Positive => "isPositive",
            Rule::NotEmpty => "isNotEmpty",
            Rule::IsString => "isString",
            Rule::IsNumber => "isNumber",
            Rule::IsInt => "isInt",
            Rule::IsBoolean => "isBoolean",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::MinLength(_) => "minLength",
            Rule::Custom { name, .. } => name,
        }
    }

    pub fn check(&self, value: &Value) -> bool {
        match self {
            Rule::NumberString => value.as_str().is_some_and(|s| NUMBER_STRING.is_match(s)),
            Rule::Url => value.as_str().is_some_and(is_http_url),
            Rule::Positive => value.as_f64().is_some_and(|n| n > 0.0),
            Rule::NotEmpty => !matches!(value, Value::Null) && value.as_str() != Some(""),
            Rule::IsString => value.is_string(),
            Rule::IsNumber => value.is_number(),
            Rule::IsInt => value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|n| n.fract() == 0.0),
            Rule::IsBoolean => value.is_boolean(),
            Rule::Min(min) => value.as_f64().is_some_and(|n| n >= *min),
            Rule::Max(max) => value.as_f64().is_some_and(|n| n <= *max),
            Rule::MinLength(len) => value.as_str().is_some_and(|s| s.chars().count() >= *len),
            Rule::Custom { check, .. } => check(value),
        }
    }

    fn describe(&self) -> String {
        match self {
            Rule::NumberString => "must be a number string".into(),
            Rule::Url => "must be an URL address".into(),
            Rule::Positive => "must be a positive number".into(),
            Rule::NotEmpty => "should not be empty".into(),
            Rule::IsString => "must be a string".into(),
            Rule::IsNumber => "must be a number".into(),
            Rule::IsInt => "must be an integer number".into(),
            Rule::IsBoolean => "must be a boolean value".into(),
            Rule::Min(min) => format!("must not be less than {}", min),
            Rule::Max(max) => format!("must not be greater than {}", max),
            Rule::MinLength(len) => {
                format!("must be longer than or equal to {} characters", len)
            }
            Rule::Custom { name, .. } => format!("failed the {} check", name),
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn is_http_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// A rule bound to a property, optionally applied per array element.
#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    pub rule: Rule,
    pub each: bool,
}

impl Constraint {
    pub fn new(rule: Rule) -> Self {
        Constraint { rule, each: false }
    }

    pub fn each(rule: Rule) -> Self {
        Constraint { rule, each: true }
    }

    fn holds(&self, value: &Value) -> bool {
        match value {
            Value::Array(items) if self.each => items.iter().all(|item| self.rule.check(item)),
            other => self.rule.check(other),
        }
    }

    fn message(&self, property: &str) -> String {
        if self.each {
            format!("each value in {} {}", property, self.rule.describe())
        } else {
            format!("{} {}", property, self.rule.describe())
        }
    }
}

/// How a missing (absent or null) property is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Presence {
    /// Rules run against the missing value, so most of them reject it.
    #[default]
    Checked,
    /// Missing also fails `isDefined`.
    Required,
    /// Missing skips every rule.
    Optional,
}

/// Check one property value against its constraints.
///
/// A missing value is checked as `null`. `each` constraints only apply to
/// arrays and accept anything else that is missing.
pub(crate) fn check_field(
    path: &str,
    name: &str,
    value: Option<&Value>,
    constraints: &[Constraint],
    presence: Presence,
) -> Option<Violation> {
    let value = value.filter(|v| !v.is_null());
    if value.is_none() && presence == Presence::Optional {
        return None;
    }

    let mut violation = Violation::new(path, value.cloned());
    match value {
        Some(value) => {
            for constraint in constraints {
                if !constraint.holds(value) {
                    violation = violation.constraint(constraint.rule.name(), constraint.message(name));
                }
            }
        }
        None => {
            if presence == Presence::Required {
                violation = violation.constraint(
                    "isDefined",
                    format!("{} should not be null or undefined", name),
                );
            }
            for constraint in constraints.iter().filter(|c| !c.each) {
                if !constraint.rule.check(&Value::Null) {
                    violation = violation.constraint(constraint.rule.name(), constraint.message(name));
                }
            }
        }
    }

    if violation.constraints.is_empty() {
        None
    } else {
        Some(violation)
    }
}
