//! User commands - validated RPC entry points.
//!
//! A [`UserCommand`] declares its ACL, its named parameters with their rules,
//! and an execute function. [`UserCommand::run`] maps positional arguments
//! to parameters, turns topic parameters into [`Topic`] instances, validates
//! every input at once, executes, then validates what came back.
//!
//! ## Example
//!
//! ```ignore
//! use tome_validator::{CommandArg, CommandOutput, Param, Rule, UserCommand};
//!
//! fn execute(_: &State, args: &[CommandArg]) -> Result<CommandOutput, TopicError> {
//!     Ok(args[0].value().clone().into())
//! }
//!
//! let command = UserCommand::new("bonus.register", &registry, execute)
//!     .acl(["*"])
//!     .param(Param::new("gemRegisterBonus").rule(Rule::Min(1.0)));
//!
//! command.run(&state, vec![json!(0)])?; // Err: Invalid user command input
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::archivist::{Index, State};
use crate::document::Node;
use crate::error::{ErrorDetails, TopicError, ValidationError, Violation};
use crate::schema::{
    check_field, validate_node, Constraint, Presence, Rule, TypeRegistry, TypeTag,
};
use crate::topic::{Topic, TopicData, TopicsExt};
use crate::view::StructuredView;

/// What a parameter is cast to before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// A plain value, checked against the parameter's rules.
    Plain,
    /// A plain object validated as an instance of the class.
    Class(TypeTag),
    /// `{ index, ...data }` turned into an instance of the named topic.
    Topic(String),
}

/// A declared command parameter.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    constraints: Vec<Constraint>,
    presence: Presence,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            kind: ParamKind::Plain,
            constraints: Vec::new(),
            presence: Presence::Checked,
        }
    }

    pub fn of(mut self, class: impl AsRef<str>) -> Self {
        self.kind = ParamKind::Class(TypeTag::class(class));
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.kind = ParamKind::Topic(topic.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.constraints.push(Constraint::new(rule));
        self
    }

    pub fn each(mut self, rule: Rule) -> Self {
        self.constraints.push(Constraint::each(rule));
        self
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}

/// A cast argument, as handed to the execute function.
#[derive(Debug, Clone)]
pub enum CommandArg {
    Value(Value),
    Topic(Topic),
}

impl CommandArg {
    /// The plain value (a topic's current data for topic arguments).
    pub fn value(&self) -> Value {
        match self {
            CommandArg::Value(value) => value.clone(),
            CommandArg::Topic(topic) => topic.value_of(),
        }
    }

    pub fn as_topic(&self) -> Option<&Topic> {
        match self {
            CommandArg::Topic(topic) => Some(topic),
            CommandArg::Value(_) => None,
        }
    }
}

/// What an execute function returns.
#[derive(Debug, Clone)]
pub enum CommandOutput {
    Value(Value),
    Topic(Topic),
    List(Vec<CommandOutput>),
}

impl CommandOutput {
    pub fn value_of(&self) -> Value {
        match self {
            CommandOutput::Value(value) => value.clone(),
            CommandOutput::Topic(topic) => topic.value_of(),
            CommandOutput::List(items) => {
                Value::Array(items.iter().map(CommandOutput::value_of).collect())
            }
        }
    }

    pub fn as_topic(&self) -> Option<&Topic> {
        match self {
            CommandOutput::Topic(topic) => Some(topic),
            _ => None,
        }
    }
}

impl From<Value> for CommandOutput {
    fn from(value: Value) -> Self {
        CommandOutput::Value(value)
    }
}

impl From<Topic> for CommandOutput {
    fn from(topic: Topic) -> Self {
        CommandOutput::Topic(topic)
    }
}

impl From<Vec<Topic>> for CommandOutput {
    fn from(topics: Vec<Topic>) -> Self {
        CommandOutput::List(topics.into_iter().map(CommandOutput::Topic).collect())
    }
}

pub type Execute = fn(state: &State, args: &[CommandArg]) -> Result<CommandOutput, TopicError>;

/// A validated user command.
pub struct UserCommand {
    name: String,
    acl: Vec<String>,
    params: Vec<Param>,
    output: Option<TypeTag>,
    execute: Execute,
    registry: Arc<TypeRegistry>,
}

impl UserCommand {
    pub fn new(name: impl Into<String>, registry: &Arc<TypeRegistry>, execute: Execute) -> Self {
        UserCommand {
            name: name.into(),
            acl: Vec::new(),
            params: Vec::new(),
            output: None,
            execute,
            registry: registry.clone(),
        }
    }

    /// Access groups allowed to run the command. Recorded, not enforced here.
    pub fn acl<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acl = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Class plain object outputs are validated against.
    pub fn output(mut self, class: impl AsRef<str>) -> Self {
        self.output = Some(TypeTag::class(class));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn acl_groups(&self) -> &[String] {
        &self.acl
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(Param::name).collect()
    }

    fn details(&self, state: &State, received: Option<Value>) -> ErrorDetails {
        ErrorDetails {
            actor_id: state.actor_id().map(str::to_string),
            user_command: Some(
                state
                    .description()
                    .map_or_else(|| self.name.clone(), str::to_string),
            ),
            topic: None,
            index: None,
            received_data: received,
        }
    }

    /// Cast, validate, execute, then validate the output.
    pub fn run(&self, state: &State, args: Vec<Value>) -> Result<CommandOutput, TopicError> {
        let mut args = args.into_iter();
        let mut received = Map::new();
        let mut cast = Vec::with_capacity(self.params.len());
        let mut violations = Vec::new();

        for param in &self.params {
            let value = args.next().unwrap_or(Value::Null);
            received.insert(param.name.clone(), value.clone());
            let arg = self.cast(state, param, value)?;
            violations.extend(self.check_input(param, &arg));
            cast.push(arg);
        }

        if !violations.is_empty() {
            warn!(command = %self.name, violations = violations.len(), "invalid user command input");
            let details = self.details(state, Some(Value::Object(received)));
            return Err(ValidationError::new("Invalid user command input", "invalidInput", details)
                .with_violations(violations)
                .into());
        }

        debug!(command = %self.name, "executing user command");
        let output = (self.execute)(state, &cast)?;

        let violations = self.check_output(&output, "");
        if !violations.is_empty() {
            warn!(command = %self.name, violations = violations.len(), "invalid user command return value");
            let details = self.details(state, None);
            return Err(
                ValidationError::new("Invalid user command return value", "server", details)
                    .with_violations(violations)
                    .into(),
            );
        }
        Ok(output)
    }

    /// Topic parameters become instances; a missing `index` is an empty one.
    fn cast(&self, state: &State, param: &Param, value: Value) -> Result<CommandArg, TopicError> {
        let ParamKind::Topic(topic) = &param.kind else {
            return Ok(CommandArg::Value(value));
        };
        let mut data = match value {
            Value::Object(data) => data,
            other => return Ok(CommandArg::Value(other)),
        };

        let index = match data.remove("index") {
            Some(index) => serde_json::from_value::<Index>(index).map_err(|err| {
                TopicError::InvalidData(format!("invalid index for {}: {}", param.name, err))
            })?,
            None => Index::new(),
        };
        let class = self.registry.topic(topic)?;
        let instance = class.create(state, index, TopicData::Plain(Value::Object(data)))?;
        Ok(CommandArg::Topic(instance))
    }

    fn check_input(&self, param: &Param, arg: &CommandArg) -> Vec<Violation> {
        let value = match arg {
            CommandArg::Value(Value::Null) => None,
            other => Some(other.value()),
        };
        let mut violations: Vec<Violation> = check_field(
            &param.name,
            &param.name,
            value.as_ref(),
            &param.constraints,
            param.presence,
        )
        .into_iter()
        .collect();

        let nested = match (arg, &param.kind) {
            (CommandArg::Topic(topic), _) => topic.root().validate(),
            (CommandArg::Value(value @ Value::Object(_)), ParamKind::Class(tag)) => {
                validate_node(&self.registry, tag, &Node::conjure(value.clone()))
            }
            _ => Vec::new(),
        };
        violations.extend(nested.into_iter().map(|v| v.under(&param.name)));
        violations
    }

    fn check_output(&self, output: &CommandOutput, path: &str) -> Vec<Violation> {
        let under = |violations: Vec<Violation>| -> Vec<Violation> {
            if path.is_empty() {
                violations
            } else {
                violations.into_iter().map(|v| v.under(path)).collect()
            }
        };

        match output {
            CommandOutput::Topic(topic) => under(topic.root().validate()),
            CommandOutput::List(items) => items
                .iter()
                .enumerate()
                .flat_map(|(i, item)| self.check_output(item, &join(path, i)))
                .collect(),
            CommandOutput::Value(Value::Array(items)) => items
                .iter()
                .enumerate()
                .flat_map(|(i, item)| {
                    self.check_output(&CommandOutput::Value(item.clone()), &join(path, i))
                })
                .collect(),
            CommandOutput::Value(value @ Value::Object(_)) => match &self.output {
                Some(tag) => under(validate_node(
                    &self.registry,
                    tag,
                    &Node::conjure(value.clone()),
                )),
                None => Vec::new(),
            },
            CommandOutput::Value(_) => Vec::new(),
        }
    }
}

fn join(path: &str, i: usize) -> String {
    if path.is_empty() {
        i.to_string()
    } else {
        format!("{}.{}", path, i)
    }
}
