use std::sync::Arc;

use serde_json::{json, Value};
use tome_validator::{
    ClassDef, CommandArg, CommandOutput, FieldDef, InMemoryVault, Index, ListOptions, Param, Rule, State,
    StructuredView, TopicDef, TopicError, TopicsExt, TypeRegistry, UserCommand, WriteOptions,
};

pub fn registry() -> Arc<TypeRegistry> {
    TypeRegistry::builder()
        .class(ClassDef::new("Reward").field(FieldDef::new("gems").rule(Rule::Min(1.0))))
        .topic(
            TopicDef::new(
                ClassDef::new("Player")
                    .field(FieldDef::new("name").rule(Rule::MinLength(2)))
                    .field(FieldDef::new("gems")
                            .rule(Rule::IsInt)
                            .optional()
                            .with_default(json!(0))),
            )
            .index_field("id", [Rule::NumberString]),
        )
        .build()
        .unwrap()
}

pub fn state() -> State {
    State::new(Arc::new(InMemoryVault::new()))
}

pub fn id(id: &str) -> Index {
    Index::from([("id", id)])
}

/// Stores players `1..=names.len()` and returns a fresh state over the vault.
pub fn seeded(names: &[&str]) -> State {
    let players = registry().topic("Player").unwrap();
    let state = state();
    for (i, name) in names.iter().enumerate() {
        players
            .create(&state, id(&(i + 1).to_string()), json!({ "name": name }))
            .unwrap()
            .record_add(WriteOptions::default())
            .unwrap();
    }
    state.distribute().unwrap();
    state.sibling()
}

fn echo(_: &State, args: &[CommandArg]) -> Result<CommandOutput, TopicError> {
    Ok(match args.first() {
        Some(CommandArg::Topic(topic)) => topic.clone().into(),
        Some(arg) => arg.value().into(),
        None => CommandOutput::Value(Value::Null),
    })
}

fn reward(state: &State, args: &[CommandArg]) -> Result<CommandOutput, TopicError> {
    let player = args[0]
        .as_topic()
        .cloned()
        .ok_or_else(|| TopicError::Method("player is not a topic".into()))?;
    let gems = args[1].value().as_i64().unwrap_or(0);
    let current = player.get("gems").as_i64().unwrap_or(0);
    player.set("gems", current + gems)?;
    player.record_set(WriteOptions::default())?;
    state.distribute()?;
    Ok(player.into())
}

fn roster(state: &State, _: &[CommandArg]) -> Result<CommandOutput, TopicError> {
    let players = registry().topic("Player")?;
    Ok(players.query(state, &Index::new(), ListOptions::default())?.into())
}

fn fail(_: &State, _: &[CommandArg]) -> Result<CommandOutput, TopicError> {
    Err(TopicError::Method("out of gems".into()))
}

pub fn echo_command(registry: &Arc<TypeRegistry>) -> UserCommand {
    UserCommand::new("echo", registry, echo)
}

pub fn reward_command() -> UserCommand {
    UserCommand::new("player.reward", &registry(), reward)
        .acl(["admin", "support"])
        .param(Param::new("player").topic("Player").required())
        .param(Param::new("gems").rule(Rule::IsInt).rule(Rule::Positive).required())
}

pub fn roster_command() -> UserCommand {
    UserCommand::new("player.roster", &registry(), roster).acl(["*"])
}

pub fn failing_command() -> UserCommand {
    UserCommand::new("player.fail", &registry(), fail)
}
