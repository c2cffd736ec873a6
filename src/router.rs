//! Command registry and dispatch.
//!
//! The router owns the registered command set (immutable after startup, safe
//! for concurrent lookup) and runs the per-message pipeline: prefix strip,
//! name/alias lookup, precondition checks, argument parsing, and handler
//! invocation. Every per-invocation failure is contained here; only
//! registration errors are allowed to halt startup.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::commands::{ArgValue, Args, CommandDefinition, HandlerError, ParamKind, ParamMode};
use crate::context::Context;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Registration-time errors. Fatal: a bot with a broken command table should
/// not come up.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate command name or alias: {0}")]
    DuplicateCommand(String),
    #[error("invalid parameters for `{command}`: {reason}")]
    InvalidParameters { command: String, reason: String },
}

/// Per-invocation dispatch failures, reported through the reply capability by
/// the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("{reason}")]
    ArgumentParse { reason: String, usage: String },
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

/// Outcome of a dispatch pass that did not fail.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The message did not carry the command prefix; not an error.
    NoMatch,
    /// A command matched and its handler ran to completion.
    Handled,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct CommandRouter {
    prefix: String,
    commands: Vec<Arc<CommandDefinition>>,
    /// Lowercased name/alias → index into `commands`.
    index: HashMap<String, usize>,
}

impl CommandRouter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register one command. Names and aliases are matched case-insensitively
    /// and must be unique across the registry.
    pub fn register(&mut self, def: CommandDefinition) -> Result<(), RegistryError> {
        def.validate().map_err(|reason| RegistryError::InvalidParameters {
            command: def.name().to_string(),
            reason,
        })?;

        let mut keys = vec![def.name().to_lowercase()];
        keys.extend(def.aliases().iter().map(|a| a.to_lowercase()));

        for key in &keys {
            if self.index.contains_key(key) || keys.iter().filter(|k| *k == key).count() > 1 {
                return Err(RegistryError::DuplicateCommand(key.clone()));
            }
        }

        let slot = self.commands.len();
        for key in keys {
            self.index.insert(key, slot);
        }
        self.commands.push(Arc::new(def));
        Ok(())
    }

    /// All registered commands, in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<CommandDefinition>> {
        self.commands.iter()
    }

    /// Look up a command by name or alias, case-insensitively.
    pub fn find(&self, name: &str) -> Option<&Arc<CommandDefinition>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&slot| &self.commands[slot])
    }

    /// Run one message through the pipeline.
    ///
    /// An unprefixed message is `Ok(Outcome::NoMatch)`. Everything after the
    /// prefix check either completes the handler (`Ok(Outcome::Handled)`) or
    /// stops at the first failing stage; handler errors are caught here and
    /// never propagate past dispatch.
    pub async fn dispatch(&self, ctx: &Context) -> Result<Outcome, DispatchError> {
        let content = ctx.message.content.trim();
        let Some(stripped) = content.strip_prefix(&self.prefix) else {
            return Ok(Outcome::NoMatch);
        };

        let stripped = stripped.trim_start();
        let (name, raw_args) = match stripped.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (stripped, ""),
        };
        if name.is_empty() {
            // A bare prefix with no command name.
            return Ok(Outcome::NoMatch);
        }

        let def = self
            .find(name)
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_string()))?;

        for precondition in def.preconditions() {
            precondition
                .check(ctx)
                .map_err(DispatchError::PreconditionFailed)?;
        }

        let args = parse_args(def, raw_args).map_err(|reason| DispatchError::ArgumentParse {
            reason,
            usage: def.usage(&self.prefix),
        })?;

        debug!(command = %def.name(), author = %ctx.author.tag(), "invoking handler");
        def.handler().handle(ctx, &args).await?;
        Ok(Outcome::Handled)
    }
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

/// Parse raw argument text against a command's parameter spec.
fn parse_args(def: &CommandDefinition, raw: &str) -> Result<Args, String> {
    let mut args = Args::default();
    let mut rest = raw.trim();

    for spec in def.params() {
        match spec.mode {
            ParamMode::Remainder => {
                if rest.is_empty() {
                    if !spec.optional {
                        return Err(format!("missing required argument `{}`", spec.name));
                    }
                    args.push(spec.default.clone());
                } else {
                    args.push(Some(ArgValue::Str(rest.to_string())));
                    rest = "";
                }
            }
            ParamMode::Variadic => {
                let items: Vec<String> =
                    rest.split_whitespace().map(str::to_string).collect();
                args.push(Some(ArgValue::List(items)));
                rest = "";
            }
            ParamMode::Scalar => match take_token(rest) {
                Some((token, remaining)) => {
                    args.push(Some(convert_scalar(token, spec.kind, spec.name)?));
                    rest = remaining;
                }
                None => {
                    if !spec.optional {
                        return Err(format!("missing required argument `{}`", spec.name));
                    }
                    args.push(spec.default.clone());
                }
            },
        }
    }

    if !rest.trim().is_empty() {
        return Err(format!("too many arguments: `{}`", rest.trim()));
    }
    Ok(args)
}

/// Split one whitespace-delimited token off the front of `rest`.
fn take_token(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }
    match rest.split_once(char::is_whitespace) {
        Some((token, remaining)) => Some((token, remaining.trim_start())),
        None => Some((rest, "")),
    }
}

fn convert_scalar(token: &str, kind: ParamKind, name: &str) -> Result<ArgValue, String> {
    match kind {
        ParamKind::Str => Ok(ArgValue::Str(token.to_string())),
        ParamKind::Int => token
            .parse::<i64>()
            .map(ArgValue::Int)
            .map_err(|_| format!("`{token}` is not a valid integer for `{name}`")),
        ParamKind::User => parse_user_token(token)
            .map(ArgValue::UserId)
            .ok_or_else(|| format!("`{token}` is not a user mention or id")),
    }
}

/// Accepts `<@id>`, `<@!id>`, or a bare numeric id.
fn parse_user_token(token: &str) -> Option<String> {
    let id = token
        .strip_prefix("<@!")
        .or_else(|| token.strip_prefix("<@"))
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(token);
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
