//! Command definitions: parameters, parsed arguments, and the handler trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::context::{ApiError, Context};
use crate::picture::PictureError;
use crate::preconditions::Precondition;
use crate::types::Snowflake;

// ---------------------------------------------------------------------------
// Parameter model
// ---------------------------------------------------------------------------

/// Target type of a scalar token conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Int,
    /// A user reference: `<@id>`, `<@!id>`, or a bare numeric id.
    User,
}

/// How a parameter consumes input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    /// Exactly one whitespace-delimited token.
    Scalar,
    /// All leftover raw text as a single string, internal whitespace preserved.
    Remainder,
    /// All leftover tokens as an ordered sequence; zero tokens is valid.
    Variadic,
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub mode: ParamMode,
    pub optional: bool,
    /// Value an optional parameter receives when absent.
    pub default: Option<ArgValue>,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            mode: ParamMode::Scalar,
            optional: false,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            mode: ParamMode::Scalar,
            optional: true,
            default: None,
        }
    }

    pub fn remainder(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Str,
            mode: ParamMode::Remainder,
            optional: false,
            default: None,
        }
    }

    pub fn optional_remainder(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Str,
            mode: ParamMode::Remainder,
            optional: true,
            default: None,
        }
    }

    pub fn variadic(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Str,
            mode: ParamMode::Variadic,
            optional: true,
            default: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsed arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    UserId(Snowflake),
    List(Vec<String>),
}

/// Parsed arguments, one slot per declared parameter.
///
/// A `None` slot means an optional parameter was absent and had no declared
/// default.
#[derive(Debug, Clone, Default)]
pub struct Args {
    slots: Vec<Option<ArgValue>>,
}

impl Args {
    pub(crate) fn push(&mut self, value: Option<ArgValue>) {
        self.slots.push(value);
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        match self.get(index) {
            Some(ArgValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        match self.get(index) {
            Some(ArgValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn user_id(&self, index: usize) -> Option<&str> {
        match self.get(index) {
            Some(ArgValue::UserId(id)) => Some(id),
            _ => None,
        }
    }

    pub fn list(&self, index: usize) -> Option<&[String]> {
        match self.get(index) {
            Some(ArgValue::List(items)) => Some(items),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// Errors a command handler can produce. Caught at the dispatch boundary;
/// they never take the router down.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Picture(#[from] PictureError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A guild-scoped handler ran without a guild in context.
    #[error("command requires a guild context")]
    MissingGuild,
    /// A required argument slot was empty despite parse-time validation.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
}

pub type HandlerResult = Result<(), HandlerError>;

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &Context, args: &Args) -> HandlerResult;
}

// ---------------------------------------------------------------------------
// Command definition
// ---------------------------------------------------------------------------

/// One registered command: routing names, parameter spec, preconditions, and
/// the handler itself. Immutable once handed to the router.
pub struct CommandDefinition {
    name: String,
    aliases: Vec<String>,
    params: Vec<ParamSpec>,
    preconditions: Vec<Precondition>,
    handler: Box<dyn Handler>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            params: Vec::new(),
            preconditions: Vec::new(),
            handler: Box::new(handler),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn precondition(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    /// One-line usage string, e.g. `!ban <user> [reason...]`.
    pub fn usage(&self, prefix: &str) -> String {
        let mut usage = format!("{}{}", prefix, self.name);
        for spec in &self.params {
            let suffix = match spec.mode {
                ParamMode::Scalar => "",
                ParamMode::Remainder | ParamMode::Variadic => "...",
            };
            if spec.optional {
                usage.push_str(&format!(" [{}{}]", spec.name, suffix));
            } else {
                usage.push_str(&format!(" <{}{}>", spec.name, suffix));
            }
        }
        usage
    }

    /// Parameter-spec invariants, checked at registration time: at most one
    /// remainder/variadic parameter and it must be last; no required
    /// parameter after an optional one.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let mut seen_optional = false;
        for (index, spec) in self.params.iter().enumerate() {
            if spec.mode != ParamMode::Scalar && index + 1 != self.params.len() {
                return Err(format!(
                    "parameter `{}` consumes the rest of the input and must be declared last",
                    spec.name
                ));
            }
            if !spec.optional && seen_optional {
                return Err(format!(
                    "required parameter `{}` follows an optional parameter",
                    spec.name
                ));
            }
            seen_optional |= spec.optional;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    #[async_trait]
    impl Handler for Nop {
        async fn handle(&self, _ctx: &Context, _args: &Args) -> HandlerResult {
            Ok(())
        }
    }

    // -- Builder -----------------------------------------------------------

    #[test]
    fn builder_collects_aliases_in_order() {
        let def = CommandDefinition::new("ping", Nop).alias("pong").alias("hello");
        assert_eq!(def.name(), "ping");
        assert_eq!(def.aliases(), ["pong".to_string(), "hello".to_string()]);
    }

    // -- Usage -------------------------------------------------------------

    #[test]
    fn usage_marks_required_optional_and_trailing() {
        let def = CommandDefinition::new("ban", Nop)
            .param(ParamSpec::required("user", ParamKind::User))
            .param(ParamSpec::optional_remainder("reason"));
        assert_eq!(def.usage("!"), "!ban <user> [reason...]");

        let def = CommandDefinition::new("list", Nop).param(ParamSpec::variadic("items"));
        assert_eq!(def.usage("!"), "!list [items...]");

        let def = CommandDefinition::new("echo", Nop).param(ParamSpec::remainder("text"));
        assert_eq!(def.usage("!"), "!echo <text...>");
    }

    // -- Validation --------------------------------------------------------

    #[test]
    fn non_trailing_remainder_is_rejected() {
        let def = CommandDefinition::new("bad", Nop)
            .param(ParamSpec::remainder("text"))
            .param(ParamSpec::required("count", ParamKind::Int));
        assert!(def.validate().is_err());
    }

    #[test]
    fn required_after_optional_is_rejected() {
        let def = CommandDefinition::new("bad", Nop)
            .param(ParamSpec::optional("a", ParamKind::Str))
            .param(ParamSpec::required("b", ParamKind::Str));
        assert!(def.validate().is_err());
    }

    #[test]
    fn trailing_remainder_is_accepted() {
        let def = CommandDefinition::new("ban", Nop)
            .param(ParamSpec::required("user", ParamKind::User))
            .param(ParamSpec::optional_remainder("reason"));
        assert!(def.validate().is_ok());
    }

    // -- Args --------------------------------------------------------------

    #[test]
    fn typed_accessors_match_slot_types() {
        let mut args = Args::default();
        args.push(Some(ArgValue::UserId("42".to_string())));
        args.push(Some(ArgValue::Int(7)));
        args.push(None);

        assert_eq!(args.user_id(0), Some("42"));
        assert_eq!(args.int(1), Some(7));
        assert_eq!(args.str(0), None, "wrong-type accessor yields None");
        assert_eq!(args.get(2), None);
        assert_eq!(args.len(), 3);
    }
}
