//! Message-loop glue between a transport and the router.
//!
//! This module owns the per-message policy the router itself stays out of:
//! ignoring bot authors, treating an @mention of the bot as a prefix, and
//! reporting each failure class back through the reply capability.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::context::{Context, Services};
use crate::router::{CommandRouter, DispatchError, Outcome};
use crate::types::{Channel, Guild, Message, Permissions};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Bot identity and tunables, loaded from the environment by the binary.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Command prefix (`!` unless overridden).
    pub prefix: String,
    /// The bot's own user id, enabling @mention addressing.
    pub bot_user_id: Option<String>,
}

impl BotConfig {
    /// Read `BOT_PREFIX` and `BOT_USER_ID` from the environment.
    pub fn from_env() -> Self {
        Self {
            prefix: std::env::var("BOT_PREFIX").unwrap_or_else(|_| "!".to_string()),
            bot_user_id: std::env::var("BOT_USER_ID").ok(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound envelope
// ---------------------------------------------------------------------------

/// One delivered message plus the identity/permission data the transport
/// resolved for it.
pub struct Incoming {
    pub message: Message,
    pub channel: Channel,
    pub guild: Option<Guild>,
    pub author_permissions: Permissions,
    pub bot_permissions: Permissions,
}

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

pub struct Bot {
    config: BotConfig,
    router: Arc<CommandRouter>,
    services: Services,
}

impl Bot {
    pub fn new(config: BotConfig, router: Arc<CommandRouter>, services: Services) -> Self {
        Self {
            config,
            router,
            services,
        }
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    /// Handle one inbound message end to end.
    ///
    /// Every failure is contained in this invocation and reported through the
    /// reply capability; nothing here can take the loop down.
    pub async fn on_message(&self, incoming: Incoming) {
        let mut message = incoming.message;
        if message.author.bot {
            return;
        }

        info!(
            message_id = %message.id,
            author = %message.author.tag(),
            channel_id = %message.channel_id,
            content = %message.content,
            "handling message"
        );

        if let Some(normalized) = normalize_mention(&self.config, &message.content) {
            message.content = normalized;
        }

        let ctx = Context::new(
            message,
            incoming.channel,
            incoming.guild,
            incoming.author_permissions,
            incoming.bot_permissions,
            self.services.clone(),
        );

        match self.router.dispatch(&ctx).await {
            Ok(Outcome::NoMatch) => {}
            Ok(Outcome::Handled) => {
                debug!(message_id = %ctx.message.id, "command handled");
            }
            Err(err) => self.report(&ctx, err).await,
        }
    }

    /// Report a per-invocation failure to the invoking channel.
    async fn report(&self, ctx: &Context, err: DispatchError) {
        let reply = match &err {
            // Unmatched names stay quiet at the channel, like unprefixed chatter.
            DispatchError::UnknownCommand(name) => {
                debug!(command = %name, "unknown command");
                return;
            }
            DispatchError::PreconditionFailed(text) => text.clone(),
            DispatchError::ArgumentParse { reason, usage } => {
                format!("{reason}\nUsage: {usage}")
            }
            DispatchError::Handler(source) => {
                error!(error = %source, message_id = %ctx.message.id, "handler failed");
                "Something went wrong running that command.".to_string()
            }
        };

        if let Err(err) = ctx.reply(&reply).await {
            warn!(error = %err, "failed to report command error");
        }
    }
}

/// Rewrite `@bot rest` into `<prefix>rest` so mention-addressed messages run
/// through the same prefixed pipeline.
fn normalize_mention(config: &BotConfig, content: &str) -> Option<String> {
    let bot_user_id = config.bot_user_id.as_deref()?;
    let content = content.trim();
    for tag in [format!("<@{bot_user_id}>"), format!("<@!{bot_user_id}>")] {
        if let Some(rest) = content.strip_prefix(&tag) {
            let rest = rest.trim_start();
            return Some(if rest.starts_with(&config.prefix) {
                rest.to_string()
            } else {
                format!("{}{}", config.prefix, rest)
            });
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
