//! The bot's command set.
//!
//! Each command is a small [`Handler`] struct; [`build_router`] registers the
//! whole surface and is the single place names, aliases, parameters, and
//! preconditions are declared.

use std::io::Read;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::commands::{
    Args, CommandDefinition, Handler, HandlerError, HandlerResult, ParamKind, ParamSpec,
};
use crate::context::Context;
use crate::preconditions::Precondition;
use crate::router::{CommandRouter, RegistryError};
use crate::types::{Permissions, User};

/// Zero-width space.
const ZWSP: char = '\u{200B}';

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Build a router carrying the full command surface.
///
/// Fails only on a broken command table (duplicate names, malformed parameter
/// specs), which is startup-fatal.
pub fn build_router(prefix: &str) -> Result<CommandRouter, RegistryError> {
    let mut router = CommandRouter::new(prefix);

    router.register(
        CommandDefinition::new("ping", PingHandler)
            .alias("pong")
            .alias("hello"),
    )?;

    router.register(CommandDefinition::new("cat", CatHandler))?;

    router.register(
        CommandDefinition::new("userinfo", UserInfoHandler)
            .param(ParamSpec::optional("user", ParamKind::User)),
    )?;

    router.register(
        CommandDefinition::new("ban", BanHandler)
            .param(ParamSpec::required("user", ParamKind::User))
            .param(ParamSpec::optional_remainder("reason"))
            .precondition(Precondition::require_guild())
            .precondition(Precondition::require_user_permission(
                Permissions::BAN_MEMBERS,
            ))
            .precondition(Precondition::require_bot_permission(
                Permissions::BAN_MEMBERS,
            )),
    )?;

    router.register(
        CommandDefinition::new("echo", EchoHandler).param(ParamSpec::remainder("text")),
    )?;

    router.register(
        CommandDefinition::new("list", ListHandler).param(ParamSpec::variadic("items")),
    )?;

    router.register(
        CommandDefinition::new("guild_only", GuildOnlyHandler).precondition(
            Precondition::require_guild_with_error(
                "Sorry, this command must be ran from within a server, not a DM!",
            ),
        ),
    )?;

    // Usage lines are frozen here; the registry is immutable once built.
    let mut lines: Vec<String> = router.commands().map(|def| def.usage(prefix)).collect();
    lines.push(format!("{prefix}help"));
    router.register(CommandDefinition::new("help", HelpHandler { lines }))?;

    Ok(router)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a user id against the message's mention objects, falling back to
/// the REST capability.
async fn resolve_user(ctx: &Context, user_id: &str) -> Result<User, HandlerError> {
    if let Some(user) = ctx.message.mentioned_user(user_id) {
        return Ok(user.clone());
    }
    Ok(ctx.services.api.fetch_user(user_id).await?)
}

// ---------------------------------------------------------------------------
// ping
// ---------------------------------------------------------------------------

/// `ping` (aliases `pong`, `hello`): replies "pong", referencing the invoking
/// message, with latency derived from the message snowflake.
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &Context, _args: &Args) -> HandlerResult {
        let now = Utc::now();
        let latency = ctx
            .message
            .snowflake_timestamp_ms()
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
            .map(|sent_at| {
                format!(" ({}ms)", now.signed_duration_since(sent_at).num_milliseconds())
            })
            .unwrap_or_default();
        ctx.reply_with_reference(&format!("pong{latency}")).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

/// `cat`: fetches a cat picture and uploads it to the invoking channel.
pub struct CatHandler;

#[async_trait]
impl Handler for CatHandler {
    async fn handle(&self, ctx: &Context, _args: &Args) -> HandlerResult {
        let mut stream = ctx.services.pictures.fetch_cat_picture().await?;
        // The stream comes back positioned at its end; rewind before reading.
        stream.set_position(0);
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        ctx.services
            .api
            .send_file(&ctx.channel.id, "cat.png", bytes)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// userinfo
// ---------------------------------------------------------------------------

/// `userinfo [user]`: info on a user, or the invoker if none is given.
pub struct UserInfoHandler;

#[async_trait]
impl Handler for UserInfoHandler {
    async fn handle(&self, ctx: &Context, args: &Args) -> HandlerResult {
        let user = match args.user_id(0) {
            Some(id) => resolve_user(ctx, id).await?,
            None => ctx.author.clone(),
        };
        let created = user
            .created_at_ms()
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        ctx.reply(&format!("{} (id {}, created {})", user.tag(), user.id, created))
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ban
// ---------------------------------------------------------------------------

/// `ban <user> [reason...]`: guild-only, gated on BAN_MEMBERS for both the
/// invoker and the bot.
pub struct BanHandler;

#[async_trait]
impl Handler for BanHandler {
    async fn handle(&self, ctx: &Context, args: &Args) -> HandlerResult {
        let user_id = args.user_id(0).ok_or(HandlerError::MissingArgument("user"))?;
        let reason = args.str(1);
        let guild = ctx.guild.as_ref().ok_or(HandlerError::MissingGuild)?;

        info!(
            guild_id = %guild.id,
            target = %user_id,
            moderator = %ctx.author.tag(),
            "banning user"
        );
        ctx.services
            .api
            .ban_user(&guild.id, user_id, reason)
            .await?;
        ctx.reply("ok!").await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

/// `echo <text...>`: repeats the remainder text verbatim.
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, ctx: &Context, args: &Args) -> HandlerResult {
        let text = args.str(0).ok_or(HandlerError::MissingArgument("text"))?;
        // Lead with a zero-width space so the echo can't trigger other bots.
        ctx.reply(&format!("{ZWSP}{text}")).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

/// `list [items...]`: parses space-separated tokens into a sequence.
pub struct ListHandler;

#[async_trait]
impl Handler for ListHandler {
    async fn handle(&self, ctx: &Context, args: &Args) -> HandlerResult {
        let items = args.list(0).unwrap_or_default();
        ctx.reply(&format!("You listed: {}", items.join("; "))).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// guild_only
// ---------------------------------------------------------------------------

/// `guild_only`: does nothing interesting; exists to demonstrate a custom
/// precondition error.
pub struct GuildOnlyHandler;

#[async_trait]
impl Handler for GuildOnlyHandler {
    async fn handle(&self, ctx: &Context, _args: &Args) -> HandlerResult {
        ctx.reply("Nothing to see here!").await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

/// `help`: lists every command's usage line, generated from the registry at
/// build time.
pub struct HelpHandler {
    lines: Vec<String>,
}

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, ctx: &Context, _args: &Args) -> HandlerResult {
        ctx.reply(&format!("Available commands:\n{}", self.lines.join("\n")))
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
