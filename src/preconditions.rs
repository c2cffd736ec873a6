//! Precondition gates evaluated before a handler runs.
//!
//! Preconditions are attached to a command as an explicit ordered list and
//! checked in declaration order; the first failure short-circuits dispatch
//! with that gate's error text.

use crate::context::Context;
use crate::types::Permissions;

/// A boolean gate over the invocation context.
#[derive(Debug, Clone)]
pub enum Precondition {
    /// The command may only run inside a guild, not a DM.
    RequireGuild { error: Option<String> },
    /// The invoking user must hold all of these permissions.
    RequireUserPermission {
        required: Permissions,
        error: Option<String>,
    },
    /// The bot itself must hold all of these permissions.
    RequireBotPermission {
        required: Permissions,
        error: Option<String>,
    },
}

impl Precondition {
    pub fn require_guild() -> Self {
        Self::RequireGuild { error: None }
    }

    pub fn require_guild_with_error(error: impl Into<String>) -> Self {
        Self::RequireGuild {
            error: Some(error.into()),
        }
    }

    pub fn require_user_permission(required: Permissions) -> Self {
        Self::RequireUserPermission {
            required,
            error: None,
        }
    }

    pub fn require_bot_permission(required: Permissions) -> Self {
        Self::RequireBotPermission {
            required,
            error: None,
        }
    }

    /// Pass, or the error text to report to the invoking channel.
    pub fn check(&self, ctx: &Context) -> Result<(), String> {
        match self {
            Self::RequireGuild { error } => {
                if ctx.guild.is_some() {
                    Ok(())
                } else {
                    Err(error
                        .clone()
                        .unwrap_or_else(|| "This command can only be used in a server.".to_string()))
                }
            }
            Self::RequireUserPermission { required, error } => {
                if ctx.author_permissions.contains(*required) {
                    Ok(())
                } else {
                    Err(error.clone().unwrap_or_else(|| {
                        format!("You need the {} permission to do that.", required.names())
                    }))
                }
            }
            Self::RequireBotPermission { required, error } => {
                if ctx.bot_permissions.contains(*required) {
                    Ok(())
                } else {
                    Err(error.clone().unwrap_or_else(|| {
                        format!("I need the {} permission to do that.", required.names())
                    }))
                }
            }
        }
    }
}
