//! Per-invocation context and the capabilities injected into it.
//!
//! All outbound effects go through [`ChatApi`] so that handlers never own a
//! transport: a live deployment implements the trait against its REST layer,
//! the binary ships a console implementation, and tests record calls.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::picture::PictureProvider;
use crate::types::{Channel, Guild, Message, Permissions, User};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the outbound chat capabilities.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success status from the platform.
    #[error("api error on {route}: {status} {body}")]
    Api {
        status: u16,
        body: String,
        route: String,
    },
    /// Transport / network error.
    #[error("api transport error: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Outbound actions supplied by the external service layer.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send a text reply to a channel, optionally referencing an earlier message.
    async fn send_reply(
        &self,
        channel_id: &str,
        text: &str,
        reference: Option<&str>,
    ) -> Result<(), ApiError>;

    /// Upload a file to a channel.
    async fn send_file(
        &self,
        channel_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError>;

    /// Ban a user from a guild.
    async fn ban_user(
        &self,
        guild_id: &str,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<(), ApiError>;

    /// Fetch a user object by id.
    async fn fetch_user(&self, user_id: &str) -> Result<User, ApiError>;
}

/// Capability bundle handed to every handler by explicit injection; there is
/// no service container to look things up in.
#[derive(Clone)]
pub struct Services {
    pub api: Arc<dyn ChatApi>,
    pub pictures: Arc<dyn PictureProvider>,
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Read-only view of one invocation: who said what, where, and with which
/// permissions. Built per message, dropped after handling.
pub struct Context {
    pub author: User,
    pub channel: Channel,
    pub guild: Option<Guild>,
    /// The raw inbound message, including resolved mention objects.
    pub message: Message,
    /// The invoking user's effective permissions in the channel.
    pub author_permissions: Permissions,
    /// The bot's own effective permissions in the channel.
    pub bot_permissions: Permissions,
    pub services: Services,
}

impl Context {
    pub fn new(
        message: Message,
        channel: Channel,
        guild: Option<Guild>,
        author_permissions: Permissions,
        bot_permissions: Permissions,
        services: Services,
    ) -> Self {
        Self {
            author: message.author.clone(),
            channel,
            guild,
            message,
            author_permissions,
            bot_permissions,
            services,
        }
    }

    /// Reply in the invoking channel.
    pub async fn reply(&self, text: &str) -> Result<(), ApiError> {
        self.services
            .api
            .send_reply(&self.channel.id, text, None)
            .await
    }

    /// Reply in the invoking channel, referencing the invoking message.
    pub async fn reply_with_reference(&self, text: &str) -> Result<(), ApiError> {
        self.services
            .api
            .send_reply(&self.channel.id, text, Some(&self.message.id))
            .await
    }
}
