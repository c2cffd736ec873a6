//! Shared fixtures for the integration tests: a recording `ChatApi`, a canned
//! picture provider, and context builders.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use text_command_bot::context::{ApiError, ChatApi, Context, Services};
use text_command_bot::picture::{PictureError, PictureProvider};
use text_command_bot::types::{Channel, ChannelType, Guild, Message, Permissions, User};

// ---------------------------------------------------------------------------
// Recording capabilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Reply {
        channel_id: String,
        text: String,
        reference: Option<String>,
    },
    File {
        channel_id: String,
        filename: String,
        len: usize,
    },
    Ban {
        guild_id: String,
        user_id: String,
        reason: Option<String>,
    },
}

/// Records every outbound call instead of performing it.
#[derive(Default)]
pub struct RecordingApi {
    actions: Mutex<Vec<Action>>,
}

impl RecordingApi {
    pub async fn actions(&self) -> Vec<Action> {
        self.actions.lock().await.clone()
    }

    pub async fn replies(&self) -> Vec<String> {
        self.actions()
            .await
            .into_iter()
            .filter_map(|action| match action {
                Action::Reply { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub async fn bans(&self) -> Vec<Action> {
        self.actions()
            .await
            .into_iter()
            .filter(|action| matches!(action, Action::Ban { .. }))
            .collect()
    }
}

#[async_trait]
impl ChatApi for RecordingApi {
    async fn send_reply(
        &self,
        channel_id: &str,
        text: &str,
        reference: Option<&str>,
    ) -> Result<(), ApiError> {
        self.actions.lock().await.push(Action::Reply {
            channel_id: channel_id.to_string(),
            text: text.to_string(),
            reference: reference.map(str::to_string),
        });
        Ok(())
    }

    async fn send_file(
        &self,
        channel_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        self.actions.lock().await.push(Action::File {
            channel_id: channel_id.to_string(),
            filename: filename.to_string(),
            len: bytes.len(),
        });
        Ok(())
    }

    async fn ban_user(
        &self,
        guild_id: &str,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<(), ApiError> {
        self.actions.lock().await.push(Action::Ban {
            guild_id: guild_id.to_string(),
            user_id: user_id.to_string(),
            reason: reason.map(str::to_string),
        });
        Ok(())
    }

    async fn fetch_user(&self, user_id: &str) -> Result<User, ApiError> {
        Ok(user(user_id, &format!("user-{user_id}")))
    }
}

/// Seven canned bytes, cursor parked at a non-zero position so callers must
/// rewind before reading.
pub struct FakePictures;

#[async_trait]
impl PictureProvider for FakePictures {
    async fn fetch_cat_picture(&self) -> Result<Cursor<Vec<u8>>, PictureError> {
        let mut stream = Cursor::new(b"PNGDATA".to_vec());
        stream.set_position(7);
        Ok(stream)
    }
}

pub fn services(api: &Arc<RecordingApi>) -> Services {
    Services {
        api: api.clone(),
        pictures: Arc::new(FakePictures),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        username: name.to_string(),
        discriminator: None,
        bot: false,
        global_name: None,
    }
}

pub fn message(content: &str, mentions: Vec<User>) -> Message {
    Message {
        id: "4194304".to_string(),
        channel_id: "10".to_string(),
        guild_id: Some("20".to_string()),
        author: user("1", "alice"),
        content: content.to_string(),
        mentions,
    }
}

fn channel(kind: ChannelType, guild_id: Option<&str>) -> Channel {
    Channel {
        id: "10".to_string(),
        kind,
        guild_id: guild_id.map(str::to_string),
        name: Some("general".to_string()),
    }
}

fn guild() -> Guild {
    Guild {
        id: "20".to_string(),
        name: "Test Guild".to_string(),
        owner_id: Some("1".to_string()),
    }
}

/// Context for a message sent inside a guild.
pub fn guild_ctx(
    services: Services,
    content: &str,
    mentions: Vec<User>,
    author_permissions: Permissions,
    bot_permissions: Permissions,
) -> Context {
    Context::new(
        message(content, mentions),
        channel(ChannelType::GuildText, Some("20")),
        Some(guild()),
        author_permissions,
        bot_permissions,
        services,
    )
}

/// Context for a direct message (no guild).
pub fn dm_ctx(services: Services, content: &str) -> Context {
    let mut msg = message(content, Vec::new());
    msg.guild_id = None;
    Context::new(
        msg,
        channel(ChannelType::Dm, None),
        None,
        Permissions::empty(),
        Permissions::empty(),
        services,
    )
}
