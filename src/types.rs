//! Typed representations of chat-platform objects.
//!
//! These mirror the platform's API objects so the transport can deserialize
//! inbound messages without touching `serde_json::Value` in the rest of the
//! codebase. Only the objects this bot actually reads are modeled.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Platform IDs are snowflakes transmitted as strings in JSON.
pub type Snowflake = String;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: Option<String>,
    #[serde(default)]
    pub bot: bool,
    pub global_name: Option<String>,
}

impl User {
    /// `Username#Discriminator`, or just `Username` for the new username system.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some("0") | None => self.username.clone(),
            Some(disc) => format!("{}#{}", self.username, disc),
        }
    }

    /// Unix-millis timestamp derived from the user snowflake.
    pub fn created_at_ms(&self) -> Option<u64> {
        self.id
            .parse::<u64>()
            .ok()
            .map(|sf| (sf >> 22) + 1420070400000)
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr, Serialize_repr)]
#[repr(u8)]
pub enum ChannelType {
    GuildText = 0,
    Dm = 1,
    GuildVoice = 2,
    GroupDm = 3,
    GuildCategory = 4,
    GuildAnnouncement = 5,
    AnnouncementThread = 10,
    PublicThread = 11,
    PrivateThread = 12,
    GuildStageVoice = 13,
    GuildDirectory = 14,
    GuildForum = 15,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Guild
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Option<Snowflake>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub author: User,
    pub content: String,
    /// Users mentioned in the content, resolved by the transport.
    #[serde(default)]
    pub mentions: Vec<User>,
}

impl Message {
    /// Unix-millis timestamp derived from the message snowflake.
    pub fn snowflake_timestamp_ms(&self) -> Option<u64> {
        self.id
            .parse::<u64>()
            .ok()
            .map(|sf| (sf >> 22) + 1420070400000)
    }

    /// Whether a given user id is mentioned in the message.
    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|u| u.id == user_id)
    }

    /// The resolved mention object for a user id, if present.
    pub fn mentioned_user(&self, user_id: &str) -> Option<&User> {
        self.mentions.iter().find(|u| u.id == user_id)
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

bitflags::bitflags! {
    /// Guild permission bits, as transmitted by the platform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u64 {
        const CREATE_INSTANT_INVITE = 1 << 0;
        const KICK_MEMBERS = 1 << 1;
        const BAN_MEMBERS = 1 << 2;
        const ADMINISTRATOR = 1 << 3;
        const MANAGE_CHANNELS = 1 << 4;
        const MANAGE_GUILD = 1 << 5;
        const SEND_MESSAGES = 1 << 11;
        const MANAGE_MESSAGES = 1 << 13;
        const ATTACH_FILES = 1 << 15;
        const MENTION_EVERYONE = 1 << 17;
    }
}

impl Permissions {
    /// Human-readable names of the set bits, for precondition error text.
    pub fn names(&self) -> String {
        self.iter_names()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_tokens, Token};

    // -- User --------------------------------------------------------------

    #[test]
    fn tag_with_legacy_discriminator() {
        let user = User {
            id: "1".to_string(),
            username: "alice".to_string(),
            discriminator: Some("1234".to_string()),
            bot: false,
            global_name: None,
        };
        assert_eq!(user.tag(), "alice#1234");
    }

    #[test]
    fn tag_without_discriminator() {
        let user = User {
            id: "1".to_string(),
            username: "alice".to_string(),
            discriminator: Some("0".to_string()),
            bot: false,
            global_name: Some("Alice".to_string()),
        };
        assert_eq!(user.tag(), "alice");
    }

    #[test]
    fn user_created_at_from_snowflake() {
        // Snowflake 0 maps to the platform epoch.
        let user = User {
            id: "0".to_string(),
            username: "epoch".to_string(),
            discriminator: None,
            bot: false,
            global_name: None,
        };
        assert_eq!(user.created_at_ms(), Some(1420070400000));
    }

    #[test]
    fn user_created_at_non_numeric_id() {
        let user = User {
            id: "not-a-snowflake".to_string(),
            username: "x".to_string(),
            discriminator: None,
            bot: false,
            global_name: None,
        };
        assert_eq!(user.created_at_ms(), None);
    }

    // -- Message -----------------------------------------------------------

    fn sample_message() -> Message {
        serde_json::from_value(serde_json::json!({
            "id": "4194304",
            "channel_id": "10",
            "guild_id": "20",
            "author": { "id": "1", "username": "alice" },
            "content": "!ping",
            "mentions": [{ "id": "2", "username": "bob" }]
        }))
        .unwrap()
    }

    #[test]
    fn message_deserializes_with_defaults() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "id": "1",
            "channel_id": "10",
            "guild_id": null,
            "author": { "id": "1", "username": "alice" },
            "content": "hi"
        }))
        .unwrap();
        assert!(msg.mentions.is_empty());
        assert!(!msg.author.bot);
    }

    #[test]
    fn message_snowflake_timestamp() {
        // 4194304 == 1 << 22, i.e. one millisecond past the epoch.
        assert_eq!(
            sample_message().snowflake_timestamp_ms(),
            Some(1420070400001)
        );
    }

    #[test]
    fn mentioned_user_lookup() {
        let msg = sample_message();
        assert!(msg.mentions_user("2"));
        assert!(!msg.mentions_user("3"));
        assert_eq!(msg.mentioned_user("2").map(|u| u.username.as_str()), Some("bob"));
    }

    // -- ChannelType -------------------------------------------------------

    #[test]
    fn channel_type_serializes_as_integer() {
        assert_tokens(&ChannelType::GuildText, &[Token::U8(0)]);
        assert_tokens(&ChannelType::Dm, &[Token::U8(1)]);
        assert_tokens(&ChannelType::GuildForum, &[Token::U8(15)]);
    }

    // -- Permissions -------------------------------------------------------

    #[test]
    fn permission_names_for_error_text() {
        assert_eq!(Permissions::BAN_MEMBERS.names(), "BAN_MEMBERS");
        assert_eq!(
            (Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS).names(),
            "KICK_MEMBERS, BAN_MEMBERS"
        );
    }
}
