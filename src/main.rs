//! Console-transport entry point.
//!
//! Runs the same dispatch pipeline as a live deployment, but inbound messages
//! come from stdin and the outbound capabilities print their actions. Useful
//! for poking at the command surface without a gateway connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use text_command_bot::bot::{Bot, BotConfig, Incoming};
use text_command_bot::context::{ApiError, ChatApi, Services};
use text_command_bot::handlers;
use text_command_bot::picture::PictureService;
use text_command_bot::types::{Channel, ChannelType, Guild, Message, Permissions, Snowflake, User};

// ---------------------------------------------------------------------------
// Console capabilities
// ---------------------------------------------------------------------------

/// [`ChatApi`] that prints every outbound action to stdout.
struct ConsoleApi;

#[async_trait]
impl ChatApi for ConsoleApi {
    async fn send_reply(
        &self,
        channel_id: &str,
        text: &str,
        reference: Option<&str>,
    ) -> Result<(), ApiError> {
        match reference {
            Some(message_id) => println!("[#{channel_id}] (re {message_id}) {text}"),
            None => println!("[#{channel_id}] {text}"),
        }
        Ok(())
    }

    async fn send_file(
        &self,
        channel_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        println!("[#{channel_id}] uploaded {filename} ({} bytes)", bytes.len());
        Ok(())
    }

    async fn ban_user(
        &self,
        guild_id: &str,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<(), ApiError> {
        let reason = reason.map(|r| format!(" ({r})")).unwrap_or_default();
        println!("[guild {guild_id}] banned {user_id}{reason}");
        Ok(())
    }

    async fn fetch_user(&self, user_id: &str) -> Result<User, ApiError> {
        Ok(User {
            id: user_id.to_string(),
            username: format!("user-{user_id}"),
            discriminator: None,
            bot: false,
            global_name: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Demo fixtures
// ---------------------------------------------------------------------------

fn demo_user() -> User {
    User {
        id: "100".to_string(),
        username: "console".to_string(),
        discriminator: None,
        bot: false,
        global_name: None,
    }
}

fn demo_channel() -> Channel {
    Channel {
        id: "200".to_string(),
        kind: ChannelType::GuildText,
        guild_id: Some("300".to_string()),
        name: Some("general".to_string()),
    }
}

fn demo_guild() -> Guild {
    Guild {
        id: "300".to_string(),
        name: "Console Guild".to_string(),
        owner_id: Some("100".to_string()),
    }
}

/// Snowflake-shaped id with the current time in the timestamp bits, so the
/// ping latency math works on console messages too.
fn next_snowflake(counter: &AtomicU64) -> Snowflake {
    let ms = chrono::Utc::now().timestamp_millis() as u64 - 1420070400000;
    ((ms << 22) | counter.fetch_add(1, Ordering::Relaxed)).to_string()
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Initialise tracing (respects RUST_LOG env, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    dotenv::dotenv().ok();

    let config = BotConfig::from_env();
    let router = match handlers::build_router(&config.prefix) {
        Ok(router) => Arc::new(router),
        Err(err) => {
            error!(error = %err, "command registration failed");
            std::process::exit(1);
        }
    };

    let services = Services {
        api: Arc::new(ConsoleApi),
        pictures: Arc::new(PictureService::new()),
    };
    let prefix = config.prefix.clone();
    let bot = Bot::new(config, router, services);

    info!(prefix = %prefix, "console bot ready, type commands");

    // Bridge stdin lines into the message loop the way a gateway feeds events.
    let (tx, rx) = async_channel::unbounded::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "failed to read stdin");
                    break;
                }
            }
        }
    });

    let counter = AtomicU64::new(0);
    while let Ok(line) = rx.recv().await {
        let message = Message {
            id: next_snowflake(&counter),
            channel_id: demo_channel().id,
            guild_id: Some(demo_guild().id),
            author: demo_user(),
            content: line,
            mentions: Vec::new(),
        };
        bot.on_message(Incoming {
            message,
            channel: demo_channel(),
            guild: Some(demo_guild()),
            author_permissions: Permissions::all(),
            bot_permissions: Permissions::all(),
        })
        .await;
    }

    info!("stdin closed, shutting down");
}
