//! Telegram implementation of outbound pushes.

use crate::core::traits::{DependencyError, Messenger};
use crate::infrastructure::settings::Settings;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::warn;
use teloxide::RequestError;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ParseMode};

/// Replies are written for the legacy Markdown dialect.
#[allow(deprecated)]
pub const MARKDOWN: ParseMode = ParseMode::Markdown;

pub struct TelegramMessenger {
    bot: Bot,
}

#[injectable(Messenger)]
impl TelegramMessenger {
    #[inject]
    pub fn create(settings: Ref<Settings>) -> TelegramMessenger {
        TelegramMessenger::new(Bot::new(&settings.bot_token))
    }
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> TelegramMessenger {
        TelegramMessenger { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn push(&self, identity: i64, text: &str) -> Result<(), DependencyError> {
        let sent = self
            .bot
            .send_message(ChatId(identity), text)
            .parse_mode(MARKDOWN)
            .await;

        let sent = match sent {
            Err(RequestError::Api(e)) => {
                warn!("markdown push to {identity} rejected ({e}), resending as plain text");
                self.bot.send_message(ChatId(identity), text).await
            }
            other => other,
        };

        sent.map(|_| ())
            .map_err(|e| DependencyError::Unavailable(e.to_string()))
    }

    async fn show_typing(&self, chat: i64) -> Result<(), DependencyError> {
        self.bot
            .send_chat_action(ChatId(chat), ChatAction::Typing)
            .await
            .map(|_| ())
            .map_err(|e| DependencyError::Unavailable(e.to_string()))
    }
}
