//! Telegram transport: turns updates into [`InboundEvent`]s and renders the replies.

use crate::core::dispatcher::{Dispatcher, InboundEvent};
use crate::core::menu::{self, PHOTO_UNAVAILABLE_NOTE};
use crate::core::reply::{Content, OutboundAction, QuickReplies};
use crate::infrastructure::entities::UserSummary;
use crate::infrastructure::messenger::MARKDOWN;
use di::Ref;
use log::{error, info, warn};
use std::path::Path;
use teloxide::RequestError;
use teloxide::payloads::{SendMessageSetters, SendPhotoSetters};
use teloxide::prelude::*;
use teloxide::types::{InputFile, KeyboardButton, KeyboardMarkup};

/// The bot's own username, used to skip commands meant for other bots in groups.
#[derive(Debug, Clone, Default)]
struct OwnUsername(Option<String>);

/// Polls Telegram until the process is interrupted.
pub async fn run(bot: Bot, dispatcher: Ref<Dispatcher>) {
    let own_username = match bot.get_me().await {
        Ok(me) => OwnUsername(me.user.username.clone()),
        Err(e) => {
            warn!("could not read bot username ({e}), accepting every command suffix");
            OwnUsername::default()
        }
    };
    let handler = Update::filter_message().endpoint(on_message);

    info!("bot started");
    teloxide::dispatching::Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher, own_username])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Text messages with a known sender; everything else is ignored.
pub fn inbound_event(msg: &Message) -> Option<InboundEvent> {
    let text = msg.text()?;
    let user = msg.from.as_ref()?;

    Some(InboundEvent {
        chat_id: msg.chat.id.0,
        sender: UserSummary {
            identity: user.id.0 as i64,
            handle: user.username.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
        },
        text: text.to_owned(),
    })
}

async fn on_message(
    bot: Bot,
    msg: Message,
    dispatcher: Ref<Dispatcher>,
    own_username: OwnUsername,
) -> ResponseResult<()> {
    let Some(event) = inbound_event(&msg) else {
        return Ok(());
    };
    if let Some(own) = own_username.0.as_deref() {
        if menu::addressed_elsewhere(&event.text, own) {
            return Ok(());
        }
    }

    match dispatcher.handle(&event).await {
        Ok(action) => render(&bot, msg.chat.id, action).await,
        Err(e) => {
            error!("failed to handle message in chat {}: {e}", event.chat_id);
            Ok(())
        }
    }
}

pub fn keyboard(quick_replies: QuickReplies) -> KeyboardMarkup {
    KeyboardMarkup::new(
        quick_replies
            .rows()
            .into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
    .resize_keyboard()
}

async fn render(bot: &Bot, chat: ChatId, action: OutboundAction) -> ResponseResult<()> {
    match action.content {
        Content::Text(text) => {
            send_text(bot, chat, text, action.markdown, action.quick_replies).await
        }
        Content::Photo { path, caption } => {
            match send_photo(bot, chat, &path, &caption, action.quick_replies).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!("photo {} unavailable ({e}), sending text only", path.display());
                    let text = format!("{caption}\n\n{PHOTO_UNAVAILABLE_NOTE}");
                    send_text(bot, chat, text, true, action.quick_replies).await
                }
            }
        }
    }
}

async fn send_text(
    bot: &Bot,
    chat: ChatId,
    text: String,
    markdown: bool,
    quick_replies: Option<QuickReplies>,
) -> ResponseResult<()> {
    let mut request = bot.send_message(chat, text.clone());
    if markdown {
        request = request.parse_mode(MARKDOWN);
    }
    if let Some(quick_replies) = quick_replies {
        request = request.reply_markup(keyboard(quick_replies));
    }

    match request.await {
        Ok(_) => Ok(()),
        // AI answers may carry unbalanced markers; resend them as plain text.
        Err(RequestError::Api(e)) if markdown => {
            warn!("markdown rejected in chat {chat} ({e}), resending as plain text");
            let mut request = bot.send_message(chat, text);
            if let Some(quick_replies) = quick_replies {
                request = request.reply_markup(keyboard(quick_replies));
            }
            request.await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn send_photo(
    bot: &Bot,
    chat: ChatId,
    path: &Path,
    caption: &str,
    quick_replies: Option<QuickReplies>,
) -> Result<(), String> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err("file not found".to_owned());
    }

    let mut request = bot
        .send_photo(chat, InputFile::file(path))
        .caption(caption)
        .parse_mode(MARKDOWN);
    if let Some(quick_replies) = quick_replies {
        request = request.reply_markup(keyboard(quick_replies));
    }
    request.await.map(|_| ()).map_err(|e| e.to_string())
}
