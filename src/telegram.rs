//! Telegram front end.
//!
//! Maps Telegram updates onto [`Controller`] events and sends the resulting
//! [`Reply`] back, translating [`Keyboard`]s into inline or reply markup.
//! Uses long polling through an explicit `Dispatcher`.
//!
//! | Update | Controller event |
//! |--------|------------------|
//! | `/start` | [`Controller::start`] |
//! | callback `folder:<label>` | [`Controller::select_category`] |
//! | any other text | [`Controller::text`] |

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::{
        InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ParseMode,
        ReplyMarkup, Update,
    },
};

use crate::config::Config;
use crate::controller::{Controller, Keyboard, Reply};
use crate::fetcher::HttpListing;
use crate::models::UserId;

/// Prefix of category button callback data.
pub const CALLBACK_PREFIX: &str = "folder:";

/// Telegram's limit on callback data, in bytes.
pub const MAX_CALLBACK_BYTES: usize = 64;

pub fn callback_data(label: &str) -> String {
    format!("{}{}", CALLBACK_PREFIX, label)
}

pub fn parse_callback(data: &str) -> Option<&str> {
    data.strip_prefix(CALLBACK_PREFIX)
}

/// True for `/start`, `/start@SomeBot` and `/start <payload>`.
pub fn is_start_command(text: &str) -> bool {
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    let command = first.split('@').next().unwrap_or(first);
    command == "/start"
}

/// Start the bot and block until it is stopped with Ctrl-C.
pub async fn run_bot(config: Config) -> Result<()> {
    let token = config.bot_token()?;
    let config = Arc::new(config);
    let source = Arc::new(HttpListing::new(&config.repository)?);
    let controller = Arc::new(Controller::new(config.clone(), source));

    let sweeper = controller.sessions().spawn_sweeper(
        Duration::from_secs(config.session.sweep_interval_secs),
        Duration::from_secs(config.session.idle_timeout_secs),
    );

    let bot = Bot::new(token);

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    tracing::info!(
        categories = config.categories.len(),
        allowed_users = config.access.allowed_users.len(),
        "bot started, polling for updates"
    );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .default_handler(|upd| async move {
            tracing::debug!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    sweeper.abort();
    tracing::info!("bot stopped");
    Ok(())
}

async fn message_handler(
    bot: Bot,
    msg: Message,
    controller: Arc<Controller>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref().map(|u| UserId(u.id.0)) else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let reply = if is_start_command(text) {
        controller.start(user).await
    } else {
        controller.text(user, text).await
    };

    send_reply(&bot, msg.chat.id, reply).await;
    Ok(())
}

async fn callback_handler(
    bot: Bot,
    query: CallbackQuery,
    controller: Arc<Controller>,
) -> ResponseResult<()> {
    let user = UserId(query.from.id.0);
    let label = query.data.as_deref().and_then(parse_callback);
    let chat_id = query.message.as_ref().map(|m| m.chat().id);

    if let (Some(label), Some(chat_id)) = (label, chat_id) {
        let reply = controller.select_category(user, label).await;
        send_reply(&bot, chat_id, reply).await;
    }

    bot.answer_callback_query(&query.id).await?;
    Ok(())
}

/// Send every message of a reply; the keyboard goes on the last one.
async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) {
    let last = reply.messages.len().saturating_sub(1);
    for (i, message) in reply.messages.into_iter().enumerate() {
        let mut request = bot.send_message(chat_id, message.text);
        if message.html {
            request = request.parse_mode(ParseMode::Html);
        }
        if i == last {
            if let Some(keyboard) = &reply.keyboard {
                request = request.reply_markup(markup(keyboard));
            }
        }
        if let Err(e) = request.await {
            tracing::warn!(chat = chat_id.0, error = %e, "failed to send message");
        }
    }
}

fn markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Categories(labels) => {
            let rows: Vec<Vec<InlineKeyboardButton>> = labels
                .chunks(2)
                .map(|row| {
                    row.iter()
                        .map(|label| InlineKeyboardButton::callback(label.clone(), callback_data(label)))
                        .collect()
                })
                .collect();
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
        }
        Keyboard::BackToMenu(text) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(vec![vec![KeyboardButton::new(text.clone())]]).resize_keyboard(),
        ),
    }
}
