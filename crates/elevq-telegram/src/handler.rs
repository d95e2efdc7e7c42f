// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and the polling loop shared by both bots.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, User};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Checks whether a user may act as dispatcher.
///
/// Updates without a sender never pass.
pub fn is_authorized(user: Option<&User>, allowed_users: &[String]) -> bool {
    user.is_some_and(|u| is_allowed(u.id.0, u.username.as_deref(), allowed_users))
}

/// Authorization passes if the user id (as string) or username matches any
/// entry in `allowed_users`, with or without a leading `@`. An empty list
/// allows every user.
pub fn is_allowed(user_id: u64, username: Option<&str>, allowed_users: &[String]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }
    let user_id_str = user_id.to_string();
    allowed_users.iter().any(|allowed| {
        if *allowed == user_id_str {
            return true;
        }
        let allowed_clean = allowed.strip_prefix('@').unwrap_or(allowed);
        username.is_some_and(|name| name.eq_ignore_ascii_case(allowed_clean))
    })
}

/// Checks whether the message is from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Display name of the sender, if any.
pub fn sender_name(msg: &Message) -> Option<String> {
    msg.from.as_ref().map(|u| u.full_name())
}

/// Chat and message id of the message a callback button belongs to.
pub fn callback_origin(q: &CallbackQuery) -> Option<(ChatId, teloxide::types::MessageId)> {
    q.message.as_ref().map(|m| (m.chat().id, m.id()))
}

/// Long-poll `bot` with `handler` until `shutdown` is cancelled.
pub(crate) async fn run_until_cancelled(
    bot: Bot,
    handler: UpdateHandler<teloxide::RequestError>,
    name: &'static str,
    shutdown: CancellationToken,
) {
    let mut dispatcher = Dispatcher::builder(bot, handler)
        .default_handler(|upd| async move {
            debug!(update_id = upd.id.0, "ignoring unhandled update");
        })
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        match token.shutdown() {
            Ok(done) => done.await,
            Err(e) => warn!(bot = name, error = %e, "bot was not running at shutdown"),
        }
    });

    info!(bot = name, "starting Telegram long polling");
    dispatcher.dispatch().await;
    info!(bot = name, "Telegram long polling stopped");
}
