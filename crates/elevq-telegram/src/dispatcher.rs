// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatcher-facing bot: daily boards, arrival/unload/cancel buttons,
//! elevator filter and CSV export.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use dashmap::DashMap;
use elevq_core::{ActionToken, BookingId, BookingStore, Elevator, ElevqError};
use elevq_engine::BookingEngine;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::utils::command::BotCommands;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{format, handler, keyboards};

/// Days covered by `/schedule` after today.
const SCHEDULE_DAYS_AHEAD: i64 = 3;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Dispatcher commands:")]
pub enum DispatcherCommand {
    #[command(description = "show this overview")]
    Start,
    #[command(description = "bookings for today")]
    Today,
    #[command(description = "bookings for tomorrow")]
    Tomorrow,
    #[command(description = "bookings from today through the next three days")]
    Schedule,
    #[command(description = "CSV of a day, e.g. /export 2026-03-02")]
    Export(String),
    #[command(description = "choose the elevator to show")]
    Elevators,
}

/// Dispatcher bot state: the engine, the allow list and a per-chat
/// elevator filter.
pub struct DispatcherBot<S> {
    engine: Arc<BookingEngine<S>>,
    allowed_users: Vec<String>,
    filters: DashMap<ChatId, Elevator>,
}

impl<S: BookingStore> DispatcherBot<S> {
    pub fn new(engine: Arc<BookingEngine<S>>, allowed_users: Vec<String>) -> Self {
        Self {
            engine,
            allowed_users,
            filters: DashMap::new(),
        }
    }

    /// Poll for updates until `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, bot: Bot, shutdown: CancellationToken) {
        handler::run_until_cancelled(bot, self.schema(), "dispatcher", shutdown).await;
    }

    fn schema(self: &Arc<Self>) -> UpdateHandler<teloxide::RequestError> {
        let for_messages = Arc::clone(self);
        let for_callbacks = Arc::clone(self);
        let on_command = Arc::clone(self);
        let on_text = Arc::clone(self);
        let on_callback = Arc::clone(self);

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter(move |msg: Message| {
                        let allowed =
                            handler::is_authorized(msg.from.as_ref(), &for_messages.allowed_users);
                        if !allowed {
                            debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                        }
                        allowed
                    })
                    .branch(dptree::entry().filter_command::<DispatcherCommand>().endpoint(
                        move |bot: Bot, msg: Message, cmd: DispatcherCommand| {
                            let this = Arc::clone(&on_command);
                            async move { this.on_command(bot, msg, cmd).await }
                        },
                    ))
                    .branch(dptree::endpoint(move |bot: Bot, msg: Message| {
                        let this = Arc::clone(&on_text);
                        async move { this.on_text(bot, msg).await }
                    })),
            )
            .branch(
                Update::filter_callback_query()
                    .filter(move |q: CallbackQuery| {
                        handler::is_authorized(Some(&q.from), &for_callbacks.allowed_users)
                    })
                    .endpoint(move |bot: Bot, q: CallbackQuery| {
                        let this = Arc::clone(&on_callback);
                        async move { this.on_callback(bot, q).await }
                    }),
            )
    }

    async fn on_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: DispatcherCommand,
    ) -> ResponseResult<()> {
        let chat = msg.chat.id;
        let today = self.engine.today();
        match cmd {
            DispatcherCommand::Start => {
                bot.send_message(chat, DispatcherCommand::descriptions().to_string())
                    .reply_markup(keyboards::dispatcher_menu())
                    .await?;
            }
            DispatcherCommand::Today => self.show_day(&bot, chat, today).await?,
            DispatcherCommand::Tomorrow => {
                self.show_day(&bot, chat, today + Duration::days(1)).await?
            }
            DispatcherCommand::Schedule => self.show_schedule(&bot, chat, today).await?,
            DispatcherCommand::Export(arg) => self.export(&bot, chat, &arg, today).await?,
            DispatcherCommand::Elevators => self.show_elevators(&bot, chat).await?,
        }
        Ok(())
    }

    async fn on_text(&self, bot: Bot, msg: Message) -> ResponseResult<()> {
        let chat = msg.chat.id;
        let today = self.engine.today();
        match msg.text().map(str::trim) {
            Some(keyboards::TODAY) => self.show_day(&bot, chat, today).await,
            Some(keyboards::TOMORROW) => {
                self.show_day(&bot, chat, today + Duration::days(1)).await
            }
            Some(keyboards::CHANGE_ELEVATOR) => self.show_elevators(&bot, chat).await,
            _ => {
                bot.send_message(chat, "Choose an option from the menu.")
                    .reply_markup(keyboards::dispatcher_menu())
                    .await?;
                Ok(())
            }
        }
    }

    fn filter(&self, chat: ChatId) -> Option<Elevator> {
        self.filters.get(&chat).map(|e| e.value().clone())
    }

    /// One card per non-cancelled booking of `day`.
    async fn show_day(&self, bot: &Bot, chat: ChatId, day: NaiveDate) -> ResponseResult<()> {
        let filter = self.filter(chat);
        let cards = match self
            .engine
            .board(filter.as_ref().map(|e| e.id), day, day)
            .await
        {
            Ok(cards) => cards,
            Err(e) => return self.report(bot, chat, &e).await,
        };

        let scope = filter.map_or_else(|| "all elevators".to_string(), |e| e.name);
        if cards.is_empty() {
            bot.send_message(
                chat,
                format!("No bookings on {} ({scope}).", day.format("%Y-%m-%d")),
            )
            .await?;
            return Ok(());
        }

        bot.send_message(
            chat,
            format!(
                "{} bookings on {} ({scope}):",
                cards.len(),
                day.format("%Y-%m-%d")
            ),
        )
        .await?;
        let settings = self.engine.settings();
        for card in &cards {
            let actions = format::card_actions(&card.booking);
            let request = bot.send_message(chat, format::booking_card(card, settings));
            if actions.is_empty() {
                request.await?;
            } else {
                request
                    .reply_markup(keyboards::inline_actions(&actions))
                    .await?;
            }
        }
        Ok(())
    }

    async fn show_schedule(&self, bot: &Bot, chat: ChatId, today: NaiveDate) -> ResponseResult<()> {
        let elevator = self.filter(chat).map(|e| e.id);
        let until = today + Duration::days(SCHEDULE_DAYS_AHEAD);
        match self.engine.board(elevator, today, until).await {
            Ok(cards) => {
                bot.send_message(chat, format::schedule(&cards, self.engine.settings()))
                    .await?;
                Ok(())
            }
            Err(e) => self.report(bot, chat, &e).await,
        }
    }

    async fn export(
        &self,
        bot: &Bot,
        chat: ChatId,
        arg: &str,
        today: NaiveDate,
    ) -> ResponseResult<()> {
        let arg = arg.trim();
        let day = if arg.is_empty() {
            today
        } else {
            match NaiveDate::parse_from_str(arg, "%Y-%m-%d") {
                Ok(day) => day,
                Err(_) => {
                    bot.send_message(chat, "Usage: /export YYYY-MM-DD").await?;
                    return Ok(());
                }
            }
        };

        let elevator = self.filter(chat).map(|e| e.id);
        match self.engine.export_day(elevator, day).await {
            Ok(csv) => {
                let name = format!("bookings_{}.csv", day.format("%Y-%m-%d"));
                bot.send_document(chat, InputFile::memory(csv).file_name(name))
                    .await?;
                info!(chat_id = chat.0, %day, "bookings exported");
                Ok(())
            }
            Err(e) => self.report(bot, chat, &e).await,
        }
    }

    async fn show_elevators(&self, bot: &Bot, chat: ChatId) -> ResponseResult<()> {
        match self.engine.elevators().await {
            Ok(elevators) if elevators.is_empty() => {
                bot.send_message(chat, "No elevators are configured.").await?;
                Ok(())
            }
            Ok(elevators) => {
                bot.send_message(chat, "Choose an elevator:")
                    .reply_markup(keyboards::elevator_picker(&elevators))
                    .await?;
                Ok(())
            }
            Err(e) => self.report(bot, chat, &e).await,
        }
    }

    async fn on_callback(&self, bot: Bot, q: CallbackQuery) -> ResponseResult<()> {
        let Some(data) = q.data.as_deref() else {
            return Ok(());
        };
        let origin = handler::callback_origin(&q);

        let answer = match data.parse::<ActionToken>() {
            Ok(ActionToken::Elevator(name)) => match self.engine.elevator_by_name(&name).await {
                Ok(elevator) => {
                    let text = format!("Showing {}", elevator.name);
                    if let Some((chat, message_id)) = origin {
                        self.filters.insert(chat, elevator);
                        bot.edit_message_text(chat, message_id, text.clone()).await?;
                    }
                    text
                }
                Err(e) => format::error_text(&e),
            },
            Ok(ActionToken::Arrive(id)) => {
                let result = self.engine.mark_arrived(id).await.map(|b| {
                    if b.is_late() {
                        "Marked arrived (late)".to_string()
                    } else {
                        "Marked arrived".to_string()
                    }
                });
                self.after_transition(&bot, origin, id, result).await?
            }
            Ok(ActionToken::Unload(id)) => {
                let result = self.engine.mark_unloaded(id).await.map(|t| match t.offer {
                    Some(offer) => format!("Marked unloaded, slot offered to #{}", offer.candidate),
                    None => "Marked unloaded".to_string(),
                });
                self.after_transition(&bot, origin, id, result).await?
            }
            Ok(ActionToken::Cancel(id)) => {
                let result = self.engine.cancel(id).await.map(|t| match t.offer {
                    Some(offer) => format!("Cancelled, slot offered to #{}", offer.candidate),
                    None => "Cancelled".to_string(),
                });
                self.after_transition(&bot, origin, id, result).await?
            }
            Ok(other) => {
                debug!(token = %other, "ignoring driver token on the dispatcher bot");
                "This button is not available here.".to_string()
            }
            Err(e) => {
                warn!(error = %e, "malformed callback data");
                "This button is no longer valid.".to_string()
            }
        };

        bot.answer_callback_query(q.id.clone()).text(answer).await?;
        Ok(())
    }

    /// Re-render the card in place after a transition and return the text
    /// for the callback answer.
    async fn after_transition(
        &self,
        bot: &Bot,
        origin: Option<(ChatId, teloxide::types::MessageId)>,
        id: BookingId,
        result: Result<String, ElevqError>,
    ) -> ResponseResult<String> {
        let answer = match result {
            Ok(answer) => answer,
            Err(e) => {
                if !e.is_user_facing() {
                    warn!(booking_id = %id, error = %e, "dispatcher action failed");
                }
                return Ok(format::error_text(&e));
            }
        };

        if let Some((chat, message_id)) = origin {
            match self.engine.booking(id).await {
                Ok(card) => {
                    let actions = format::card_actions(&card.booking);
                    let edit = bot.edit_message_text(
                        chat,
                        message_id,
                        format::booking_card(&card, self.engine.settings()),
                    );
                    if actions.is_empty() {
                        edit.await?;
                    } else {
                        edit.reply_markup(keyboards::inline_actions(&actions)).await?;
                    }
                }
                Err(e) => warn!(booking_id = %id, error = %e, "could not refresh booking card"),
            }
        }
        Ok(answer)
    }

    /// Tell the dispatcher an engine call failed.
    async fn report(&self, bot: &Bot, chat: ChatId, error: &ElevqError) -> ResponseResult<()> {
        if !error.is_user_facing() {
            warn!(chat_id = chat.0, error = %error, "dispatcher request failed");
        }
        bot.send_message(chat, format::error_text(error)).await?;
        Ok(())
    }
}
