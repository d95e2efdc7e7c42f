// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The driver-facing bot: booking dialog, own bookings and offer answers.

use std::sync::Arc;

use dashmap::DashMap;
use elevq_core::{ActionToken, BookingStore, ElevqError, RecipientHandle};
use elevq_engine::{BookingEngine, BookingRequest};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{KeyboardRemove, ReplyMarkup};
use teloxide::utils::command::BotCommands;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dialog::{self, Confirmation, Dialog};
use crate::{format, handler, keyboards};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum DriverCommand {
    #[command(description = "show the main menu")]
    Start,
    #[command(description = "how booking works")]
    Help,
    #[command(description = "book an unloading slot")]
    Book,
    #[command(description = "list your bookings")]
    MyBookings,
}

const HELP_TEXT: &str = "To book a slot: pick an elevator, a date, a free time and enter \
your truck's license plate, then confirm.\n\
You get a confirmation, reminders before your slot and a message whenever \
your place in the queue changes. If the elevator frees up early you may be \
asked to come right away.";

/// Driver bot state: the engine plus one in-progress dialog per chat.
pub struct DriverBot<S> {
    engine: Arc<BookingEngine<S>>,
    dialogs: DashMap<ChatId, Dialog>,
}

impl<S: BookingStore> DriverBot<S> {
    pub fn new(engine: Arc<BookingEngine<S>>) -> Self {
        Self {
            engine,
            dialogs: DashMap::new(),
        }
    }

    /// Poll for updates until `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, bot: Bot, shutdown: CancellationToken) {
        handler::run_until_cancelled(bot, self.schema(), "driver", shutdown).await;
    }

    fn schema(self: &Arc<Self>) -> UpdateHandler<teloxide::RequestError> {
        let on_command = Arc::clone(self);
        let on_text = Arc::clone(self);
        let on_callback = Arc::clone(self);

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| handler::is_dm(&msg))
                    .branch(dptree::entry().filter_command::<DriverCommand>().endpoint(
                        move |bot: Bot, msg: Message, cmd: DriverCommand| {
                            let this = Arc::clone(&on_command);
                            async move { this.on_command(bot, msg, cmd).await }
                        },
                    ))
                    .branch(dptree::endpoint(move |bot: Bot, msg: Message| {
                        let this = Arc::clone(&on_text);
                        async move { this.on_text(bot, msg).await }
                    })),
            )
            .branch(Update::filter_callback_query().endpoint(
                move |bot: Bot, q: CallbackQuery| {
                    let this = Arc::clone(&on_callback);
                    async move { this.on_callback(bot, q).await }
                },
            ))
    }

    async fn on_command(&self, bot: Bot, msg: Message, cmd: DriverCommand) -> ResponseResult<()> {
        let chat = msg.chat.id;
        match cmd {
            DriverCommand::Start => {
                self.dialogs.remove(&chat);
                bot.send_message(chat, "Welcome! Book an unloading slot or check your bookings.")
                    .reply_markup(keyboards::driver_menu())
                    .await?;
            }
            DriverCommand::Help => self.send_help(&bot, chat).await?,
            DriverCommand::Book => self.start_booking(&bot, chat).await?,
            DriverCommand::MyBookings => self.show_bookings(&bot, chat).await?,
        }
        Ok(())
    }

    async fn on_text(&self, bot: Bot, msg: Message) -> ResponseResult<()> {
        let chat = msg.chat.id;
        let Some(text) = msg.text() else {
            return Ok(());
        };

        match text.trim() {
            keyboards::BOOK => return self.start_booking(&bot, chat).await,
            keyboards::MY_BOOKINGS => {
                self.dialogs.remove(&chat);
                return self.show_bookings(&bot, chat).await;
            }
            keyboards::HELP => return self.send_help(&bot, chat).await,
            _ => {}
        }

        let current = self.dialogs.get(&chat).map(|d| d.value().clone());
        match current {
            Some(state) => self.advance(&bot, &msg, state, text).await,
            None => {
                bot.send_message(chat, "Choose an option from the menu.")
                    .reply_markup(keyboards::driver_menu())
                    .await?;
                Ok(())
            }
        }
    }

    async fn send_help(&self, bot: &Bot, chat: ChatId) -> ResponseResult<()> {
        bot.send_message(chat, format!("{HELP_TEXT}\n\n{}", DriverCommand::descriptions()))
            .reply_markup(keyboards::driver_menu())
            .await?;
        Ok(())
    }

    async fn start_booking(&self, bot: &Bot, chat: ChatId) -> ResponseResult<()> {
        let elevators = match self.engine.elevators().await {
            Ok(elevators) => elevators,
            Err(e) => return self.fail(bot, chat, &e).await,
        };
        if elevators.is_empty() {
            self.dialogs.remove(&chat);
            bot.send_message(chat, "No elevators are configured yet. Please contact the dispatcher.")
                .await?;
            return Ok(());
        }

        self.dialogs.insert(chat, Dialog::ChooseElevator);
        bot.send_message(chat, "Choose an elevator:")
            .reply_markup(keyboards::choices(elevators.into_iter().map(|e| e.name), 2))
            .await?;
        Ok(())
    }

    /// Handle one reply inside the booking dialog.
    async fn advance(&self, bot: &Bot, msg: &Message, state: Dialog, text: &str) -> ResponseResult<()> {
        let chat = msg.chat.id;
        let settings = self.engine.settings();

        match state {
            Dialog::ChooseElevator => match self.engine.elevator_by_name(text.trim()).await {
                Ok(elevator) => {
                    let today = self.engine.today();
                    self.dialogs.insert(chat, Dialog::ChooseDate { elevator });
                    bot.send_message(chat, "Choose a date (YYYY-MM-DD):")
                        .reply_markup(keyboards::choices(dialog::date_choices(today), 2))
                        .await?;
                }
                Err(ElevqError::NotFound { .. }) => {
                    bot.send_message(chat, "Please pick an elevator from the keyboard.")
                        .await?;
                }
                Err(e) => return self.fail(bot, chat, &e).await,
            },

            Dialog::ChooseDate { elevator } => {
                let day = match dialog::parse_day(text, self.engine.today()) {
                    Ok(day) => day,
                    Err(e) => return self.reply_error(bot, chat, &e).await,
                };
                let slots = match self.engine.available_slots(elevator.id, day).await {
                    Ok(slots) => slots,
                    Err(e) => return self.fail(bot, chat, &e).await,
                };
                if slots.is_empty() {
                    bot.send_message(
                        chat,
                        format!(
                            "There are no free slots on {}. Choose another date.",
                            day.format("%Y-%m-%d")
                        ),
                    )
                    .await?;
                    return Ok(());
                }
                let labels = dialog::slot_labels(&slots, settings);
                self.dialogs.insert(chat, Dialog::ChooseSlot { elevator, day, slots });
                bot.send_message(chat, "Choose a time:")
                    .reply_markup(keyboards::choices(labels, 4))
                    .await?;
            }

            Dialog::ChooseSlot { elevator, day, slots } => {
                let Some(slot) = dialog::pick_slot(text, &slots, settings) else {
                    bot.send_message(chat, "Please pick a time from the keyboard.")
                        .await?;
                    return Ok(());
                };
                self.dialogs.insert(chat, Dialog::EnterPlate { elevator, day, slot });
                bot.send_message(chat, "Enter your truck's license plate:")
                    .reply_markup(ReplyMarkup::KeyboardRemove(KeyboardRemove::new()))
                    .await?;
            }

            Dialog::EnterPlate { elevator, day, slot } => {
                let plate = match dialog::parse_plate(text) {
                    Ok(plate) => plate,
                    Err(e) => return self.reply_error(bot, chat, &e).await,
                };
                let summary = dialog::summary(&elevator, day, &slot, &plate, settings);
                self.dialogs.insert(
                    chat,
                    Dialog::Confirm {
                        elevator,
                        day,
                        slot,
                        plate,
                    },
                );
                bot.send_message(chat, summary)
                    .reply_markup(keyboards::confirm())
                    .await?;
            }

            Dialog::Confirm {
                elevator,
                day,
                slot,
                plate,
            } => match dialog::parse_confirmation(text) {
                Some(Confirmation::Yes) => {
                    self.dialogs.remove(&chat);
                    let request = BookingRequest {
                        handle: RecipientHandle(chat.0),
                        display_name: handler::sender_name(msg),
                        elevator_id: elevator.id,
                        day,
                        slot_start: slot.start,
                        license_plate: plate,
                    };
                    match self.engine.create_booking(request).await {
                        // The confirmation itself arrives through the transport.
                        Ok(booking) => {
                            debug!(booking_id = %booking.id, chat_id = chat.0, "booking dialog finished");
                            bot.send_message(chat, "Done. See you at the elevator!")
                                .reply_markup(keyboards::driver_menu())
                                .await?;
                        }
                        Err(ElevqError::Conflict(_)) => {
                            bot.send_message(
                                chat,
                                "Sorry, that slot has just been taken. Please start again.",
                            )
                            .reply_markup(keyboards::driver_menu())
                            .await?;
                        }
                        Err(e) => return self.fail(bot, chat, &e).await,
                    }
                }
                Some(Confirmation::No) => {
                    self.dialogs.remove(&chat);
                    bot.send_message(chat, "Booking cancelled.")
                        .reply_markup(keyboards::driver_menu())
                        .await?;
                }
                None => {
                    bot.send_message(chat, "Please answer Confirm or Cancel.")
                        .reply_markup(keyboards::confirm())
                        .await?;
                }
            },
        }
        Ok(())
    }

    async fn show_bookings(&self, bot: &Bot, chat: ChatId) -> ResponseResult<()> {
        match self.engine.driver_bookings(RecipientHandle(chat.0)).await {
            Ok(cards) => {
                bot.send_message(chat, format::driver_bookings(&cards, self.engine.settings()))
                    .reply_markup(keyboards::driver_menu())
                    .await?;
                Ok(())
            }
            Err(e) => self.fail(bot, chat, &e).await,
        }
    }

    async fn on_callback(&self, bot: Bot, q: CallbackQuery) -> ResponseResult<()> {
        let responder = RecipientHandle(q.from.id.0 as i64);
        let token = q.data.as_deref().map(str::parse::<ActionToken>);

        let (answer, edited) = match token {
            Some(Ok(ActionToken::OfferAccept(id))) => {
                match self.engine.accept_offer(responder, id).await {
                    Ok(_) => ("On your way!".to_string(), Some("You accepted the offer.")),
                    Err(e) => (format::error_text(&e), None),
                }
            }
            Some(Ok(ActionToken::OfferDecline { booking, fallback })) => {
                match self.engine.decline_offer(responder, booking, fallback).await {
                    Ok(_) => (
                        "Thanks, your slot stays as booked.".to_string(),
                        Some("You declined the offer. Your slot is unchanged."),
                    ),
                    Err(e) => (format::error_text(&e), None),
                }
            }
            Some(Ok(other)) => {
                debug!(token = %other, "ignoring dispatcher token on the driver bot");
                ("This button is not available here.".to_string(), None)
            }
            Some(Err(e)) => {
                warn!(error = %e, "malformed callback data");
                ("This button is no longer valid.".to_string(), None)
            }
            None => return Ok(()),
        };

        bot.answer_callback_query(q.id.clone()).text(answer).await?;
        if let Some(text) = edited
            && let Some((chat, message_id)) = handler::callback_origin(&q)
        {
            bot.edit_message_text(chat, message_id, text).await?;
        }
        Ok(())
    }

    async fn reply_error(&self, bot: &Bot, chat: ChatId, error: &ElevqError) -> ResponseResult<()> {
        bot.send_message(chat, format::error_text(error)).await?;
        Ok(())
    }

    /// An engine failure aborts the dialog.
    async fn fail(&self, bot: &Bot, chat: ChatId, error: &ElevqError) -> ResponseResult<()> {
        self.dialogs.remove(&chat);
        if error.is_user_facing() {
            info!(chat_id = chat.0, error = %error, "driver request rejected");
        } else {
            warn!(chat_id = chat.0, error = %error, "driver request failed");
        }
        bot.send_message(chat, format::error_text(error))
            .reply_markup(keyboards::driver_menu())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_in_snake_case() {
        assert_eq!(
            DriverCommand::parse("/my_bookings", "elevq_bot").unwrap(),
            DriverCommand::MyBookings
        );
        assert_eq!(DriverCommand::parse("/book", "elevq_bot").unwrap(), DriverCommand::Book);
        assert!(DriverCommand::parse("/unknown", "elevq_bot").is_err());
    }
}
