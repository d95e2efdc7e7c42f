// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply and inline keyboards.

use elevq_core::{Action, ActionToken, Elevator};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

pub const BOOK: &str = "Book a slot";
pub const MY_BOOKINGS: &str = "My bookings";
pub const HELP: &str = "Help";
pub const CONFIRM: &str = "Confirm";
pub const CANCEL: &str = "Cancel";
pub const TODAY: &str = "Today";
pub const TOMORROW: &str = "Tomorrow";
pub const CHANGE_ELEVATOR: &str = "Change elevator";

/// One row of callback buttons, in order.
pub fn inline_actions(actions: &[Action]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([actions
        .iter()
        .map(|a| InlineKeyboardButton::callback(a.label.clone(), a.token.to_string()))
        .collect::<Vec<_>>()])
}

/// A reply keyboard laid out `per_row` buttons wide.
pub fn choices<I, T>(labels: I, per_row: usize) -> KeyboardMarkup
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let buttons: Vec<KeyboardButton> = labels.into_iter().map(KeyboardButton::new).collect();
    let rows: Vec<Vec<KeyboardButton>> = buttons
        .chunks(per_row.max(1))
        .map(<[KeyboardButton]>::to_vec)
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn driver_menu() -> KeyboardMarkup {
    choices([BOOK, MY_BOOKINGS, HELP], 2)
}

pub fn dispatcher_menu() -> KeyboardMarkup {
    choices([TODAY, TOMORROW, CHANGE_ELEVATOR], 2)
}

pub fn confirm() -> KeyboardMarkup {
    choices([CONFIRM, CANCEL], 2)
}

/// One button per elevator carrying an `elevator:<name>` token.
pub fn elevator_picker(elevators: &[Elevator]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(elevators.iter().map(|e| {
        [InlineKeyboardButton::callback(
            e.name.clone(),
            ActionToken::Elevator(e.name.clone()).to_string(),
        )]
    }))
}
