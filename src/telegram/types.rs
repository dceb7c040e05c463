//! Bot API request payloads.

use serde::{Deserialize, Serialize};

/// Confirmation sent after a payment is applied.
pub const SUBSCRIPTION_CONFIRMATION_TEXT: &str = "🎉 Your weekly subscription has been activated! \
You now have access to personalized English lessons for the next 7 days.";

/// Label of the inline button offered with the confirmation.
pub const START_LESSON_BUTTON_TEXT: &str = "Start Lesson Now";

/// Callback the bot's webhook handles by starting a lesson.
pub const START_LESSON_CALLBACK: &str = "lesson:start";

/// `sendMessage` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl SendMessage {
    /// The subscription confirmation with a single "start lesson" button.
    pub fn subscription_confirmation(chat_id: i64) -> Self {
        Self {
            chat_id,
            text: SUBSCRIPTION_CONFIRMATION_TEXT.to_string(),
            reply_markup: Some(InlineKeyboardMarkup {
                inline_keyboard: vec![vec![InlineKeyboardButton {
                    text: START_LESSON_BUTTON_TEXT.to_string(),
                    callback_data: START_LESSON_CALLBACK.to_string(),
                }]],
            }),
        }
    }
}
