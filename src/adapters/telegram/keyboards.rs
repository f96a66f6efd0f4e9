//! Keyboard → `reply_markup` JSON.

use crate::domain::Keyboard;
use serde_json::{json, Value};

pub fn reply_markup(keyboard: &Keyboard) -> Value {
    match keyboard {
        Keyboard::Reply { rows, one_time } => json!({
            "keyboard": rows
                .iter()
                .map(|row| row.iter().map(|text| json!({ "text": text })).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
            "resize_keyboard": true,
            "one_time_keyboard": one_time,
        }),
        Keyboard::Inline(rows) => json!({
            "inline_keyboard": rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| json!({ "text": b.text, "callback_data": b.data }))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>(),
        }),
        Keyboard::Remove => json!({ "remove_keyboard": true }),
    }
}
