//! Map Bot API updates to domain `Incoming` values.
//!
//! Updates from bots, without a sender, or without text/data are dropped
//! (the update id is still returned so the offset advances).

use super::types;
use crate::domain::{Incoming, IncomingCallback, IncomingMessage, Sender};
use crate::ports::PolledUpdate;

fn sender(user: &types::User) -> Sender {
    Sender {
        telegram_id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

fn message_to_domain(msg: &types::Message) -> Option<IncomingMessage> {
    let from = msg.from.as_ref().filter(|u| !u.is_bot)?;
    let text = msg.text.as_ref()?;
    Some(IncomingMessage {
        chat_id: msg.chat.id,
        message_id: msg.message_id,
        from: sender(from),
        text: text.clone(),
    })
}

fn callback_to_domain(cq: &types::CallbackQuery) -> Option<IncomingCallback> {
    if cq.from.is_bot {
        return None;
    }
    let data = cq.data.as_ref()?;
    Some(IncomingCallback {
        id: cq.id.clone(),
        from: sender(&cq.from),
        chat_id: cq.message.as_ref().map(|m| m.chat.id),
        message_id: cq.message.as_ref().map(|m| m.message_id),
        message_text: cq.message.as_ref().and_then(|m| m.text.clone()),
        data: data.clone(),
    })
}

pub fn update_to_domain(update: &types::Update) -> PolledUpdate {
    let incoming = if let Some(msg) = &update.message {
        message_to_domain(msg).map(Incoming::Message)
    } else if let Some(cq) = &update.callback_query {
        callback_to_domain(cq).map(Incoming::Callback)
    } else {
        None
    };
    PolledUpdate {
        update_id: update.update_id,
        incoming,
    }
}
