//! Conversation aggregation
//!
//! Groups a flat message list into conversations keyed by
//! (property-or-sentinel, counterpart). Pure and total: messages whose
//! counterpart summary is missing are dropped, never reported.
//!
//! Every presentation (full inbox, floating overlay, HTTP API) calls into this
//! module so that identical input always yields identical groupings.

use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use super::entities::{Conversation, ConversationKey, Message};

/// Key of the conversation a message belongs to, or `None` if it cannot form one
pub fn conversation_key(message: &Message, viewer_id: Uuid) -> Option<ConversationKey> {
    message
        .counterpart(viewer_id)
        .map(|counterpart| ConversationKey::new(message.property_id, counterpart.id))
}

/// Ascending display order. Ties on timestamp fall back to id so the result
/// does not depend on input order.
fn chronological(a: &Message, b: &Message) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Group messages into conversations, most recent activity first.
pub fn aggregate(messages: &[Message], viewer_id: Uuid) -> Vec<Conversation> {
    // Each entry remembers its newest message seen so far
    let mut by_key: HashMap<ConversationKey, (Conversation, &Message)> = HashMap::new();

    for message in messages {
        let Some(counterpart) = message.counterpart(viewer_id) else {
            continue;
        };
        let key = ConversationKey::new(message.property_id, counterpart.id);

        let (conversation, newest) = by_key.entry(key).or_insert_with(|| {
            (
                Conversation {
                    key,
                    property: message.property.clone(),
                    counterpart: counterpart.clone(),
                    messages: Vec::new(),
                    last_message_at: message.created_at,
                    unread_count: 0,
                },
                message,
            )
        });

        // Summaries come from the newest message so they don't depend on traversal order
        if chronological(message, newest) == Ordering::Greater {
            *newest = message;
            conversation.counterpart = counterpart.clone();
            if message.property.is_some() {
                conversation.property = message.property.clone();
            }
        } else if conversation.property.is_none() {
            conversation.property = message.property.clone();
        }

        if message.created_at > conversation.last_message_at {
            conversation.last_message_at = message.created_at;
        }
        if message.is_unread_for(viewer_id) {
            conversation.unread_count += 1;
        }
        conversation.messages.push(message.clone());
    }

    let mut conversations: Vec<Conversation> = by_key
        .into_values()
        .map(|(conversation, _)| conversation)
        .collect();
    for conversation in &mut conversations {
        conversation.messages.sort_by(chronological);
    }
    conversations.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.key.cmp(&b.key))
    });

    conversations
}

/// Messages of a single conversation, ascending. Equal to the message set the
/// aggregator assigns to `key`.
pub fn messages_in(messages: &[Message], key: &ConversationKey, viewer_id: Uuid) -> Vec<Message> {
    let mut selected: Vec<Message> = messages
        .iter()
        .filter(|m| conversation_key(m, viewer_id).as_ref() == Some(key))
        .cloned()
        .collect();
    selected.sort_by(chronological);
    selected
}

/// Unread messages addressed to the viewer across the whole list
pub fn unread_total(messages: &[Message], viewer_id: Uuid) -> usize {
    messages
        .iter()
        .filter(|m| m.is_unread_for(viewer_id))
        .count()
}
