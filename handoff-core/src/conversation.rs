//! Ordered list of conversation turns.

use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Messages in the order their handlers fired.
///
/// Append order is display order; no sequence numbers are honored, so a
/// frame delivered late by the network renders late.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    /// Flip `flagged` on every turn whose `turn_id` matches.
    ///
    /// Returns `false` when nothing matched.
    pub fn toggle_flag(&mut self, turn_id: &str) -> bool {
        let mut matched = false;
        for message in self
            .messages
            .iter_mut()
            .filter(|m| m.turn_id.as_deref() == Some(turn_id))
        {
            message.flagged = !message.flagged;
            matched = true;
        }
        matched
    }

    pub fn flagged_count(&self) -> usize {
        self.messages.iter().filter(|m| m.flagged).count()
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl FromIterator<Message> for Conversation {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
