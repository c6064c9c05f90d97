//! UI-agnostic conversation state
//!
//! The chat log and the recent-questions list are shared by every front end
//! and don't depend on any UI framework.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::Result;
use crate::responder::{Reply, Source, Topic};

/// Maximum number of entries kept in the recent-questions list.
pub const RECENT_CAPACITY: usize = 5;

/// A chat message in the Q&A conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Local::now(),
            topic: None,
            sources: Vec::new(),
        }
    }

    pub fn assistant(reply: Reply) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: reply.text,
            timestamp: Local::now(),
            topic: reply.topic,
            sources: reply.sources,
        }
    }
}

/// Append-only, insertion-ordered message log.
///
/// Messages are never edited or removed and there is no size limit, so the
/// log grows for the whole session.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ExportEntry<'a> {
    #[serde(rename = "type")]
    role: ChatRole,
    content: &'a str,
    timestamp: String,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_assistant(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == ChatRole::Assistant)
    }

    /// Serialize the history as a pretty JSON array of `{type, content, timestamp}`.
    pub fn export_json(&self) -> Result<String> {
        let entries: Vec<ExportEntry<'_>> = self
            .messages
            .iter()
            .map(|m| ExportEntry {
                role: m.role,
                content: &m.content,
                timestamp: m.timestamp.to_rfc3339(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}

/// Newest-first list of recently asked questions, capped at [`RECENT_CAPACITY`].
#[derive(Debug, Default, Clone)]
pub struct RecentQuestions {
    items: VecDeque<String>,
}

impl RecentQuestions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front, evicting the oldest entry once the cap is exceeded.
    /// Duplicates are kept; every submit counts as a new entry.
    pub fn push(&mut self, question: impl Into<String>) {
        self.items.push_front(question.into());
        self.items.truncate(RECENT_CAPACITY);
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::select_response;

    #[test]
    fn test_chat_log_keeps_insertion_order() {
        let mut log = ChatLog::new();
        log.push(ChatMessage::user("first"));
        log.push(ChatMessage::assistant(select_response("first")));
        log.push(ChatMessage::user("second"));

        let contents: Vec<&str> = log.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents[0], "first");
        assert_eq!(contents[2], "second");
        assert_eq!(log.len(), 3);
        assert!(log.messages().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_last_assistant_skips_user_messages() {
        let mut log = ChatLog::new();
        assert!(log.last_assistant().is_none());

        log.push(ChatMessage::user("如何配置环境"));
        log.push(ChatMessage::assistant(select_response("如何配置环境")));
        log.push(ChatMessage::user("another"));

        let last = log.last_assistant().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.topic, Some(Topic::Installation));
    }

    #[test]
    fn test_export_json_shape() {
        let mut log = ChatLog::new();
        log.push(ChatMessage::user("hello"));
        log.push(ChatMessage::assistant(select_response("hello")));

        let json = log.export_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = value.as_array().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["type"], "user");
        assert_eq!(entries[0]["content"], "hello");
        assert_eq!(entries[1]["type"], "assistant");
        assert!(entries[1]["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_recent_questions_evicts_oldest() {
        let mut recent = RecentQuestions::new();
        for i in 1..=6 {
            recent.push(format!("q{}", i));
        }

        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert_eq!(recent.get(0), Some("q6"));
        assert_eq!(recent.get(4), Some("q2"));
        assert!(!recent.iter().any(|q| q == "q1"));
    }

    #[test]
    fn test_recent_questions_keeps_duplicates() {
        let mut recent = RecentQuestions::new();
        recent.push("same");
        recent.push("same");
        assert_eq!(recent.len(), 2);
    }
}
