//! Transport-neutral description of what to send back.

use crate::core::menu::{
    LABEL_ABOUT, LABEL_BACK, LABEL_CANCEL, LABEL_CASES, LABEL_DIRECTOR, LABEL_PHONE,
    LABEL_START_INTAKE,
};
use std::path::PathBuf;

/// Backslash-escapes the characters legacy Markdown treats as entity markers.
///
/// For user-supplied text placed in a Markdown reply.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Quick-reply keyboards the bot can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickReplies {
    MainMenu,
    IntakeOffer,
    CancelOnly,
}

impl QuickReplies {
    pub fn rows(&self) -> Vec<Vec<&'static str>> {
        match self {
            QuickReplies::MainMenu => vec![
                vec![LABEL_ABOUT, LABEL_CASES],
                vec![LABEL_DIRECTOR, LABEL_PHONE],
            ],
            QuickReplies::IntakeOffer => vec![vec![LABEL_START_INTAKE], vec![LABEL_BACK]],
            QuickReplies::CancelOnly => vec![vec![LABEL_CANCEL]],
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.rows().iter().flatten().any(|l| *l == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Image with caption; the transport falls back to the caption alone if the image is missing.
    Photo { path: PathBuf, caption: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundAction {
    pub content: Content,
    pub markdown: bool,
    /// `None` keeps whatever keyboard the chat already shows.
    pub quick_replies: Option<QuickReplies>,
}

impl OutboundAction {
    pub fn text(text: impl Into<String>) -> OutboundAction {
        OutboundAction {
            content: Content::Text(text.into()),
            markdown: false,
            quick_replies: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> OutboundAction {
        OutboundAction {
            markdown: true,
            ..OutboundAction::text(text)
        }
    }

    pub fn photo(path: PathBuf, caption: impl Into<String>) -> OutboundAction {
        OutboundAction {
            content: Content::Photo {
                path,
                caption: caption.into(),
            },
            markdown: true,
            quick_replies: None,
        }
    }

    pub fn with_quick_replies(mut self, quick_replies: QuickReplies) -> OutboundAction {
        self.quick_replies = Some(quick_replies);
        self
    }

    /// Text of a plain message, or the caption of a photo.
    pub fn body(&self) -> &str {
        match &self.content {
            Content::Text(text) => text,
            Content::Photo { caption, .. } => caption,
        }
    }
}
