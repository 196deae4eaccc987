//! Bot message content, serialized as the LINE WORKS bot API expects it
//! (`{"content": {"type": "text", ...}}` etc).

use serde::Serialize;

/// Message body sent to a channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ButtonTemplate {
        content_text: String,
        actions: Vec<Action>,
    },
    #[serde(rename_all = "camelCase")]
    ListTemplate {
        #[serde(skip_serializing_if = "Option::is_none")]
        cover_data: Option<CoverData>,
        elements: Vec<ListElement>,
        /// Rows of bottom buttons
        actions: Vec<Vec<Action>>,
    },
}

/// Button / link behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Posts `text` (or the label) back to the bot, with an optional postback
    Message {
        label: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        postback: Option<String>,
    },
    /// Opens a URL
    Uri { label: String, uri: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListElement {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Text { .. } => "text",
            Content::ButtonTemplate { .. } => "button_template",
            Content::ListTemplate { .. } => "list_template",
        }
    }
}
