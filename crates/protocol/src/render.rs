use crate::action::Action;
use crate::event::UserId;
use serde::{Deserialize, Serialize};

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonTarget {
    Action(Action),
    Url(String),
    /// Sends the label back as free text (reply keyboards)
    Reply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub target: ButtonTarget,
}

impl Button {
    pub fn action(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Action(action),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Url(url.into()),
        }
    }

    pub fn reply(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Reply,
        }
    }
}

/// A message with an optional button grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<Button>>,
}

impl Screen {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
        }
    }

    /// Appends a single-button row.
    pub fn button(mut self, button: Button) -> Self {
        self.rows.push(vec![button]);
        self
    }

    pub fn row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn push(&mut self, button: Button) {
        self.rows.push(vec![button]);
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.rows.iter().flatten().filter_map(|b| match &b.target {
            ButtonTarget::Action(action) => Some(action),
            _ => None,
        })
    }

    pub fn find_action(&self, label: &str) -> Option<&Action> {
        self.rows
            .iter()
            .flatten()
            .find(|b| b.label == label)
            .and_then(|b| match &b.target {
                ButtonTarget::Action(action) => Some(action),
                _ => None,
            })
    }
}

/// Address of a message previously sent by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: UserId,
    pub message_id: i64,
}
