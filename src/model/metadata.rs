// src/model/metadata.rs
//! Document metadata and the article attributes derived from its properties.

use crate::constants::UNTITLED;
use crate::types::{plain_text_of, DateValue, DocumentId, RichTextItem, SelectOption, User};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A page property as a tagged value.
///
/// Notion page properties are schema-less; each value is tagged by its
/// `type` field. Types this crate never reads collapse into `Unsupported`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        title: Vec<RichTextItem>,
    },
    RichText {
        rich_text: Vec<RichTextItem>,
    },
    Select {
        select: Option<SelectOption>,
    },
    MultiSelect {
        multi_select: Vec<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    People {
        people: Vec<User>,
    },
    Number {
        number: Option<f64>,
    },
    Checkbox {
        checkbox: bool,
    },
    Url {
        url: Option<String>,
    },
    Date {
        date: Option<DateValue>,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    /// Returns the Notion API type name for this property value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Title { .. } => "title",
            Self::RichText { .. } => "rich_text",
            Self::Select { .. } => "select",
            Self::MultiSelect { .. } => "multi_select",
            Self::Status { .. } => "status",
            Self::People { .. } => "people",
            Self::Number { .. } => "number",
            Self::Checkbox { .. } => "checkbox",
            Self::Url { .. } => "url",
            Self::Date { .. } => "date",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Metadata of one document, derived from its page record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub id: DocumentId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub properties: IndexMap<String, PropertyValue>,
}

impl DocumentMetadata {
    /// Builds metadata, deriving the title from the first title-typed property.
    pub fn new(
        id: DocumentId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        properties: IndexMap<String, PropertyValue>,
    ) -> Self {
        let title = extract_title(&properties);
        Self {
            id,
            title,
            created_at,
            updated_at,
            properties,
        }
    }

    /// Names of the `tags`/`Tags` multi-select property.
    pub fn tags(&self) -> Vec<String> {
        match self.property(&["tags", "Tags"]) {
            Some(PropertyValue::MultiSelect { multi_select }) => {
                multi_select.iter().map(|tag| tag.name.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// First person of the `author`/`Author` property, or its first text run.
    pub fn author(&self) -> Option<String> {
        match self.property(&["author", "Author"])? {
            PropertyValue::People { people } => people.first().and_then(|p| p.name.clone()),
            PropertyValue::RichText { rich_text } => {
                rich_text.first().map(|run| run.plain_text.clone())
            }
            _ => None,
        }
    }

    /// Name of the `status`/`Status` property, whether select- or status-typed.
    pub fn status(&self) -> Option<String> {
        match self.property(&["status", "Status"])? {
            PropertyValue::Select { select } => select.as_ref().map(|s| s.name.clone()),
            PropertyValue::Status { status } => status.as_ref().map(|s| s.name.clone()),
            _ => None,
        }
    }

    /// Documents without a status are always processable.
    pub fn is_processable(&self, allowed: &[&str]) -> bool {
        match self.status() {
            Some(status) => allowed.iter().any(|a| *a == status),
            None => true,
        }
    }

    fn property(&self, names: &[&str]) -> Option<&PropertyValue> {
        names.iter().find_map(|name| self.properties.get(*name))
    }
}

fn extract_title(properties: &IndexMap<String, PropertyValue>) -> String {
    properties
        .values()
        .find_map(|value| match value {
            PropertyValue::Title { title } => Some(title),
            _ => None,
        })
        .filter(|title| !title.is_empty())
        .map(|title| plain_text_of(title))
        .unwrap_or_else(|| UNTITLED.to_string())
}
