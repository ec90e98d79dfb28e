//! Microsoft Graph To Do payloads
//!
//! Every field the API may omit carries a serde default, so formatting code
//! never has to deal with missing keys.

use serde::Deserialize;

/// A Graph collection response (`{"value": [...], "@odata.nextLink": ...}`).
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

impl<T> Collection<T> {
    pub fn new(value: Vec<T>) -> Self {
        Self {
            value,
            next_link: None,
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    #[serde(default)]
    pub time_zone: String,
}

impl DateTimeTimeZone {
    /// The `YYYY-MM-DD` prefix of the timestamp.
    pub fn date(&self) -> String {
        self.date_time.chars().take(10).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_importance")]
    pub importance: String,
    #[serde(default)]
    pub due_date_time: Option<DateTimeTimeZone>,
    #[serde(default)]
    pub is_reminder_on: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub created_date_time: String,
    #[serde(default)]
    pub last_modified_date_time: String,
    #[serde(default)]
    pub body: Option<ItemBody>,
}

impl TodoTask {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }

    /// Body text, if the task has any non-whitespace content.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_ref()
            .map(|b| b.content.trim())
            .filter(|content| !content.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_checked: bool,
}

fn default_status() -> String {
    "notStarted".to_string()
}

fn default_importance() -> String {
    "normal".to_string()
}
