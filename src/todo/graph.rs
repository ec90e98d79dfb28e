//! Microsoft Graph client for the To Do endpoints.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::{Error, Result};

use super::model::{ChecklistItem, Collection, TaskList, TodoTask};

/// Per-request timeout for Graph and identity calls.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GraphClient {
    http: Client,
    base_url: String,
}

impl GraphClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// `{base}/me/todo/lists`
    pub async fn task_lists(&self, token: &str) -> Result<Collection<TaskList>> {
        let url = self.endpoint(&["me", "todo", "lists"])?;
        self.get_collection(token, url).await
    }

    /// `{base}/me/todo/lists/{list_id}/tasks`
    pub async fn tasks(&self, token: &str, list_id: &str) -> Result<Collection<TodoTask>> {
        let url = self.endpoint(&["me", "todo", "lists", list_id, "tasks"])?;
        self.get_collection(token, url).await
    }

    /// `{base}/me/todo/lists/{list_id}/tasks/{task_id}`
    pub async fn task(&self, token: &str, list_id: &str, task_id: &str) -> Result<TodoTask> {
        let url = self.endpoint(&["me", "todo", "lists", list_id, "tasks", task_id])?;
        self.get_json(token, url).await
    }

    /// `{base}/me/todo/lists/{list_id}/tasks/{task_id}/checklistItems`
    pub async fn checklist_items(
        &self,
        token: &str,
        list_id: &str,
        task_id: &str,
    ) -> Result<Vec<ChecklistItem>> {
        let url = self.endpoint(&[
            "me",
            "todo",
            "lists",
            list_id,
            "tasks",
            task_id,
            "checklistItems",
        ])?;
        let items: Collection<ChecklistItem> = self.get_collection(token, url).await?;
        Ok(items.value)
    }

    /// Append percent-encoded path segments to the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, url: Url) -> Result<T> {
        debug!(url = %url, "GET");
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Graph request failed: {}", body);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch a collection, following `@odata.nextLink` until the last page.
    async fn get_collection<T: DeserializeOwned>(
        &self,
        token: &str,
        url: Url,
    ) -> Result<Collection<T>> {
        let mut page: Collection<T> = self.get_json(token, url).await?;
        let mut value = std::mem::take(&mut page.value);
        while let Some(next) = page.next_link.take() {
            page = self.get_json(token, Url::parse(&next)?).await?;
            value.append(&mut page.value);
        }
        Ok(Collection::new(value))
    }
}
