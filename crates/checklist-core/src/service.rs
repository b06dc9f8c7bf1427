use anyhow::{Context, anyhow};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::{debug, info};

use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// The remote collection the client reads from and writes to.
pub trait TaskService {
    fn list(&mut self) -> anyhow::Result<Vec<Task>>;
    fn create(&mut self, task: &NewTask) -> anyhow::Result<()>;
    fn update(&mut self, id: &TaskId, patch: TaskPatch) -> anyhow::Result<()>;
    fn delete(&mut self, id: &TaskId) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpTaskService {
    client: Client,
    base: Url,
}

impl HttpTaskService {
    #[tracing::instrument]
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url.trim())
            .with_context(|| format!("invalid service url: {base_url}"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("service url cannot carry task paths: {base}"));
        }

        let client = Client::builder()
            .timeout(None)
            .build()
            .context("failed building HTTP client for task service")?;

        info!(base = %base, "task service client ready");
        Ok(Self { client, base })
    }

    /// `<base>/<id>`, with the id percent-encoded as a single segment.
    pub fn item_url(&self, id: &TaskId) -> anyhow::Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("service url cannot carry task paths: {}", self.base))?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    fn send(&self, method: &str, url: &Url, request: RequestBuilder) -> anyhow::Result<Response> {
        let response = request
            .send()
            .with_context(|| format!("{method} {url} failed"))?;

        let status = response.status();
        debug!(method, url = %url, status = status.as_u16(), "task service responded");
        if !status.is_success() {
            return Err(anyhow!("{method} {url} returned {status}"));
        }
        Ok(response)
    }
}

impl TaskService for HttpTaskService {
    #[tracing::instrument(skip(self), fields(url = %self.base))]
    fn list(&mut self) -> anyhow::Result<Vec<Task>> {
        let url = self.base.clone();
        let response = self.send("GET", &url, self.client.get(url.clone()))?;
        let tasks: Vec<Task> = response
            .json()
            .with_context(|| format!("failed decoding task list from {url}"))?;
        debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    #[tracing::instrument(skip(self, task), fields(url = %self.base))]
    fn create(&mut self, task: &NewTask) -> anyhow::Result<()> {
        let url = self.base.clone();
        self.send("POST", &url, self.client.post(url.clone()).json(task))?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    fn update(&mut self, id: &TaskId, patch: TaskPatch) -> anyhow::Result<()> {
        let url = self.item_url(id)?;
        self.send("PUT", &url, self.client.put(url.clone()).json(&patch))?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    fn delete(&mut self, id: &TaskId) -> anyhow::Result<()> {
        let url = self.item_url(id)?;
        self.send("DELETE", &url, self.client.delete(url.clone()))?;
        Ok(())
    }
}
