use bytes::Bytes;
use color_eyre::Result;
use futures_util::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde::Deserialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Correlates an in-flight upload with its document placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    #[cfg(test)]
    pub fn for_tests(id: u64) -> Self {
        Self(id)
    }
}

/// Response of the metadata lookup proxy: either rich embeddable markup, or
/// a direct photo URL.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OembedResponse {
    pub html: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub url: String,
}

/// Transport for the three remote collaborators: metadata lookup, upload and
/// delete. Spawned work is counted so shutdown and tests can observe
/// outstanding tasks even though completions are never awaited by callers.
pub struct Client {
    http: reqwest::Client,
    next_task: AtomicU64,
    pending: Arc<AtomicUsize>,
}

impl Client {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            next_task: AtomicU64::new(0),
            pending: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn task_id(&self) -> TaskId {
        TaskId(self.next_task.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Detached task with outstanding-count tracking.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            future.await;
            pending.fetch_sub(1, Ordering::SeqCst);
        })
    }

    /// Metadata lookup for a pasted URL. The original plugin issued this with
    /// no timeout, leaving a hung slot with no recourse; a bounded timeout is
    /// applied here and reported as an ordinary failure.
    pub async fn oembed(&self, proxy: &str, url: &str) -> Result<OembedResponse> {
        let response = self
            .http
            .get(proxy)
            .query(&[("url", url)])
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Multipart upload reporting ascending loaded/total percentages as the
    /// body is streamed out.
    pub async fn upload<F>(
        &self,
        endpoint: &str,
        file_name: &str,
        data: Vec<u8>,
        progress: F,
    ) -> Result<UploadedFile>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let length = data.len() as u64;
        let total = data.len().max(1);
        let mut sent = 0usize;
        let chunks: Vec<(Bytes, u8)> = data
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(|chunk| {
                sent += chunk.len();
                (Bytes::copy_from_slice(chunk), (sent * 100 / total) as u8)
            })
            .collect();
        let body = Body::wrap_stream(stream::iter(chunks.into_iter().map(
            move |(bytes, percent)| {
                progress(percent);
                Ok::<Bytes, std::io::Error>(bytes)
            },
        )));
        let part = Part::stream_with_length(body, length)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let response = self
            .http
            .post(endpoint)
            .multipart(Form::new().part("files[]", part))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fire-and-forget delete; the response is only logged.
    pub fn spawn_delete(&self, url: String, method: String) -> JoinHandle<()> {
        let http = self.http.clone();
        self.spawn(async move {
            let method = Method::from_bytes(method.as_bytes()).unwrap_or(Method::POST);
            match http.request(method, &url).send().await {
                Ok(response) => log::debug!("delete request to {url}: {}", response.status()),
                Err(e) => log::warn!("delete request to {url} failed: {e}"),
            }
        })
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
