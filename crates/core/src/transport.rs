use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Url, header::COOKIE};

use crate::{
    error::{Result, TrackerError},
    session::CookieJar,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(&self, url: Url) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport. Optionally sends the page's cookies along, the
/// way a browser does for same-origin requests.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    cookies: Option<CookieJar>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            cookies: None,
        })
    }

    pub fn with_cookies(mut self, jar: CookieJar) -> Self {
        self.cookies = Some(jar);
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        if let Some(header) = self.cookies.as_ref().and_then(CookieJar::header) {
            request = request.header(COOKIE, header);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

/// Keeps every requested URL and answers with a canned reply. Backs dry runs
/// and tests.
pub struct RecordingTransport {
    requests: Mutex<Vec<Url>>,
    reply: Option<HttpResponse>,
}

impl RecordingTransport {
    pub fn ok(body: &str) -> Arc<Self> {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply: Some(HttpResponse {
                status,
                body: body.to_string(),
            }),
        })
    }

    /// Every request fails as if the network were down.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply: None,
        })
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests
            .lock()
            .expect("RecordingTransport poisoned")
            .clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, url: Url) -> Result<HttpResponse> {
        self.requests
            .lock()
            .expect("RecordingTransport poisoned")
            .push(url.clone());

        self.reply.clone().ok_or_else(|| TrackerError::NotDelivered {
            url: url.to_string(),
        })
    }
}
