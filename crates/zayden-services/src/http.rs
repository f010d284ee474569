//! HTTP scraper client.
//!
//! Every service lives under one base URL and answers
//! `{"status": bool, "result": ...}`; image renderers answer with raw bytes.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::{debug, warn};
use zayden_core::{
    config::ServicesConfig,
    error::ZaydenError,
    traits::{Fetched, RemoteFile, Scraper, SearchHit, TiktokPost, VideoInfo, YoutubeFormat},
};

/// Scraper client over a JSON HTTP API.
pub struct HttpScraper {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    #[serde(default = "default_status")]
    status: bool,
    result: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

fn default_status() -> bool {
    true
}

#[derive(Deserialize)]
struct KhodamResult {
    #[serde(default)]
    nama: String,
    khodam: String,
}

impl HttpScraper {
    /// Create from config values.
    pub fn from_config(config: &ServicesConfig) -> Result<Self, ZaydenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ZaydenError::Service(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }

    /// Send a request to the scraper API with its credentials attached.
    async fn send(
        &self,
        endpoint: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ZaydenError> {
        send_unauthenticated(endpoint, self.authorize(req)).await
    }

    /// Unwrap the `result` of a JSON API response.
    async fn parse<T: DeserializeOwned>(
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<T, ZaydenError> {
        let parsed: ApiResponse<T> = resp.json().await.map_err(|e| {
            ZaydenError::Service(format!("{endpoint}: failed to parse response: {e}"))
        })?;
        if !parsed.status {
            return Err(ZaydenError::Service(format!(
                "{endpoint}: {}",
                parsed.message.unwrap_or_else(|| "request rejected".into())
            )));
        }
        parsed
            .result
            .ok_or_else(|| ZaydenError::Service(format!("{endpoint}: empty result")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ZaydenError> {
        debug!("scraper: GET {endpoint}");
        let req = self.client.get(self.url(endpoint)).query(query);
        let resp = self.send(endpoint, req).await?;
        Self::parse(endpoint, resp).await
    }

    async fn get_bytes(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<u8>, ZaydenError> {
        debug!("scraper: GET {endpoint} (binary)");
        let req = self.client.get(self.url(endpoint)).query(query);
        let resp = self.send(endpoint, req).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ZaydenError::Service(format!("{endpoint}: failed to read body: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn file_form(data: Vec<u8>, mimetype: &str) -> Result<reqwest::multipart::Form, ZaydenError> {
        let ext = mimetype
            .split('/')
            .nth(1)
            .and_then(|s| s.split(';').next())
            .unwrap_or("bin");
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(format!("file.{ext}"))
            .mime_str(mimetype)
            .map_err(|e| ZaydenError::Service(format!("invalid mimetype {mimetype}: {e}")))?;
        Ok(reqwest::multipart::Form::new().part("file", part))
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn shorten_url(&self, url: &str) -> Result<String, ZaydenError> {
        self.get_json("tinyurl", &[("link", url)]).await
    }

    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<Fetched, ZaydenError> {
        debug!("fetch: GET {url}");
        let mut resp = send_unauthenticated("fetch", self.client.get(url)).await?;
        if resp.content_length().is_some_and(|len| len > max_bytes) {
            return Err(ZaydenError::Service(format!(
                "fetch: body larger than {max_bytes} bytes"
            )));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| ZaydenError::Service(format!("fetch: failed to read body: {e}")))?
        {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > max_bytes {
                warn!("fetch: {url} exceeded {max_bytes} bytes, truncating");
                body.truncate(max_bytes as usize);
                break;
            }
        }
        Ok(Fetched { content_type, body })
    }

    async fn chat(&self, prompt: &str) -> Result<String, ZaydenError> {
        self.get_json("openai", &[("text", prompt)]).await
    }

    async fn enhance_image(&self, image: Vec<u8>) -> Result<Vec<u8>, ZaydenError> {
        let form = Self::file_form(image, "image/jpeg")?;
        let req = self.client.post(self.url("remini")).multipart(form);
        let resp = self.send("remini", req).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ZaydenError::Service(format!("remini: failed to read body: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn identify_music(&self, audio: Vec<u8>) -> Result<Option<String>, ZaydenError> {
        let url = self.upload(audio, "audio/mpeg").await?;
        let result: String = self.get_json("whatmusic", &[("url", &url)]).await?;
        if result.trim().is_empty() || result.contains("undefined") {
            return Ok(None);
        }
        Ok(Some(result))
    }

    async fn upload(&self, data: Vec<u8>, mimetype: &str) -> Result<String, ZaydenError> {
        let form = Self::file_form(data, mimetype)?;
        let req = self.client.post(self.url("upload")).multipart(form);
        let resp = self.send("upload", req).await?;
        Self::parse("upload", resp).await
    }

    async fn pinterest(&self, query: &str) -> Result<Vec<String>, ZaydenError> {
        self.get_json("pinterest", &[("query", query)]).await
    }

    async fn instagram(&self, url: &str) -> Result<Vec<String>, ZaydenError> {
        self.get_json("igdl", &[("url", url)]).await
    }

    async fn instagram_stories(&self, username: &str) -> Result<Vec<String>, ZaydenError> {
        self.get_json("igstory", &[("username", username)]).await
    }

    async fn mediafire(&self, url: &str) -> Result<RemoteFile, ZaydenError> {
        self.get_json("mediafire", &[("url", url)]).await
    }

    async fn tiktok(&self, url: &str) -> Result<TiktokPost, ZaydenError> {
        self.get_json("tiktok", &[("url", url)]).await
    }

    async fn spotify_search(&self, query: &str) -> Result<Vec<SearchHit>, ZaydenError> {
        self.get_json("spotify/search", &[("query", query)]).await
    }

    async fn spotify_download(&self, url: &str) -> Result<RemoteFile, ZaydenError> {
        self.get_json("spotify/download", &[("url", url)]).await
    }

    async fn youtube_search(&self, query: &str) -> Result<Vec<SearchHit>, ZaydenError> {
        self.get_json("yts", &[("query", query)]).await
    }

    async fn youtube_info(&self, url: &str) -> Result<VideoInfo, ZaydenError> {
        self.get_json("ytinfo", &[("url", url)]).await
    }

    async fn youtube_download(
        &self,
        url: &str,
        format: YoutubeFormat,
    ) -> Result<RemoteFile, ZaydenError> {
        let endpoint = match format {
            YoutubeFormat::Audio => "ytmp3",
            YoutubeFormat::Video => "ytmp4",
        };
        self.get_json(endpoint, &[("url", url)]).await
    }

    async fn quote_image(
        &self,
        text: &str,
        name: &str,
        avatar_url: Option<&str>,
    ) -> Result<Vec<u8>, ZaydenError> {
        let mut query = vec![("text", text), ("name", name)];
        if let Some(avatar) = avatar_url {
            query.push(("avatar", avatar));
        }
        self.get_bytes("quotely", &query).await
    }

    async fn text_image(&self, style: &str, text: &str) -> Result<Vec<u8>, ZaydenError> {
        self.get_bytes(style, &[("text", text)]).await
    }

    async fn khodam(&self, name: &str) -> Result<String, ZaydenError> {
        let res: KhodamResult = self.get_json("khodam", &[("name", name)]).await?;
        let shown = if res.nama.is_empty() { name } else { &res.nama };
        Ok(format!("*Name:* {shown}\n*Khodam:* {}", res.khodam))
    }
}

/// Send a request without the scraper credentials. Used for arbitrary user URLs.
async fn send_unauthenticated(
    endpoint: &str,
    req: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ZaydenError> {
    let resp = req
        .send()
        .await
        .map_err(|e| ZaydenError::Service(format!("{endpoint}: request failed: {e}")))?;
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(ZaydenError::Service(format!(
            "{endpoint} returned {status}: {text}"
        )));
    }
    Ok(resp)
}
