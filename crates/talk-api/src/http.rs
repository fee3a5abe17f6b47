//! HTTP backend

use async_trait::async_trait;
use futures::StreamExt;

use crate::{
    backend::{Backend, ByteStream},
    error::{Error, Result},
    types::{CreateTalkRequest, RenameTalkRequest, SendMessageRequest, Talk, TalkId},
};

/// Talk backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url` (for example `http://localhost:5000`)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a backend that reuses an existing client
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "base URL must start with http:// or https://, got {:?}",
                base_url
            )));
        }
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Turn a non-success response into `Error::Status`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::status(status.as_u16(), body))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_talks(&self) -> Result<Vec<Talk>> {
        let response = self.client.get(self.url("talks")).send().await?;
        let talks = check_status(response).await?.json().await?;
        Ok(talks)
    }

    async fn create_talk(&self, title: &str) -> Result<Talk> {
        let request = CreateTalkRequest {
            title: title.to_string(),
        };
        let response = self
            .client
            .post(self.url("talks"))
            .json(&request)
            .send()
            .await?;
        let talk = check_status(response).await?.json().await?;
        Ok(talk)
    }

    async fn delete_talk(&self, id: &TalkId) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("talks/{}", id)))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn send_message(&self, id: &TalkId, message: &str) -> Result<ByteStream> {
        let request = SendMessageRequest {
            message: message.to_string(),
        };
        let response = self
            .client
            .post(self.url(&format!("talks/{}/message", id)))
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        tracing::debug!("Reply stream opened for talk {}", id);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(Error::from));
        Ok(Box::pin(body))
    }

    async fn generate_title(&self, id: &TalkId) -> Result<String> {
        let response = self
            .client
            .post(self.url(&format!("talk/{}/title/gen", id)))
            .send()
            .await?;
        let text = check_status(response).await?.text().await?;

        // Plain text is the norm, but accept a JSON string too
        let title = serde_json::from_str::<String>(&text).unwrap_or(text);
        Ok(title.trim().to_string())
    }

    async fn rename_talk(&self, id: &TalkId, title: &str) -> Result<()> {
        let request = RenameTalkRequest {
            title: title.to_string(),
        };
        let response = self
            .client
            .put(self.url(&format!("talk/{}/title", id)))
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let backend = HttpBackend::new("http://localhost:5000/").unwrap();
        assert_eq!(backend.base_url(), "http://localhost:5000");
        assert_eq!(backend.url("talks"), "http://localhost:5000/talks");
    }

    #[test]
    fn test_base_url_requires_scheme() {
        let err = HttpBackend::new("localhost:5000").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
