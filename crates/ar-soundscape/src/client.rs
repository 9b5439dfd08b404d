//! Soundscape HTTP client

use crate::error::{SoundscapeError, SoundscapeResult};
use crate::model::SoundscapeResponse;
use async_trait::async_trait;
use reqwest::Url;

/// Anything that can answer a per-page soundscape query.
///
/// `chapter_number` and `page_number` are 1-based.
#[async_trait]
pub trait SoundscapeSource: Send + Sync {
    async fn fetch_soundscape(
        &self,
        book_id: &str,
        chapter_number: u32,
        page_number: u32,
    ) -> SoundscapeResult<SoundscapeResponse>;
}

/// reqwest-backed client for the soundscape service
#[derive(Debug, Clone)]
pub struct SoundscapeClient {
    base: Url,
    http: reqwest::Client,
}

impl SoundscapeClient {
    pub fn new(base_url: &str) -> SoundscapeResult<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Use a preconfigured reqwest client (proxies, TLS roots, headers)
    pub fn with_client(base_url: &str, http: reqwest::Client) -> SoundscapeResult<Self> {
        let invalid = |reason: String| SoundscapeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let base = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".into()));
        }
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/book/{bookId}/chapter{N}/page/{M}`
    pub fn page_url(&self, book_id: &str, chapter_number: u32, page_number: u32) -> Url {
        let mut url = self.base.clone();
        let chapter = format!("chapter{}", chapter_number);
        let page = page_number.to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["book", book_id, chapter.as_str(), "page", page.as_str()]);
        }
        url
    }
}

#[async_trait]
impl SoundscapeSource for SoundscapeClient {
    async fn fetch_soundscape(
        &self,
        book_id: &str,
        chapter_number: u32,
        page_number: u32,
    ) -> SoundscapeResult<SoundscapeResponse> {
        let url = self.page_url(book_id, chapter_number, page_number);
        log::debug!("[Soundscape] GET {}", url);

        let transport = |source| SoundscapeError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.http.get(url.clone()).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SoundscapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        let parsed = SoundscapeResponse::from_json(&body).map_err(|source| {
            SoundscapeError::Decode {
                url: url.to_string(),
                source,
            }
        })?;

        log::debug!(
            "[Soundscape] chapter{}/page/{}: carpet {:?}, {} triggered sound(s)",
            chapter_number,
            page_number,
            parsed.carpet_key(),
            parsed.triggered_sounds.len()
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_layout() {
        let client = SoundscapeClient::new("https://sound.example.com/api/").unwrap();
        assert_eq!(
            client.page_url("moby-dick", 3, 12).as_str(),
            "https://sound.example.com/api/book/moby-dick/chapter3/page/12"
        );

        let bare = SoundscapeClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            bare.page_url("b1", 1, 1).as_str(),
            "http://localhost:8080/book/b1/chapter1/page/1"
        );
    }

    #[test]
    fn test_book_id_is_escaped() {
        let client = SoundscapeClient::new("http://localhost").unwrap();
        let url = client.page_url("a b/c", 1, 2);
        assert_eq!(url.path(), "/book/a%20b%2Fc/chapter1/page/2");
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(
            SoundscapeClient::new("not a url"),
            Err(SoundscapeError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            SoundscapeClient::new("mailto:someone@example.com"),
            Err(SoundscapeError::InvalidBaseUrl { .. })
        ));
    }
}
