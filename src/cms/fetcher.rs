use crate::cms::PageContentDocument;
use crate::config::Config;
use crate::error::ContentFetchError;
use crate::i18n::Language;
use crate::routes::PageKey;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Retrieves the localized document for a page.
///
/// One call is one attempt: implementations do not retry. Calls for
/// different keys are independent and may resolve in any order.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(
        &self,
        page: &PageKey,
        language: Language,
    ) -> Result<PageContentDocument, ContentFetchError>;
}

#[async_trait]
impl<T: ContentFetcher + ?Sized> ContentFetcher for std::sync::Arc<T> {
    async fn fetch(
        &self,
        page: &PageKey,
        language: Language,
    ) -> Result<PageContentDocument, ContentFetchError> {
        (**self).fetch(page, language).await
    }
}

/// Query API envelope: `{"result": <document or null>, "ms": ...}`
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Option<Value>,
}

const PAGE_QUERY: &str = "*[_type == $type && language == $lang][0]";
const SLUG_QUERY: &str = "*[_type == $type && language == $lang && slug.current == $key][0]";

/// Read-only client for the CMS query HTTP API.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    query_url: String,
    token: Option<String>,
}

impl CmsClient {
    pub fn new(
        api_url: &str,
        dataset: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build CMS HTTP client")?;

        Ok(Self {
            http,
            query_url: format!("{}/data/query/{}", api_url.trim_end_matches('/'), dataset),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.cms_api_url,
            &config.cms_dataset,
            config.cms_token.clone(),
            Duration::from_secs(config.cms_timeout_secs),
        )
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    /// Query string for a page. Parameter values are JSON literals.
    fn query_params(page: &PageKey, language: Language) -> Vec<(String, String)> {
        let mut params = vec![
            (
                "query".to_string(),
                if page.slug().is_some() { SLUG_QUERY } else { PAGE_QUERY }.to_string(),
            ),
            ("$type".to_string(), Value::from(page.document_type()).to_string()),
            ("$lang".to_string(), Value::from(language.code()).to_string()),
        ];
        if let Some(slug) = page.slug() {
            params.push(("$key".to_string(), Value::from(slug).to_string()));
        }
        params
    }

    async fn query(
        &self,
        page: &PageKey,
        language: Language,
    ) -> Result<PageContentDocument, ContentFetchError> {
        let mut request = self
            .http
            .get(&self.query_url)
            .query(&Self::query_params(page, language));

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(ContentFetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentFetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: QueryResponse = response
            .json()
            .await
            .map_err(|e| ContentFetchError::Decode(e.to_string()))?;

        match envelope.result {
            Some(Value::Null) | None => Err(ContentFetchError::NotFound {
                document_type: page.document_type(),
                language: language.code(),
            }),
            Some(value) => PageContentDocument::from_value(page.clone(), language, value),
        }
    }
}

#[async_trait]
impl ContentFetcher for CmsClient {
    async fn fetch(
        &self,
        page: &PageKey,
        language: Language,
    ) -> Result<PageContentDocument, ContentFetchError> {
        debug!("Fetching {} ({})", page, language);

        let result = self.query(page, language).await;
        if let Err(e) = &result {
            warn!("Content fetch for {} ({}) failed: {}", page, language, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer, token: Option<&str>) -> CmsClient {
        CmsClient::new(
            &server.uri(),
            "production",
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .expect("client should build")
    }

    #[test]
    fn test_query_url_trims_trailing_slash() {
        let client = CmsClient::new(
            "https://abc.api.example.com/v2021-10-21/",
            "staging",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.query_url(),
            "https://abc.api.example.com/v2021-10-21/data/query/staging"
        );
    }

    #[test]
    fn test_query_params_for_collection_page() {
        let params = CmsClient::query_params(
            &PageKey::Project("smart-factory".to_string()),
            Language::VIETNAMESE,
        );

        assert!(params.contains(&("query".to_string(), SLUG_QUERY.to_string())));
        assert!(params.contains(&("$type".to_string(), "\"project\"".to_string())));
        assert!(params.contains(&("$lang".to_string(), "\"vi\"".to_string())));
        assert!(params.contains(&("$key".to_string(), "\"smart-factory\"".to_string())));
    }

    #[test]
    fn test_query_params_for_single_page() {
        let params = CmsClient::query_params(&PageKey::About, Language::ENGLISH);

        assert!(params.contains(&("query".to_string(), PAGE_QUERY.to_string())));
        assert!(!params.iter().any(|(k, _)| k == "$key"));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/query/production"))
            .and(query_param("$type", "\"aboutPage\""))
            .and(query_param("$lang", "\"vi\""))
            .and(header("Authorization", "Bearer cms-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ms": 3,
                "result": { "header": { "title": "Về chúng tôi" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let doc = client_for(&server, Some("cms-token"))
            .fetch(&PageKey::About, Language::VIETNAMESE)
            .await
            .expect("fetch should succeed");

        assert_eq!(doc.title(), Some("Về chúng tôi"));
        assert_eq!(doc.language, Language::VIETNAMESE);
        assert_eq!(doc.page, PageKey::About);
    }

    #[tokio::test]
    async fn test_fetch_null_result_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": null })))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .fetch(&PageKey::News, Language::ENGLISH)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("newsPage"));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .fetch(&PageKey::Home, Language::ENGLISH)
            .await
            .unwrap_err();

        match err {
            ContentFetchError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .fetch(&PageKey::Home, Language::ENGLISH)
            .await
            .unwrap_err();

        assert!(matches!(err, ContentFetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let client = CmsClient::new(
            "http://127.0.0.1:1",
            "production",
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client
            .fetch(&PageKey::Home, Language::ENGLISH)
            .await
            .unwrap_err();

        assert!(matches!(err, ContentFetchError::Transport(_)));
    }
}
