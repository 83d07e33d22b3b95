// ============================================================================
// BizDesk Infrastructure - Web Researcher (Google Custom Search + scraper)
// File: crates/bizdesk-infrastructure/src/gateways/web_search.rs
// ============================================================================

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

use bizdesk_core::error::DomainError;
use bizdesk_core::gateways::{ScrapedPage, SearchHit, WebResearcher};
use bizdesk_shared::config::SearchSettings;

use super::{ensure_success, http_client, network_error};

const SERVICE: &str = "web_search";
const MAX_RESULTS: &str = "5";
const MAX_IMAGES: usize = 8;

pub struct GoogleWebResearcher {
    client: Client,
    base_url: String,
    api_key: String,
    engine_id: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    link: String,
    snippet: Option<String>,
    pagemap: Option<PageMap>,
}

#[derive(Deserialize)]
struct PageMap {
    #[serde(default)]
    cse_image: Vec<CseImage>,
}

#[derive(Deserialize)]
struct CseImage {
    src: String,
}

impl GoogleWebResearcher {
    pub fn new(settings: &SearchSettings) -> Result<Self, DomainError> {
        Ok(Self {
            client: http_client("web_search", settings.timeout_seconds)?,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            engine_id: settings.engine_id.clone(),
        })
    }
}

#[async_trait]
impl WebResearcher for GoogleWebResearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, DomainError> {
        if self.api_key.is_empty() || self.engine_id.is_empty() {
            return Err(DomainError::external(SERVICE, "search engine not configured"));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", MAX_RESULTS),
            ])
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| DomainError::external(SERVICE, format!("unreadable response: {}", e)))?;

        let hits: Vec<SearchHit> = body
            .items
            .into_iter()
            .map(|item| SearchHit {
                title: item.title,
                url: item.link,
                snippet: item.snippet,
                image_url: item
                    .pagemap
                    .and_then(|p| p.cse_image.into_iter().next())
                    .map(|i| i.src),
            })
            .collect();

        debug!(query, hits = hits.len(), "Web search completed");
        Ok(hits)
    }

    async fn fetch_page(&self, url: &str) -> Result<ScrapedPage, DomainError> {
        let base = Url::parse(url).map_err(|e| DomainError::Validation(format!("invalid URL '{}': {}", url, e)))?;

        let response = self
            .client
            .get(base.clone())
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;
        let html = response
            .text()
            .await
            .map_err(|e| DomainError::external(SERVICE, format!("unreadable page: {}", e)))?;

        Ok(scrape(&base, &html))
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

/// Pulls `og:*` metadata, falling back to `<title>` and the description meta.
fn scrape(base: &Url, html: &str) -> ScrapedPage {
    let document = Html::parse_document(html);

    let title = meta_content(&document, r#"meta[property="og:title"]"#).or_else(|| {
        let sel = selector("title")?;
        document
            .select(&sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let description = meta_content(&document, r#"meta[property="og:description"]"#)
        .or_else(|| meta_content(&document, r#"meta[name="description"]"#));

    let mut image_urls: Vec<String> = Vec::new();
    if let Some(sel) = selector(r#"meta[property="og:image"], meta[property="og:image:url"]"#) {
        for content in document.select(&sel).filter_map(|el| el.value().attr("content")) {
            if let Ok(resolved) = base.join(content.trim()) {
                let resolved = resolved.to_string();
                if !image_urls.contains(&resolved) {
                    image_urls.push(resolved);
                }
            }
            if image_urls.len() >= MAX_IMAGES {
                break;
            }
        }
    }

    ScrapedPage {
        url: base.to_string(),
        title,
        description,
        image_urls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> SearchSettings {
        SearchSettings {
            base_url,
            api_key: "k".to_string(),
            engine_id: "cx1".to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_scrape_prefers_open_graph() {
        let html = r#"<html><head>
            <title>Fallback title</title>
            <meta property="og:title" content="Stoneware Mug">
            <meta name="description" content="plain description">
            <meta property="og:description" content="Hand-glazed 350 ml mug">
            <meta property="og:image" content="/img/mug.jpg">
            <meta property="og:image" content="https://cdn.example.com/mug2.jpg">
        </head><body></body></html>"#;
        let base = Url::parse("https://shop.example.com/p/mug").unwrap();
        let page = scrape(&base, html);
        assert_eq!(page.title.as_deref(), Some("Stoneware Mug"));
        assert_eq!(page.description.as_deref(), Some("Hand-glazed 350 ml mug"));
        assert_eq!(
            page.image_urls,
            vec![
                "https://shop.example.com/img/mug.jpg".to_string(),
                "https://cdn.example.com/mug2.jpg".to_string()
            ]
        );
    }

    #[test]
    fn test_scrape_falls_back_to_title_and_description() {
        let html = r#"<html><head><title> Plain page </title>
            <meta name="description" content="Just a page"></head></html>"#;
        let base = Url::parse("https://example.com/").unwrap();
        let page = scrape(&base, html);
        assert_eq!(page.title.as_deref(), Some("Plain page"));
        assert_eq!(page.description.as_deref(), Some("Just a page"));
        assert!(page.image_urls.is_empty());
    }

    #[tokio::test]
    async fn test_search_maps_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("cx", "cx1"))
            .and(query_param("q", "stoneware mug"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {
                        "title": "Mug",
                        "link": "https://shop.example.com/mug",
                        "snippet": "A mug",
                        "pagemap": { "cse_image": [{ "src": "https://shop.example.com/mug.jpg" }] }
                    },
                    { "title": "Other", "link": "https://other.example.com" }
                ]
            })))
            .mount(&server)
            .await;

        let researcher = GoogleWebResearcher::new(&settings(format!("{}/customsearch/v1", server.uri()))).unwrap();
        let hits = researcher.search("stoneware mug").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].image_url.as_deref(), Some("https://shop.example.com/mug.jpg"));
        assert!(hits[1].snippet.is_none());
    }

    #[tokio::test]
    async fn test_search_without_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let researcher = GoogleWebResearcher::new(&settings(server.uri())).unwrap();
        assert!(researcher.search("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_scrapes_served_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head><meta property="og:title" content="Served"></head></html>"#,
            ))
            .mount(&server)
            .await;

        let researcher = GoogleWebResearcher::new(&settings(server.uri())).unwrap();
        let page = researcher
            .fetch_page(&format!("{}/product", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.title.as_deref(), Some("Served"));
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_bad_url() {
        let researcher = GoogleWebResearcher::new(&settings("http://127.0.0.1:9".into())).unwrap();
        let err = researcher.fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
