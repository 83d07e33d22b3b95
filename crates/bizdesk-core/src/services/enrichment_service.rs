// ============================================================================
// BizDesk Core - Enrichment Service
// File: crates/bizdesk-core/src/services/enrichment_service.rs
// ============================================================================
//! Asks external generators and the web for better product metadata. The
//! result is a set of suggestions for a person to review; nothing is saved.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::TenantContext;
use crate::domain::enrichment::{merge_drafts, parse_draft, single_source};
use crate::domain::{Confidence, EnrichmentMethod, EnrichmentResult, MethodFailure, MethodResult, Product, ProductDraft};
use crate::error::DomainError;
use crate::gateways::{ContentGenerator, WebResearcher};
use crate::repositories::ProductRepository;

const SYSTEM_PROMPT: &str = "You are a retail catalog assistant for a small business in Chile. \
Improve the product data you are given. Answer with a single JSON object with the keys \
\"name\", \"description\", \"category\", \"brand\" and \"tags\" (an array of short strings). \
Write in Spanish. Omit a key when you have nothing better than the input.";

const SOURCE_PRIMARY: &str = "primary";
const SOURCE_SECONDARY: &str = "secondary";
const SOURCE_PREMIUM: &str = "premium";
const SOURCE_WEB: &str = "web";

/// Bounds how many enrichments run at once in this process.
#[derive(Clone)]
pub struct EnrichmentLimiter {
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl EnrichmentLimiter {
    pub fn new(concurrency: usize, acquire_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            acquire_timeout: acquire_timeout.max(Duration::from_millis(1)),
        }
    }

    pub async fn acquire(&self) -> Result<(OwnedSemaphorePermit, Duration), DomainError> {
        let start = Instant::now();
        let permit = tokio::time::timeout(self.acquire_timeout, Arc::clone(&self.permits).acquire_owned())
            .await
            .map_err(|_| DomainError::external("enrichment", "too many enrichments in progress, try again later"))?
            .map_err(|e| DomainError::InternalError(format!("enrichment limiter closed: {}", e)))?;
        Ok((permit, start.elapsed()))
    }
}

pub struct EnrichmentService {
    products: Arc<dyn ProductRepository>,
    primary: Arc<dyn ContentGenerator>,
    secondary: Arc<dyn ContentGenerator>,
    premium: Arc<dyn ContentGenerator>,
    web: Arc<dyn WebResearcher>,
    limiter: EnrichmentLimiter,
}

impl EnrichmentService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        primary: Arc<dyn ContentGenerator>,
        secondary: Arc<dyn ContentGenerator>,
        premium: Arc<dyn ContentGenerator>,
        web: Arc<dyn WebResearcher>,
        limiter: EnrichmentLimiter,
    ) -> Self {
        Self {
            products,
            primary,
            secondary,
            premium,
            web,
            limiter,
        }
    }

    /// Runs the requested methods concurrently (all of them when `methods`
    /// is empty). Fails only when every requested method failed.
    pub async fn enrich(
        &self,
        ctx: &TenantContext,
        product_id: &Uuid,
        methods: &[EnrichmentMethod],
    ) -> Result<EnrichmentResult, DomainError> {
        let product = self
            .products
            .find_by_id(&ctx.tenant_id, product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;

        let wants = |m: EnrichmentMethod| methods.is_empty() || methods.contains(&m);
        let requested = EnrichmentMethod::ALL.iter().filter(|m| wants(**m)).count();

        let (_permit, waited) = self.limiter.acquire().await?;
        debug!(product_id = %product.id, waited_ms = waited.as_millis() as u64, "Enrichment permit acquired");

        let prompt = build_prompt(&product);
        let (ai, web, premium) = tokio::join!(
            async {
                if wants(EnrichmentMethod::Ai) {
                    Some(self.run_ai(&prompt).await)
                } else {
                    None
                }
            },
            async {
                if wants(EnrichmentMethod::Web) {
                    Some(self.run_web(&product).await)
                } else {
                    None
                }
            },
            async {
                if wants(EnrichmentMethod::Premium) {
                    Some(self.run_premium(&prompt).await)
                } else {
                    None
                }
            },
        );

        let mut result = EnrichmentResult {
            product_id: product.id,
            ai: None,
            web: None,
            premium: None,
            errors: Vec::new(),
        };
        result.ai = settle(EnrichmentMethod::Ai, ai, &mut result.errors);
        result.web = settle(EnrichmentMethod::Web, web, &mut result.errors);
        result.premium = settle(EnrichmentMethod::Premium, premium, &mut result.errors);

        if result.succeeded() == 0 {
            let reasons = result
                .errors
                .iter()
                .map(|f| format!("{}: {}", f.method.as_str(), f.message))
                .collect::<Vec<_>>()
                .join("; ");
            warn!(product_id = %product.id, "Every enrichment method failed: {}", reasons);
            return Err(DomainError::external("enrichment", reasons));
        }

        info!(
            tenant_id = %ctx.tenant_id,
            product_id = %product.id,
            requested,
            succeeded = result.succeeded(),
            "Product enriched"
        );
        Ok(result)
    }

    /// Two generators with the same prompt; their agreement sets the confidence.
    async fn run_ai(&self, prompt: &str) -> Result<MethodResult, DomainError> {
        let (a, b) = tokio::join!(
            self.primary.complete(SYSTEM_PROMPT, prompt),
            self.secondary.complete(SYSTEM_PROMPT, prompt),
        );
        let a = a.and_then(|reply| parse_draft(&reply));
        let b = b.and_then(|reply| parse_draft(&reply));

        let suggestions = match (&a, &b) {
            (Err(ea), Err(eb)) => {
                return Err(DomainError::external(
                    "ai",
                    format!("{}: {}; {}: {}", SOURCE_PRIMARY, ea, SOURCE_SECONDARY, eb),
                ))
            }
            _ => merge_drafts(
                a.as_ref().ok().map(|d| (SOURCE_PRIMARY, d)),
                b.as_ref().ok().map(|d| (SOURCE_SECONDARY, d)),
            ),
        };
        if let Err(e) = &a {
            debug!("Primary generator unusable: {}", e);
        }
        if let Err(e) = &b {
            debug!("Secondary generator unusable: {}", e);
        }

        Ok(MethodResult {
            method: EnrichmentMethod::Ai,
            suggestions,
            image_urls: Vec::new(),
            source_urls: Vec::new(),
        })
    }

    async fn run_premium(&self, prompt: &str) -> Result<MethodResult, DomainError> {
        let reply = self.premium.complete(SYSTEM_PROMPT, prompt).await?;
        let draft = parse_draft(&reply)?;
        Ok(MethodResult {
            method: EnrichmentMethod::Premium,
            suggestions: single_source(SOURCE_PREMIUM, &draft, Confidence::Medium),
            image_urls: Vec::new(),
            source_urls: Vec::new(),
        })
    }

    /// Search by name and brand, then scrape the first hit.
    async fn run_web(&self, product: &Product) -> Result<MethodResult, DomainError> {
        let query = match product.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            Some(brand) if !product.name.to_lowercase().contains(&brand.to_lowercase()) => {
                format!("{} {}", product.name, brand)
            }
            _ => product.name.clone(),
        };

        let hits = self.web.search(&query).await?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::external("web", format!("no search results for '{}'", query)))?;
        let page = self.web.fetch_page(&hit.url).await?;

        let draft = ProductDraft {
            name: page.title.clone().or_else(|| Some(hit.title.clone())),
            description: page.description.clone().or_else(|| hit.snippet.clone()),
            ..Default::default()
        };

        let mut image_urls = page.image_urls;
        if let Some(url) = hit.image_url {
            if !image_urls.contains(&url) {
                image_urls.push(url);
            }
        }

        Ok(MethodResult {
            method: EnrichmentMethod::Web,
            suggestions: single_source(SOURCE_WEB, &draft, Confidence::Low),
            image_urls,
            source_urls: vec![hit.url],
        })
    }
}

fn settle(
    method: EnrichmentMethod,
    outcome: Option<Result<MethodResult, DomainError>>,
    errors: &mut Vec<MethodFailure>,
) -> Option<MethodResult> {
    match outcome? {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(method = method.as_str(), "Enrichment method failed: {}", e);
            errors.push(MethodFailure {
                method,
                message: e.to_string(),
            });
            None
        }
    }
}

fn build_prompt(product: &Product) -> String {
    let mut prompt = format!("Product name: {}\n", product.name);
    for (label, value) in [
        ("Brand", &product.brand),
        ("Category", &product.category),
        ("Description", &product.description),
    ] {
        if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            prompt.push_str(&format!("{}: {}\n", label, v.trim()));
        }
    }
    if !product.tags.is_empty() {
        prompt.push_str(&format!("Tags: {}\n", product.tags.join(", ")));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::{MockContentGenerator, MockWebResearcher, ScrapedPage, SearchHit};
    use crate::repositories::MockProductRepository;

    const REPLY_A: &str = r#"Claro, aquí va:
```json
{"name": "Harina de trigo 25 kg", "category": "Panadería", "tags": ["harina", "trigo"]}
```"#;
    const REPLY_B: &str = r#"{"name": "Harina trigo 25 kg", "category": "Abarrotes", "brand": "Selecta"}"#;

    fn generator(reply: Result<&'static str, &'static str>) -> Arc<dyn ContentGenerator> {
        let mut g = MockContentGenerator::new();
        g.expect_complete().returning(move |_, _| match reply {
            Ok(text) => Ok(text.to_string()),
            Err(msg) => Err(DomainError::external("llm", msg)),
        });
        Arc::new(g)
    }

    fn products(product: Product) -> Arc<dyn ProductRepository> {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().returning(move |_, _| Ok(Some(product.clone())));
        Arc::new(repo)
    }

    fn failing_web() -> Arc<dyn WebResearcher> {
        let mut web = MockWebResearcher::new();
        web.expect_search()
            .returning(|_| Err(DomainError::external("search", "quota exceeded")));
        Arc::new(web)
    }

    fn limiter() -> EnrichmentLimiter {
        EnrichmentLimiter::new(2, Duration::from_secs(1))
    }

    fn product(tenant: Uuid) -> Product {
        let mut p = Product::new(tenant, "harina 25kg".into());
        p.brand = Some("Selecta".into());
        p
    }

    #[tokio::test]
    async fn test_partial_success_keeps_available_methods() {
        let tenant = Uuid::new_v4();
        let p = product(tenant);
        let id = p.id;
        let svc = EnrichmentService::new(
            products(p),
            generator(Ok(REPLY_A)),
            generator(Ok(REPLY_B)),
            generator(Err("HTTP 429")),
            failing_web(),
            limiter(),
        );

        let ctx = TenantContext::staff(tenant, Uuid::new_v4(), "employee");
        let result = svc.enrich(&ctx, &id, &[]).await.unwrap();

        let ai = result.ai.expect("ai result");
        let name = ai.suggestions.iter().find(|s| s.field == "name").unwrap();
        assert_eq!(name.value, "Harina de trigo 25 kg");
        assert_eq!(name.confidence, Confidence::High);
        assert_eq!(name.sources, vec!["primary", "secondary"]);

        let category = ai.suggestions.iter().find(|s| s.field == "category").unwrap();
        assert_eq!(category.confidence, Confidence::Low);

        let brand = ai.suggestions.iter().find(|s| s.field == "brand").unwrap();
        assert_eq!(brand.confidence, Confidence::Low);
        assert_eq!(brand.sources, vec!["secondary"]);

        assert!(result.web.is_none());
        assert!(result.premium.is_none());
        let failed: Vec<_> = result.errors.iter().map(|e| e.method).collect();
        assert_eq!(failed, vec![EnrichmentMethod::Web, EnrichmentMethod::Premium]);
    }

    #[tokio::test]
    async fn test_all_methods_failing_is_an_error() {
        let tenant = Uuid::new_v4();
        let p = product(tenant);
        let id = p.id;
        let svc = EnrichmentService::new(
            products(p),
            generator(Err("timeout")),
            generator(Ok("no json here")),
            generator(Err("HTTP 500")),
            failing_web(),
            limiter(),
        );
        let ctx = TenantContext::staff(tenant, Uuid::new_v4(), "employee");
        let err = svc.enrich(&ctx, &id, &[]).await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService { service: "enrichment", .. }));
    }

    #[tokio::test]
    async fn test_web_method_scrapes_first_hit() {
        let tenant = Uuid::new_v4();
        let p = product(tenant);
        let id = p.id;

        let mut web = MockWebResearcher::new();
        web.expect_search()
            .withf(|q| q == "harina 25kg Selecta")
            .returning(|_| {
                Ok(vec![SearchHit {
                    title: "Harina Selecta 25 kg".into(),
                    url: "https://tienda.example.cl/harina".into(),
                    snippet: Some("Harina de trigo para panificación".into()),
                    image_url: Some("https://tienda.example.cl/thumb.jpg".into()),
                }])
            });
        web.expect_fetch_page()
            .withf(|url| url == "https://tienda.example.cl/harina")
            .returning(|url| {
                Ok(ScrapedPage {
                    url: url.to_string(),
                    title: Some("Harina Selecta 25 kg | Tienda".into()),
                    description: None,
                    image_urls: vec!["https://tienda.example.cl/og.jpg".into()],
                })
            });

        let mut unused = MockContentGenerator::new();
        unused.expect_complete().never();
        let unused: Arc<dyn ContentGenerator> = Arc::new(unused);

        let svc = EnrichmentService::new(
            products(p),
            Arc::clone(&unused),
            Arc::clone(&unused),
            unused,
            Arc::new(web),
            limiter(),
        );
        let ctx = TenantContext::staff(tenant, Uuid::new_v4(), "employee");
        let result = svc.enrich(&ctx, &id, &[EnrichmentMethod::Web]).await.unwrap();

        assert!(result.ai.is_none() && result.premium.is_none());
        assert!(result.errors.is_empty());
        let web = result.web.unwrap();
        assert!(web.suggestions.iter().all(|s| s.confidence == Confidence::Low));
        let description = web.suggestions.iter().find(|s| s.field == "description").unwrap();
        assert_eq!(description.value, "Harina de trigo para panificación");
        assert_eq!(
            web.image_urls,
            vec!["https://tienda.example.cl/og.jpg", "https://tienda.example.cl/thumb.jpg"]
        );
        assert_eq!(web.source_urls, vec!["https://tienda.example.cl/harina"]);
    }

    #[tokio::test]
    async fn test_premium_is_medium_confidence() {
        let tenant = Uuid::new_v4();
        let p = product(tenant);
        let id = p.id;
        let svc = EnrichmentService::new(
            products(p),
            generator(Err("unused")),
            generator(Err("unused")),
            generator(Ok(REPLY_B)),
            failing_web(),
            limiter(),
        );
        let ctx = TenantContext::staff(tenant, Uuid::new_v4(), "employee");
        let result = svc.enrich(&ctx, &id, &[EnrichmentMethod::Premium]).await.unwrap();
        let premium = result.premium.unwrap();
        assert_eq!(premium.suggestions.len(), 3);
        assert!(premium.suggestions.iter().all(|s| s.confidence == Confidence::Medium));
    }

    #[tokio::test]
    async fn test_limiter_times_out_when_saturated() {
        let limiter = EnrichmentLimiter::new(1, Duration::from_millis(20));
        let (_held, _) = limiter.acquire().await.unwrap();
        assert!(limiter.acquire().await.is_err());
    }

    #[test]
    fn test_prompt_includes_known_fields() {
        let mut p = product(Uuid::new_v4());
        p.tags = vec!["harina".into()];
        let prompt = build_prompt(&p);
        assert!(prompt.contains("Product name: harina 25kg"));
        assert!(prompt.contains("Brand: Selecta"));
        assert!(prompt.contains("Tags: harina"));
        assert!(!prompt.contains("Category"));
    }
}
