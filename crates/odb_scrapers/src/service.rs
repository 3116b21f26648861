use std::sync::Arc;

use odb_core::{
    DevotionalPage, DevotionalRecord, Error, ExtractionError, FetchError, ResolutionError, Result,
    SourceConfig,
};
use tracing::{info, instrument};
use url::Url;

use crate::devotional::extract_devotional;
use crate::fetch::{Fetch, HttpFetcher};
use crate::listing::{clamp_limit, extract_listing, parse_cards};
use crate::resolver::{resolve, Request, Target};

/// Resolves, fetches and extracts devotionals. Holds no per-request state, so
/// one instance is shared by every handler.
pub struct DevotionalService {
    fetcher: Arc<dyn Fetch>,
    config: SourceConfig,
}

impl DevotionalService {
    pub fn new(fetcher: Arc<dyn Fetch>, config: SourceConfig) -> Self {
        Self { fetcher, config }
    }

    /// Service backed by a real HTTP client.
    pub fn from_config(config: SourceConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    #[instrument(skip(self))]
    pub async fn today(&self) -> Result<DevotionalRecord> {
        let landing = resolve(&self.config, &Request::Today)?;
        let html = self.fetcher.fetch(landing.url()).await?;

        match parse_cards(&html, landing.url()).into_iter().next() {
            Some(card) => {
                info!("📖 Today's devotional: {}", card.title);
                let url = Url::parse(&card.url).map_err(|_| ExtractionError::MissingField("url"))?;
                self.scrape(&url).await
            }
            None => Ok(extract_devotional(&html, landing.url())?),
        }
    }

    #[instrument(skip(self))]
    pub async fn by_date(&self, date: &str) -> Result<DevotionalRecord> {
        let target = resolve(&self.config, &Request::ByDate(date.to_string()))?;
        let Target::Dated { index, date } = target else {
            return Err(ResolutionError::InvalidDateFormat(date.to_string()).into());
        };
        let html = self.fetcher.fetch(&index).await?;

        let card = parse_cards(&html, &index)
            .into_iter()
            .find(|card| card.date == Some(date))
            .ok_or_else(|| {
                ResolutionError::NotFound(format!("Devotional not found for date: {}", date))
            })?;
        info!("📅 {} is {}", date, card.title);

        let url = Url::parse(&card.url).map_err(|_| ExtractionError::MissingField("url"))?;
        self.scrape(&url)
            .await
            .map_err(|err| not_found(err, format!("Devotional not found for date: {}", date)))
    }

    #[instrument(skip(self))]
    pub async fn by_slug(&self, slug: &str) -> Result<DevotionalRecord> {
        let target = resolve(&self.config, &Request::BySlug(slug.to_string()))?;
        self.scrape(target.url())
            .await
            .map_err(|err| not_found(err, format!("Devotional not found: {}", slug)))
    }

    /// One page of previews. The returned `limit` is the clamped value.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64, offset: usize) -> Result<DevotionalPage> {
        let index = self.config.devotionals_url();
        let html = self.fetcher.fetch(&index).await?;
        let devotionals = extract_listing(&html, &index, limit, offset).collect();
        Ok(DevotionalPage::new(clamp_limit(limit), offset, devotionals))
    }

    async fn scrape(&self, url: &Url) -> Result<DevotionalRecord> {
        let html = self.fetcher.fetch(url).await?;
        let record = extract_devotional(&html, url)?;
        info!("🦗 Scraped {} ({})", record.title, record.date);
        Ok(record)
    }
}

/// For a specific date or slug, a missing page and a page without its
/// mandatory fields both mean there is no such devotional.
fn not_found(err: Error, message: String) -> Error {
    match err {
        Error::Fetch(FetchError::HttpStatus(404 | 410))
        | Error::Extraction(ExtractionError::MissingField(_)) => ResolutionError::NotFound(message).into(),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StaticFetcher {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn with(mut self, url: Url, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }
    }

    #[async_trait]
    impl Fetch for StaticFetcher {
        async fn fetch(&self, url: &Url) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or(FetchError::HttpStatus(404))
        }
    }

    const INDEX: &str = r#"<html><body><main>
        <article class="card"><a href="/en/devotionals/devotional-category/newest"><h3>Newest</h3></a><span class="date">18 Jan 2026</span></article>
        <article class="card"><a href="/en/devotionals/devotional-category/older"><h3>Older</h3></a><span class="date">17 Jan 2026</span></article>
        <article class="card"><a href="/en/devotionals/devotional-category/broken"><h3>Broken</h3></a><span class="date">16 Jan 2026</span></article>
    </main></body></html>"#;

    fn page(title: &str, date: &str) -> String {
        format!(r#"<html><body><h1>{title}</h1><time datetime="{date}"></time><article><p>Body of {title}.</p></article></body></html>"#)
    }

    fn service() -> (DevotionalService, Arc<StaticFetcher>) {
        let config = SourceConfig::default();
        let fetcher = Arc::new(
            StaticFetcher::default()
                .with(config.devotionals_url(), INDEX)
                .with(config.devotional_url("newest"), &page("Newest", "2026-01-18"))
                .with(config.devotional_url("older"), &page("Older", "2026-01-17"))
                .with(config.devotional_url("broken"), "<html><body><p>nothing</p></body></html>"),
        );
        (DevotionalService::new(fetcher.clone(), config), fetcher)
    }

    #[tokio::test]
    async fn test_today_follows_first_card() {
        let (service, _) = service();
        let record = service.today().await.unwrap();
        assert_eq!(record.title, "Newest");
        assert!(record.url.ends_with("/devotional-category/newest"));
    }

    #[tokio::test]
    async fn test_today_without_cards_reads_landing_page() {
        let config = SourceConfig::default();
        let fetcher = Arc::new(StaticFetcher::default().with(config.devotionals_url(), &page("Landing", "2026-01-18")));
        let service = DevotionalService::new(fetcher, config);
        assert_eq!(service.today().await.unwrap().title, "Landing");
    }

    #[tokio::test]
    async fn test_by_date_finds_matching_card() {
        let (service, _) = service();
        let record = service.by_date("2026-01-17").await.unwrap();
        assert_eq!(record.title, "Older");
    }

    #[tokio::test]
    async fn test_by_date_invalid_never_fetches() {
        let (service, fetcher) = service();
        let err = service.by_date("2099-99-99").await.unwrap_err();
        assert_eq!(err, Error::Resolution(ResolutionError::InvalidDateFormat("2099-99-99".into())));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_by_date_unknown_is_not_found() {
        let (service, _) = service();
        assert!(service.by_date("2025-12-25").await.unwrap_err().is_not_found());
        // Card exists but the page has no title.
        assert!(service.by_date("2026-01-16").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_by_slug() {
        let (service, _) = service();
        assert_eq!(service.by_slug("older").await.unwrap().title, "Older");
        assert!(service.by_slug("missing").await.unwrap_err().is_not_found());
        assert_eq!(
            service.by_slug("a/b").await.unwrap_err(),
            Error::Resolution(ResolutionError::InvalidSlug("a/b".into()))
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_on_list_is_not_not_found() {
        let service = DevotionalService::new(Arc::new(StaticFetcher::default()), SourceConfig::default());
        assert_eq!(
            service.list(10, 0).await.unwrap_err(),
            Error::Fetch(FetchError::HttpStatus(404))
        );
    }

    #[tokio::test]
    async fn test_list_clamps_limit() {
        let (service, _) = service();
        let page = service.list(200, 1).await.unwrap();
        assert_eq!(page.limit, 50);
        assert_eq!(page.offset, 1);
        assert_eq!(page.count, 2);
        assert_eq!(page.devotionals[0].title, "Older");
    }
}
