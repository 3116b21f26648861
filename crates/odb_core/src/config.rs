use std::time::Duration;
use url::Url;

pub const BASE_URL: &str = "https://www.odbm.org";
pub const DEVOTIONALS_PATH: &str = "/en/devotionals/";
pub const DEVOTIONAL_PAGE_PATH: &str = "/en/devotionals/devotional-category/";
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Where devotionals live upstream and how to ask for them.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    base_url: Url,
    timeout: Duration,
    user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(BASE_URL).expect("BASE_URL is a valid URL"),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Landing page that lists recent devotionals, newest first.
    pub fn devotionals_url(&self) -> Url {
        self.join(DEVOTIONALS_PATH)
    }

    /// Page for one devotional. `slug` must already be validated.
    pub fn devotional_url(&self, slug: &str) -> Url {
        self.join(&format!("{}{}", DEVOTIONAL_PAGE_PATH, slug))
    }

    fn join(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let config = SourceConfig::default();
        assert_eq!(config.devotionals_url().as_str(), "https://www.odbm.org/en/devotionals/");
        assert_eq!(
            config.devotional_url("faith-and-false-accusation").as_str(),
            "https://www.odbm.org/en/devotionals/devotional-category/faith-and-false-accusation"
        );
    }

    #[test]
    fn test_base_url_override_keeps_paths() {
        let config = SourceConfig::new()
            .with_base_url(Url::parse("http://127.0.0.1:8080/ignored?x=1").unwrap())
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.devotionals_url().as_str(), "http://127.0.0.1:8080/en/devotionals/");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }
}
