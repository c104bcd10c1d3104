// 🌐 Source Fetcher - Raw CSV retrieval from OFAC publication endpoints
//
// Behind a trait so the pipeline can run against canned text in tests.
// Real runs hit the Treasury download URLs (overridable via environment).

use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Primary SDN table (one row per sanctioned entity)
pub const DEFAULT_SDN_URL: &str = "https://www.treasury.gov/ofac/downloads/sdn.csv";

/// Alternate-identity table (aliases, keyed by parent uid)
pub const DEFAULT_ALT_URL: &str = "https://www.treasury.gov/ofac/downloads/alt.csv";

/// Address table (keyed by parent uid)
pub const DEFAULT_ADD_URL: &str = "https://www.treasury.gov/ofac/downloads/add.csv";

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Retrieves one CSV document as text
pub trait SourceFetcher {
    fn fetch_text(&self, url: &str) -> Result<String>;
}

// ============================================================================
// HTTP FETCHER
// ============================================================================

/// Blocking HTTP fetcher used by the CLI pipeline
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpFetcher { client })
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Fetch of {} returned HTTP {}", url, status);
        }

        response
            .text()
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Canned fetcher for exercising trait consumers
    struct ScriptedFetcher {
        responses: RefCell<Vec<Result<String>>>,
    }

    impl SourceFetcher for ScriptedFetcher {
        fn fetch_text(&self, _url: &str) -> Result<String> {
            self.responses.borrow_mut().remove(0)
        }
    }

    #[test]
    fn test_trait_is_object_safe() {
        let fetcher = ScriptedFetcher {
            responses: RefCell::new(vec![Ok("a,b\n1,2".to_string())]),
        };
        let dyn_ref: &dyn SourceFetcher = &fetcher;

        assert_eq!(dyn_ref.fetch_text("http://example.test").unwrap(), "a,b\n1,2");
    }

    #[test]
    fn test_default_urls_point_at_treasury() {
        for url in [DEFAULT_SDN_URL, DEFAULT_ALT_URL, DEFAULT_ADD_URL] {
            assert!(url.starts_with("https://www.treasury.gov/"));
            assert!(url.ends_with(".csv"));
        }
    }
}
