//! Page fetching over HTTP

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::Result;

/// Something that can turn a URL into page text.
///
/// Implemented for [`HttpFetcher`] and for any `Fn(&str) -> Result<String>`,
/// so a plain closure can be wrapped by a `CachedFetcher`.
pub trait Fetch {
    /// Fetch the body at `url`
    fn fetch(&self, url: &str) -> Result<String>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<String>,
{
    fn fetch(&self, url: &str) -> Result<String> {
        self(url)
    }
}

/// Blocking HTTP GET fetcher.
///
/// The body is returned whatever the status code; a 404 or 500 page is still
/// page text. Timeouts and redirects are the reqwest defaults.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default blocking client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("getpage/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;
        debug!("GET {} -> {}", url, response.status());

        let body = response.text()?;
        info!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
