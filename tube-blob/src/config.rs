use std::time::Duration;

pub const TESTNET_PUBLISHER: &str = "https://publisher.walrus-testnet.walrus.space";
pub const TESTNET_AGGREGATOR: &str = "https://aggregator.walrus-testnet.walrus.space";

/// Where to find Walrus and how long to wait for it.
#[derive(Debug, Clone)]
pub struct WalrusConfig {
    pub publisher_url: String,
    pub aggregator_url: String,

    /// Whole-request timeout for uploads and buffered reads. Large video
    /// uploads need minutes. Streamed reads apply it per read instead.
    pub timeout: Duration,

    /// Storage epochs used when the caller does not ask for a number.
    pub default_epochs: Option<u32>,
}

impl Default for WalrusConfig {
    fn default() -> Self {
        Self {
            publisher_url: TESTNET_PUBLISHER.to_string(),
            aggregator_url: TESTNET_AGGREGATOR.to_string(),
            timeout: Duration::from_secs(300),
            default_epochs: None,
        }
    }
}

impl WalrusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_publisher_url<S: Into<String>>(mut self, url: S) -> Self {
        self.publisher_url = trim_slash(url.into());
        self
    }

    pub fn with_aggregator_url<S: Into<String>>(mut self, url: S) -> Self {
        self.aggregator_url = trim_slash(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_epochs(mut self, epochs: u32) -> Self {
        self.default_epochs = Some(epochs);
        self
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_trims_trailing_slashes() {
        let cfg = WalrusConfig::new()
            .with_publisher_url("http://pub.local/")
            .with_aggregator_url("http://agg.local//")
            .with_default_epochs(3);

        assert_eq!(cfg.publisher_url, "http://pub.local");
        assert_eq!(cfg.aggregator_url, "http://agg.local");
        assert_eq!(cfg.default_epochs, Some(3));
        assert_eq!(cfg.timeout, Duration::from_secs(300));
    }
}
