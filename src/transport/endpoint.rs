// src/transport/endpoint.rs
use anyhow::{bail, Context, Result};
use reqwest::Url;
use std::collections::BTreeMap;
use std::time::Duration;

use super::types::FetchError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Everything needed to issue one GET: where, with which parameters, and how long to wait.
///
/// Path templates use `{name}` segments, e.g. `/service-trends/dashboard/{businessId}`.
/// Builders consume and return `Self`, so a descriptor never changes once handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    base_url: Url,
    path_template: String,
    path_params: BTreeMap<String, String>,
    query_params: BTreeMap<String, String>,
    timeout: Duration,
}

impl EndpointDescriptor {
    pub fn new(base_url: &str, path_template: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("parsing base url {base_url:?}"))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            bail!("base url must be an absolute http(s) url, got {base_url}");
        }
        Ok(Self {
            base_url,
            path_template: path_template.to_string(),
            path_params: BTreeMap::new(),
            query_params: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Names of the `{name}` segments in the path template.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.path_template
            .split('/')
            .filter_map(|raw| raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
    }

    /// Fail at build time if the template names a placeholder the caller will never fill.
    pub fn expecting_params(self, supplied: &[&str]) -> Result<Self> {
        if let Some(name) = self.placeholders().find(|p| !supplied.contains(p)) {
            bail!(
                "path template {:?} has placeholder {{{name}}} that is never supplied",
                self.path_template
            );
        }
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_query_param(mut self, name: &str, value: &str) -> Self {
        self.query_params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn path_params(&self) -> &BTreeMap<String, String> {
        &self.path_params
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    /// Look a parameter up by name, path parameters first.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params
            .get(name)
            .or_else(|| self.query_params.get(name))
            .map(String::as_str)
    }

    /// Render the full request URL. Path values are percent-encoded per segment.
    ///
    /// A descriptor that cannot be rendered is a programming error, not a transient
    /// failure, so it is reported with a non-retryable kind.
    pub fn url(&self) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                FetchError::decode(format!("base url {} cannot carry a path", self.base_url))
            })?;
            segments.pop_if_empty();
            for raw in self.path_template.split('/').filter(|s| !s.is_empty()) {
                match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => {
                        let value = self.path_params.get(name).ok_or_else(|| {
                            FetchError::decode(format!("unresolved path parameter {{{name}}}"))
                        })?;
                        segments.push(value);
                    }
                    None => {
                        segments.push(raw);
                    }
                }
            }
        }
        if !self.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query_params.iter());
        }
        Ok(url)
    }
}
