//! Request method and option handling

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether the payload travels in the query string instead of the body
    pub fn uses_query(&self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }
}

/// Options fixed when a request controller is built
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Do not touch the shared loading indicator
    pub skip_loader: bool,
    /// Artificial latency before the network call
    pub with_delay: Option<Duration>,
    /// Fire one call as soon as the controller is constructed
    pub immediate: bool,
    /// Replace a `{ "data": ... }` envelope with its `data` member
    pub unwrap_data: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_loader(mut self) -> Self {
        self.skip_loader = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.with_delay = Some(delay);
        self
    }

    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    pub fn unwrap_data(mut self) -> Self {
        self.unwrap_data = true;
        self
    }

    /// Layer per-call overrides on top of these defaults; set overrides win
    pub fn merged(&self, overrides: Option<&RequestOverrides>) -> RequestOptions {
        let Some(overrides) = overrides else {
            return self.clone();
        };

        RequestOptions {
            skip_loader: overrides.skip_loader.unwrap_or(self.skip_loader),
            with_delay: overrides.with_delay.or(self.with_delay),
            immediate: self.immediate,
            unwrap_data: overrides.unwrap_data.unwrap_or(self.unwrap_data),
        }
    }
}

/// Per-call overrides. Unset fields fall back to the controller defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub skip_loader: Option<bool>,
    pub with_delay: Option<Duration>,
    pub unwrap_data: Option<bool>,
}
