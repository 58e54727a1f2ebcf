//! Upstream request description
//!
//! A request is a list of raw path segments under one of the PubChem
//! services. Escaping happens only when the URL is built.

use crate::types::PubChemError;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// PUG REST (`/rest/pug`)
    Pug,
    /// PUG View annotations (`/rest/pug_view`)
    PugView,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Pug => "pug",
            Service::PugView => "pug_view",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubChemRequest {
    pub service: Service,
    pub method: HttpMethod,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl PubChemRequest {
    pub fn new<I, S>(service: Service, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service,
            method: HttpMethod::Get,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            form: Vec::new(),
        }
    }

    /// GET under `pug/`
    pub fn pug<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Service::Pug, segments)
    }

    /// GET under `pug_view/`
    pub fn view<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Service::PugView, segments)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Adds a form field and switches the request to POST.
    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.method = HttpMethod::Post;
        self.form.push((key.into(), value.into()));
        self
    }

    /// Unescaped `service/seg/seg/...` path, used for logging and matching.
    pub fn path(&self) -> String {
        let mut path = String::from(self.service.as_str());
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    /// Full URL under `base`, with every segment percent-encoded.
    pub fn url(&self, base: &Url) -> Result<Url, PubChemError> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| PubChemError::InvalidUrl(base.to_string()))?;
            path.pop_if_empty();
            path.push(self.service.as_str());
            for segment in &self.segments {
                path.push(segment);
            }
        }

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}
