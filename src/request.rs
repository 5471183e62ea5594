use reqwest::Method;
use serde_json::Value;

use crate::store::Credential;

/// Immutable description of one outgoing call.
///
/// A descriptor is never mutated after submission; the credential header is
/// injected only on the [`PreparedRequest`] copy built for each attempt, so
/// a retried attempt can carry a different credential than the first one.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: Vec<(String, String)>,
    exempt: bool,
    silent: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            exempt: false,
            silent: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Mark this call as exempt from the credential requirement. The
    /// bootstrap and refresh calls themselves are built this way.
    pub fn exempt(mut self) -> Self {
        self.exempt = true;
        self
    }

    /// Suppress the user-visible notification normally emitted for
    /// application failures on this call.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_exempt(&self) -> bool {
        self.exempt
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }
}

/// A fully-formed request ready for the transport: absolute URL, final
/// headers (including the injected credential, when any), JSON body.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl PreparedRequest {
    pub(crate) fn assemble(
        base_url: &str,
        descriptor: &RequestDescriptor,
        credential: Option<&Credential>,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        // Normalize the joint so a path without a leading slash still forms
        // a well-formed URL instead of failing later inside the transport.
        let mut url = if descriptor.path.starts_with('/') {
            format!("{base}{}", descriptor.path)
        } else {
            format!("{base}/{}", descriptor.path)
        };
        if !descriptor.query.is_empty() {
            let joined = descriptor
                .query
                .iter()
                .map(|(k, v)| {
                    format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))
                })
                .collect::<Vec<_>>()
                .join("&");
            let sep = if descriptor.path.contains('?') { '&' } else { '?' };
            url.push(sep);
            url.push_str(&joined);
        }

        let mut headers = descriptor.headers.clone();
        if let Some(credential) = credential {
            headers.push(("Authorization".to_string(), credential.as_str().to_string()));
        }

        Self {
            method: descriptor.method.clone(),
            url,
            headers,
            body: descriptor.body.clone(),
        }
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.as_str())
    }
}
