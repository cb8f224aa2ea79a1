//! Semantic HTTP message: an insertion-ordered, case-insensitive header
//! multimap plus the request/response line data carried by HTTP/2
//! pseudo-headers.

/// Ordered header multimap with ASCII-case-insensitive names.
///
/// Insertion order is preserved, which matters for HPACK round-trips and for
/// headers with list semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing values for the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `name` with a single value. The new entry takes
    /// the position of the first removed one, or appends if none existed.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let first = self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&name));
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        let at = first.unwrap_or(self.entries.len()).min(self.entries.len());
        self.entries.insert(at, (name, value.into()));
    }

    /// Remove every value of `name`; returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    /// Join all values of `name` with `sep`. `None` when the header is absent.
    pub fn combine(&self, name: &str, sep: &str) -> Option<String> {
        let mut values = self.get_all(name);
        let first = values.next()?;
        let mut combined = String::from(first);
        for value in values {
            combined.push_str(sep);
            combined.push_str(value);
        }
        Some(combined)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// A decoded HTTP request or response.
///
/// Requests carry a method, URL and secure flag (`:scheme == "https"`);
/// responses carry a status code. The `:authority` pseudo-header appears as
/// a `host` header rather than a field of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpMessage {
    method: Option<String>,
    url: Option<String>,
    status_code: Option<u16>,
    secure: bool,
    headers: Headers,
}

impl HttpMessage {
    /// Build a request. CONNECT requests may pass an empty `url`.
    pub fn request(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Build a response.
    pub fn response(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::default()
        }
    }

    pub fn is_request(&self) -> bool {
        self.method.is_some()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}
