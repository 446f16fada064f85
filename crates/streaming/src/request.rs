use foundation::Handle;

/// One download handed to a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Cache slot the result belongs to.
    pub handle: Handle,
    /// URL-like tile identifier; also the dedup key.
    pub identifier: String,
    /// Send credentials (cookies, auth headers) with the request.
    pub credentialed: bool,
}

/// Result of a [`FetchRequest`], posted back on the completion channel.
#[derive(Debug)]
pub struct Completion<I> {
    pub handle: Handle,
    pub identifier: String,
    pub result: Result<I, FetchError>,
}

impl<I> Completion<I> {
    pub fn for_request(request: &FetchRequest, result: Result<I, FetchError>) -> Self {
        Self {
            handle: request.handle,
            identifier: request.identifier.clone(),
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Network(String),
    NotFound(String),
    Decode(String),
    Cancelled,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::NotFound(id) => write!(f, "tile not found: {id}"),
            FetchError::Decode(msg) => write!(f, "could not decode tile: {msg}"),
            FetchError::Cancelled => write!(f, "fetch cancelled"),
        }
    }
}

impl std::error::Error for FetchError {}
