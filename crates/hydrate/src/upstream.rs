//! Upstream call shapes.
//!
//! Every table talks to its provider through paginated listings and keyed
//! lookups. Adapters translate provider responses into [`Page`]s and provider
//! failures into an [`UpstreamError`] carrying a parsed [`ErrorCode`], so the
//! rest of the pipeline never has to look at provider exception names.

use derive_more::{Display, Error, From};

/// Result type alias for a single upstream call.
pub type UpstreamResult<T> = std::result::Result<T, exn::Exn<UpstreamError>>;

/// Provider failure categories the pipeline knows how to route.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Target resource (or its container) does not exist.
    #[display("not found")]
    NotFound,
    /// Caller lacks permission for this specific resource.
    #[display("access denied")]
    AccessDenied,
    /// Request rate exceeded.
    #[display("throttled")]
    Throttling,
    /// Provider-side outage or internal failure.
    #[display("service unavailable")]
    Unavailable,
    /// Could not reach the provider at all (dispatch failure, timeout).
    #[display("connectivity failure")]
    Connectivity,
    /// Credentials rejected outright.
    #[display("unauthorized")]
    Unauthorized,
    /// Request rejected as malformed by the provider.
    #[display("invalid request")]
    InvalidRequest,
    #[display("{_0}")]
    Other(String),
}

impl ErrorCode {
    /// Parse a provider error code.
    ///
    /// ```
    /// use vaultrow_hydrate::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::from_code("ResourceNotFoundException"), ErrorCode::NotFound);
    /// assert_eq!(ErrorCode::from_code("ThrottlingException"), ErrorCode::Throttling);
    /// assert_eq!(ErrorCode::from_code("Teapot"), ErrorCode::Other("Teapot".to_string()));
    /// ```
    pub fn from_code(code: &str) -> Self {
        match code {
            "NotFoundException" | "ResourceNotFoundException" | "NoSuchEntity" => Self::NotFound,
            "AccessDeniedException" | "AccessDenied" => Self::AccessDenied,
            "ThrottlingException" | "Throttling" | "TooManyRequestsException" | "RequestLimitExceeded" => {
                Self::Throttling
            },
            "ServiceUnavailableException" | "ServiceUnavailable" | "InternalFailure" | "InternalServerError" => {
                Self::Unavailable
            },
            "UnrecognizedClientException" | "InvalidClientTokenId" | "ExpiredTokenException" | "InvalidSignatureException" => {
                Self::Unauthorized
            },
            "InvalidParameterValueException" | "MissingParameterValueException" | "ValidationException" => {
                Self::InvalidRequest
            },
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns `true` if the same request could succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttling | Self::Unavailable | Self::Connectivity)
    }
}

/// A failed upstream call.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("{code}: {message}")]
pub struct UpstreamError {
    pub code: ErrorCode,
    pub message: String,
}

impl UpstreamError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Opaque continuation token handed back by a paginated listing.
#[derive(Debug, Display, Clone, PartialEq, Eq, From)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a paginated listing.
///
/// A page is the last one exactly when `next` is `None`. Small or empty pages
/// with a cursor are *not* final; only the provider decides that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<Cursor>) -> Self {
        Self { items, next }
    }

    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    /// Convert the items, keeping the cursor.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
        }
    }
}
