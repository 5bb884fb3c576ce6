use reqwest::StatusCode;

/// A required field was absent from an otherwise well-formed API payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Malformed response: missing required field `{field}`")]
    MalformedResponse { field: &'static str },
}

/// Failures of the weather API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("OpenWeather {endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Could not reach OpenWeather ({endpoint}): {source}")]
    Connectivity {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("OpenWeather {endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to parse OpenWeather {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Malformed(#[from] MapError),
}

impl ApiError {
    pub(crate) fn from_reqwest(endpoint: &'static str, source: reqwest::Error) -> Self {
        if source.is_connect() {
            ApiError::Connectivity { endpoint, source }
        } else {
            ApiError::Transport { endpoint, source }
        }
    }
}

/// Location acquisition failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Classified failure as surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("City not found. Please check the name.")]
    NotFound,
    #[error("No internet connection. Try again later.")]
    NoConnectivity,
    #[error("Something went wrong.")]
    Unknown,
    #[error("Unable to fetch location.")]
    LocationUnavailable,
}

impl ErrorKind {
    /// Only a 404 means the city did not resolve; other statuses are unexpected.
    pub fn classify(err: &ApiError) -> Self {
        match err {
            ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
                ErrorKind::NotFound
            }
            ApiError::Connectivity { .. } => ErrorKind::NoConnectivity,
            ApiError::Status { .. }
            | ApiError::Transport { .. }
            | ApiError::Decode { .. }
            | ApiError::Malformed(_) => ErrorKind::Unknown,
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<&ApiError> for ErrorKind {
    fn from(err: &ApiError) -> Self {
        ErrorKind::classify(err)
    }
}

impl From<&LocationError> for ErrorKind {
    fn from(_: &LocationError) -> Self {
        ErrorKind::LocationUnavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            endpoint: "weather",
            status: StatusCode::from_u16(code).unwrap(),
            body: String::new(),
        }
    }

    #[test]
    fn not_found_status_is_not_found() {
        assert_eq!(ErrorKind::classify(&status(404)), ErrorKind::NotFound);
    }

    #[test]
    fn other_statuses_are_unknown() {
        assert_eq!(ErrorKind::classify(&status(401)), ErrorKind::Unknown);
        assert_eq!(ErrorKind::classify(&status(500)), ErrorKind::Unknown);
    }

    #[test]
    fn malformed_payload_is_unknown() {
        let err = ApiError::from(MapError::MalformedResponse { field: "main.temp" });
        assert_eq!(ErrorKind::from(&err), ErrorKind::Unknown);
        assert!(err.to_string().contains("main.temp"));
    }

    #[test]
    fn location_errors_are_location_unavailable() {
        assert_eq!(
            ErrorKind::from(&LocationError::PermissionDenied),
            ErrorKind::LocationUnavailable
        );
        assert_eq!(ErrorKind::from(&LocationError::Timeout), ErrorKind::LocationUnavailable);
    }

    #[test]
    fn user_messages() {
        assert_eq!(ErrorKind::NotFound.user_message(), "City not found. Please check the name.");
        assert_eq!(
            ErrorKind::NoConnectivity.user_message(),
            "No internet connection. Try again later."
        );
        assert_eq!(ErrorKind::Unknown.user_message(), "Something went wrong.");
    }
}
