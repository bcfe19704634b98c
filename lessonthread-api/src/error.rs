use http::StatusCode;

/// Everything that can go wrong talking to the comment store.
///
/// None of these are fatal to the page: validation failures are caught
/// before any request goes out, rejections carry the server's message
/// verbatim, and network failures degrade to a section-level error state.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("comment text cannot be empty")]
    EmptyText,

    #[error("permission denied")]
    PermissionDenied,

    /// Non-2xx response carrying a structured message; surfaced verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),
}

impl Error {
    /// Maps a non-2xx response to the error shown to the actor: the
    /// server's own message when the body carries one, a generic network
    /// failure otherwise.
    pub fn from_response_body(status: StatusCode, body: &[u8]) -> Error {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|data| {
                data.get("message")
                    .and_then(|msg| msg.as_str())
                    .map(String::from)
            });
        match message {
            Some(msg) => Error::Rejected(msg),
            None => Error::Network(format!("server returned {status}")),
        }
    }
}
