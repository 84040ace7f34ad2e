// Raw gateway response.

/// An HTTP response from the gateway: status code plus the body text.
///
/// Produced for every response that made it back over the wire, including
/// 4xx/5xx. The gateway wraps failures in the same JSON envelope as
/// successes, so the body is worth decoding either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    status: u16,
    body: String,
}

impl Payload {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Shorthand for a `200 OK` payload.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the HTTP status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
