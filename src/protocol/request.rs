use bincode::{Decode, Encode};

/// Whether `text` is the session-ending `bye` command, in any ASCII case.
pub fn is_bye(text: &str) -> bool {
    text.eq_ignore_ascii_case("bye")
}

/// Catalog a query is run against.
#[derive(Debug, Clone, Copy, Encode, Decode, PartialEq, Eq)]
pub enum QueryService {
    Song,
    Album,
    Singer,
}

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct QueryRequest {
    pub service: QueryService,
    pub offset: u16,
    pub limit: u16,
    pub text: String,
}

impl QueryRequest {
    pub fn new(service: QueryService, offset: u16, limit: u16, text: impl Into<String>) -> Self {
        Self {
            service,
            offset,
            limit,
            text: text.into(),
        }
    }

    /// First page of song results for `text`.
    pub fn song(text: impl Into<String>) -> Self {
        Self::new(QueryService::Song, 1, 50, text)
    }

    /// Whether this request asks the peer to end the session.
    pub fn is_bye(&self) -> bool {
        is_bye(&self.text)
    }
}
