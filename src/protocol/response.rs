use std::fmt;

use bincode::{Decode, Encode};

#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub enum QueryResponse {
    Results {
        body: String,
    },
    Err {
        code: ResponseError,
        description: String,
    },
}

#[derive(Debug, Clone, Copy, Encode, Decode, PartialEq, Eq)]
pub enum ResponseError {
    Query,
    Read,
    Unavailable,
}

impl fmt::Display for QueryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResponse::Results { body } => write!(f, "{body}"),
            QueryResponse::Err { code, description } => {
                write!(f, "error[{code:?}]: {description}")
            }
        }
    }
}
