//! Next-protocol negotiation result recording.
//!
//! A TLS layer that supports NPN/ALPN drives a [`ProtocolSelector`] during the handshake:
//! it asks for the advertised protocols, then reports either the protocol the peer picked
//! or that the peer does not support negotiation at all. Once the handshake is done the
//! connection asks the selector which [`SelectedProtocol`] to speak.
//!
//! # Example
//! ```rust
//! use tunequery::negotiation::{ProtocolSelector, SelectedProtocol, SpdyProtocolRecorder};
//!
//! let mut recorder = SpdyProtocolRecorder::new();
//! assert_eq!(recorder.selected_protocol(), SelectedProtocol::Unknown);
//!
//! recorder.protocol_selected("spdy/3.1");
//! assert_eq!(recorder.selected_protocol(), SelectedProtocol::Spdy3_1);
//! ```
use std::fmt;

use log::debug;

/// Name reported when the peer does not support protocol negotiation.
pub const FALLBACK_PROTOCOL: &str = "http/1.1";

/// Advertised protocols, most preferred first.
pub const ADVERTISED_PROTOCOLS: [&str; 3] = ["spdy/3.1", "spdy/3", "http/1.1"];

const PROTOCOLS: &[(&str, SelectedProtocol)] = &[
    ("spdy/3", SelectedProtocol::Spdy3),
    ("spdy/3.1", SelectedProtocol::Spdy3_1),
    ("http/1.1", SelectedProtocol::Http1_1),
    ("http/1.0", SelectedProtocol::Http1_0),
];

/// Protocol a connection should speak after negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectedProtocol {
    Spdy3,
    Spdy3_1,
    Http1_0,
    Http1_1,
    Unknown,
}

impl SelectedProtocol {
    /// Exact, case-sensitive lookup. Names outside the table are [`SelectedProtocol::Unknown`].
    pub fn from_name(name: &str) -> Self {
        PROTOCOLS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
            .unwrap_or(SelectedProtocol::Unknown)
    }

    pub fn name(&self) -> Option<&'static str> {
        PROTOCOLS.iter().find(|(_, p)| p == self).map(|(n, _)| *n)
    }
}

impl fmt::Display for SelectedProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().unwrap_or("unknown"))
    }
}

/// Callbacks a negotiating TLS layer invokes on the application.
pub trait ProtocolSelector {
    /// Protocols offered to the peer, in preference order.
    fn protocols(&self) -> Vec<&'static str>;

    /// Peer does not support negotiation.
    fn unsupported(&mut self);

    /// Peer selected `protocol`.
    fn protocol_selected(&mut self, protocol: &str);

    /// Outcome of the negotiation so far.
    fn selected_protocol(&self) -> SelectedProtocol;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum NegotiationState {
    #[default]
    Unset,
    Unsupported,
    Selected(String),
}

/// Per-connection record of a SPDY-or-HTTP negotiation.
#[derive(Debug, Clone, Default)]
pub struct SpdyProtocolRecorder {
    state: NegotiationState,
}

impl SpdyProtocolRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw name recorded so far, if any.
    pub fn selected_name(&self) -> Option<&str> {
        match &self.state {
            NegotiationState::Unset => None,
            NegotiationState::Unsupported => Some(FALLBACK_PROTOCOL),
            NegotiationState::Selected(name) => Some(name.as_str()),
        }
    }
}

impl ProtocolSelector for SpdyProtocolRecorder {
    fn protocols(&self) -> Vec<&'static str> {
        ADVERTISED_PROTOCOLS.to_vec()
    }

    fn unsupported(&mut self) {
        debug!("peer does not support protocol negotiation, falling back to {FALLBACK_PROTOCOL}");
        self.state = NegotiationState::Unsupported;
    }

    fn protocol_selected(&mut self, protocol: &str) {
        debug!("peer selected protocol '{protocol}'");
        self.state = NegotiationState::Selected(protocol.to_string());
    }

    fn selected_protocol(&self) -> SelectedProtocol {
        self.selected_name()
            .map(SelectedProtocol::from_name)
            .unwrap_or(SelectedProtocol::Unknown)
    }
}

/// Advertised protocols as ALPN wire identifiers.
pub fn alpn_protocols<S: ProtocolSelector>(selector: &S) -> Vec<Vec<u8>> {
    selector
        .protocols()
        .into_iter()
        .map(|p| p.as_bytes().to_vec())
        .collect()
}

/// Feeds the protocol a TLS session reports after its handshake into `selector`.
///
/// `None` means nothing was negotiated and is reported as unsupported.
pub fn observe_alpn<S: ProtocolSelector>(selector: &mut S, negotiated: Option<&[u8]>) {
    match negotiated {
        Some(bytes) => selector.protocol_selected(&String::from_utf8_lossy(bytes)),
        None => selector.unsupported(),
    }
}
