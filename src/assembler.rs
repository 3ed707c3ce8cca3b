//! Per-connection request assembly.
//!
//! The transport delivers a request as up to three event kinds: one head,
//! zero or more body fragments, and an end marker. [`Assembler`] is the
//! state machine that folds those into one complete [`Request`]:
//!
//! ```text
//! AwaitingHead ──head──▶ AccumulatingBody ──end──▶ (emit) ─┐
//!      ▲                   │    ▲                          │
//!      │                   └──body (append)                │
//!      └───────────────────────────────────────────────────┘
//! ```
//!
//! One assembler is exclusively owned by one connection; there is no
//! cross-connection sharing and therefore no locking.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::method::Method;
use crate::request::Request;

/// A transport-level request fragment.
#[derive(Debug)]
pub enum TransportEvent {
    /// Request line and headers.
    Head {
        method: Method,
        /// The raw request target, query string still attached.
        target: String,
        headers: HashMap<String, String>,
    },
    /// One body fragment.
    Body(Bytes),
    /// End of the message.
    End,
}

enum State {
    AwaitingHead,
    AccumulatingBody {
        method: Method,
        target: String,
        headers: HashMap<String, String>,
    },
}

/// Folds transport events into complete requests.
pub struct Assembler {
    state: State,
    body: BytesMut,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingHead,
            body: BytesMut::new(),
        }
    }

    /// Feeds one event.
    ///
    /// Returns `Ok(Some(request))` when an end marker completes a message,
    /// `Ok(None)` otherwise. A body or end event arriving before any head
    /// fails with `InvalidRequest`; the assembler stays in `AwaitingHead`
    /// and may be fed again. After each completed request the assembler
    /// resets, ready for the next head on the same connection.
    pub fn push(&mut self, event: TransportEvent) -> Result<Option<Request>> {
        match event {
            TransportEvent::Head { method, target, headers } => {
                self.state = State::AccumulatingBody { method, target, headers };
                self.body.clear();
                Ok(None)
            }
            TransportEvent::Body(chunk) => match self.state {
                State::AwaitingHead => {
                    Err(Error::InvalidRequest("Invalid HTTP request".to_owned()))
                }
                State::AccumulatingBody { .. } => {
                    self.body.extend_from_slice(&chunk);
                    Ok(None)
                }
            },
            TransportEvent::End => {
                match std::mem::replace(&mut self.state, State::AwaitingHead) {
                    State::AwaitingHead => {
                        Err(Error::InvalidRequest("Invalid HTTP request".to_owned()))
                    }
                    State::AccumulatingBody { method, target, headers } => {
                        let body = if self.body.is_empty() {
                            None
                        } else {
                            Some(self.body.split().freeze())
                        };
                        Ok(Some(Request::new(method, &target, headers, body)))
                    }
                }
            }
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(target: &str) -> TransportEvent {
        TransportEvent::Head {
            method: Method::Post,
            target: target.to_owned(),
            headers: HashMap::new(),
        }
    }

    #[test]
    fn head_then_end_yields_bodyless_request() {
        let mut asm = Assembler::new();
        assert!(asm.push(head("/submit")).unwrap().is_none());
        let req = asm.push(TransportEvent::End).unwrap().unwrap();
        assert_eq!(req.path(), "/submit");
        assert!(req.body().is_none());
    }

    #[test]
    fn body_fragments_are_concatenated() {
        let mut asm = Assembler::new();
        asm.push(head("/submit")).unwrap();
        asm.push(TransportEvent::Body(Bytes::from_static(b"hel"))).unwrap();
        asm.push(TransportEvent::Body(Bytes::from_static(b"lo"))).unwrap();
        let req = asm.push(TransportEvent::End).unwrap().unwrap();
        assert_eq!(req.body().map(|b| &b[..]), Some(&b"hello"[..]));
    }

    #[test]
    fn empty_accumulated_body_becomes_none() {
        let mut asm = Assembler::new();
        asm.push(head("/submit")).unwrap();
        asm.push(TransportEvent::Body(Bytes::new())).unwrap();
        let req = asm.push(TransportEvent::End).unwrap().unwrap();
        assert!(req.body().is_none());
    }

    #[test]
    fn body_before_head_is_invalid() {
        let mut asm = Assembler::new();
        let err = asm.push(TransportEvent::Body(Bytes::from_static(b"x"))).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Invalid HTTP request");
    }

    #[test]
    fn end_before_head_is_invalid() {
        let mut asm = Assembler::new();
        assert!(asm.push(TransportEvent::End).is_err());
    }

    #[test]
    fn assembler_resets_between_requests() {
        let mut asm = Assembler::new();
        asm.push(head("/first")).unwrap();
        asm.push(TransportEvent::Body(Bytes::from_static(b"one"))).unwrap();
        asm.push(TransportEvent::End).unwrap().unwrap();

        asm.push(head("/second")).unwrap();
        let req = asm.push(TransportEvent::End).unwrap().unwrap();
        assert_eq!(req.path(), "/second");
        // The first request's body did not bleed into the second.
        assert!(req.body().is_none());
    }

    #[test]
    fn recovers_after_a_stray_event() {
        let mut asm = Assembler::new();
        assert!(asm.push(TransportEvent::End).is_err());
        asm.push(head("/ok")).unwrap();
        assert!(asm.push(TransportEvent::End).unwrap().is_some());
    }
}
