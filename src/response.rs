//! Abstract response model and its single-read entity stream.

use std::{
    fmt,
    io::{self, Read},
    sync::mpsc,
};

use bytes::Bytes;
use http::StatusCode;

use crate::header::HeaderMap;

/// An abstract HTTP response.
///
/// The entity is readable exactly once: [`Response::entity`] hands the stream
/// out and subsequent calls yield nothing. A response with no entity is
/// safely droppable without reading.
pub struct Response {
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    entity: Option<EntityStream>,
}

impl Response {
    pub(crate) fn new(
        status: StatusCode,
        reason: Option<String>,
        headers: HeaderMap,
        entity: Option<EntityStream>,
    ) -> Self {
        Response {
            status,
            reason,
            headers,
            entity,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Engine-supplied reason phrase, else the canonical phrase for the code.
    pub fn reason(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => self.status.canonical_reason().unwrap_or(""),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether an entity is still available to read.
    pub fn has_entity(&self) -> bool {
        self.entity.is_some()
    }

    /// Take the entity stream. At most one caller gets it.
    pub fn entity(&mut self) -> Option<EntityStream> {
        self.entity.take()
    }

    /// Drain the entity into one buffer. Empty when no entity remains.
    pub fn read_entity(&mut self) -> io::Result<Bytes> {
        match self.entity.take() {
            Some(mut stream) => {
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf)?;
                Ok(buf.into())
            }
            None => Ok(Bytes::new()),
        }
    }

    /// Release the response without reading the entity.
    pub fn close(mut self) {
        self.entity.take();
    }

    /// Settle a zero-length buffered entity so emptiness is observable
    /// without touching a stream that was never populated (blocking path).
    pub(crate) fn settle_empty_entity(&mut self) {
        if matches!(&self.entity, Some(stream) if stream.known_empty()) {
            self.entity = None;
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nResponse {} {}", self.status, self.reason())?;
        writeln!(f, "  headers:")?;
        for (key, val) in self.headers.iter() {
            writeln!(f, "    {key:?}: {val:?}")?;
        }
        Ok(())
    }
}

/// Response entity bytes, readable exactly once.
///
/// The buffered shape wraps a complete byte sequence; the channel shape is a
/// view over chunks the engine may still be delivering, and reads block until
/// more data or end-of-body arrives.
pub struct EntityStream {
    inner: StreamKind,
}

enum StreamKind {
    Buffered {
        bytes: Bytes,
        pos: usize,
    },
    Channel {
        rx: mpsc::Receiver<Bytes>,
        current: Bytes,
        pos: usize,
        done: bool,
    },
}

impl EntityStream {
    pub(crate) fn buffered(bytes: Bytes) -> Self {
        EntityStream {
            inner: StreamKind::Buffered { bytes, pos: 0 },
        }
    }

    pub(crate) fn channel(rx: mpsc::Receiver<Bytes>) -> Self {
        EntityStream {
            inner: StreamKind::Channel {
                rx,
                current: Bytes::new(),
                pos: 0,
                done: false,
            },
        }
    }

    fn known_empty(&self) -> bool {
        matches!(&self.inner, StreamKind::Buffered { bytes, .. } if bytes.is_empty())
    }
}

impl Read for EntityStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            StreamKind::Buffered { bytes, pos } => {
                let remaining = &bytes[*pos..];
                let n = remaining.len().min(buf.len());
                buf[..n].copy_from_slice(&remaining[..n]);
                *pos += n;
                Ok(n)
            }
            StreamKind::Channel {
                rx,
                current,
                pos,
                done,
            } => loop {
                if *pos < current.len() {
                    let remaining = &current[*pos..];
                    let n = remaining.len().min(buf.len());
                    buf[..n].copy_from_slice(&remaining[..n]);
                    *pos += n;
                    return Ok(n);
                }
                if *done {
                    return Ok(0);
                }
                match rx.recv() {
                    Ok(chunk) => {
                        *current = chunk;
                        *pos = 0;
                    }
                    Err(_) => {
                        *done = true;
                        return Ok(0);
                    }
                }
            },
        }
    }
}

impl Drop for EntityStream {
    fn drop(&mut self) {
        let unread = match &self.inner {
            StreamKind::Buffered { bytes, pos } => bytes.len().saturating_sub(*pos),
            StreamKind::Channel {
                rx,
                current,
                pos,
                done,
            } => {
                let mut pending = current.len().saturating_sub(*pos);
                if !*done {
                    while let Ok(chunk) = rx.try_recv() {
                        pending += chunk.len();
                    }
                }
                pending
            }
        };
        if unread > 0 {
            log::debug!("response entity dropped with {unread} unread byte(s)");
        }
    }
}

impl fmt::Debug for EntityStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            StreamKind::Buffered { bytes, pos } => {
                write!(f, "EntityStream::Buffered({}/{} bytes)", pos, bytes.len())
            }
            StreamKind::Channel { done, .. } => {
                write!(f, "EntityStream::Channel(done: {done})")
            }
        }
    }
}
