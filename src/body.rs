//! Request entity model and its serialization into engine body providers.

use std::{fmt, io, sync::mpsc};

use bytes::Bytes;

use crate::error::EntityWriteError;

/// Producer half of a deferred request entity: writes the body into a sink.
pub trait EntityWriter: Send {
    fn write_entity(&mut self, out: &mut dyn io::Write) -> io::Result<()>;
}

impl<F> EntityWriter for F
where
    F: FnMut(&mut dyn io::Write) -> io::Result<()> + Send,
{
    fn write_entity(&mut self, out: &mut dyn io::Write) -> io::Result<()> {
        (self)(out)
    }
}

/// Opaque request body.
pub enum Entity {
    /// Fully materialized body bytes.
    Bytes(Bytes),
    /// Deferred body, produced during serialization.
    Writer(Box<dyn EntityWriter>),
}

impl Entity {
    pub fn bytes(body: impl Into<Bytes>) -> Self {
        Entity::Bytes(body.into())
    }

    pub fn writer(writer: impl EntityWriter + 'static) -> Self {
        Entity::Writer(Box::new(writer))
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Bytes(bytes) => write!(f, "Entity::Bytes({} bytes)", bytes.len()),
            Entity::Writer(_) => f.write_str("Entity::Writer(..)"),
        }
    }
}

/// How an entity is serialized for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SerializeMode {
    /// Whole body buffered up front into a fixed-length provider
    /// (blocking path).
    Buffered,
    /// Producer/consumer byte pipe; the engine may begin transmitting while
    /// chunks are still queued (callback path).
    Streamed,
}

/// Body form handed to the engine.
pub enum BodyProvider {
    /// Fixed-length, fully buffered body.
    Fixed(Bytes),
    /// Chunked body; the engine drains chunks as they become available.
    Streamed(mpsc::Receiver<Bytes>),
}

impl BodyProvider {
    /// Length when known up front.
    pub fn len(&self) -> Option<usize> {
        match self {
            BodyProvider::Fixed(bytes) => Some(bytes.len()),
            BodyProvider::Streamed(_) => None,
        }
    }

    /// Drain the provider into one contiguous buffer.
    pub fn into_bytes(self) -> Bytes {
        match self {
            BodyProvider::Fixed(bytes) => bytes,
            BodyProvider::Streamed(rx) => {
                let mut buf = Vec::new();
                while let Ok(chunk) = rx.recv() {
                    buf.extend_from_slice(&chunk);
                }
                buf.into()
            }
        }
    }
}

impl fmt::Debug for BodyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyProvider::Fixed(bytes) => write!(f, "BodyProvider::Fixed({} bytes)", bytes.len()),
            BodyProvider::Streamed(_) => f.write_str("BodyProvider::Streamed(..)"),
        }
    }
}

/// `io::Write` adapter over the pipe's sending half.
struct PipeWriter {
    tx: mpsc::Sender<Bytes>,
}

impl io::Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(Bytes::copy_from_slice(buf))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "body consumer hung up"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serialize an entity into the form the engine accepts for `mode`.
///
/// Any I/O failure while the writer runs aborts the call before anything is
/// sent.
pub(crate) fn materialize(
    entity: Entity,
    mode: SerializeMode,
) -> Result<BodyProvider, EntityWriteError> {
    match (entity, mode) {
        // already materialized; a fixed provider suits both paths
        (Entity::Bytes(bytes), _) => Ok(BodyProvider::Fixed(bytes)),
        (Entity::Writer(mut writer), SerializeMode::Buffered) => {
            let mut buf = Vec::new();
            writer.write_entity(&mut buf).map_err(EntityWriteError::new)?;
            Ok(BodyProvider::Fixed(buf.into()))
        }
        (Entity::Writer(mut writer), SerializeMode::Streamed) => {
            let (tx, rx) = mpsc::channel();
            let mut pipe = PipeWriter { tx };
            writer
                .write_entity(&mut pipe)
                .map_err(EntityWriteError::new)?;
            // dropping the sender marks end-of-body for the engine
            drop(pipe);
            Ok(BodyProvider::Streamed(rx))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn bytes_pass_through_unchanged() {
        let provider = materialize(Entity::bytes("payload"), SerializeMode::Buffered).unwrap();
        assert_eq!(provider.len(), Some(7));
        assert_eq!(provider.into_bytes(), Bytes::from("payload"));
    }

    #[test]
    fn buffered_writer_runs_to_completion() {
        let entity = Entity::writer(|out: &mut dyn io::Write| {
            out.write_all(b"part one, ")?;
            out.write_all(b"part two")
        });

        let provider = materialize(entity, SerializeMode::Buffered).unwrap();
        assert_eq!(provider.into_bytes(), Bytes::from("part one, part two"));
    }

    #[test]
    fn streamed_writer_feeds_the_pipe_in_chunks() {
        let entity = Entity::writer(|out: &mut dyn io::Write| {
            out.write_all(b"alpha")?;
            out.write_all(b"beta")
        });

        let provider = materialize(entity, SerializeMode::Streamed).unwrap();
        match provider {
            BodyProvider::Streamed(rx) => {
                assert_eq!(rx.recv().unwrap(), Bytes::from("alpha"));
                assert_eq!(rx.recv().unwrap(), Bytes::from("beta"));
                // writer finished, so the pipe is closed
                assert!(rx.recv().is_err());
            }
            other => panic!("expected a streamed provider, got {other:?}"),
        }
    }

    #[test]
    fn writer_failure_aborts_with_entity_write_error() {
        let entity = Entity::writer(|_: &mut dyn io::Write| -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        });

        let err = materialize(entity, SerializeMode::Buffered).unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
    }
}
