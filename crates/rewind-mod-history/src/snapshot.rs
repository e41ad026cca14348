/// Snapshot capture and restore.
///
/// A snapshot holds two positional streams: a byte blob for primitive fields
/// (encoded with bincode, no field tags) and a list of opaque handles for
/// references to other objects. The engine never looks inside either.
use std::any::Any;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::tracked::{same_object, Tracked};

/// Opaque reference stored in a snapshot and replayed in write order.
pub type Handle = Rc<dyn Any>;

/// Immutable copy of one object's state at a point in time.
#[derive(Clone)]
pub struct Snapshot {
    target: Tracked,
    references: Option<Box<[Handle]>>,
    data: Option<Box<[u8]>>,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("target", &Rc::as_ptr(&self.target).cast::<()>())
            .field("references", &self.references.as_ref().map(|r| r.len()))
            .field("data_len", &self.data.as_ref().map(|d| d.len()))
            .finish()
    }
}

impl Snapshot {
    /// The object this snapshot belongs to.
    pub fn target(&self) -> &Tracked {
        &self.target
    }

    /// Encoded primitive fields, or `None` if the capture wrote no bytes.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Handles written by the capture, or `None` if it wrote none.
    pub fn references(&self) -> Option<&[Handle]> {
        self.references.as_deref()
    }

    /// Whether this snapshot was taken of `target`.
    pub fn is_for(&self, target: &Tracked) -> bool {
        same_object(&self.target, target)
    }
}

/// Write side of the codec, handed to `Undoable::capture`.
///
/// The buffer and handle list are reused across captures.
#[derive(Default)]
pub struct SnapshotWriter {
    buffer: Vec<u8>,
    handles: Vec<Handle>,
}

impl std::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWriter")
            .field("bytes", &self.buffer.len())
            .field("handles", &self.handles.len())
            .finish()
    }
}

impl SnapshotWriter {
    /// Appends a primitive field.
    ///
    /// # Errors
    ///
    /// Returns an error if bincode cannot encode the value.
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        bincode::serialize_into(&mut self.buffer, value).context("Failed to encode snapshot field")
    }

    /// Appends a reference field.
    pub fn write_handle(&mut self, handle: Handle) {
        self.handles.push(handle);
    }

    /// Appends several reference fields in iteration order.
    pub fn write_handles<I>(&mut self, handles: I)
    where
        I: IntoIterator<Item = Handle>,
    {
        self.handles.extend(handles);
    }

    /// Copies out what was written and resets for the next capture.
    fn finish(&mut self, target: Tracked) -> Snapshot {
        let data = (!self.buffer.is_empty()).then(|| self.buffer.as_slice().into());
        let references = (!self.handles.is_empty()).then(|| self.handles.as_slice().into());
        self.reset();
        Snapshot {
            target,
            references,
            data,
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.handles.clear();
    }
}

/// Read side of the codec, handed to `Undoable::restore`.
pub struct SnapshotReader<'a> {
    data: &'a [u8],
    handles: &'a [Handle],
    next_handle: usize,
}

impl std::fmt::Debug for SnapshotReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotReader")
            .field("remaining_bytes", &self.data.len())
            .field("next_handle", &self.next_handle)
            .finish()
    }
}

impl<'a> SnapshotReader<'a> {
    /// Binds a reader to the start of both streams of `snapshot`.
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            data: snapshot.data().unwrap_or_default(),
            handles: snapshot.references().unwrap_or_default(),
            next_handle: 0,
        }
    }

    /// Reads the next primitive field.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is exhausted or holds a different type.
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<T> {
        bincode::deserialize_from(&mut self.data).context("Failed to decode snapshot field")
    }

    /// Reads the next reference field.
    ///
    /// # Errors
    ///
    /// Returns an error if every handle has already been read.
    pub fn read_handle(&mut self) -> Result<Handle> {
        let handle = self
            .handles
            .get(self.next_handle)
            .cloned()
            .with_context(|| format!("Snapshot has no handle at index {}", self.next_handle))?;
        self.next_handle += 1;
        Ok(handle)
    }

    /// Reads the next reference field and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if no handle is left or it does not point at a `T`.
    pub fn read_handle_as<T: Any>(&mut self) -> Result<Rc<T>> {
        let index = self.next_handle;
        self.read_handle()?.downcast::<T>().map_err(|_| {
            anyhow!(
                "Snapshot handle {index} is not a {}",
                std::any::type_name::<T>()
            )
        })
    }

    /// Bytes not yet consumed.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len()
    }

    /// Handles not yet consumed.
    pub fn remaining_handles(&self) -> usize {
        self.handles.len() - self.next_handle
    }
}

/// Converts live object state to and from snapshots.
#[derive(Debug, Default)]
pub struct SnapshotCodec {
    writer: SnapshotWriter,
}

impl SnapshotCodec {
    /// Creates a codec with an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current state of `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target fails to write one of its fields. The
    /// writer is reset either way.
    pub fn capture(&mut self, target: &Tracked) -> Result<Snapshot> {
        let result = target.borrow().capture(&mut self.writer);
        if let Err(e) = result {
            self.writer.reset();
            return Err(e).context("Failed to capture snapshot");
        }
        let snapshot = self.writer.finish(Rc::clone(target));
        tracing::trace!(
            bytes = snapshot.data().map_or(0, <[u8]>::len),
            handles = snapshot.references().map_or(0, <[Handle]>::len),
            "Captured snapshot"
        );
        Ok(snapshot)
    }

    /// Overwrites the state of the snapshot's target from `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target's `restore` does not match the layout
    /// its `capture` wrote.
    pub fn restore(snapshot: &Snapshot) -> Result<()> {
        let mut reader = SnapshotReader::new(snapshot);
        snapshot
            .target()
            .borrow_mut()
            .restore(&mut reader)
            .context("Failed to restore snapshot")
    }
}
