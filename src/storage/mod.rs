//! Channel Storage
//!
//! Four parallel chunked arrays hold an encoded infoset stream:
//!
//! ```text
//! Channels
//! ├── structure: ChunkedArray<u8>          # opcodes + inline operands
//! ├── strings:   ChunkedArray<Arc<str>>    # names, attribute values, PI parts
//! ├── chars:     ChunkedArray<u8>          # inline UTF-8 text runs
//! └── objects:   ChunkedArray<Arc<str>>    # copied or shared large text
//! ```
//!
//! A `Snapshot` captures one position in each channel. Buffers and marks are
//! snapshots plus metadata, so taking one never copies channel data.

pub mod chunked;
pub mod cursor;
pub mod fragment;

pub use chunked::ChunkedArray;
pub use cursor::ReadCursor;
pub use fragment::{Fragment, Position};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Channel;

/// The four channels written by one encoding session
#[derive(Debug)]
pub struct Channels {
    pub structure: ChunkedArray<u8>,
    pub strings: ChunkedArray<Arc<str>>,
    pub chars: ChunkedArray<u8>,
    pub objects: ChunkedArray<Arc<str>>,
    /// Bumped on every rewind so stale views can be detected in debug builds
    generation: Arc<AtomicU64>,
}

impl Channels {
    pub fn new(structure: usize, strings: usize, chars: usize, objects: usize) -> Self {
        Self {
            structure: ChunkedArray::new(Channel::Structure, structure),
            strings: ChunkedArray::new(Channel::Strings, strings),
            chars: ChunkedArray::new(Channel::Characters, chars),
            objects: ChunkedArray::new(Channel::Objects, objects),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Positions at the start of the current pass
    pub fn start_snapshot(&self) -> Snapshot {
        Snapshot {
            structure: self.structure.start(),
            strings: self.strings.start(),
            chars: self.chars.start(),
            objects: self.objects.start(),
            generation: self.generation(),
        }
    }

    /// Capture the current write position of every channel
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            structure: self.structure.position(),
            strings: self.strings.position(),
            chars: self.chars.position(),
            objects: self.objects.position(),
            generation: self.generation(),
        }
    }

    fn generation(&self) -> Generation {
        Generation {
            counter: Arc::clone(&self.generation),
            captured: self.generation.load(Ordering::Acquire),
        }
    }

    /// Rewind all channels for reuse
    pub fn rewind(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.structure.rewind();
        self.strings.rewind();
        self.chars.rewind();
        self.objects.rewind();
    }

    /// Fragments in use per channel: structure, strings, chars, objects
    pub fn fragment_counts(&self) -> [usize; 4] {
        [
            self.structure.fragments(),
            self.strings.fragments(),
            self.chars.fragments(),
            self.objects.fragments(),
        ]
    }
}

/// Start positions of a buffer or mark in all four channels
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub structure: Position<u8>,
    pub strings: Position<Arc<str>>,
    pub chars: Position<u8>,
    pub objects: Position<Arc<str>>,
    pub generation: Generation,
}

/// Session generation observed when a snapshot was taken
#[derive(Debug, Clone)]
pub struct Generation {
    counter: Arc<AtomicU64>,
    captured: u64,
}

impl Generation {
    /// False once the originating storage has been rewound
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::Acquire) == self.captured
    }
}
