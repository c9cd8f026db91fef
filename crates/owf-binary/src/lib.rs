//! Binary codec for the Open Wire Format (OWF).
//!
//! The wire is a length-prefixed frame tree: a magic word, an outer body
//! length, then channel frames, each nesting namespace frames, which in
//! turn hold signal, event, and alarm groups. All multi-byte scalars are
//! big-endian; every frame length is a multiple of 4 bytes.
//!
//! Two decode modes share one segment walker:
//!
//! - **Streaming**: [`BinaryReader::decode_with`] invokes a visitor once
//!   per node in depth-first pre-order. Returning [`Control::Skip`]
//!   discards the rest of the current frame without further callbacks.
//! - **Materialization**: [`BinaryReader::materialize`] builds an owned
//!   [`Package`](owf_types::Package) tree directly.
//!
//! Encoding is the inverse: [`BinaryWriter::encode`] walks a tree
//! top-down, writing each frame's pre-computed size followed by its
//! body, byte-for-byte reproducible for a given tree.
//!
//! I/O happens through the blocking [`ByteSource`] and [`ByteSink`]
//! traits; anything that reads or writes bytes (sockets, files,
//! in-memory buffers) is a thin adapter over those two.

pub mod error;
pub mod reader;
pub mod sink;
pub mod source;
pub mod writer;

pub use error::{DecodeError, EncodeError};
pub use reader::{BinaryReader, Control, Node};
pub use sink::{BufSink, ByteSink};
pub use source::{ByteSource, BytesSource};
pub use writer::{BinaryWriter, encode_to_vec};
