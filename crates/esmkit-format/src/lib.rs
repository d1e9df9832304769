pub mod compound;
mod compression;
pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod field;
mod file;
pub mod header;
pub mod localization;
pub mod record;
pub mod registry;
pub mod shapes;
pub mod subrecord;

pub use config::{CodecConfig, CompressionPolicy, ReadOptions, WriteOptions};
pub use cursor::{ByteReader, ByteWriter};
pub use dispatch::{Entry, Group, GroupContents, GroupHeader, RecordDispatcher};
pub use file::{write_file_atomic, EsmFile, Records};
pub use header::{HeaderMeta, RecordHeader};
pub use localization::{LocalizedString, StringLookup, StringTable};
pub use record::{DecodeContext, DynShape, Record, RecordBody, RecordShape};
pub use registry::ShapeRegistry;
pub use subrecord::{PayloadSink, SizeAccumulator, Subrecord, SubrecordCursor, SubrecordWriter};
