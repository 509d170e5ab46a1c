/// Document model subsystem - the line store and everything that records
/// changes to it.
///
/// Holds the linked line arena, the node buffers and undo engine built on
/// top of it, plus the small stores that refer to lines by handle (marks,
/// the cut buffer) and the load/save routines.

pub mod document;
pub mod marks;
pub mod node_buffer;
pub mod persistence;
pub mod registers;
pub mod undo;

// Re-export main types for convenience
pub use document::{Document, LineId, Lines, terminated};
pub use marks::{AttachedMarks, MarkLookup, MarkTable};
pub use node_buffer::{Entry, NodeBuffer};
pub use persistence::{LoadReport, read_lines, write_lines};
pub use registers::CutBuffer;
pub use undo::{BufferKind, InvariantViolation, Tag, UndoEngine};
