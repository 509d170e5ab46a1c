use super::document::{Document, LineId};
use crate::error::{EdError, EdResult};
use std::collections::HashMap;

pub const FIRST_MARK: char = '!';
pub const LAST_MARK: char = '~';

/// Anything the address resolver can ask for a marked line.
pub trait MarkLookup {
    fn lookup(&self, mark: char) -> Option<LineId>;
}

/// Named references to line nodes.
///
/// Marks point at nodes, not line numbers, so they follow a line when text
/// around it moves. A mark on a line that is currently detached does not
/// resolve, and starts resolving again if an undo brings the line back.
#[derive(Debug, Clone, Default)]
pub struct MarkTable {
    marks: HashMap<char, LineId>,
}

impl MarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, mark: char, line: LineId) -> EdResult<()> {
        match mark {
            FIRST_MARK..=LAST_MARK => {
                self.marks.insert(mark, line);
                Ok(())
            }
            _ => Err(EdError::InvalidMark(mark)),
        }
    }

    pub fn get(&self, mark: char) -> Option<LineId> {
        self.marks.get(&mark).copied()
    }

    pub fn clear_all(&mut self) {
        self.marks.clear();
    }

    /// Point every mark on `outgoing` at `incoming` instead. Used when one
    /// node takes another's place in the chain.
    pub fn retarget(&mut self, outgoing: LineId, incoming: LineId) {
        for line in self.marks.values_mut() {
            if *line == outgoing {
                *line = incoming;
            }
        }
    }
}

/// Pairs a mark table with the document it refers to, so lookups only
/// answer with lines that are actually in the document.
pub struct AttachedMarks<'a> {
    pub marks: &'a MarkTable,
    pub doc: &'a Document,
}

impl MarkLookup for AttachedMarks<'_> {
    fn lookup(&self, mark: char) -> Option<LineId> {
        self.marks
            .get(mark)
            .filter(|id| self.doc.is_attached(*id))
    }
}

impl MarkLookup for MarkTable {
    fn lookup(&self, mark: char) -> Option<LineId> {
        self.get(mark)
    }
}
