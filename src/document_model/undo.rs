//! Generative undo and redo.
//!
//! Nothing here ever snapshots the document. Each forward editing operation
//! records the nodes it attached or detached into `append_buf` and
//! `delete_buf`, bracketed by a brake, and then pushes a [`Tag`]. Undo looks
//! at the tag, pops the matching brackets and applies the structural inverse
//! using nothing but [`Document`] primitives, parking the nodes in the two
//! redo buffers. Redo does the same in the other direction and lands the
//! nodes back where a fresh forward operation would have put them.
//!
//! The tag stack is a `(tags, len)` pair. Undo shortens `len` without
//! erasing; redo grows it again and reads what is already there. A new
//! forward operation truncates everything past `len` before pushing, which
//! is what makes a stale redo unreachable.

use super::document::{Document, LineId};
use super::node_buffer::NodeBuffer;
use crate::error::{EdError, EdResult};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

/// Which kind of operation produced an undo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Append,
    Insert,
    Read,
    Transfer,
    Paste,
    Delete,
    Change,
    Move,
    Join,
    Substitute,
    GroupOpen,
    GroupClose,
}

impl Tag {
    pub fn as_char(self) -> char {
        match self {
            Tag::Append => 'a',
            Tag::Insert => 'i',
            Tag::Read => 'r',
            Tag::Transfer => 't',
            Tag::Paste => 'x',
            Tag::Delete => 'd',
            Tag::Change => 'c',
            Tag::Move => 'm',
            Tag::Join => 'j',
            Tag::Substitute => 's',
            Tag::GroupOpen => 'g',
            Tag::GroupClose => 'G',
        }
    }

    pub fn from_char(c: char) -> Option<Tag> {
        let tag = match c {
            'a' => Tag::Append,
            'i' => Tag::Insert,
            'r' => Tag::Read,
            't' => Tag::Transfer,
            'x' => Tag::Paste,
            'd' => Tag::Delete,
            'c' => Tag::Change,
            'm' => Tag::Move,
            'j' => Tag::Join,
            's' => Tag::Substitute,
            'g' => Tag::GroupOpen,
            'G' => Tag::GroupClose,
            _ => return None,
        };
        Some(tag)
    }

    fn is_group_marker(self) -> bool {
        matches!(self, Tag::GroupOpen | Tag::GroupClose)
    }

    /// Buffers the next undo of this tag pops, and whether their nodes must
    /// be attached at that moment.
    fn undo_reads(self) -> &'static [(BufferKind, bool)] {
        use BufferKind::*;
        match self {
            Tag::Append | Tag::Insert | Tag::Read | Tag::Transfer | Tag::Paste | Tag::Move => {
                &[(Append, true)]
            }
            Tag::Delete | Tag::Join => &[(Delete, false)],
            Tag::Change | Tag::Substitute => &[(Append, true), (Delete, false)],
            Tag::GroupOpen | Tag::GroupClose => &[],
        }
    }

    /// Buffers the next redo of this tag pops, and whether their nodes must
    /// be attached at that moment.
    fn redo_reads(self) -> &'static [(BufferKind, bool)] {
        use BufferKind::*;
        match self {
            Tag::Append | Tag::Insert | Tag::Read | Tag::Transfer | Tag::Paste => {
                &[(RedoDelete, false)]
            }
            Tag::Delete | Tag::Join | Tag::Move => &[(RedoAppend, true)],
            Tag::Change | Tag::Substitute => &[(RedoDelete, false), (RedoAppend, true)],
            Tag::GroupOpen | Tag::GroupClose => &[],
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Append,
    Delete,
    RedoAppend,
    RedoDelete,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BufferKind::Append => "append_buf",
            BufferKind::Delete => "delete_buf",
            BufferKind::RedoAppend => "redo_append_buf",
            BufferKind::RedoDelete => "redo_delete_buf",
        };
        f.write_str(name)
    }
}

/// A node buffer holds a reference whose attachment state is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{buffer} holds a node that is {}", attachment(.attached))]
pub struct InvariantViolation {
    pub buffer: BufferKind,
    pub node: LineId,
    pub attached: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UndoEngine {
    append_buf: NodeBuffer,
    delete_buf: NodeBuffer,
    redo_append_buf: NodeBuffer,
    redo_delete_buf: NodeBuffer,
    tags: Vec<Tag>,
    len: usize,
    undo_count: usize,
    group_pending: bool,
    group_open: bool,
    /// `(outgoing, incoming)` node swaps made by the last undo or redo.
    swaps: Vec<(LineId, LineId)>,
}

impl UndoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // Recording, called by forward operations (and by redo, which mirrors them).

    pub fn push_append_brake(&mut self) {
        self.append_buf.push_brake();
    }

    pub fn push_append(&mut self, node: LineId) {
        self.append_buf.push(node);
    }

    pub fn push_delete_brake(&mut self) {
        self.delete_buf.push_brake();
    }

    pub fn push_delete(&mut self, node: LineId) {
        self.delete_buf.push(node);
    }

    /// Bracket of freshly attached nodes.
    pub fn record_append(&mut self, nodes: &[LineId]) {
        self.push_append_brake();
        for &node in nodes {
            self.push_append(node);
        }
    }

    /// Bracket of freshly detached nodes, in detach order.
    pub fn record_delete(&mut self, nodes: &[LineId]) {
        self.push_delete_brake();
        for &node in nodes {
            self.push_delete(node);
        }
    }

    /// The six boundary nodes of a move, in the order
    /// `from_prev, from, to, to_next, dest, dest_next`.
    pub fn record_move(&mut self, bounds: [LineId; 6]) {
        self.record_append(&bounds);
    }

    /// Matched `(old, new)` pairs of a substitution.
    pub fn record_substitute(&mut self, pairs: &[(LineId, LineId)]) {
        self.push_delete_brake();
        self.push_append_brake();
        for &(old, new) in pairs {
            self.push_delete(old);
            self.push_append(new);
        }
    }

    /// Close one forward operation. Anything that could still have been
    /// redone is dropped here, and the nodes only the redo side knew about
    /// are freed.
    pub fn push_tag(&mut self, tag: Tag, doc: &mut Document) {
        self.discard_redo(doc);
        if self.group_pending {
            self.group_pending = false;
            self.group_open = true;
            self.tags.push(Tag::GroupOpen);
            self.len += 1;
        }
        self.tags.push(tag);
        self.len += 1;
        self.undo_count = 0;
        trace!(%tag, depth = self.len, "recorded");
    }

    /// Start collecting the following tags into one undo step. The open
    /// marker is only written once something is actually recorded.
    pub fn begin_group(&mut self) {
        self.group_pending = true;
        self.group_open = false;
    }

    pub fn end_group(&mut self, doc: &mut Document) {
        if self.group_open {
            self.push_tag(Tag::GroupClose, doc);
        }
        self.group_pending = false;
        self.group_open = false;
    }

    pub fn in_group(&self) -> bool {
        self.group_pending || self.group_open
    }

    fn discard_redo(&mut self, doc: &mut Document) {
        self.tags.truncate(self.len);
        self.redo_append_buf.drain();
        let orphans = self.redo_delete_buf.drain();
        if orphans.is_empty() {
            return;
        }
        let mut freed = 0;
        for node in orphans {
            if doc.contains(node) && !doc.is_attached(node) {
                doc.free(node);
                freed += 1;
            }
        }
        debug!(freed, "discarded redo history");
    }

    pub fn can_undo(&self) -> bool {
        self.len > 0
    }

    pub fn can_redo(&self) -> bool {
        self.undo_count > 0 && self.len < self.tags.len()
    }

    /// Node swaps performed by the most recent undo or redo, oldest first.
    /// Each pair is `(outgoing, incoming)`: the second node now sits where
    /// the first one was.
    pub fn take_swaps(&mut self) -> Vec<(LineId, LineId)> {
        std::mem::take(&mut self.swaps)
    }

    /// Logical height of the tag stack. Group markers count as tags.
    pub fn depth(&self) -> usize {
        self.len
    }

    /// Revert the most recent operation (or group). Returns its tag.
    pub fn undo(&mut self, doc: &mut Document) -> EdResult<Tag> {
        if self.len == 0 {
            return Err(EdError::NothingToUndo);
        }
        self.swaps.clear();
        self.len -= 1;
        let tag = self.tags[self.len];
        let mut touched = None;
        if tag == Tag::GroupClose {
            while self.len > 0 {
                self.len -= 1;
                let inner = self.tags[self.len];
                if inner == Tag::GroupOpen {
                    break;
                }
                touched = self.invert(inner, doc)?.or(touched);
            }
        } else {
            touched = self.invert(tag, doc)?;
        }
        self.undo_count += 1;
        settle_current(doc, touched);
        debug!(%tag, depth = self.len, "undo");
        Ok(tag)
    }

    /// Re-apply the most recently undone operation (or group).
    pub fn redo(&mut self, doc: &mut Document) -> EdResult<Tag> {
        if !self.can_redo() {
            return Err(EdError::NothingToRedo);
        }
        self.swaps.clear();
        let tag = self.tags[self.len];
        self.len += 1;
        let mut touched = None;
        if tag == Tag::GroupOpen {
            while self.len < self.tags.len() {
                let inner = self.tags[self.len];
                self.len += 1;
                if inner == Tag::GroupClose {
                    break;
                }
                touched = self.replay(inner, doc)?.or(touched);
            }
        } else {
            touched = self.replay(tag, doc)?;
        }
        self.undo_count -= 1;
        settle_current(doc, touched);
        debug!(%tag, depth = self.len, "redo");
        Ok(tag)
    }

    /// Forget all history and free every node only history was keeping.
    pub fn reset(&mut self, doc: &mut Document) {
        let held: HashSet<LineId> = self
            .delete_buf
            .drain()
            .into_iter()
            .chain(self.redo_delete_buf.drain())
            .collect();
        for node in held {
            if doc.contains(node) && !doc.is_attached(node) {
                doc.free(node);
            }
        }
        *self = Self::default();
    }

    fn invert(&mut self, tag: Tag, doc: &mut Document) -> EdResult<Option<LineId>> {
        trace!(%tag, "invert");
        let touched = match tag {
            Tag::Append | Tag::Insert | Tag::Read | Tag::Transfer | Tag::Paste => {
                self.un_append(doc)
            }
            Tag::Delete => self.un_delete(doc),
            Tag::Change => {
                let inserted = self.un_append(doc);
                self.un_delete(doc).or(inserted)
            }
            Tag::Move => Some(self.un_move(doc)?),
            Tag::Join => self.un_join(doc),
            Tag::Substitute => self.un_substitute(doc)?,
            Tag::GroupOpen | Tag::GroupClose => None,
        };
        Ok(touched)
    }

    fn replay(&mut self, tag: Tag, doc: &mut Document) -> EdResult<Option<LineId>> {
        trace!(%tag, "replay");
        let touched = match tag {
            Tag::Append | Tag::Insert | Tag::Read | Tag::Transfer | Tag::Paste => {
                self.re_append(doc)
            }
            Tag::Delete => self.re_delete(doc),
            Tag::Change => {
                let removed = self.re_delete(doc);
                self.re_append(doc).or(removed)
            }
            Tag::Move => Some(self.re_move(doc)?),
            Tag::Join => self.re_join(doc),
            Tag::Substitute => self.re_substitute(doc)?,
            Tag::GroupOpen | Tag::GroupClose => None,
        };
        Ok(touched)
    }

    fn un_append(&mut self, doc: &mut Document) -> Option<LineId> {
        let nodes = self.append_buf.pop_bracket();
        self.redo_delete_buf.push_brake();
        let mut anchor = None;
        for node in nodes {
            doc.detach(node);
            anchor = Some(doc.prev(node));
            self.redo_delete_buf.push(node);
        }
        anchor
    }

    fn re_append(&mut self, doc: &mut Document) -> Option<LineId> {
        let nodes = self.redo_delete_buf.pop_bracket();
        self.append_buf.push_brake();
        let mut last = None;
        for node in nodes {
            doc.reattach(node);
            self.append_buf.push(node);
            last = Some(node);
        }
        last
    }

    fn un_delete(&mut self, doc: &mut Document) -> Option<LineId> {
        let nodes = self.delete_buf.pop_bracket();
        self.redo_append_buf.push_brake();
        let mut last = None;
        for node in nodes {
            doc.reattach(node);
            self.redo_append_buf.push(node);
            last = Some(node);
        }
        last
    }

    fn re_delete(&mut self, doc: &mut Document) -> Option<LineId> {
        let nodes = self.redo_append_buf.pop_bracket();
        self.delete_buf.push_brake();
        let mut after = None;
        for node in nodes {
            doc.detach(node);
            self.delete_buf.push(node);
            after = Some(doc.next(node));
        }
        after
    }

    fn un_move(&mut self, doc: &mut Document) -> EdResult<LineId> {
        let bounds = self
            .append_buf
            .pop_fixed::<6>()
            .ok_or(EdError::CorruptHistory(Tag::Move))?;
        let [from_prev, from, to, to_next, dest, dest_next] = bounds;
        doc.attach(from_prev, from);
        doc.attach(to, to_next);
        doc.attach(dest, dest_next);
        self.redo_append_buf.push_bracket(bounds);
        Ok(to)
    }

    fn re_move(&mut self, doc: &mut Document) -> EdResult<LineId> {
        let bounds = self
            .redo_append_buf
            .pop_fixed::<6>()
            .ok_or(EdError::CorruptHistory(Tag::Move))?;
        let [from_prev, from, to, to_next, dest, dest_next] = bounds;
        doc.attach(from_prev, to_next);
        doc.attach(dest, from);
        doc.attach(to, dest_next);
        self.append_buf.push_bracket(bounds);
        Ok(to)
    }

    fn un_join(&mut self, doc: &mut Document) -> Option<LineId> {
        // Popped newest first: the last node swallowed keeps its newline
        // inside the survivor, every earlier one lost it.
        let swallowed = self.delete_buf.pop_bracket();
        let &newest = swallowed.first()?;
        let survivor = doc.prev(newest);

        let suffix: usize = swallowed
            .iter()
            .enumerate()
            .map(|(i, &node)| {
                let text = doc.text(node);
                if i > 0 && text.last() == Some(&b'\n') {
                    text.len() - 1
                } else {
                    text.len()
                }
            })
            .sum();

        self.redo_append_buf.push_brake();
        for &node in &swallowed {
            doc.reattach(node);
            self.redo_append_buf.push(node);
        }

        let offset = doc.text(survivor).len().saturating_sub(suffix);
        doc.cut(survivor, offset);
        doc.push_terminator(survivor);
        Some(survivor)
    }

    fn re_join(&mut self, doc: &mut Document) -> Option<LineId> {
        let nodes = self.redo_append_buf.pop_bracket();
        let &oldest = nodes.first()?;
        let survivor = doc.prev(oldest);
        self.delete_buf.push_brake();
        for node in nodes {
            doc.join(survivor, node);
            self.delete_buf.push(node);
        }
        Some(survivor)
    }

    fn un_substitute(&mut self, doc: &mut Document) -> EdResult<Option<LineId>> {
        let olds = self.delete_buf.pop_bracket();
        let news = self.append_buf.pop_bracket();
        if olds.len() != news.len() {
            return Err(EdError::CorruptHistory(Tag::Substitute));
        }
        self.redo_append_buf.push_brake();
        self.redo_delete_buf.push_brake();
        for (&old, &new) in olds.iter().zip(&news) {
            doc.replace(new, old);
            self.swaps.push((new, old));
            self.redo_append_buf.push(old);
            self.redo_delete_buf.push(new);
        }
        Ok(olds.first().copied())
    }

    fn re_substitute(&mut self, doc: &mut Document) -> EdResult<Option<LineId>> {
        let olds = self.redo_append_buf.pop_bracket();
        let news = self.redo_delete_buf.pop_bracket();
        if olds.len() != news.len() {
            return Err(EdError::CorruptHistory(Tag::Substitute));
        }
        self.delete_buf.push_brake();
        self.append_buf.push_brake();
        for (&old, &new) in olds.iter().zip(&news) {
            doc.replace(old, new);
            self.swaps.push((old, new));
            self.delete_buf.push(old);
            self.append_buf.push(new);
        }
        Ok(news.last().copied())
    }

    fn buffer(&self, kind: BufferKind) -> &NodeBuffer {
        match kind {
            BufferKind::Append => &self.append_buf,
            BufferKind::Delete => &self.delete_buf,
            BufferKind::RedoAppend => &self.redo_append_buf,
            BufferKind::RedoDelete => &self.redo_delete_buf,
        }
    }

    /// Check the brackets the next undo and the next redo would consume:
    /// nodes the inversion expects to find in the document must be attached,
    /// nodes it expects to put back must be detached.
    ///
    /// Older brackets can legitimately disagree with the live document. A
    /// line appended and later deleted sits in both `append_buf` and
    /// `delete_buf`; the delete is undone first, so by the time the append's
    /// bracket is read the line is attached again.
    pub fn check_invariants(&self, doc: &Document) -> Result<(), InvariantViolation> {
        let attached = doc.attached_set();
        let undo_tag = self.tags[..self.len]
            .iter()
            .rev()
            .find(|tag| !tag.is_group_marker());
        if let Some(tag) = undo_tag {
            self.check_reads(tag.undo_reads(), &attached)?;
        }
        if self.can_redo() {
            let redo_tag = self.tags[self.len..]
                .iter()
                .find(|tag| !tag.is_group_marker());
            if let Some(tag) = redo_tag {
                self.check_reads(tag.redo_reads(), &attached)?;
            }
        }
        Ok(())
    }

    /// Check every reference in every buffer. Holds as long as no line has
    /// been recorded by two operations that are both still undoable.
    pub fn check_all(&self, doc: &Document) -> Result<(), InvariantViolation> {
        let attached = doc.attached_set();
        let all = [
            (BufferKind::Append, true),
            (BufferKind::RedoAppend, true),
            (BufferKind::Delete, false),
            (BufferKind::RedoDelete, false),
        ];
        for (kind, expect) in all {
            for node in self.buffer(kind).nodes() {
                check_node(kind, node, expect, &attached)?;
            }
        }
        Ok(())
    }

    fn check_reads(
        &self,
        reads: &[(BufferKind, bool)],
        attached: &HashSet<LineId>,
    ) -> Result<(), InvariantViolation> {
        for &(kind, expect) in reads {
            for node in self.buffer(kind).top_bracket() {
                check_node(kind, node, expect, attached)?;
            }
        }
        Ok(())
    }
}

fn attachment(attached: &bool) -> &'static str {
    if *attached { "attached" } else { "detached" }
}

fn check_node(
    buffer: BufferKind,
    node: LineId,
    expect_attached: bool,
    attached: &HashSet<LineId>,
) -> Result<(), InvariantViolation> {
    let is_attached = attached.contains(&node);
    if is_attached == expect_attached {
        Ok(())
    } else {
        Err(InvariantViolation {
            buffer,
            node,
            attached: is_attached,
        })
    }
}

/// Point `current` at the line an undo/redo touched, falling back to the
/// last line when nothing useful was touched. A touched `head` lands on the
/// first line unless the document is empty.
fn settle_current(doc: &mut Document, touched: Option<LineId>) {
    let candidate = match touched {
        Some(id) if id == doc.tail() => doc.last(),
        Some(id) if doc.is_attached(id) => id,
        _ if doc.is_attached(doc.current()) => doc.current(),
        _ => doc.last(),
    };
    doc.set_current(candidate);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(lines: &[&str]) -> (Document, Vec<LineId>) {
        let mut doc = Document::new();
        let mut anchor = doc.head();
        let mut ids = Vec::new();
        for line in lines {
            anchor = doc.insert_after(anchor, line.as_bytes().to_vec());
            ids.push(anchor);
        }
        (doc, ids)
    }

    fn bytes(lines: &[&str]) -> Vec<Vec<u8>> {
        lines.iter().map(|line| line.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_tag_chars_round_trip() {
        for c in "airtxdcmjsgG".chars() {
            assert_eq!(Tag::from_char(c).map(Tag::as_char), Some(c));
        }
        assert_eq!(Tag::from_char('z'), None);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let (mut doc, _) = doc_with(&["a\n"]);
        let mut undo = UndoEngine::new();
        assert!(matches!(undo.undo(&mut doc), Err(EdError::NothingToUndo)));
        assert!(matches!(undo.redo(&mut doc), Err(EdError::NothingToRedo)));
        assert_eq!(doc.contents(), bytes(&["a\n"]));
    }

    #[test]
    fn test_undo_redo_append() {
        let (mut doc, ids) = doc_with(&["a\n", "d\n"]);
        let mut undo = UndoEngine::new();

        let b = doc.insert_after(ids[0], b"b\n".to_vec());
        let c = doc.insert_after(b, b"c\n".to_vec());
        undo.record_append(&[b, c]);
        undo.push_tag(Tag::Append, &mut doc);
        assert_eq!(doc.contents(), bytes(&["a\n", "b\n", "c\n", "d\n"]));

        assert_eq!(undo.undo(&mut doc).unwrap(), Tag::Append);
        assert_eq!(doc.contents(), bytes(&["a\n", "d\n"]));
        assert_eq!(doc.current(), ids[0]);
        undo.check_invariants(&doc).unwrap();

        assert_eq!(undo.redo(&mut doc).unwrap(), Tag::Append);
        assert_eq!(doc.contents(), bytes(&["a\n", "b\n", "c\n", "d\n"]));
        assert_eq!(doc.current(), c);
        undo.check_all(&doc).unwrap();
    }

    #[test]
    fn test_undo_redo_delete() {
        let (mut doc, ids) = doc_with(&["1\n", "2\n", "3\n", "4\n", "5\n"]);
        let mut undo = UndoEngine::new();

        for &id in &ids[1..4] {
            doc.detach(id);
        }
        undo.record_delete(&ids[1..4]);
        undo.push_tag(Tag::Delete, &mut doc);
        assert_eq!(doc.contents(), bytes(&["1\n", "5\n"]));

        undo.undo(&mut doc).unwrap();
        assert_eq!(doc.contents(), bytes(&["1\n", "2\n", "3\n", "4\n", "5\n"]));
        undo.check_invariants(&doc).unwrap();

        undo.redo(&mut doc).unwrap();
        assert_eq!(doc.contents(), bytes(&["1\n", "5\n"]));
        assert_eq!(doc.current(), ids[4]);
        undo.check_all(&doc).unwrap();
    }

    #[test]
    fn test_new_edit_invalidates_redo() {
        let (mut doc, ids) = doc_with(&["a\n", "b\n"]);
        let mut undo = UndoEngine::new();

        doc.detach(ids[0]);
        undo.record_delete(&[ids[0]]);
        undo.push_tag(Tag::Delete, &mut doc);
        undo.undo(&mut doc).unwrap();

        let c = doc.insert_after(ids[1], b"c\n".to_vec());
        undo.record_append(&[c]);
        undo.push_tag(Tag::Append, &mut doc);

        assert!(matches!(undo.redo(&mut doc), Err(EdError::NothingToRedo)));
        assert_eq!(doc.contents(), bytes(&["a\n", "b\n", "c\n"]));
    }

    #[test]
    fn test_discarded_redo_frees_nodes() {
        let (mut doc, ids) = doc_with(&["a\n"]);
        let mut undo = UndoEngine::new();

        let b = doc.insert_after(ids[0], b"b\n".to_vec());
        undo.record_append(&[b]);
        undo.push_tag(Tag::Append, &mut doc);
        undo.undo(&mut doc).unwrap();
        assert!(doc.contains(b));

        let c = doc.insert_after(ids[0], b"c\n".to_vec());
        undo.record_append(&[c]);
        undo.push_tag(Tag::Append, &mut doc);
        assert!(!doc.contains(b));
    }

    #[test]
    fn test_join_undo_restores_terminators() {
        let (mut doc, ids) = doc_with(&["ab\n", "cd\n", "ef\n", "gh\n"]);
        let mut undo = UndoEngine::new();

        doc.join(ids[0], ids[1]);
        doc.join(ids[0], ids[2]);
        undo.record_delete(&[ids[1], ids[2]]);
        undo.push_tag(Tag::Join, &mut doc);
        assert_eq!(doc.contents(), bytes(&["abcdef\n", "gh\n"]));

        undo.undo(&mut doc).unwrap();
        assert_eq!(doc.contents(), bytes(&["ab\n", "cd\n", "ef\n", "gh\n"]));
        undo.check_invariants(&doc).unwrap();

        undo.redo(&mut doc).unwrap();
        assert_eq!(doc.contents(), bytes(&["abcdef\n", "gh\n"]));
        assert_eq!(doc.current(), ids[0]);
    }

    #[test]
    fn test_move_round_trip() {
        let (mut doc, ids) = doc_with(&["1\n", "2\n", "3\n", "4\n", "5\n", "6\n"]);
        let mut undo = UndoEngine::new();

        // Lines 2..3 after line 5.
        let bounds = [ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]];
        doc.attach(ids[0], ids[3]);
        doc.attach(ids[4], ids[1]);
        doc.attach(ids[2], ids[5]);
        undo.record_move(bounds);
        undo.push_tag(Tag::Move, &mut doc);
        let moved = bytes(&["1\n", "4\n", "5\n", "2\n", "3\n", "6\n"]);
        assert_eq!(doc.contents(), moved);

        undo.undo(&mut doc).unwrap();
        assert_eq!(doc.contents(), bytes(&["1\n", "2\n", "3\n", "4\n", "5\n", "6\n"]));
        undo.redo(&mut doc).unwrap();
        assert_eq!(doc.contents(), moved);
    }

    #[test]
    fn test_group_is_one_step() {
        let (mut doc, ids) = doc_with(&["x\n", "y\n", "x\n", "x\n"]);
        let mut undo = UndoEngine::new();

        undo.begin_group();
        for &id in [ids[0], ids[2], ids[3]].iter() {
            doc.detach(id);
            undo.record_delete(&[id]);
            undo.push_tag(Tag::Delete, &mut doc);
        }
        undo.end_group(&mut doc);
        assert_eq!(doc.contents(), bytes(&["y\n"]));
        assert_eq!(undo.depth(), 5);

        assert_eq!(undo.undo(&mut doc).unwrap(), Tag::GroupClose);
        assert_eq!(doc.contents(), bytes(&["x\n", "y\n", "x\n", "x\n"]));
        assert!(!undo.can_undo());

        assert_eq!(undo.redo(&mut doc).unwrap(), Tag::GroupOpen);
        assert_eq!(doc.contents(), bytes(&["y\n"]));
        assert!(!undo.can_redo());
    }

    #[test]
    fn test_empty_group_leaves_no_trace() {
        let (mut doc, _) = doc_with(&["a\n"]);
        let mut undo = UndoEngine::new();
        undo.begin_group();
        undo.end_group(&mut doc);
        assert_eq!(undo.depth(), 0);
        assert!(!undo.in_group());
    }

    #[test]
    fn test_reset_frees_detached_history() {
        let (mut doc, ids) = doc_with(&["a\n", "b\n"]);
        let mut undo = UndoEngine::new();
        doc.detach(ids[0]);
        undo.record_delete(&[ids[0]]);
        undo.push_tag(Tag::Delete, &mut doc);

        undo.reset(&mut doc);
        assert!(!doc.contains(ids[0]));
        assert!(doc.contains(ids[1]));
        assert!(!undo.can_undo());
    }

    #[test]
    fn test_undo_append_at_top_lands_on_first_line() {
        let (mut doc, ids) = doc_with(&["b\n"]);
        let mut undo = UndoEngine::new();

        let x = doc.insert_after(doc.head(), b"x\n".to_vec());
        undo.record_append(&[x]);
        undo.push_tag(Tag::Append, &mut doc);

        undo.undo(&mut doc).unwrap();
        assert_eq!(doc.contents(), bytes(&["b\n"]));
        assert_eq!(doc.current(), ids[0]);
    }

    #[test]
    fn test_substitute_reports_swaps() {
        let (mut doc, ids) = doc_with(&["a\n", "b\n"]);
        let mut undo = UndoEngine::new();

        let new = doc.make_node(doc.head(), ids[1], b"A\n".to_vec());
        doc.replace(ids[0], new);
        undo.record_substitute(&[(ids[0], new)]);
        undo.push_tag(Tag::Substitute, &mut doc);
        assert!(undo.take_swaps().is_empty());

        undo.undo(&mut doc).unwrap();
        assert_eq!(undo.take_swaps(), vec![(new, ids[0])]);
        assert!(undo.take_swaps().is_empty());

        undo.redo(&mut doc).unwrap();
        assert_eq!(undo.take_swaps(), vec![(ids[0], new)]);
        assert_eq!(doc.contents(), bytes(&["A\n", "b\n"]));
        undo.check_all(&doc).unwrap();
    }
}
