//! Editing operations over the document.
//!
//! Every operation here validates first and mutates second. Once a method
//! starts relinking nodes it cannot fail, so a recorded undo step always
//! describes a complete change.

use crate::address::{self, Address};
use crate::document_model::{
    AttachedMarks, CutBuffer, Document, InvariantViolation, LineId, MarkTable, Tag, UndoEngine,
    terminated,
};
use crate::error::{EdError, EdResult};
use crate::search::{self, SearchState, Substitution};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Editor {
    document: Document,
    history: UndoEngine,
    marks: MarkTable,
    cut: CutBuffer,
    search: SearchState,
    modified: bool,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &UndoEngine {
        &self.history
    }

    pub fn marks(&self) -> &MarkTable {
        &self.marks
    }

    pub fn search_mut(&mut self) -> &mut SearchState {
        &mut self.search
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn current(&self) -> LineId {
        self.document.current()
    }

    pub fn set_current(&mut self, line: LineId) {
        if line != self.document.tail() {
            self.document.set_current(line);
        }
    }

    /// Resolve the address prefix of a command line against the document,
    /// the mark table and the remembered search pattern.
    pub fn resolve<'a>(&mut self, input: &'a str) -> EdResult<(Address, &'a str)> {
        let marks = AttachedMarks {
            marks: &self.marks,
            doc: &self.document,
        };
        address::resolve(input, &self.document, &marks, &mut self.search)
    }

    /// Lines `from..=to`, refusing a range that starts at line 0.
    pub fn lines(&self, from: LineId, to: LineId) -> EdResult<Vec<LineId>> {
        self.require_line(from)?;
        self.require_line(to)?;
        Ok(self.document.range(from, to))
    }

    pub fn require_line(&self, line: LineId) -> EdResult<()> {
        if self.document.is_sentinel(line) || !self.document.is_attached(line) {
            Err(EdError::InvalidAddress)
        } else {
            Ok(())
        }
    }

    pub fn texts(&self, from: LineId, to: LineId) -> EdResult<Vec<Vec<u8>>> {
        Ok(self
            .lines(from, to)?
            .into_iter()
            .map(|id| self.document.text(id).to_vec())
            .collect())
    }

    fn record(&mut self, tag: Tag) {
        self.history.push_tag(tag, &mut self.document);
        self.modified = true;
        debug!(%tag, "edit");
    }

    /// Link `lines` in after `anchor` as one recorded step. Returns the
    /// number of lines added.
    fn attach_block(&mut self, anchor: LineId, lines: Vec<Vec<u8>>, tag: Tag) -> usize {
        if lines.is_empty() {
            self.set_current(anchor);
            return 0;
        }
        let mut after = anchor;
        let mut added = Vec::with_capacity(lines.len());
        for text in lines {
            after = self.document.insert_after(after, terminated(text));
            added.push(after);
        }
        self.history.record_append(&added);
        self.record(tag);
        self.document.set_current(after);
        added.len()
    }

    /// `a`: add lines after `after` (which may be line 0).
    pub fn append(&mut self, after: LineId, lines: Vec<Vec<u8>>) -> usize {
        self.attach_block(after, lines, Tag::Append)
    }

    /// `i`: add lines before `before`. Line 0 behaves like line 1.
    pub fn insert(&mut self, before: LineId, lines: Vec<Vec<u8>>) -> usize {
        let anchor = if before == self.document.head() {
            before
        } else {
            self.document.prev(before)
        };
        self.attach_block(anchor, lines, Tag::Insert)
    }

    /// `r`: add lines read from a file or command.
    pub fn read_in(&mut self, after: LineId, lines: Vec<Vec<u8>>) -> usize {
        self.attach_block(after, lines, Tag::Read)
    }

    /// `d`
    pub fn delete(&mut self, from: LineId, to: LineId) -> EdResult<()> {
        let doomed = self.lines(from, to)?;
        let before = self.document.prev(from);
        let after = self.document.next(to);
        for &line in &doomed {
            self.document.detach(line);
        }
        self.history.record_delete(&doomed);
        self.record(Tag::Delete);
        self.settle_after_removal(before, after);
        Ok(())
    }

    /// `c`: replace `from..=to` with `lines`, as a single step.
    pub fn change(&mut self, from: LineId, to: LineId, lines: Vec<Vec<u8>>) -> EdResult<usize> {
        let doomed = self.lines(from, to)?;
        let before = self.document.prev(from);
        let after = self.document.next(to);
        for &line in &doomed {
            self.document.detach(line);
        }

        let mut anchor = before;
        let mut added = Vec::with_capacity(lines.len());
        for text in lines {
            anchor = self.document.insert_after(anchor, terminated(text));
            added.push(anchor);
        }

        self.history.record_delete(&doomed);
        self.history.record_append(&added);
        self.record(Tag::Change);
        match added.last() {
            Some(&last) => self.document.set_current(last),
            None => self.settle_after_removal(before, after),
        }
        Ok(added.len())
    }

    fn settle_after_removal(&mut self, before: LineId, after: LineId) {
        let current = if after != self.document.tail() {
            after
        } else {
            before
        };
        self.document.set_current(current);
    }

    /// `m`: relink `from..=to` after `dest`. Moving a range to where it
    /// already is records nothing.
    pub fn move_lines(&mut self, from: LineId, to: LineId, dest: LineId) -> EdResult<()> {
        self.lines(from, to)?;
        let doc = &self.document;
        let dest_index = doc.ordinal(dest).ok_or(EdError::InvalidDestination)?;
        let from_index = doc.ordinal(from).ok_or(EdError::InvalidAddress)?;
        let to_index = doc.ordinal(to).ok_or(EdError::InvalidAddress)?;
        if (from_index..=to_index).contains(&dest_index) {
            return Err(EdError::InvalidDestination);
        }

        let from_prev = doc.prev(from);
        let to_next = doc.next(to);
        let dest_next = doc.next(dest);
        if dest == from_prev {
            self.document.set_current(to);
            return Ok(());
        }

        self.document.attach(from_prev, to_next);
        self.document.attach(dest, from);
        self.document.attach(to, dest_next);

        self.history
            .record_move([from_prev, from, to, to_next, dest, dest_next]);
        self.record(Tag::Move);
        self.document.set_current(to);
        Ok(())
    }

    /// `t`: copy `from..=to` after `dest`. The destination may lie inside
    /// the range.
    pub fn transfer(&mut self, from: LineId, to: LineId, dest: LineId) -> EdResult<usize> {
        let copies = self.texts(from, to)?;
        if self.document.ordinal(dest).is_none() {
            return Err(EdError::InvalidDestination);
        }
        Ok(self.attach_block(dest, copies, Tag::Transfer))
    }

    /// `j`: fold `from..=to` into `from`. A single line is left alone.
    pub fn join(&mut self, from: LineId, to: LineId) -> EdResult<()> {
        let lines = self.lines(from, to)?;
        if lines.len() < 2 {
            self.document.set_current(from);
            return Ok(());
        }
        let swallowed = &lines[1..];
        for &line in swallowed {
            self.document.join(from, line);
        }
        self.history.record_delete(swallowed);
        self.record(Tag::Join);
        self.document.set_current(from);
        Ok(())
    }

    /// `s`: rewrite every line in range that the pattern touches. Each
    /// rewritten line becomes a new node; the old one stays detached for
    /// undo, and marks move over to the new node. Fails with
    /// [`EdError::NoMatch`] if no line changed.
    pub fn substitute(&mut self, from: LineId, to: LineId, sub: &Substitution) -> EdResult<usize> {
        let lines = self.lines(from, to)?;
        let regex = self.search.compile(&sub.pattern)?;

        let rewrites: Vec<(LineId, Vec<u8>)> = lines
            .into_iter()
            .filter_map(|id| {
                search::substitute_line(&regex, self.document.text(id), sub)
                    .map(|text| (id, text))
            })
            .collect();
        if rewrites.is_empty() {
            return Err(EdError::NoMatch);
        }

        let mut pairs = Vec::with_capacity(rewrites.len());
        for (old, text) in rewrites {
            let new = self.document.make_node(
                self.document.prev(old),
                self.document.next(old),
                text,
            );
            self.document.replace(old, new);
            self.marks.retarget(old, new);
            pairs.push((old, new));
        }
        self.history.record_substitute(&pairs);
        self.record(Tag::Substitute);
        if let Some(&(_, last)) = pairs.last() {
            self.document.set_current(last);
        }
        Ok(pairs.len())
    }

    /// `y`
    pub fn yank(&mut self, from: LineId, to: LineId) -> EdResult<usize> {
        let texts = self.texts(from, to)?;
        let n = texts.len();
        self.cut.store(texts);
        Ok(n)
    }

    /// `x`: put a copy of the cut buffer after `after`.
    pub fn paste(&mut self, after: LineId) -> EdResult<usize> {
        if self.cut.is_empty() {
            return Err(EdError::EmptyCutBuffer);
        }
        let lines = self.cut.lines().to_vec();
        Ok(self.attach_block(after, lines, Tag::Paste))
    }

    /// `k`
    pub fn mark(&mut self, name: char, line: LineId) -> EdResult<()> {
        self.require_line(line)?;
        self.marks.set(name, line)
    }

    /// Lines in `from..=to` that match (or, with `invert`, do not match)
    /// `pattern`. Handles are taken up front so later edits cannot shift
    /// which lines a global command visits.
    pub fn select(
        &mut self,
        from: LineId,
        to: LineId,
        pattern: &str,
        invert: bool,
    ) -> EdResult<Vec<LineId>> {
        let lines = self.lines(from, to)?;
        let regex = self.search.compile(pattern)?;
        Ok(lines
            .into_iter()
            .filter(|&id| regex.is_match(search::body(self.document.text(id))) != invert)
            .collect())
    }

    /// Whether a line picked by [`select`](Editor::select) is still in the
    /// document.
    pub fn is_live(&self, line: LineId) -> bool {
        self.document.is_attached(line)
    }

    pub fn begin_global(&mut self) -> EdResult<()> {
        if self.history.in_group() {
            return Err(EdError::NestedGlobal);
        }
        self.history.begin_group();
        Ok(())
    }

    pub fn end_global(&mut self) {
        self.history.end_group(&mut self.document);
    }

    pub fn in_global(&self) -> bool {
        self.history.in_group()
    }

    /// `u`
    pub fn undo(&mut self) -> EdResult<Tag> {
        let tag = self.history.undo(&mut self.document)?;
        self.follow_swaps();
        self.modified = true;
        Ok(tag)
    }

    /// `U`
    pub fn redo(&mut self) -> EdResult<Tag> {
        let tag = self.history.redo(&mut self.document)?;
        self.follow_swaps();
        self.modified = true;
        Ok(tag)
    }

    /// Keep marks on the node that now holds their line after an undone or
    /// redone substitution.
    fn follow_swaps(&mut self) {
        for (outgoing, incoming) in self.history.take_swaps() {
            self.marks.retarget(outgoing, incoming);
        }
    }

    /// Replace the whole document with `lines` and forget all history and
    /// marks. The cut buffer survives.
    pub fn load(&mut self, lines: Vec<Vec<u8>>) {
        self.history.reset(&mut self.document);
        self.document.clear();
        self.marks.clear_all();
        let mut anchor = self.document.head();
        for text in lines {
            anchor = self.document.insert_after(anchor, terminated(text));
        }
        self.document.set_current(anchor);
        self.modified = false;
        debug!(lines = self.document.len(), "loaded");
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.history.check_invariants(&self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(lines: &[&str]) -> Editor {
        let mut editor = Editor::new();
        editor.load(strings(lines));
        editor
    }

    fn at(editor: &Editor, n: usize) -> LineId {
        editor.document().at(n).unwrap()
    }

    fn contents(editor: &Editor) -> Vec<Vec<u8>> {
        editor.document().contents()
    }

    fn strings(lines: &[&str]) -> Vec<Vec<u8>> {
        lines.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    fn sub(editor: &mut Editor, args: &str) -> Substitution {
        editor.search_mut().parse_substitute(args).unwrap()
    }

    #[test]
    fn test_round_trip_many_operations() {
        let original = ["one\n", "two\n", "three\n", "four\n", "five\n"];
        let mut editor = editor_with(&original);

        editor.append(at(&editor, 2), strings(&["new\n"]));
        editor.delete(at(&editor, 4), at(&editor, 5)).unwrap();
        editor.move_lines(at(&editor, 1), at(&editor, 1), at(&editor, 3)).unwrap();
        editor.join(at(&editor, 2), at(&editor, 3)).unwrap();
        let s = sub(&mut editor, "/o/0/g");
        editor.substitute(at(&editor, 1), at(&editor, 3), &s).unwrap();
        editor.transfer(at(&editor, 1), at(&editor, 2), at(&editor, 0)).unwrap();
        editor.change(at(&editor, 2), at(&editor, 2), strings(&["x\n", "y\n"])).unwrap();
        editor.insert(at(&editor, 1), strings(&["top\n"]));
        editor.check_invariants().unwrap();

        for _ in 0..8 {
            editor.undo().unwrap();
            editor.check_invariants().unwrap();
        }
        assert_eq!(contents(&editor), strings(&original));
        assert!(matches!(editor.undo(), Err(EdError::NothingToUndo)));
    }

    #[test]
    fn test_redo_reproduces_state() {
        let mut editor = editor_with(&["a\n", "b\n", "c\n", "d\n"]);

        editor.change(at(&editor, 2), at(&editor, 3), strings(&["X\n"])).unwrap();
        let after = contents(&editor);

        editor.undo().unwrap();
        assert_eq!(contents(&editor), strings(&["a\n", "b\n", "c\n", "d\n"]));
        editor.check_invariants().unwrap();

        editor.redo().unwrap();
        assert_eq!(contents(&editor), after);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn test_redo_invalidation() {
        let mut editor = editor_with(&["a\n", "b\n"]);

        editor.append(at(&editor, 2), strings(&["first\n"]));
        editor.undo().unwrap();
        editor.append(at(&editor, 1), strings(&["second\n"]));

        assert!(matches!(editor.redo(), Err(EdError::NothingToRedo)));
        assert_eq!(contents(&editor), strings(&["a\n", "second\n", "b\n"]));
    }

    #[test]
    fn test_stale_redo_nodes_are_freed() {
        let mut editor = editor_with(&["a\n"]);
        let baseline = editor.document().allocated();

        editor.append(at(&editor, 1), strings(&["b\n", "c\n"]));
        editor.undo().unwrap();
        editor.delete(at(&editor, 1), at(&editor, 1)).unwrap();

        // "a" stays alive for undo; "b" and "c" are gone
        assert_eq!(editor.document().allocated(), baseline);
    }

    #[test]
    fn test_join_undo_restores_terminators() {
        let mut editor = editor_with(&["ab\n", "cd\n"]);

        editor.join(at(&editor, 1), at(&editor, 2)).unwrap();
        assert_eq!(contents(&editor), strings(&["abcd\n"]));

        editor.undo().unwrap();
        assert_eq!(contents(&editor), strings(&["ab\n", "cd\n"]));
        editor.check_invariants().unwrap();

        editor.redo().unwrap();
        assert_eq!(contents(&editor), strings(&["abcd\n"]));
    }

    #[test]
    fn test_join_three_lines() {
        let mut editor = editor_with(&["a\n", "b\n", "c\n", "d\n"]);
        editor.join(at(&editor, 1), at(&editor, 3)).unwrap();
        assert_eq!(contents(&editor), strings(&["abc\n", "d\n"]));
        editor.undo().unwrap();
        assert_eq!(contents(&editor), strings(&["a\n", "b\n", "c\n", "d\n"]));
    }

    #[test]
    fn test_join_single_line_is_noop() {
        let mut editor = editor_with(&["a\n", "b\n"]);
        editor.join(at(&editor, 1), at(&editor, 1)).unwrap();
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_global_is_one_undo_step() {
        let mut editor = editor_with(&["x1\n", "y\n", "x2\n", "x3\n"]);
        let original = contents(&editor);

        let (first, last) = (at(&editor, 1), at(&editor, 4));
        let targets = editor.select(first, last, "^x", false).unwrap();
        assert_eq!(targets.len(), 3);

        editor.begin_global().unwrap();
        let s = sub(&mut editor, "/x/z/");
        for line in targets {
            editor.substitute(line, line, &s).unwrap();
        }
        editor.end_global();
        let edited = contents(&editor);
        assert_eq!(edited, strings(&["z1\n", "y\n", "z2\n", "z3\n"]));

        editor.undo().unwrap();
        assert_eq!(contents(&editor), original);
        assert!(!editor.history().can_undo());

        editor.redo().unwrap();
        assert_eq!(contents(&editor), edited);
    }

    #[test]
    fn test_nested_global_rejected() {
        let mut editor = editor_with(&["a\n"]);
        editor.begin_global().unwrap();
        assert!(matches!(editor.begin_global(), Err(EdError::NestedGlobal)));
        editor.end_global();
        assert!(!editor.in_global());
    }

    #[test]
    fn test_move_round_trip() {
        let original = ["1\n", "2\n", "3\n", "4\n", "5\n", "6\n"];
        let mut editor = editor_with(&original);

        editor
            .move_lines(at(&editor, 2), at(&editor, 3), at(&editor, 5))
            .unwrap();
        let moved = strings(&["1\n", "4\n", "5\n", "2\n", "3\n", "6\n"]);
        assert_eq!(contents(&editor), moved);
        assert_eq!(editor.document().index_of(editor.current()), Some(5));

        editor.undo().unwrap();
        assert_eq!(contents(&editor), strings(&original));

        editor.redo().unwrap();
        assert_eq!(contents(&editor), moved);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn test_move_backwards_and_to_top() {
        let mut editor = editor_with(&["1\n", "2\n", "3\n", "4\n"]);
        editor
            .move_lines(at(&editor, 3), at(&editor, 4), at(&editor, 0))
            .unwrap();
        assert_eq!(contents(&editor), strings(&["3\n", "4\n", "1\n", "2\n"]));
        editor.undo().unwrap();
        assert_eq!(contents(&editor), strings(&["1\n", "2\n", "3\n", "4\n"]));
    }

    #[test]
    fn test_move_into_itself() {
        let mut editor = editor_with(&["1\n", "2\n", "3\n", "4\n"]);
        let result = editor.move_lines(at(&editor, 1), at(&editor, 3), at(&editor, 2));
        assert!(matches!(result, Err(EdError::InvalidDestination)));

        // already in place
        editor
            .move_lines(at(&editor, 2), at(&editor, 3), at(&editor, 1))
            .unwrap();
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_transfer_into_own_range() {
        let mut editor = editor_with(&["a\n", "b\n", "c\n"]);
        editor
            .transfer(at(&editor, 1), at(&editor, 2), at(&editor, 1))
            .unwrap();
        assert_eq!(contents(&editor), strings(&["a\n", "a\n", "b\n", "b\n", "c\n"]));
        editor.undo().unwrap();
        assert_eq!(contents(&editor), strings(&["a\n", "b\n", "c\n"]));
    }

    #[test]
    fn test_delete_rejects_line_zero() {
        let mut editor = editor_with(&["a\n"]);
        let result = editor.delete(at(&editor, 0), at(&editor, 1));
        assert!(matches!(result, Err(EdError::InvalidAddress)));
        assert_eq!(contents(&editor), strings(&["a\n"]));
    }

    #[test]
    fn test_delete_sets_current() {
        let mut editor = editor_with(&["a\n", "b\n", "c\n"]);
        editor.delete(at(&editor, 2), at(&editor, 2)).unwrap();
        assert_eq!(editor.document().text(editor.current()), b"c\n");
        editor.delete(at(&editor, 2), at(&editor, 2)).unwrap();
        assert_eq!(editor.document().text(editor.current()), b"a\n");
        editor.delete(at(&editor, 1), at(&editor, 1)).unwrap();
        assert_eq!(editor.current(), editor.document().head());
    }

    #[test]
    fn test_substitute_no_match_records_nothing() {
        let mut editor = editor_with(&["abc\n"]);
        let s = sub(&mut editor, "/z/y/");
        let result = editor.substitute(at(&editor, 1), at(&editor, 1), &s);
        assert!(matches!(result, Err(EdError::NoMatch)));
        assert!(!editor.history().can_undo());
        assert!(!editor.is_modified());
    }

    #[test]
    fn test_substitute_undo_relinks_original() {
        let mut editor = editor_with(&["a1\n", "a2\n", "b\n", "a3\n"]);
        let original_second = at(&editor, 2);
        let s = sub(&mut editor, "/a/A/");
        let n = editor.substitute(at(&editor, 1), at(&editor, 4), &s).unwrap();
        assert_eq!(n, 3);
        assert_eq!(contents(&editor), strings(&["A1\n", "A2\n", "b\n", "A3\n"]));

        editor.undo().unwrap();
        assert_eq!(contents(&editor), strings(&["a1\n", "a2\n", "b\n", "a3\n"]));
        assert_eq!(at(&editor, 2), original_second);
        editor.check_invariants().unwrap();

        editor.redo().unwrap();
        assert_eq!(contents(&editor), strings(&["A1\n", "A2\n", "b\n", "A3\n"]));
        editor.check_invariants().unwrap();
    }

    #[test]
    fn test_yank_and_paste() {
        let mut editor = editor_with(&["a\n", "b\n"]);
        assert!(matches!(editor.paste(at(&editor, 1)), Err(EdError::EmptyCutBuffer)));

        editor.yank(at(&editor, 1), at(&editor, 2)).unwrap();
        editor.paste(at(&editor, 2)).unwrap();
        assert_eq!(contents(&editor), strings(&["a\n", "b\n", "a\n", "b\n"]));

        editor.undo().unwrap();
        assert_eq!(contents(&editor), strings(&["a\n", "b\n"]));
    }

    #[test]
    fn test_marks_follow_undo() {
        let mut editor = editor_with(&["a\n", "b\n", "c\n"]);
        editor.mark('m', at(&editor, 2)).unwrap();
        editor.delete(at(&editor, 2), at(&editor, 2)).unwrap();
        assert!(matches!(editor.resolve("'m"), Err(EdError::UnsetMark('m'))));

        editor.undo().unwrap();
        let (addr, _) = editor.resolve("'m").unwrap();
        assert_eq!(editor.document().index_of(addr.from), Some(2));
    }

    #[test]
    fn test_load_resets_history() {
        let mut editor = editor_with(&["a\n"]);
        editor.append(at(&editor, 1), strings(&["b\n"]));
        editor.mark('a', at(&editor, 1)).unwrap();
        assert!(editor.is_modified());

        editor.load(strings(&["fresh"]));
        assert_eq!(contents(&editor), strings(&["fresh\n"]));
        assert!(!editor.is_modified());
        assert!(!editor.history().can_undo());
        assert!(editor.marks().get('a').is_none());
        // head, tail and the one line
        assert_eq!(editor.document().allocated(), 3);
    }

    #[test]
    fn test_append_empty_input_records_nothing() {
        let mut editor = editor_with(&["a\n"]);
        assert_eq!(editor.append(at(&editor, 1), Vec::new()), 0);
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_marks_survive_substitute() {
        let mut editor = editor_with(&["a\n", "b\n"]);
        editor.mark('m', at(&editor, 1)).unwrap();
        let s = sub(&mut editor, "/a/A/");
        editor.substitute(at(&editor, 1), at(&editor, 1), &s).unwrap();

        let (addr, _) = editor.resolve("'m").unwrap();
        assert_eq!(editor.document().text(addr.from), b"A\n");

        editor.undo().unwrap();
        let (addr, _) = editor.resolve("'m").unwrap();
        assert_eq!(editor.document().text(addr.from), b"a\n");

        editor.redo().unwrap();
        let (addr, _) = editor.resolve("'m").unwrap();
        assert_eq!(editor.document().text(addr.from), b"A\n");
    }

    #[test]
    fn test_current_never_rests_on_head() {
        let mut editor = editor_with(&["b\n"]);
        let head = editor.document().head();

        editor.append(head, Vec::new());
        assert_eq!(editor.current(), at(&editor, 1));

        editor.append(head, strings(&["x\n"]));
        editor.undo().unwrap();
        assert_eq!(editor.current(), at(&editor, 1));

        editor.insert(at(&editor, 1), strings(&["y\n"]));
        editor.undo().unwrap();
        assert_eq!(editor.current(), at(&editor, 1));
        assert_eq!(contents(&editor), strings(&["b\n"]));
    }

    #[test]
    fn test_global_liveness_on_large_document() {
        let lines: Vec<Vec<u8>> = (0..20_000).map(|i| format!("x{i}\n").into_bytes()).collect();
        let mut editor = Editor::new();
        editor.load(lines);
        let (first, last) = (at(&editor, 1), at(&editor, 20_000));
        let targets = editor.select(first, last, "^x", false).unwrap();

        editor.begin_global().unwrap();
        let s = sub(&mut editor, "/x/y/");
        for line in targets {
            if editor.is_live(line) {
                editor.set_current(line);
                editor.substitute(line, line, &s).unwrap();
                assert!(!editor.is_live(line));
            }
        }
        editor.end_global();
        assert!(contents(&editor).iter().all(|line| line.starts_with(b"y")));

        editor.undo().unwrap();
        assert!(contents(&editor).iter().all(|line| line.starts_with(b"x")));
    }
}
