use slotmap::{SlotMap, new_key_type};
use std::collections::HashSet;

new_key_type! {
    /// Stable handle to a line node. Survives detach/reattach; goes stale once
    /// the node is freed.
    pub struct LineId;
}

/// Line text is kept as raw bytes. Nothing here assumes it is UTF-8.
#[derive(Debug, Clone)]
struct Line {
    text: Vec<u8>,
    prev: LineId,
    next: LineId,
    /// Reachable from `head`. Kept up to date by every primitive that moves
    /// a node into or out of the chain.
    attached: bool,
}

/// Doubly-linked sequence of lines bounded by two sentinel nodes.
///
/// Nodes live in an arena, so a detached node keeps its slot (and its links
/// to its former neighbours) until someone explicitly frees it. The store
/// itself never decides when text is gone for good; that is the caller's
/// business.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: SlotMap<LineId, Line>,
    head: LineId,
    tail: LineId,
    current: LineId,
}

/// Give `text` a trailing newline if it lacks one.
pub fn terminated(mut text: Vec<u8>) -> Vec<u8> {
    if text.last() != Some(&b'\n') {
        text.push(b'\n');
    }
    text
}

impl Document {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let head = nodes.insert(Line {
            text: Vec::new(),
            prev: LineId::default(),
            next: LineId::default(),
            attached: true,
        });
        let tail = nodes.insert(Line {
            text: Vec::new(),
            prev: head,
            next: LineId::default(),
            attached: true,
        });
        // Sentinels loop onto themselves at the outer ends.
        nodes[head].prev = head;
        nodes[head].next = tail;
        nodes[tail].next = tail;

        Self {
            nodes,
            head,
            tail,
            current: head,
        }
    }

    pub fn head(&self) -> LineId {
        self.head
    }

    pub fn tail(&self) -> LineId {
        self.tail
    }

    pub fn current(&self) -> LineId {
        self.current
    }

    /// Move the current line. `head` is only kept while the document is
    /// empty; otherwise it becomes the first line.
    pub fn set_current(&mut self, id: LineId) {
        debug_assert!(id != self.tail, "current line can never be the tail sentinel");
        self.current = if id == self.head && !self.is_empty() {
            self.first()
        } else {
            id
        };
    }

    pub fn is_sentinel(&self, id: LineId) -> bool {
        id == self.head || id == self.tail
    }

    /// Whether `id` still names a live (attached or detached) node.
    pub fn contains(&self, id: LineId) -> bool {
        self.nodes.contains_key(id)
    }

    /// First editable line, or `tail` when the document is empty.
    pub fn first(&self) -> LineId {
        self.nodes[self.head].next
    }

    /// Last editable line, or `head` when the document is empty.
    pub fn last(&self) -> LineId {
        self.nodes[self.tail].prev
    }

    pub fn is_empty(&self) -> bool {
        self.first() == self.tail
    }

    /// Number of attached lines. Walks the chain.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Allocate an unattached node. The new node points at `prev` and `next`
    /// but neither of them points back until someone calls [`attach`].
    ///
    /// [`attach`]: Document::attach
    pub fn make_node(&mut self, prev: LineId, next: LineId, text: Vec<u8>) -> LineId {
        self.nodes.insert(Line {
            text,
            prev,
            next,
            attached: false,
        })
    }

    /// Link `a -> b` and `b <- a`. Does not validate reachability, and does
    /// not change whether either node counts as attached: relinking nodes
    /// that are already in the chain is the only legitimate use.
    pub fn attach(&mut self, a: LineId, b: LineId) {
        self.nodes[a].next = b;
        self.nodes[b].prev = a;
    }

    /// Unlink `n` from the chain. Its own links are left pointing at its
    /// former neighbours so it can be put back with [`reattach`].
    ///
    /// [`reattach`]: Document::reattach
    pub fn detach(&mut self, n: LineId) {
        let (prev, next) = self.links(n);
        self.attach(prev, next);
        self.nodes[n].attached = false;
    }

    /// Put a detached node back between the neighbours it remembers.
    pub fn reattach(&mut self, n: LineId) {
        let (prev, next) = self.links(n);
        self.attach(prev, n);
        self.attach(n, next);
        self.nodes[n].attached = true;
    }

    /// Link `incoming` into the position currently held by `outgoing`.
    /// `outgoing` ends up detached but still remembers where it was.
    pub fn replace(&mut self, outgoing: LineId, incoming: LineId) {
        let (prev, next) = self.links(outgoing);
        self.attach(prev, incoming);
        self.attach(incoming, next);
        self.nodes[outgoing].attached = false;
        self.nodes[incoming].attached = true;
    }

    /// Make a node holding `text` and link it right after `anchor`.
    pub fn insert_after(&mut self, anchor: LineId, text: Vec<u8>) -> LineId {
        let next = self.nodes[anchor].next;
        let node = self.make_node(anchor, next, text);
        self.reattach(node);
        node
    }

    pub fn remove_and_free(&mut self, n: LineId) {
        self.detach(n);
        self.free(n);
    }

    /// Drop a node that is already detached.
    pub fn free(&mut self, n: LineId) {
        debug_assert!(!self.is_sentinel(n));
        self.nodes.remove(n);
    }

    fn links(&self, n: LineId) -> (LineId, LineId) {
        let line = &self.nodes[n];
        (line.prev, line.next)
    }

    /// Immediate successor, which may be `tail`.
    pub fn next(&self, n: LineId) -> LineId {
        self.nodes[n].next
    }

    /// Immediate predecessor, which may be `head`.
    pub fn prev(&self, n: LineId) -> LineId {
        self.nodes[n].prev
    }

    /// Follow `k` forward links, stopping early at `tail`.
    pub fn next_n(&self, mut n: LineId, mut k: usize) -> LineId {
        while k > 0 && n != self.tail {
            n = self.next(n);
            k -= 1;
        }
        n
    }

    /// Follow `k` backward links, stopping early at `head`.
    pub fn prev_n(&self, mut n: LineId, mut k: usize) -> LineId {
        while k > 0 && n != self.head {
            n = self.prev(n);
            k -= 1;
        }
        n
    }

    /// 1-based position of an attached line. `None` for the sentinels and for
    /// anything not currently reachable from `head`.
    pub fn index_of(&self, n: LineId) -> Option<usize> {
        if self.is_sentinel(n) {
            return None;
        }
        self.iter().position(|id| id == n).map(|i| i + 1)
    }

    /// Like [`index_of`] but treats `head` as line 0, which is a valid
    /// address for commands that insert after a line.
    ///
    /// [`index_of`]: Document::index_of
    pub fn ordinal(&self, n: LineId) -> Option<usize> {
        if n == self.head {
            Some(0)
        } else {
            self.index_of(n)
        }
    }

    /// Line `i` (1-based); 0 yields `head`.
    pub fn at(&self, i: usize) -> Option<LineId> {
        if i == 0 {
            return Some(self.head);
        }
        self.iter().nth(i - 1)
    }

    /// Whether `n` is in the chain. Stale handles are not.
    pub fn is_attached(&self, n: LineId) -> bool {
        self.nodes.get(n).is_some_and(|line| line.attached)
    }

    /// Every node reachable from `head`, sentinels included.
    pub fn attached_set(&self) -> HashSet<LineId> {
        let mut set: HashSet<LineId> = self.iter().collect();
        set.insert(self.head);
        set.insert(self.tail);
        set
    }

    pub fn text(&self, n: LineId) -> &[u8] {
        &self.nodes[n].text
    }

    /// Append `n2`'s text to `n1` (dropping `n1`'s trailing newline first) and
    /// detach `n2`. The swallowed node is not freed: whoever recorded the
    /// join owns it now. Returns `n1`.
    pub fn join(&mut self, n1: LineId, n2: LineId) -> LineId {
        let tail_text = std::mem::take(&mut self.nodes[n2].text);
        let survivor = &mut self.nodes[n1].text;
        if survivor.last() == Some(&b'\n') {
            survivor.pop();
        }
        survivor.extend_from_slice(&tail_text);
        self.nodes[n2].text = tail_text;
        self.detach(n2);
        n1
    }

    /// Truncate `n`'s text to `offset` bytes.
    pub fn cut(&mut self, n: LineId, offset: usize) {
        self.nodes[n].text.truncate(offset);
    }

    pub fn push_terminator(&mut self, n: LineId) {
        self.nodes[n].text.push(b'\n');
    }

    /// Throw away every line, attached or not, and reset to an empty chain.
    pub fn clear(&mut self) {
        let (head, tail) = (self.head, self.tail);
        self.nodes.retain(|id, _| id == head || id == tail);
        self.attach(head, tail);
        self.current = head;
    }

    /// Number of arena slots in use, sentinels and detached nodes included.
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// Attached lines front to back.
    pub fn iter(&self) -> Lines<'_> {
        Lines {
            doc: self,
            cursor: self.first(),
        }
    }

    /// Attached lines from `from` through `to`, inclusive. Stops at `tail`
    /// if `to` is never reached.
    pub fn range(&self, from: LineId, to: LineId) -> Vec<LineId> {
        let mut out = Vec::new();
        let mut cursor = from;
        while cursor != self.tail {
            out.push(cursor);
            if cursor == to {
                break;
            }
            cursor = self.next(cursor);
        }
        out
    }

    /// Texts of all attached lines, in order.
    pub fn contents(&self) -> Vec<Vec<u8>> {
        self.iter().map(|id| self.text(id).to_vec()).collect()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Lines<'a> {
    doc: &'a Document,
    cursor: LineId,
}

impl Iterator for Lines<'_> {
    type Item = LineId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.doc.tail {
            return None;
        }
        let id = self.cursor;
        self.cursor = self.doc.next(id);
        Some(id)
    }
}
