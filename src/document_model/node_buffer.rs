use super::document::LineId;

/// One slot of a [`NodeBuffer`]. A `Brake` opens one operation's worth of
/// node references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Brake,
    Node(LineId),
}

/// Stack of node references, bracketed per operation.
#[derive(Debug, Clone, Default)]
pub struct NodeBuffer {
    entries: Vec<Entry>,
}

impl NodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_brake(&mut self) {
        self.entries.push(Entry::Brake);
    }

    pub fn push(&mut self, node: LineId) {
        self.entries.push(Entry::Node(node));
    }

    /// Pop node references down to the nearest brake and consume the brake.
    /// Nodes come back in pop order, most recently pushed first.
    pub fn pop_bracket(&mut self) -> Vec<LineId> {
        let mut nodes = Vec::new();
        while let Some(entry) = self.entries.pop() {
            match entry {
                Entry::Brake => break,
                Entry::Node(id) => nodes.push(id),
            }
        }
        nodes
    }

    /// Pop exactly `N` node references and then the brake beneath them,
    /// without scanning. Returned in push order. `None` if the top of the
    /// buffer does not have that shape, in which case nothing is consumed.
    pub fn pop_fixed<const N: usize>(&mut self) -> Option<[LineId; N]> {
        let start = self.entries.len().checked_sub(N + 1)?;
        if self.entries[start] != Entry::Brake {
            return None;
        }
        let mut out = [LineId::default(); N];
        for (slot, entry) in out.iter_mut().zip(&self.entries[start + 1..]) {
            match entry {
                Entry::Node(id) => *slot = *id,
                Entry::Brake => return None,
            }
        }
        self.entries.truncate(start);
        Some(out)
    }

    /// Push a brake followed by `nodes`, in order.
    pub fn push_bracket(&mut self, nodes: impl IntoIterator<Item = LineId>) {
        self.push_brake();
        for node in nodes {
            self.push(node);
        }
    }

    /// Every node reference currently held, brakes skipped.
    pub fn nodes(&self) -> impl Iterator<Item = LineId> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Node(id) => Some(*id),
            Entry::Brake => None,
        })
    }

    /// Nodes of the most recent bracket, in push order, without popping.
    pub fn top_bracket(&self) -> Vec<LineId> {
        let start = self
            .entries
            .iter()
            .rposition(|e| *e == Entry::Brake)
            .map_or(0, |i| i + 1);
        self.entries[start..]
            .iter()
            .filter_map(|entry| match entry {
                Entry::Node(id) => Some(*id),
                Entry::Brake => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the buffer, handing back the node references it held.
    pub fn drain(&mut self) -> Vec<LineId> {
        let nodes = self.nodes().collect();
        self.entries.clear();
        nodes
    }
}
