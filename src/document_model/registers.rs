/// The unnamed cut buffer filled by `y` and emptied into the document by `x`.
///
/// Holds line texts rather than node handles: pasting always makes fresh
/// nodes, so a paste can be undone without touching the yanked lines.
#[derive(Debug, Clone, Default)]
pub struct CutBuffer {
    lines: Vec<Vec<u8>>,
}

impl CutBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer's contents.
    pub fn store(&mut self, lines: Vec<Vec<u8>>) {
        self.lines = lines;
    }

    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_replaces() {
        let mut buffer = CutBuffer::new();
        assert!(buffer.is_empty());

        buffer.store(vec![b"one\n".to_vec()]);
        buffer.store(vec![b"two\n".to_vec(), b"three\n".to_vec()]);
        assert_eq!(buffer.lines(), [b"two\n".to_vec(), b"three\n".to_vec()]);
        assert!(!buffer.is_empty());
    }
}
