#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn slice<'b>(&self, bytes: &'b [u8]) -> &'b [u8] {
        let start = self.start.min(bytes.len());
        let end = self.end.min(bytes.len());
        &bytes[start..end.max(start)]
    }
}
