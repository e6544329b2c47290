/// Per-write limit of the console transport, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Lazy, restartable sequence of `size`-character pieces of a text.
///
/// Every piece except the last holds exactly `size` characters; the last holds
/// the remainder (never empty). An empty text yields no pieces. Splitting is
/// done on `char` boundaries, so multi-byte text is never cut mid-character.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    size: usize,
}

/// Split `text` into pieces of `size` characters. A `size` of 0 is treated as 1.
pub fn chunk(text: &str, size: usize) -> Chunks<'_> {
    Chunks {
        rest: text,
        size: size.max(1),
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let split_at = self
            .rest
            .char_indices()
            .nth(self.size)
            .map_or(self.rest.len(), |(idx, _)| idx);
        let (piece, rest) = self.rest.split_at(split_at);
        self.rest = rest;
        Some(piece)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.rest.is_empty() {
            return (0, Some(0));
        }
        // Bytes bound the char count from above; at least one char per 4 bytes.
        let upper = self.rest.len().div_ceil(self.size);
        let lower = self.rest.len().div_ceil(4).div_ceil(self.size);
        (lower, Some(upper))
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}
