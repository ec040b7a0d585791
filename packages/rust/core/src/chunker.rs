//! Token-bounded, overlapping chunking.
//!
//! Window positions come from [`TokenWindows`], a lazy cursor over a token
//! buffer length. [`Chunker`] decodes each window back to text, computes
//! insight signals for it and merges everything into chunk metadata.

use std::sync::Arc;

use orgingest_shared::{Chunk, IngestError, Metadata, ProcessingParams, Result};
use tracing::debug;

use crate::insights::InsightExtractor;
use crate::tokenizer::Tokenizer;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Window size and overlap, in tokens. `chunk_overlap < max_chunk_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    max_chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkParams {
    pub fn new(max_chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(IngestError::config("max_chunk_size must be > 0"));
        }
        if chunk_overlap >= max_chunk_size {
            return Err(IngestError::config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than max_chunk_size ({max_chunk_size})"
            )));
        }
        Ok(Self {
            max_chunk_size,
            chunk_overlap,
        })
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl TryFrom<ProcessingParams> for ChunkParams {
    type Error = IngestError;

    fn try_from(p: ProcessingParams) -> Result<Self> {
        Self::new(p.max_chunk_size, p.chunk_overlap)
    }
}

// ---------------------------------------------------------------------------
// Window cursor
// ---------------------------------------------------------------------------

/// Half-open token range `[start, end)` of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenWindow {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl TokenWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Lazy sequence of overlapping windows over `len` tokens.
///
/// Each step emits `[start, min(start + max, len))`, then moves the cursor
/// to `end - overlap`. Iteration stops once the cursor reaches
/// `len - overlap`.
#[derive(Debug, Clone)]
pub struct TokenWindows {
    len: usize,
    params: ChunkParams,
    start: usize,
    index: usize,
    done: bool,
}

impl TokenWindows {
    pub fn new(len: usize, params: ChunkParams) -> Self {
        Self::resume(len, params, 0, 0)
    }

    /// Restart the sequence at token offset `start`, numbering from `index`.
    pub fn resume(len: usize, params: ChunkParams, start: usize, index: usize) -> Self {
        Self {
            len,
            params,
            start,
            index,
            done: start >= len,
        }
    }
}

impl Iterator for TokenWindows {
    type Item = TokenWindow;

    fn next(&mut self) -> Option<TokenWindow> {
        if self.done {
            return None;
        }

        let end = (self.start + self.params.max_chunk_size).min(self.len);
        let window = TokenWindow {
            index: self.index,
            start: self.start,
            end,
        };

        self.start = end - self.params.chunk_overlap;
        self.index += 1;
        if self.start >= self.len.saturating_sub(self.params.chunk_overlap) {
            self.done = true;
        }

        Some(window)
    }
}

// ---------------------------------------------------------------------------
// Chunker
// ---------------------------------------------------------------------------

/// Splits normalized text into chunks and attaches metadata.
#[derive(Clone)]
pub struct Chunker {
    tokenizer: Arc<dyn Tokenizer>,
    params: ChunkParams,
    insights: InsightExtractor,
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Chunker {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, params: ChunkParams, insights: InsightExtractor) -> Self {
        Self {
            tokenizer,
            params,
            insights,
        }
    }

    pub fn params(&self) -> ChunkParams {
        self.params
    }

    /// Chunk `text`, copying `base` into every chunk's metadata.
    ///
    /// Text that fits in one window is emitted as-is with no token range
    /// fields. Empty text yields one empty chunk with `token_count = 0`.
    /// Longer text is decoded window by window; every chunk then receives
    /// the final `total_chunks`.
    pub fn chunk(&self, text: &str, base: &Metadata) -> Result<Vec<Chunk>> {
        let tokens = self.tokenizer.encode(text)?;

        if tokens.len() <= self.params.max_chunk_size {
            let mut metadata = base.clone();
            self.insights.extract(text).merge_into(&mut metadata);
            metadata.insert("chunk_index".into(), 0.into());
            metadata.insert("total_chunks".into(), 1.into());
            metadata.insert("token_count".into(), tokens.len().into());
            return Ok(vec![Chunk {
                content: text.to_string(),
                metadata,
            }]);
        }

        let mut chunks = Vec::new();
        for window in TokenWindows::new(tokens.len(), self.params) {
            let content = self.tokenizer.decode(&tokens[window.start..window.end])?;

            let mut metadata = base.clone();
            self.insights.extract(&content).merge_into(&mut metadata);
            metadata.insert("chunk_index".into(), window.index.into());
            metadata.insert("chunk_start_token".into(), window.start.into());
            metadata.insert("chunk_end_token".into(), window.end.into());
            metadata.insert("token_count".into(), window.len().into());

            chunks.push(Chunk { content, metadata });
        }

        let total = chunks.len();
        for chunk in &mut chunks {
            chunk.metadata.insert("total_chunks".into(), total.into());
        }

        debug!(tokens = tokens.len(), chunks = total, "chunked text");
        Ok(chunks)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Cl100kTokenizer;
    use crate::tokenizer::testing::{WordTokenizer, words};

    fn params(max: usize, overlap: usize) -> ChunkParams {
        ChunkParams::new(max, overlap).expect("valid params")
    }

    fn word_chunker(max: usize, overlap: usize) -> Chunker {
        Chunker::new(
            Arc::new(WordTokenizer::default()),
            params(max, overlap),
            InsightExtractor::new(vec![]),
        )
    }

    fn base() -> Metadata {
        let mut meta = Metadata::new();
        meta.insert("title".into(), "Doc".into());
        meta
    }

    #[test]
    fn params_reject_overlap_not_below_max() {
        assert!(ChunkParams::new(100, 100).is_err());
        assert!(ChunkParams::new(100, 150).is_err());
        assert!(ChunkParams::new(0, 0).is_err());
        assert!(ChunkParams::new(100, 0).is_ok());
    }

    #[test]
    fn windows_for_1200_tokens() {
        let windows: Vec<_> = TokenWindows::new(1200, params(1000, 200)).collect();
        assert_eq!(
            windows,
            vec![
                TokenWindow { index: 0, start: 0, end: 1000 },
                TokenWindow { index: 1, start: 800, end: 1200 },
            ]
        );
    }

    #[test]
    fn windows_always_reach_the_end() {
        for len in [501, 777, 1000, 1150, 4096] {
            let windows: Vec<_> = TokenWindows::new(len, params(500, 200)).collect();
            assert_eq!(windows.last().expect("some window").end, len, "len={len}");
            for pair in windows.windows(2) {
                assert_eq!(pair[1].start, pair[0].end - 200);
            }
        }
    }

    #[test]
    fn windows_resume_matches_tail() {
        let p = params(300, 50);
        let all: Vec<_> = TokenWindows::new(1000, p).collect();
        let resumed: Vec<_> = TokenWindows::resume(1000, p, all[2].start, 2).collect();
        assert_eq!(resumed, all[2..]);
    }

    #[test]
    fn windows_resume_past_end_is_empty() {
        assert_eq!(TokenWindows::resume(10, params(5, 1), 10, 0).count(), 0);
        assert_eq!(TokenWindows::new(0, params(5, 1)).count(), 0);
    }

    #[test]
    fn zero_overlap_tiles_exactly() {
        let windows: Vec<_> = TokenWindows::new(10, params(4, 0)).collect();
        let ranges: Vec<_> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(ranges, [(0, 4), (4, 8), (8, 10)]);
    }

    #[test]
    fn chunks_1200_tokens_into_two() {
        let chunks = word_chunker(1000, 200)
            .chunk(&words(1200), &base())
            .expect("chunk");
        assert_eq!(chunks.len(), 2);

        assert_eq!(chunks[0].token_count(), Some(1000));
        assert_eq!(chunks[0].metadata["chunk_start_token"], 0);
        assert_eq!(chunks[0].metadata["chunk_end_token"], 1000);

        assert_eq!(chunks[1].token_count(), Some(400));
        assert_eq!(chunks[1].metadata["chunk_start_token"], 800);
        assert_eq!(chunks[1].metadata["chunk_end_token"], 1200);
        assert!(chunks[1].content.starts_with("w800 "));
        assert!(chunks[1].content.ends_with(" w1199"));
    }

    #[test]
    fn total_chunks_and_indexes_are_consistent() {
        let chunks = word_chunker(100, 30)
            .chunk(&words(1000), &base())
            .expect("chunk");
        let total = chunks.len();
        assert!(total > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index(), Some(i));
            assert_eq!(chunk.total_chunks(), Some(total));
            assert_eq!(chunk.metadata["title"], "Doc");
        }
    }

    #[test]
    fn small_text_is_one_chunk_with_cl100k() {
        let chunker = Chunker::new(
            Arc::new(Cl100kTokenizer::new().expect("load")),
            params(1000, 200),
            InsightExtractor::new(vec![]),
        );
        let chunks = chunker.chunk("hello world", &base()).expect("chunk");
        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.content, "hello world");
        assert_eq!(chunk.chunk_index(), Some(0));
        assert_eq!(chunk.total_chunks(), Some(1));
        assert_eq!(chunk.token_count(), Some(2));
        assert!(!chunk.metadata.contains_key("chunk_start_token"));
    }

    #[test]
    fn non_ascii_windows_chunk_with_cl100k() {
        let chunker = Chunker::new(
            Arc::new(Cl100kTokenizer::new().expect("load")),
            params(1000, 200),
            InsightExtractor::new(vec![]),
        );
        let texts = [
            "我们的团队文化强调透明、协作与持续改进。".repeat(200),
            "Team update 🚀🎉👩‍💻 shipped! ".repeat(400),
        ];
        for text in &texts {
            let chunks = chunker.chunk(text, &base()).expect("chunk");
            assert!(chunks.len() > 1);
            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.chunk_index(), Some(i));
                assert_eq!(chunk.total_chunks(), Some(chunks.len()));
                assert!(chunk.token_count().expect("token_count") <= 1000);
                assert!(!chunk.content.is_empty());
            }
        }
    }

    #[test]
    fn empty_text_is_one_empty_chunk() {
        let chunker = word_chunker(10, 2);
        let first = chunker.chunk("", &base()).expect("chunk");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].content, "");
        assert_eq!(first[0].token_count(), Some(0));
        assert_eq!(first[0].total_chunks(), Some(1));
        assert_eq!(first, chunker.chunk("", &base()).expect("chunk"));
    }

    #[test]
    fn insights_are_computed_per_chunk() {
        let mut text = words(10);
        text.push_str(" customer");
        let chunks = word_chunker(6, 1).chunk(&text, &base()).expect("chunk");
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].metadata["customer_context"], false);
        assert_eq!(chunks.last().expect("last").metadata["customer_context"], true);
    }

    #[test]
    fn chunking_is_idempotent() {
        let chunker = word_chunker(50, 10);
        let text = words(333);
        assert_eq!(
            chunker.chunk(&text, &base()).expect("chunk"),
            chunker.chunk(&text, &base()).expect("chunk")
        );
    }
}
