//! Subword tokenizer seam.
//!
//! Chunk sizes are measured in tokens of a fixed vocabulary. The production
//! tokenizer is OpenAI's `cl100k_base` BPE via `tiktoken-rs`.

use orgingest_shared::{IngestError, Result};
use tiktoken_rs::CoreBPE;

/// Ordinary (non-special) ranks of `cl100k_base` are `0..CL100K_ORDINARY_RANKS`.
const CL100K_ORDINARY_RANKS: u32 = 100_256;

/// Encode/decode capability over a fixed vocabulary.
///
/// Implementations must round-trip: `decode(encode(t)) == t`. Decoding an
/// arbitrary slice of those tokens must not fail when the slice splits a
/// multi-byte character; partial bytes become U+FFFD.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// `cl100k_base` tokenizer.
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    /// Load the embedded `cl100k_base` vocabulary.
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| IngestError::Tokenizer(format!("failed to load cl100k_base: {e}")))?;
        Ok(Self { bpe })
    }
}

impl std::fmt::Debug for Cl100kTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cl100kTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        // Special-token text (e.g. `<|endoftext|>`) is encoded as plain text.
        Ok(self
            .bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect())
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        // `_decode_native_and_split` panics on ranks outside the vocabulary.
        if let Some(&bad) = tokens.iter().find(|&&t| t >= CL100K_ORDINARY_RANKS) {
            return Err(IngestError::Tokenizer(format!("unknown token {bad}")));
        }
        let bytes: Vec<u8> = self
            .bpe
            ._decode_native_and_split(tokens.to_vec())
            .flatten()
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic test double: one token per whitespace-separated word.

    use std::sync::Mutex;

    use super::*;

    /// Maps each distinct word to an id; decode joins words with single spaces.
    #[derive(Default)]
    pub(crate) struct WordTokenizer {
        vocab: Mutex<Vec<String>>,
    }

    impl Tokenizer for WordTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            let mut vocab = self.vocab.lock().expect("vocab lock");
            Ok(text
                .split_whitespace()
                .map(|word| match vocab.iter().position(|w| w == word) {
                    Some(i) => i as u32,
                    None => {
                        vocab.push(word.to_string());
                        (vocab.len() - 1) as u32
                    }
                })
                .collect())
        }

        fn decode(&self, tokens: &[u32]) -> Result<String> {
            let vocab = self.vocab.lock().expect("vocab lock");
            tokens
                .iter()
                .map(|&t| {
                    vocab
                        .get(t as usize)
                        .cloned()
                        .ok_or_else(|| IngestError::Tokenizer(format!("unknown token {t}")))
                })
                .collect::<Result<Vec<_>>>()
                .map(|words| words.join(" "))
        }
    }

    /// `n` distinct words `w0 w1 ... w{n-1}`.
    pub(crate) fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }
}
