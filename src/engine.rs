//! Per-field encode/decode engines and the multi-field row layer.
//!
//! A [`DelimEngine`] holds the immutable dictionaries derived from one
//! calibration tree. Encode walks the source a word at a time, appends
//! the field's delimiter code, then the raw trailing bytes. Decode walks
//! the delimiter tree bit by bit, consuming multi-word runs through the
//! fast table whenever the cursor is at the root and a full register of
//! input remains. Engines never mutate after construction, so one engine
//! may serve any number of concurrent calls over disjoint buffers.

use std::ptr;

use crate::bits::{self, BitSink, BitStream, ByteCounter, Code};
use crate::delim::{DelimTree, FastEntry};
use crate::frequency::{count_words, word_index};
use crate::tree::HuffmanTree;
use crate::{HuffError, HuffResult, ALPHABET_BITS, REGISTER_BITS, WORD_WIDTH};

/// Encoder/decoder for one field, specialized to one calibration tree.
#[derive(Debug, Clone)]
pub struct DelimEngine {
    encode_table: Vec<Code>,
    delim_table: Vec<Code>,
    tree: DelimTree,
    fast: Vec<FastEntry>,
}

impl DelimEngine {
    /// Derive the delimiter tree and all dictionaries from a Huffman
    /// tree.
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let delim_tree = DelimTree::from_tree(tree);
        let (encode_table, delim_table) = delim_tree.collect_codes();
        let fast = delim_tree.fast_table();
        DelimEngine {
            encode_table,
            delim_table,
            tree: delim_tree,
            fast,
        }
    }

    /// Calibrate on `input` and build the engine in one step.
    pub fn from_data(input: &[u8]) -> Self {
        Self::from_tree(&HuffmanTree::from_counts(count_words(input)))
    }

    /// The code assigned to the word with the given numeric index.
    pub fn word_code(&self, index: usize) -> &Code {
        &self.encode_table[index]
    }

    /// The delimiter code announcing `trailing` raw trailing bytes.
    pub fn delim_code(&self, trailing: usize) -> &Code {
        &self.delim_table[trailing]
    }

    /// Encode `src` into the shared bit-stream window without flushing.
    ///
    /// Whole words are emitted through the encode table, then the
    /// delimiter for the trailing-byte count, then the trailing bytes
    /// verbatim. The window is left unflushed so several fields can
    /// share it; callers finish with [`BitStream::exhaust`].
    pub fn encode_into<S: BitSink>(&self, src: &[u8], stream: &mut BitStream, sink: &mut S) {
        let split = src.len() - src.len() % WORD_WIDTH;
        for word in src[..split].chunks_exact(WORD_WIDTH) {
            stream.append_code(sink, &self.encode_table[word_index(word)]);
        }

        let trailing = &src[split..];
        stream.append_code(sink, &self.delim_table[trailing.len()]);
        for &byte in trailing {
            stream.append(sink, byte as u64, 8);
        }
    }

    /// Encode one field and flush, returning the packed bytes.
    pub fn encode(&self, src: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len(src));
        let mut stream = BitStream::new();
        self.encode_into(src, &mut stream, &mut out);
        stream.exhaust(&mut out);
        out
    }

    /// Flushed size of `encode(src)`, measured without writing.
    pub fn encoded_len(&self, src: &[u8]) -> usize {
        let mut counter = ByteCounter::new();
        let mut stream = BitStream::new();
        self.encode_into(src, &mut stream, &mut counter);
        counter.len() + bits::byte_size(stream.bit_len() as usize)
    }

    /// Decode one field by walking the delimiter tree bit by bit.
    ///
    /// Decoded bytes are appended to `dst` (the output cursor is
    /// `dst.len()`); returns the bit offset just past the field. Stops
    /// on the field's delimiter leaf, copying its announced trailing
    /// bytes verbatim.
    pub fn decode_into(
        &self,
        src: &[u8],
        mut bit_offset: usize,
        dst: &mut Vec<u8>,
    ) -> HuffResult<usize> {
        let bit_last = src.len() * 8;
        let root = self.tree.root();
        let mut cursor = root;

        loop {
            if bit_offset >= bit_last {
                return Err(HuffError::TruncatedStream);
            }
            let bit = bits::read_bit(src, bit_offset);
            bit_offset += 1;
            cursor = if bit {
                cursor.right.as_deref().unwrap()
            } else {
                cursor.left.as_deref().unwrap()
            };

            if cursor.is_leaf() {
                if cursor.delim_stat != 0 {
                    return self.copy_trailing(src, bit_offset, bit_last, cursor.delim_stat, dst);
                }
                dst.extend_from_slice(&cursor.word);
                cursor = root;
            }
        }
    }

    /// Decode one field, using the fast table for multi-word steps.
    ///
    /// Equivalent to [`DelimEngine::decode_into`] on every well-formed
    /// stream. The fast path engages when the cursor is at the root and
    /// at least a register of bits remains before `bit_last`; a bad
    /// prefix latches the next iteration onto the slow path so the walk
    /// always progresses.
    pub fn decode_fast_into(
        &self,
        src: &[u8],
        mut bit_offset: usize,
        bit_last: usize,
        dst: &mut Vec<u8>,
    ) -> HuffResult<usize> {
        let root = self.tree.root();
        let mut cursor = root;
        let mut bad_bit = false;

        loop {
            let fast_eligible =
                bit_offset + REGISTER_BITS < bit_last && ptr::eq(cursor, root) && !bad_bit;

            if fast_eligible {
                let prefix = bits::read_word(src, bit_offset, ALPHABET_BITS as u32) as usize;
                let entry = &self.fast[prefix];
                dst.extend_from_slice(&entry.bytes[..entry.len as usize]);
                bit_offset += ALPHABET_BITS - entry.leftover as usize;
                bad_bit = entry.leftover as usize == ALPHABET_BITS;
            } else {
                bad_bit = false;
                if bit_offset >= bit_last {
                    return Err(HuffError::TruncatedStream);
                }
                let bit = bits::read_bit(src, bit_offset);
                bit_offset += 1;
                cursor = if bit {
                    cursor.right.as_deref().unwrap()
                } else {
                    cursor.left.as_deref().unwrap()
                };

                if cursor.is_leaf() {
                    if cursor.delim_stat != 0 {
                        return self.copy_trailing(
                            src,
                            bit_offset,
                            bit_last,
                            cursor.delim_stat,
                            dst,
                        );
                    }
                    dst.extend_from_slice(&cursor.word);
                    cursor = root;
                }
            }
        }
    }

    /// Decode one whole-buffer field from bit offset 0.
    pub fn decode(&self, src: &[u8]) -> HuffResult<Vec<u8>> {
        let mut out = Vec::new();
        self.decode_fast_into(src, 0, src.len() * 8, &mut out)?;
        Ok(out)
    }

    /// Copy the `delim_stat - 1` raw trailing bytes that follow a
    /// delimiter, 8 bits each.
    fn copy_trailing(
        &self,
        src: &[u8],
        mut bit_offset: usize,
        bit_last: usize,
        delim_stat: u8,
        dst: &mut Vec<u8>,
    ) -> HuffResult<usize> {
        for _ in 0..delim_stat - 1 {
            if bit_offset + 8 > bit_last {
                return Err(HuffError::TruncatedStream);
            }
            dst.push(bits::read_byte(src, bit_offset));
            bit_offset += 8;
        }
        Ok(bit_offset)
    }
}

/// Encoder/decoder for rows of independently calibrated fields.
///
/// One bit-stream window is threaded through every field on encode and
/// flushed once, so fields pack back-to-back with no byte alignment
/// between them; each field's in-band delimiter locates the boundary on
/// decode.
#[derive(Debug, Clone)]
pub struct RowEngine {
    engines: Vec<DelimEngine>,
}

impl RowEngine {
    pub fn new(engines: Vec<DelimEngine>) -> Self {
        RowEngine { engines }
    }

    /// Number of fields per row.
    pub fn field_count(&self) -> usize {
        self.engines.len()
    }

    /// Encode one row, one field per engine.
    ///
    /// # Panics
    ///
    /// Panics if `fields.len()` differs from the engine count; a
    /// mismatched row is a programming error.
    pub fn encode(&self, fields: &[&[u8]]) -> Vec<u8> {
        assert_eq!(
            fields.len(),
            self.engines.len(),
            "row must carry one field per engine"
        );
        let mut out = Vec::with_capacity(self.encoded_len(fields));
        let mut stream = BitStream::new();
        for (engine, field) in self.engines.iter().zip(fields) {
            engine.encode_into(field, &mut stream, &mut out);
        }
        stream.exhaust(&mut out);
        out
    }

    /// Flushed size of `encode(fields)`, measured without writing.
    pub fn encoded_len(&self, fields: &[&[u8]]) -> usize {
        assert_eq!(
            fields.len(),
            self.engines.len(),
            "row must carry one field per engine"
        );
        let mut counter = ByteCounter::new();
        let mut stream = BitStream::new();
        for (engine, field) in self.engines.iter().zip(fields) {
            engine.encode_into(field, &mut stream, &mut counter);
        }
        counter.len() + bits::byte_size(stream.bit_len() as usize)
    }

    /// Decode one row back into its fields, lengths recovered from each
    /// field's delimiter.
    pub fn decode(&self, src: &[u8]) -> HuffResult<Vec<Vec<u8>>> {
        let bit_last = src.len() * 8;
        let mut bit_offset = 0usize;
        let mut fields = Vec::with_capacity(self.engines.len());
        for engine in &self.engines {
            let mut field = Vec::new();
            bit_offset = engine.decode_fast_into(src, bit_offset, bit_last, &mut field)?;
            fields.push(field);
        }
        Ok(fields)
    }
}
