//! Huffman tree construction over the word alphabet.
//!
//! Every alphabet word receives a leaf: zero counts are clamped up to 1
//! so the tree always covers the full alphabet, and counts are clamped
//! down so interior sums cannot overflow. The tree is built once from a
//! calibration sample and is immutable afterwards.

use crate::frequency::count_words;
use crate::pqueue::WeightedHeap;
use crate::{HuffError, HuffResult, DICT_SIZE, WORD_WIDTH};

/// Largest per-word count after clamping. Keeps even a fully saturated
/// alphabet's interior sums inside `u64`.
pub const MAX_WORD_COUNT: u64 = u64::MAX / DICT_SIZE as u64;

/// A node in the Huffman tree. Interior nodes own both children; a leaf
/// owns neither and its `word` is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
    pub word: [u8; WORD_WIDTH],
}

impl Node {
    fn leaf(word: [u8; WORD_WIDTH]) -> Self {
        Node {
            left: None,
            right: None,
            word,
        }
    }

    fn interior(left: Box<Node>, right: Box<Node>) -> Self {
        Node {
            left: Some(left),
            right: Some(right),
            word: [0; WORD_WIDTH],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// A Huffman tree with one leaf per alphabet word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: Box<Node>,
}

impl HuffmanTree {
    /// Build a tree from per-word counts.
    ///
    /// Counts are clamped to `[1, MAX_WORD_COUNT]`, one leaf per word is
    /// seeded into a min-heap, and the two lowest-count subtrees are
    /// merged until one root remains. Tie-breaking among equal counts is
    /// the heap's order; stability across runs is not required.
    ///
    /// # Panics
    ///
    /// Panics if `counts.len() != DICT_SIZE`; a short or oversized count
    /// vector is a programming error.
    pub fn from_counts(counts: Vec<u64>) -> Self {
        assert_eq!(
            counts.len(),
            DICT_SIZE,
            "counts must cover the whole alphabet"
        );

        let mut heap: WeightedHeap<Box<Node>> = WeightedHeap::with_capacity(DICT_SIZE);
        for (index, &raw) in counts.iter().enumerate() {
            let count = raw.clamp(1, MAX_WORD_COUNT);
            let word = (index as u16).to_le_bytes();
            heap.push(count, Box::new(Node::leaf(word)));
        }

        while let Some(((lighter_count, lighter), (heavier_count, heavier))) = heap.pop_pair() {
            heap.push(
                lighter_count + heavier_count,
                Box::new(Node::interior(lighter, heavier)),
            );
        }

        let (_, root) = heap.pop_lightest().unwrap();
        HuffmanTree { root }
    }

    /// Count words in `input` and build a tree from the tally.
    pub fn from_data(input: &[u8]) -> Self {
        Self::from_counts(count_words(input))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Serialize the tree structure for persistence.
    ///
    /// Pre-order walk: tag `0` for an interior node followed by both
    /// subtrees, tag `1` for a leaf followed by its word bytes. The
    /// delimiter-augmented decode tree is rederivable and is never
    /// persisted.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_node(&self.root, &mut out);
        out
    }

    /// Reconstruct a tree serialized by [`HuffmanTree::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> HuffResult<Self> {
        let mut pos = 0usize;
        let root = read_node(bytes, &mut pos)?;
        if pos != bytes.len() {
            return Err(HuffError::InvalidInput);
        }
        Ok(HuffmanTree { root })
    }
}

const TAG_INTERIOR: u8 = 0;
const TAG_LEAF: u8 = 1;

fn write_node(node: &Node, out: &mut Vec<u8>) {
    if node.is_leaf() {
        out.push(TAG_LEAF);
        out.extend_from_slice(&node.word);
    } else {
        out.push(TAG_INTERIOR);
        write_node(node.left.as_deref().unwrap(), out);
        write_node(node.right.as_deref().unwrap(), out);
    }
}

fn read_node(bytes: &[u8], pos: &mut usize) -> HuffResult<Box<Node>> {
    let tag = *bytes.get(*pos).ok_or(HuffError::InvalidInput)?;
    *pos += 1;
    match tag {
        TAG_LEAF => {
            let end = *pos + WORD_WIDTH;
            let raw = bytes.get(*pos..end).ok_or(HuffError::InvalidInput)?;
            let mut word = [0u8; WORD_WIDTH];
            word.copy_from_slice(raw);
            *pos = end;
            Ok(Box::new(Node::leaf(word)))
        }
        TAG_INTERIOR => {
            let left = read_node(bytes, pos)?;
            let right = read_node(bytes, pos)?;
            Ok(Box::new(Node::interior(left, right)))
        }
        _ => Err(HuffError::InvalidInput),
    }
}
