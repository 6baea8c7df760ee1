//! Delimiter-augmented decode tree and the dictionaries derived from it.
//!
//! The plain Huffman tree is mirrored into a [`DelimTree`] and one
//! delimiter leaf per possible trailing-byte count is grafted onto the
//! shallowest ordinary leaves. A delimiter leaf marks the end of a field
//! in-band: `delim_stat = k` means "the stream ends here, followed by
//! `k - 1` raw trailing bytes". Grafting replaces a leaf with an interior
//! node whose left child clones the old leaf, so every word keeps its
//! code (one bit longer) and the prefix property is preserved.

use crate::bits::Code;
use crate::frequency::word_index;
use crate::tree::{HuffmanTree, Node};
use crate::{ALPHABET_BITS, DICT_SIZE, WORD_WIDTH};

/// Upper bound on bytes one fast-table entry can decode: every bit of an
/// [`ALPHABET_BITS`] prefix can complete a one-bit word code.
pub const FAST_BYTES_MAX: usize = ALPHABET_BITS * WORD_WIDTH;

/// A node in the delimiter-augmented tree.
#[derive(Debug, Clone)]
pub struct DelimNode {
    pub(crate) left: Option<Box<DelimNode>>,
    pub(crate) right: Option<Box<DelimNode>>,
    pub(crate) word: [u8; WORD_WIDTH],
    /// 0 for an ordinary word leaf; `k > 0` marks the delimiter leaf
    /// announcing `k - 1` raw trailing bytes.
    pub(crate) delim_stat: u8,
}

impl DelimNode {
    pub(crate) fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// One precomputed fast-decode step: the full words decodable from one
/// [`ALPHABET_BITS`]-bit prefix and the unconsumed bit count.
///
/// `leftover == ALPHABET_BITS` signals a bad prefix (no complete word);
/// the decoder must fall back to the bit-by-bit walk for one step.
#[derive(Debug, Clone, Copy)]
pub struct FastEntry {
    pub(crate) bytes: [u8; FAST_BYTES_MAX],
    pub(crate) len: u8,
    pub(crate) leftover: u8,
}

/// The Huffman tree augmented with [`crate::WORD_WIDTH`] delimiter leaves.
#[derive(Debug, Clone)]
pub struct DelimTree {
    root: Box<DelimNode>,
}

impl DelimTree {
    /// Mirror `tree` and graft one delimiter leaf per trailing-byte
    /// count onto the currently shallowest ordinary leaf, left-first on
    /// depth ties.
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut root = mirror(tree.root());
        for stat in 1..=WORD_WIDTH as u8 {
            let (_, leaf) = shallowest_leaf(&mut root, 0);
            let moved = DelimNode {
                left: None,
                right: None,
                word: leaf.word,
                delim_stat: leaf.delim_stat,
            };
            leaf.left = Some(Box::new(moved));
            leaf.right = Some(Box::new(DelimNode {
                left: None,
                right: None,
                word: [0; WORD_WIDTH],
                delim_stat: stat,
            }));
        }
        DelimTree { root }
    }

    pub(crate) fn root(&self) -> &DelimNode {
        &self.root
    }

    /// Extract the encode dictionaries: one code per alphabet word and
    /// one code per delimiter leaf (indexed by trailing-byte count).
    pub fn collect_codes(&self) -> (Vec<Code>, Vec<Code>) {
        let mut encode = vec![Code::new(); DICT_SIZE];
        let mut delim = vec![Code::new(); WORD_WIDTH];
        let mut trace = Code::new();
        collect(&self.root, &mut trace, &mut encode, &mut delim);
        (encode, delim)
    }

    /// Precompute the fast decode table: one entry per numeric
    /// [`ALPHABET_BITS`]-bit prefix.
    pub fn fast_table(&self) -> Vec<FastEntry> {
        (0..DICT_SIZE).map(|p| self.fast_entry(p as u16)).collect()
    }

    /// Simulate the decoder walk over one prefix, LSB upward: each
    /// ordinary leaf emits its word and restarts at the root; the walk
    /// stops short of any delimiter leaf and never consumes a partial
    /// code.
    fn fast_entry(&self, prefix: u16) -> FastEntry {
        let mut bytes = [0u8; FAST_BYTES_MAX];
        let mut len = 0usize;
        let mut consumed = 0usize;
        let mut pos = 0usize;
        let mut cursor = &*self.root;

        while pos < ALPHABET_BITS {
            let bit = (prefix >> pos) & 1 != 0;
            pos += 1;
            cursor = if bit {
                cursor.right.as_deref().unwrap()
            } else {
                cursor.left.as_deref().unwrap()
            };
            if cursor.is_leaf() {
                if cursor.delim_stat != 0 {
                    break;
                }
                bytes[len..len + WORD_WIDTH].copy_from_slice(&cursor.word);
                len += WORD_WIDTH;
                consumed = pos;
                cursor = &self.root;
            }
        }

        FastEntry {
            bytes,
            len: len as u8,
            leftover: (ALPHABET_BITS - consumed) as u8,
        }
    }
}

fn mirror(node: &Node) -> Box<DelimNode> {
    Box::new(DelimNode {
        left: node.left.as_deref().map(mirror),
        right: node.right.as_deref().map(mirror),
        word: node.word,
        delim_stat: 0,
    })
}

/// Find the shallowest leaf, breaking depth ties toward the left
/// subtree. Leafness is the two-child test: a node with exactly one
/// child cannot occur in a merge-built tree.
fn shallowest_leaf(node: &mut DelimNode, depth: usize) -> (usize, &mut DelimNode) {
    if node.left.is_none() && node.right.is_none() {
        return (depth, node);
    }
    let left = shallowest_leaf(node.left.as_deref_mut().unwrap(), depth + 1);
    let right = shallowest_leaf(node.right.as_deref_mut().unwrap(), depth + 1);
    if left.0 <= right.0 {
        left
    } else {
        right
    }
}

fn collect(node: &DelimNode, trace: &mut Code, encode: &mut [Code], delim: &mut [Code]) {
    if node.is_leaf() {
        if node.delim_stat == 0 {
            encode[word_index(&node.word)] = trace.clone();
        } else {
            delim[node.delim_stat as usize - 1] = trace.clone();
        }
        return;
    }
    trace.push_bit(false);
    collect(node.left.as_deref().unwrap(), trace, encode, delim);
    trace.pop_bit();
    trace.push_bit(true);
    collect(node.right.as_deref().unwrap(), trace, encode, delim);
    trace.pop_bit();
}
