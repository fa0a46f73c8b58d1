//! Lexing
//!
//! Turns raw report text into the normalized token stream the score machines
//! walk, and locates the anchor phrases those machines start from.
//!
//! Structure:
//!     1. Word boundaries come from the logos lexer in [words]. This is the only
//!        place that decides where one word ends and the next begins.
//!     2. [normalize] post-processes those words: case folding, one trailing
//!        period stripped, single punctuation characters dropped, and optionally
//!        a second split on separator characters.
//!     3. [anchors] works on the raw text, not on tokens. Offsets it returns are
//!        byte offsets into the original string, so callers slice the text and
//!        tokenize the remainder.
//!
//! Token streams are ordered and never reordered; machines only ever drop a
//! prefix or take a bounded window.

pub mod anchors;
pub mod normalize;
pub mod words;

pub use anchors::{AnchorHit, AnchorLocator};
pub use normalize::{indices_of, Normalizer};
pub use words::{word_spans, WordKind};
