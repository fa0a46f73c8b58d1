//! Word-boundary primitive
//!
//! The logos lexer below is the black-box boundary detector the normalizer
//! builds on. It only classifies; it never rewrites text.
//!
//!     Word:   a run of letters/digits, optionally joined by internal connectors
//!             (`-`, `:`, `=`, `/`, `'`, `.`) to further letters/digits, with at
//!             most one trailing period. `ses-cd`, `o'neil`, `df:0`, `2.`.
//!             A possessive `'s` is not joined: `mayo's` is `mayo`, `'`, `s`.
//!     Symbol: any other single non-space character. `,`, `(`, `°`.
//!
//! Whitespace (Unicode) is skipped.
//!
//! The logos lexer emits atomic pieces (alphanumeric runs, connectors, other
//! symbols) and [word_spans] joins adjacent pieces into words, so no pattern
//! ever has to look past a connector to decide where a word ends.
use logos::Logos;
use std::ops::Range;

/// Classes produced by the boundary lexer
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WordKind {
    Word,
    Symbol,
}

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"\s+")]
enum Piece {
    #[regex(r"[\p{L}\p{N}]+")]
    Alnum,

    #[regex(r"[\-:=/'.]")]
    Connector,

    #[regex(r"[^\s\p{L}\p{N}\-:=/'.]")]
    Symbol,
}

/// Split `source` into word-level spans.
///
/// Every non-whitespace character of `source` is covered by exactly one span.
/// Input the lexer cannot classify is surfaced as a `Symbol` rather than lost.
pub fn word_spans(source: &str) -> Vec<(WordKind, Range<usize>)> {
    let pieces: Vec<(Piece, Range<usize>)> = Piece::lexer(source)
        .spanned()
        .map(|(piece, span)| (piece.unwrap_or(Piece::Symbol), span))
        .collect();

    let touching = |at: usize, kind: Piece, end: usize| {
        pieces
            .get(at)
            .is_some_and(|(piece, span)| *piece == kind && span.start == end)
    };

    let mut spans = Vec::with_capacity(pieces.len());
    let mut i = 0;
    while i < pieces.len() {
        let (piece, span) = &pieces[i];
        if *piece != Piece::Alnum {
            spans.push((WordKind::Symbol, span.clone()));
            i += 1;
            continue;
        }

        let start = span.start;
        let mut end = span.end;
        i += 1;
        while touching(i, Piece::Connector, end)
            && touching(i + 1, Piece::Alnum, pieces[i].1.end)
            && !is_possessive(source, &pieces[i].1, &pieces[i + 1].1)
        {
            end = pieces[i + 1].1.end;
            i += 2;
        }
        if touching(i, Piece::Connector, end) && &source[pieces[i].1.clone()] == "." {
            end = pieces[i].1.end;
            i += 1;
        }
        spans.push((WordKind::Word, start..end));
    }
    spans
}

/// `'s` after a word is split off, so `Mayo's` still yields `mayo`.
fn is_possessive(source: &str, connector: &Range<usize>, next: &Range<usize>) -> bool {
    &source[connector.clone()] == "'" && source[next.clone()].eq_ignore_ascii_case("s")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slices(source: &str) -> Vec<(WordKind, &str)> {
        word_spans(source)
            .into_iter()
            .map(|(kind, span)| (kind, &source[span]))
            .collect()
    }

    #[test]
    fn test_words_and_symbols() {
        assert_eq!(
            slices("Mayo score: 2, (ses-cd)"),
            vec![
                (WordKind::Word, "Mayo"),
                (WordKind::Word, "score"),
                (WordKind::Symbol, ":"),
                (WordKind::Word, "2"),
                (WordKind::Symbol, ","),
                (WordKind::Symbol, "("),
                (WordKind::Word, "ses-cd"),
                (WordKind::Symbol, ")"),
            ]
        );
    }

    #[test]
    fn test_internal_connectors_stay_in_word() {
        assert_eq!(
            slices("DF:0 score=1 foo-bar:1 o'neil"),
            vec![
                (WordKind::Word, "DF:0"),
                (WordKind::Word, "score=1"),
                (WordKind::Word, "foo-bar:1"),
                (WordKind::Word, "o'neil"),
            ]
        );
    }

    #[test]
    fn test_possessive_split_off() {
        assert_eq!(
            slices("Mayo's score, Crohn'S"),
            vec![
                (WordKind::Word, "Mayo"),
                (WordKind::Symbol, "'"),
                (WordKind::Word, "s"),
                (WordKind::Word, "score"),
                (WordKind::Symbol, ","),
                (WordKind::Word, "Crohn"),
                (WordKind::Symbol, "'"),
                (WordKind::Word, "S"),
            ]
        );
    }

    #[test]
    fn test_trailing_period_kept_once() {
        assert_eq!(
            slices("was 4. Done.."),
            vec![
                (WordKind::Word, "was"),
                (WordKind::Word, "4."),
                (WordKind::Word, "Done."),
                (WordKind::Symbol, "."),
            ]
        );
    }

    #[test]
    fn test_unicode_whitespace_skipped() {
        assert_eq!(
            slices("mayo\u{a0}2\tgrade"),
            vec![
                (WordKind::Word, "mayo"),
                (WordKind::Word, "2"),
                (WordKind::Word, "grade"),
            ]
        );
    }

    #[test]
    fn test_empty_source() {
        assert!(word_spans("").is_empty());
        assert!(word_spans("   \n").is_empty());
    }
}
