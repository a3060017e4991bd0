/*!
The anchored-literal fast path.

Patterns shaped like `^prefix.*[class+]suffix$` (with every piece except the
suffix optional) bypass the automata entirely: matching is a length check,
two memcmps and a backward scan through a byte table. The byte table is the
ASCII subset of the bridge class, which is deliberate: a non-ASCII byte in
the bridge region fails the match even when the Unicode class would have
accepted the decoded character.
*/

use regex_syntax::hir::{Hir, HirKind, Look};

use crate::analysis::{self, ClassTable};

/// Everything needed to match `^prefix.*[class+]suffix$` without automata.
#[derive(Debug)]
pub(crate) struct AnchoredLiteral {
    prefix: Vec<u8>,
    /// Always non-empty.
    suffix: Vec<u8>,
    /// The bridge class sitting immediately before the suffix, if any.
    class: Option<ClassTable>,
    /// Minimum number of bridge bytes (1 for `+`).
    class_min: usize,
    /// Minimum number of wildcard bytes (0 for `.*`, 1 for `.+`).
    wildcard_min: usize,
    /// The shortest input that can possibly match.
    min_len: usize,
}

impl AnchoredLiteral {
    /// Recognizes the fast-path shape on the HIR.
    ///
    /// The outer node must be a concatenation whose first element is a start
    /// anchor and whose last is an end anchor. Somewhere in the middle sits
    /// exactly one greedy `.*`/`.+`. Items before it must be literals (the
    /// prefix); after it, at most one `class+` repetition followed by
    /// literals (the non-empty suffix). Anything else rejects the shape.
    pub(crate) fn new(hir: &Hir) -> Option<AnchoredLiteral> {
        let items = match *hir.kind() {
            HirKind::Concat(ref items) => items,
            _ => return None,
        };
        if items.len() < 3 {
            return None;
        }
        if *items[0].kind() != HirKind::Look(Look::Start) {
            return None;
        }
        if *items[items.len() - 1].kind() != HirKind::Look(Look::End) {
            return None;
        }
        let inner = &items[1..items.len() - 1];
        let mut wildcard = None;
        for (i, item) in inner.iter().enumerate() {
            if let Some(rep) = analysis::wildcard_rep(item) {
                if wildcard.is_some() {
                    return None;
                }
                wildcard = Some((i, rep));
            }
        }
        let (w, rep) = wildcard?;
        let mut prefix = vec![];
        for item in inner[..w].iter() {
            prefix.extend_from_slice(&analysis::flatten_literal(item)?);
        }
        let mut rest = &inner[w + 1..];
        let (class, class_min) = match rest.first().map(|h| h.kind()) {
            Some(&HirKind::Repetition(ref crep))
                if crep.min >= 1 && crep.max.is_none() && crep.greedy =>
            {
                let class = match *crep.sub.kind() {
                    HirKind::Class(ref class) => class,
                    _ => return None,
                };
                rest = &rest[1..];
                (Some(analysis::class_table(class)), crep.min as usize)
            }
            _ => (None, 0),
        };
        let mut suffix = vec![];
        for item in rest.iter() {
            suffix.extend_from_slice(&analysis::flatten_literal(item)?);
        }
        if suffix.is_empty() {
            return None;
        }
        let wildcard_min = rep.min as usize;
        let min_len = prefix.len() + wildcard_min + class_min + suffix.len();
        Some(AnchoredLiteral {
            prefix,
            suffix,
            class,
            class_min,
            wildcard_min,
            min_len,
        })
    }

    /// Matching is O(|prefix| + |suffix| + k) where k is the bridge length.
    pub(crate) fn is_match(&self, haystack: &[u8]) -> bool {
        if haystack.len() < self.min_len {
            return false;
        }
        if !haystack.starts_with(&self.prefix) {
            return false;
        }
        if !haystack.ends_with(&self.suffix) {
            return false;
        }
        let suffix_start = haystack.len() - self.suffix.len();
        let middle = suffix_start - self.prefix.len();
        let class = match self.class {
            None => return middle >= self.wildcard_min,
            Some(ref class) => class,
        };
        // Count consecutive class bytes immediately before the suffix. A
        // non-matching byte terminates the count: the class must sit flush
        // against the suffix. Class bytes beyond the required minimum can be
        // re-attributed to the wildcard, which matches anything.
        let mut count = 0;
        let mut i = suffix_start;
        while i > self.prefix.len() && class.contains(haystack[i - 1]) {
            i -= 1;
            count += 1;
        }
        count >= self.class_min && middle - self.class_min >= self.wildcard_min
    }

    /// Both ends are anchored, so a match always spans the whole haystack.
    pub(crate) fn find(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        if self.is_match(haystack) {
            Some((0, haystack.len()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(pattern: &str) -> Option<AnchoredLiteral> {
        let hir = regex_syntax::Parser::new().parse(pattern).unwrap();
        AnchoredLiteral::new(&hir)
    }

    #[test]
    fn detection() {
        assert!(lit(r"^/.*[\w-]+\.php$").is_some());
        assert!(lit(r"^foo.*bar$").is_some());
        assert!(lit(r"^.*x$").is_some());
        assert!(lit(r"^pre.+[0-9]+end$").is_some());

        // Two wildcards.
        assert!(lit(r"^a.*b.*c$").is_none());
        // Optional prefix element.
        assert!(lit(r"^a?.*b$").is_none());
        // Non-literal between start anchor and wildcard.
        assert!(lit(r"^[ab].*c$").is_none());
        // No suffix.
        assert!(lit(r"^foo.*$").is_none());
        // Not anchored at both ends.
        assert!(lit(r"/.*\.php$").is_none());
        assert!(lit(r"^/.*\.php").is_none());
        // No wildcard at all.
        assert!(lit(r"^foobar$").is_none());
    }

    #[test]
    fn php_path() {
        let m = lit(r"^/.*[\w-]+\.php$").unwrap();
        assert_eq!(Some((0, 17)), m.find(b"/path/to/file.php"));
        assert_eq!(None, m.find(b"/.php"));
        // The bridge table is ASCII-only: the UTF-8 encoding of Cyrillic
        // letters is not in it, so the class never sits flush against the
        // suffix.
        assert_eq!(None, m.find("/файл.php".as_bytes()));
        assert_eq!(None, m.find(b"relative/file.php"));
        assert_eq!(None, m.find(b"/path/to/file.phpx"));
    }

    #[test]
    fn wildcard_and_class_share_bytes() {
        // `.+` and `[0-9]+` can both be satisfied from the same digit run.
        let m = lit(r"^a.+[0-9]+z$").unwrap();
        assert!(!m.is_match(b"a9z"));
        assert!(m.is_match(b"a99z"));
        assert!(m.is_match(b"ax9z"));
    }

    #[test]
    fn no_class_gap() {
        let m = lit(r"^foo.+bar$").unwrap();
        assert!(!m.is_match(b"foobar"));
        assert!(m.is_match(b"fooxbar"));
        let m = lit(r"^foo.*bar$").unwrap();
        assert!(m.is_match(b"foobar"));
    }
}
