/*!
Byte-table searchers for char-class shaped patterns.

These handle the shapes where a full automaton is overkill: a single
quantified class (`[a-z]+`), a concatenation of quantified classes
(`[a-z]+[0-9]+`), and a start-anchored alternation of literals with distinct
first bytes (`^(GET|PUT|HEAD)`). Each is a straight scan over a 256-entry
membership table.

All of them require byte-exact classes. A Unicode class that leaves ASCII
compiles to multi-byte UTF-8 sequences and is left to the NFA engines.
*/

use regex_syntax::hir::{Hir, HirKind, Look};

use crate::analysis::{self, Analysis, ClassTable};

/// Searcher for a single greedy quantified class with `min >= 1`, like
/// `[a-z]+` or `[0-9]{2,5}`.
#[derive(Debug)]
pub(crate) struct CharClassSearcher {
    table: ClassTable,
    min: usize,
    max: Option<usize>,
}

impl CharClassSearcher {
    pub(crate) fn new(hir: &Hir) -> Option<CharClassSearcher> {
        let rep = match *hir.kind() {
            HirKind::Repetition(ref rep) => rep,
            _ => return None,
        };
        if rep.min == 0 || !rep.greedy {
            return None;
        }
        let class = match *rep.sub.kind() {
            HirKind::Class(ref class) => class,
            _ => return None,
        };
        let table = analysis::class_table(class);
        if !table.byte_exact {
            return None;
        }
        Some(CharClassSearcher {
            table,
            min: rep.min as usize,
            max: rep.max.map(|m| m as usize),
        })
    }

    pub(crate) fn find(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
    ) -> Option<(usize, usize)> {
        let mut at = start;
        while at < end {
            if !self.table.contains(haystack[at]) {
                at += 1;
                continue;
            }
            let run_start = at;
            let mut run_end = at + 1;
            while run_end < end && self.table.contains(haystack[run_end]) {
                run_end += 1;
            }
            let len = run_end - run_start;
            if len >= self.min {
                let take = self.max.map_or(len, |m| len.min(m));
                return Some((run_start, run_start + take));
            }
            // A run shorter than the minimum cannot contain a match start:
            // every position inside it yields an even shorter run.
            at = run_end;
        }
        None
    }

    pub(crate) fn is_match(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
    ) -> bool {
        let mut run = 0;
        for &byte in haystack[start..end].iter() {
            if self.table.contains(byte) {
                run += 1;
                if run >= self.min {
                    return true;
                }
            } else {
                run = 0;
            }
        }
        false
    }
}

/// One element of a composite: a quantified class.
#[derive(Debug)]
struct CompositeItem {
    table: ClassTable,
    min: usize,
    max: Option<usize>,
}

/// Searcher for a concatenation of quantified classes such as
/// `[a-z]+[0-9]+`.
///
/// Restricted to adjacent-disjoint classes. Disjointness is what makes the
/// greedy scan exact: once a run of one class ends, no shorter take could
/// ever let the next class start earlier, so there is nothing to backtrack
/// over. Overlapping adjacent classes fall through to the NFA engines.
#[derive(Debug)]
pub(crate) struct CompositeSearcher {
    items: Vec<CompositeItem>,
}

impl CompositeSearcher {
    pub(crate) fn new(hir: &Hir) -> Option<CompositeSearcher> {
        let subs = match *hir.kind() {
            HirKind::Concat(ref subs) => subs,
            _ => return None,
        };
        if subs.len() < 2 {
            return None;
        }
        let mut items = Vec::with_capacity(subs.len());
        for sub in subs.iter() {
            let item = match *sub.kind() {
                HirKind::Class(ref class) => {
                    let table = analysis::class_table(class);
                    CompositeItem { table, min: 1, max: Some(1) }
                }
                HirKind::Repetition(ref rep) => {
                    if rep.min == 0 || !rep.greedy {
                        return None;
                    }
                    let class = match *rep.sub.kind() {
                        HirKind::Class(ref class) => class,
                        _ => return None,
                    };
                    CompositeItem {
                        table: analysis::class_table(class),
                        min: rep.min as usize,
                        max: rep.max.map(|m| m as usize),
                    }
                }
                _ => return None,
            };
            if !item.table.byte_exact {
                return None;
            }
            items.push(item);
        }
        for pair in items.windows(2) {
            if !disjoint(&pair[0].table, &pair[1].table) {
                return None;
            }
        }
        Some(CompositeSearcher { items })
    }

    pub(crate) fn find(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
    ) -> Option<(usize, usize)> {
        let first = &self.items[0];
        let mut at = start;
        'candidates: while at < end {
            if !first.table.contains(haystack[at]) {
                at += 1;
                continue;
            }
            let mut pos = at;
            for item in self.items.iter() {
                let mut run = pos;
                while run < end && item.table.contains(haystack[run]) {
                    run += 1;
                }
                let len = run - pos;
                if len < item.min {
                    at += 1;
                    continue 'candidates;
                }
                pos += item.max.map_or(len, |m| len.min(m));
            }
            return Some((at, pos));
        }
        None
    }

    pub(crate) fn is_match(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
    ) -> bool {
        self.find(haystack, start, end).is_some()
    }
}

fn disjoint(a: &ClassTable, b: &ClassTable) -> bool {
    (0..256).all(|i| !(a.table[i] && b.table[i]))
}

/// Searcher for `^(alt|alt|…)` where every alternate is a plain literal and
/// no two alternates share a first byte. The first haystack byte picks the
/// only branch that could match, which is then verified with one memcmp.
#[derive(Debug)]
pub(crate) struct BranchDispatcher {
    branches: Vec<Vec<u8>>,
    /// First byte to branch index; `NO_BRANCH` when no branch starts with
    /// that byte.
    index: [u16; 256],
    end_anchored: bool,
}

const NO_BRANCH: u16 = u16::MAX;

impl BranchDispatcher {
    pub(crate) fn new(
        analysis: &Analysis,
        hir: &Hir,
    ) -> Option<BranchDispatcher> {
        if !analysis.start_anchored {
            return None;
        }
        let items = match *hir.kind() {
            HirKind::Concat(ref items) => items,
            _ => return None,
        };
        if *items[0].kind() != HirKind::Look(Look::Start) {
            return None;
        }
        let (body, end_anchored) = match items.len() {
            2 => (&items[1], false),
            3 if *items[2].kind() == HirKind::Look(Look::End) => {
                (&items[1], true)
            }
            _ => return None,
        };
        // A capture wrapper is transparent for span searches; submatches are
        // resolved by the NFA engines over the reported span.
        let body = match *body.kind() {
            HirKind::Capture(ref cap) => &cap.sub,
            _ => body,
        };
        let alts = match *body.kind() {
            HirKind::Alternation(ref alts) => alts,
            _ => return None,
        };
        let mut branches = Vec::with_capacity(alts.len());
        let mut index = [NO_BRANCH; 256];
        for alt in alts.iter() {
            let lit = analysis::flatten_literal(alt)?;
            let first = *lit.first()?;
            if index[usize::from(first)] != NO_BRANCH {
                return None;
            }
            index[usize::from(first)] = u16::try_from(branches.len()).ok()?;
            branches.push(lit);
        }
        Some(BranchDispatcher { branches, index, end_anchored })
    }

    pub(crate) fn find(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
    ) -> Option<(usize, usize)> {
        // The start anchor can only hold at the very beginning.
        if start != 0 || start >= end {
            return None;
        }
        let idx = self.index[usize::from(haystack[start])];
        if idx == NO_BRANCH {
            return None;
        }
        let branch = &self.branches[usize::from(idx)];
        if branch.len() > end - start {
            return None;
        }
        if &haystack[start..start + branch.len()] != branch.as_slice() {
            return None;
        }
        if self.end_anchored && start + branch.len() != end {
            return None;
        }
        Some((start, start + branch.len()))
    }
}
