/*!
Literal scanners: the complete multi-literal strategies (Teddy and
Aho-Corasick), the candidate searchers that feed the reverse family, and the
digit scanner.

A "complete" searcher's matches are matches of the whole pattern, so the
Teddy/Aho-Corasick strategies report straight from here. The candidate
searchers are incomplete: they propose positions that a reverse scan must
verify.
*/

use aho_corasick::{packed, AhoCorasick};
use log::debug;
use memchr::memmem;
use regex_syntax::hir::{literal, Hir};

use crate::stats::{bump, Stats};

/// Below this haystack length, Fat Teddy's AVX2 setup cost exceeds its
/// throughput benefit and the Aho-Corasick companion wins.
pub(crate) const FAT_TEDDY_MIN_HAYSTACK: usize = 64;

/// Slim Teddy tops out at 32 patterns; beyond that the Fat variant is used,
/// which needs the small-haystack companion.
const SLIM_TEDDY_MAX_PATTERNS: usize = 32;

fn ac_find(
    ac: &AhoCorasick,
    haystack: &[u8],
    start: usize,
    end: usize,
) -> Option<(usize, usize)> {
    ac.find(aho_corasick::Input::new(haystack).span(start..end))
        .map(|m| (m.start(), m.end()))
}

/// A complete searcher for an exact-literal alternation: Teddy for 2-64
/// branches, Aho-Corasick beyond that (and as Fat Teddy's small-haystack
/// companion).
#[derive(Debug)]
pub(crate) struct MultiLiteral {
    imp: MultiImp,
}

#[derive(Debug)]
enum MultiImp {
    Teddy { searcher: packed::Searcher, fallback: Option<AhoCorasick> },
    Ac(AhoCorasick),
}

impl MultiLiteral {
    /// Builds the packed SIMD searcher. For more than 32 patterns (the Fat
    /// regime) this also materializes the Aho-Corasick companion used on
    /// short haystacks. Returns `None` when the packed searcher can't be
    /// built, e.g. when the required SIMD support is missing.
    pub(crate) fn teddy(lits: &[Vec<u8>]) -> Option<MultiLiteral> {
        let searcher = packed::Config::new()
            .match_kind(packed::MatchKind::LeftmostFirst)
            .builder()
            .extend(lits)
            .build()?;
        let fallback = if lits.len() > SLIM_TEDDY_MAX_PATTERNS {
            match AhoCorasick::builder()
                .match_kind(aho_corasick::MatchKind::LeftmostFirst)
                .build(lits)
            {
                Ok(ac) => Some(ac),
                Err(err) => {
                    debug!("Fat Teddy companion failed to build: {}", err);
                    return None;
                }
            }
        } else {
            None
        };
        Some(MultiLiteral { imp: MultiImp::Teddy { searcher, fallback } })
    }

    pub(crate) fn aho_corasick(lits: &[Vec<u8>]) -> Option<MultiLiteral> {
        let ac = AhoCorasick::builder()
            .match_kind(aho_corasick::MatchKind::LeftmostFirst)
            .build(lits)
            .map_err(|err| {
                debug!("Aho-Corasick failed to build: {}", err);
                err
            })
            .ok()?;
        Some(MultiLiteral { imp: MultiImp::Ac(ac) })
    }

    pub(crate) fn find(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
        stats: &Stats,
    ) -> Option<(usize, usize)> {
        match self.imp {
            MultiImp::Teddy { ref searcher, ref fallback } => {
                if let Some(ref ac) = *fallback {
                    if end - start < FAT_TEDDY_MIN_HAYSTACK {
                        bump(&stats.aho_corasick_searches);
                        return ac_find(ac, haystack, start, end);
                    }
                }
                match searcher.find_in(&haystack, (start..end).into()) {
                    Some(m) => {
                        bump(&stats.prefilter_hits);
                        Some((m.start(), m.end()))
                    }
                    None => {
                        bump(&stats.prefilter_misses);
                        None
                    }
                }
            }
            MultiImp::Ac(ref ac) => {
                bump(&stats.aho_corasick_searches);
                ac_find(ac, haystack, start, end)
            }
        }
    }

    pub(crate) fn is_match(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
        stats: &Stats,
    ) -> bool {
        self.find(haystack, start, end, stats).is_some()
    }
}

/// An incomplete candidate scanner: a single substring via memmem, a small
/// set via the packed searcher, a large set via Aho-Corasick. Matches are
/// candidate positions only; the caller verifies them.
#[derive(Debug)]
pub(crate) enum CandidateSearcher {
    Memmem(memmem::Finder<'static>),
    Packed(packed::Searcher),
    Ac(AhoCorasick),
}

impl CandidateSearcher {
    pub(crate) fn new(lits: &[Vec<u8>]) -> Option<CandidateSearcher> {
        if lits.is_empty() || lits.iter().any(|l| l.is_empty()) {
            return None;
        }
        if lits.len() == 1 {
            let finder = memmem::Finder::new(&lits[0]).into_owned();
            return Some(CandidateSearcher::Memmem(finder));
        }
        let packed = packed::Config::new()
            .match_kind(packed::MatchKind::LeftmostFirst)
            .builder()
            .extend(lits)
            .build();
        if let Some(searcher) = packed {
            return Some(CandidateSearcher::Packed(searcher));
        }
        AhoCorasick::builder()
            .match_kind(aho_corasick::MatchKind::LeftmostFirst)
            .build(lits)
            .ok()
            .map(CandidateSearcher::Ac)
    }

    /// Returns the span of the leftmost candidate in
    /// `haystack[start..end]`. Positions are absolute.
    pub(crate) fn find(
        &self,
        haystack: &[u8],
        start: usize,
        end: usize,
    ) -> Option<(usize, usize)> {
        match *self {
            CandidateSearcher::Memmem(ref finder) => finder
                .find(&haystack[start..end])
                .map(|i| (start + i, start + i + finder.needle().len())),
            CandidateSearcher::Packed(ref searcher) => searcher
                .find_in(&haystack, (start..end).into())
                .map(|m| (m.start(), m.end())),
            CandidateSearcher::Ac(ref ac) => {
                ac_find(ac, haystack, start, end)
            }
        }
    }
}

/// Extracts the prefix literal set used to drive a forward prefilter.
///
/// Returns `None` when extraction comes up empty, any literal is shorter
/// than `min_len`, or the set is bigger than `max`.
pub(crate) fn prefix_literals(
    min_len: usize,
    max: usize,
    hir: &Hir,
) -> Option<Vec<Vec<u8>>> {
    let mut seq = literal::Extractor::new().extract(hir);
    seq.optimize_for_prefix_by_preference();
    let lits = seq.literals()?;
    if lits.is_empty() || lits.len() > max {
        return None;
    }
    if lits.iter().any(|l| l.as_bytes().len() < min_len) {
        return None;
    }
    Some(lits.iter().map(|l| l.as_bytes().to_vec()).collect())
}

/// Position of the next byte that can begin a match of a digit-lead
/// pattern: an ASCII digit, or any non-ASCII byte (non-ASCII digits encode
/// to UTF-8 sequences starting with one).
///
/// The scan is a straight byte loop; there is no multi-byte trick like
/// memchr's because the class has ten members. The compiler vectorizes it
/// well enough for a candidate scanner.
#[inline]
pub(crate) fn find_digit(
    haystack: &[u8],
    start: usize,
    end: usize,
) -> Option<usize> {
    haystack[start..end]
        .iter()
        .position(|&b| b.is_ascii_digit() || b >= 0x80)
        .map(|i| start + i)
}
