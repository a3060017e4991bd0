/*!
The reverse-search family.

For patterns whose hard constraint lives at or near the end of a match,
forward search degenerates to quadratic rescanning. These searchers instead
locate candidates with a literal scan and verify them with a reverse lazy
DFA that walks the haystack right to left, pinned at the candidate. A
forward scan then resolves the true (greedy) end of the match.

Shared invariant: a reported span is always a span the forward pattern
matches, and a "no match" answer means the forward pattern has no match.
Verification failures move on to the next candidate; engine failures (a
quitting DFA) abandon the trick and rerun the search on the NFA engines.

Empty input is the one place the reverse machinery misbehaves (`a*$` against
`""`), so every searcher routes empty spans to the forward PikeVM.
*/

use log::debug;
use memchr::memrchr;
use regex_automata::{Anchored, Input, Span};
use regex_syntax::hir::{literal, Hir, HirKind, Look};

use crate::{
    analysis::{self, Wildcard},
    engine::{RegexI, RegexInfo, SearchState},
    prefilter::CandidateSearcher,
    stats::bump,
    wrappers::RevDfa,
};

/// The candidate set for `.*LITERAL`-shaped patterns, plus whether the
/// leading wildcard lets every match start at the search origin.
#[derive(Debug)]
pub(crate) struct SuffixShape {
    pub(crate) lits: Vec<Vec<u8>>,
    pub(crate) starts_at_origin: bool,
}

/// Recognizes `.*LITERAL` and `.*\.(lit|lit|…)`: a single greedy wildcard
/// followed by nothing but literals and literal alternations.
pub(crate) fn suffix_shape(
    info: &RegexInfo,
    hir: &Hir,
) -> Option<SuffixShape> {
    let a = info.analysis();
    if a.start_anchored || a.end_anchored || a.multiline_start {
        return None;
    }
    let items = match *hir.kind() {
        HirKind::Concat(ref items) => items,
        _ => return None,
    };
    if items.len() < 2 {
        return None;
    }
    let rep = analysis::wildcard_rep(&items[0])?;
    let max = info.config().get_max_literals() as usize;
    let lits = analysis::literal_set(&items[1..], max)?;
    let min_len = info.config().get_min_literal_len() as usize;
    if lits.is_empty() || lits.iter().any(|l| l.len() < min_len) {
        return None;
    }
    // Only a dot-all `.*` guarantees a match from the origin; the default
    // `.` stops at newlines.
    let starts_at_origin = rep.min == 0 && rep.kind == Wildcard::Any;
    Some(SuffixShape { lits, starts_at_origin })
}

/// The `(?m)^prefix.*suffix` shape.
#[derive(Debug)]
pub(crate) struct MultilineShape {
    pub(crate) line_prefix: Option<Vec<u8>>,
    pub(crate) suffix: Vec<u8>,
}

pub(crate) fn multiline_suffix_shape(
    info: &RegexInfo,
    hir: &Hir,
) -> Option<MultilineShape> {
    let a = info.analysis();
    if !a.multiline_start || a.end_anchored || a.start_anchored {
        return None;
    }
    let items = match *hir.kind() {
        HirKind::Concat(ref items) => items,
        _ => return None,
    };
    if items.len() < 3 || *items[0].kind() != HirKind::Look(Look::StartLF) {
        return None;
    }
    let inner = &items[1..];
    let mut wildcard = None;
    for (i, item) in inner.iter().enumerate() {
        if let Some(rep) = analysis::wildcard_rep(item) {
            // The wildcard must stay within the line, or the line-start walk
            // during verification would be wrong.
            if rep.kind != Wildcard::AnyExceptNewline || wildcard.is_some() {
                return None;
            }
            wildcard = Some(i);
        }
    }
    let w = wildcard?;
    let mut prefix = vec![];
    for item in inner[..w].iter() {
        prefix.extend_from_slice(&analysis::flatten_literal(item)?);
    }
    let mut suffix = vec![];
    for item in inner[w + 1..].iter() {
        suffix.extend_from_slice(&analysis::flatten_literal(item)?);
    }
    let min_len = info.config().get_min_literal_len() as usize;
    if suffix.len() < min_len {
        return None;
    }
    let line_prefix = if prefix.is_empty() { None } else { Some(prefix) };
    Some(MultilineShape { line_prefix, suffix })
}

/// An inner-literal split: `items[..split]` is the prefix sub-pattern and
/// `lits` are the literals every match's remainder starts with.
#[derive(Debug)]
pub(crate) struct InnerShape {
    pub(crate) split: usize,
    pub(crate) lits: Vec<Vec<u8>>,
    /// `Some((pre_min, suf_min))` when both sides of the literal are
    /// unbounded dot-alls, enabling the whole-span fast path.
    pub(crate) universal: Option<(usize, usize)>,
}

/// Hunts for the best inner literal: the concatenation split whose
/// remainder starts with the longest extractable literals. A single byte
/// (the `@` of an email pattern) is an acceptable inner literal.
pub(crate) fn inner_shape(info: &RegexInfo, hir: &Hir) -> Option<InnerShape> {
    let a = info.analysis();
    if a.start_anchored || a.end_anchored || a.multiline_start || a.has_look {
        return None;
    }
    // Digit-lead patterns like `\d+\.\d+\.\d+` technically have inner
    // literal splits at their separators, but every such "literal" crosses
    // into the digit classes and explodes into common-byte candidate sets.
    // The digit candidate scan is the better strategy for those.
    if a.digit_lead {
        return None;
    }
    let items = match *hir.kind() {
        HirKind::Concat(ref items) => items,
        _ => return None,
    };
    if items.len() < 2 {
        return None;
    }
    let min_len = info.config().get_min_literal_len() as usize;
    let mut best: Option<(usize, Vec<Vec<u8>>, usize)> = None;
    for split in 1..items.len() {
        // The remainder must *begin* with the literals for candidate
        // verification to be sound, so only splits at a literal item count.
        if analysis::flatten_literal(&items[split]).is_none() {
            continue;
        }
        let rest = Hir::concat(items[split..].to_vec());
        let mut seq = literal::Extractor::new().extract(&rest);
        seq.optimize_for_prefix_by_preference();
        let lits = match seq.literals() {
            None => continue,
            Some(lits) => lits,
        };
        if lits.is_empty() || lits.len() > 64 {
            continue;
        }
        let shortest =
            lits.iter().map(|l| l.as_bytes().len()).min().unwrap_or(0);
        if shortest < min_len {
            continue;
        }
        if best.as_ref().map_or(true, |&(_, _, s)| shortest > s) {
            let lits =
                lits.iter().map(|l| l.as_bytes().to_vec()).collect();
            best = Some((split, lits, shortest));
        }
    }
    let (split, lits, _) = best?;
    let universal = universal_shape(items, split);
    Some(InnerShape { split, lits, universal })
}

/// Detects `(?s).*LIT(?s).*`: one literal item bracketed by unbounded
/// dot-alls. Any candidate hit then implies the whole span matches.
fn universal_shape(items: &[Hir], split: usize) -> Option<(usize, usize)> {
    if items.len() != 3 || split != 1 {
        return None;
    }
    let pre = analysis::wildcard_rep(&items[0])?;
    let suf = analysis::wildcard_rep(&items[2])?;
    if pre.kind != Wildcard::Any || suf.kind != Wildcard::Any {
        return None;
    }
    Some((pre.min as usize, suf.min as usize))
}

/// The one reverse searcher an engine owns, fixed by its strategy tag.
#[derive(Debug)]
pub(crate) enum ReverseSearcher {
    Anchored(ReverseAnchored),
    /// Shared by the single-literal and literal-set suffix strategies; the
    /// candidate searcher inside decides which scan runs.
    Suffix(ReverseSuffix),
    Inner(ReverseInner),
    MultilineSuffix(MultilineSuffix),
}

impl ReverseSearcher {
    pub(crate) fn rev_dfa(&self) -> &RevDfa {
        match *self {
            ReverseSearcher::Anchored(ref s) => &s.rev,
            ReverseSearcher::Suffix(ref s) => &s.rev,
            ReverseSearcher::Inner(ref s) => &s.prerev,
            ReverseSearcher::MultilineSuffix(ref s) => &s.rev,
        }
    }

    pub(crate) fn find(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        if input.start() >= input.end() {
            return re.nfa_search(state, input);
        }
        match *self {
            ReverseSearcher::Anchored(ref s) => s.find(re, state, input),
            ReverseSearcher::Suffix(ref s) => s.find(re, state, input),
            ReverseSearcher::Inner(ref s) => s.find(re, state, input),
            ReverseSearcher::MultilineSuffix(ref s) => {
                s.find(re, state, input)
            }
        }
    }

    pub(crate) fn is_match(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> bool {
        if input.start() >= input.end() {
            return re.nfa_search(state, input).is_some();
        }
        match *self {
            ReverseSearcher::Anchored(ref s) => s.is_match(re, state, input),
            ReverseSearcher::Suffix(ref s) => s.is_match(re, state, input),
            ReverseSearcher::Inner(ref s) => s.is_match(re, state, input),
            ReverseSearcher::MultilineSuffix(ref s) => {
                s.is_match(re, state, input)
            }
        }
    }
}

/// `…$`: the whole search is one reverse scan pinned at the end of the
/// haystack. No reversed copy of the bytes is ever allocated.
#[derive(Debug)]
pub(crate) struct ReverseAnchored {
    pub(crate) rev: RevDfa,
}

impl ReverseAnchored {
    pub(crate) fn new(
        info: &RegexInfo,
        hir: &Hir,
    ) -> Option<ReverseAnchored> {
        RevDfa::new(info, hir).map(|rev| ReverseAnchored { rev })
    }

    fn find(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        let revin = Input::new(input.haystack())
            .span(input.start()..input.end())
            .anchored(Anchored::Yes);
        bump(&re.stats.dfa_searches);
        match self.rev.try_search_rev(&mut state.revdfa, &revin) {
            Ok(Some(hm)) => {
                // The end anchor pins the match end at the end of the
                // haystack; the reverse scan supplied the start.
                Some(Span { start: hm.offset(), end: input.end() })
            }
            Ok(None) => None,
            Err(err) => {
                re.note_dfa_error(&err);
                re.nfa_search(state, input)
            }
        }
    }

    fn is_match(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> bool {
        let revin = Input::new(input.haystack())
            .span(input.start()..input.end())
            .anchored(Anchored::Yes)
            .earliest(true);
        bump(&re.stats.dfa_searches);
        match self.rev.try_search_rev(&mut state.revdfa, &revin) {
            Ok(result) => result.is_some(),
            Err(err) => {
                re.note_dfa_error(&err);
                re.nfa_search(state, input).is_some()
            }
        }
    }
}

/// `.*LITERAL` / `.*\.(txt|log|md)`: scan for the suffix, verify the
/// stretch before it with the reverse DFA, then resolve the greedy end
/// going forward.
#[derive(Debug)]
pub(crate) struct ReverseSuffix {
    pub(crate) rev: RevDfa,
    candidates: CandidateSearcher,
    starts_at_origin: bool,
}

impl ReverseSuffix {
    pub(crate) fn new(
        info: &RegexInfo,
        hir: &Hir,
        shape: SuffixShape,
    ) -> Option<ReverseSuffix> {
        let rev = RevDfa::new(info, hir)?;
        let candidates = CandidateSearcher::new(&shape.lits)?;
        Some(ReverseSuffix {
            rev,
            candidates,
            starts_at_origin: shape.starts_at_origin,
        })
    }

    fn find(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        let h = input.haystack();
        let mut at = input.start();
        loop {
            let (cs, ce) =
                match self.candidates.find(h, at, input.end()) {
                    None => {
                        bump(&re.stats.prefilter_misses);
                        return None;
                    }
                    Some(c) => c,
                };
            bump(&re.stats.prefilter_hits);
            let start = if self.starts_at_origin {
                input.start()
            } else {
                let revin = Input::new(h)
                    .span(input.start()..ce)
                    .anchored(Anchored::Yes);
                bump(&re.stats.dfa_searches);
                match self.rev.try_search_rev(&mut state.revdfa, &revin) {
                    Ok(Some(hm)) => hm.offset(),
                    Ok(None) => {
                        bump(&re.stats.prefilter_abandoned);
                        at = cs + 1;
                        continue;
                    }
                    Err(err) => {
                        re.note_dfa_error(&err);
                        return re.nfa_search(state, input);
                    }
                }
            };
            // The match is verified to exist from `start`; a forward scan
            // anchored there resolves where greediness actually ends it.
            let fwdin = Input::new(h)
                .span(start..input.end())
                .anchored(Anchored::Yes);
            return re.core_search(state, &fwdin);
        }
    }

    fn is_match(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> bool {
        let h = input.haystack();
        let mut at = input.start();
        loop {
            let (cs, ce) =
                match self.candidates.find(h, at, input.end()) {
                    None => {
                        bump(&re.stats.prefilter_misses);
                        return false;
                    }
                    Some(c) => c,
                };
            bump(&re.stats.prefilter_hits);
            if self.starts_at_origin {
                return true;
            }
            let revin = Input::new(h)
                .span(input.start()..ce)
                .anchored(Anchored::Yes)
                .earliest(true);
            bump(&re.stats.dfa_searches);
            match self.rev.try_search_rev(&mut state.revdfa, &revin) {
                Ok(Some(_)) => return true,
                Ok(None) => {
                    bump(&re.stats.prefilter_abandoned);
                    at = cs + 1;
                }
                Err(err) => {
                    re.note_dfa_error(&err);
                    return re.nfa_search(state, input).is_some();
                }
            }
        }
    }
}

/// `prefix INNER suffix`: candidates come from an inner literal, the
/// reverse DFA (built from the prefix sub-pattern only) walks left to a
/// start, and a forward scan of the full pattern confirms and finishes the
/// match. Verification failure on either side moves to the next candidate.
#[derive(Debug)]
pub(crate) struct ReverseInner {
    pub(crate) prerev: RevDfa,
    candidates: CandidateSearcher,
    universal: Option<(usize, usize)>,
}

impl ReverseInner {
    pub(crate) fn new(
        info: &RegexInfo,
        hir: &Hir,
        shape: InnerShape,
    ) -> Option<ReverseInner> {
        let items = match *hir.kind() {
            HirKind::Concat(ref items) => items,
            _ => return None,
        };
        let prefix = Hir::concat(items[..shape.split].to_vec());
        let prerev = match RevDfa::new(info, &prefix) {
            Some(prerev) => prerev,
            None => {
                debug!("reverse-inner prefix DFA failed to build");
                return None;
            }
        };
        let candidates = CandidateSearcher::new(&shape.lits)?;
        Some(ReverseInner { prerev, candidates, universal: shape.universal })
    }

    fn find(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        let h = input.haystack();
        let mut at = input.start();
        loop {
            let (cs, ce) =
                match self.candidates.find(h, at, input.end()) {
                    None => {
                        bump(&re.stats.prefilter_misses);
                        return None;
                    }
                    Some(c) => c,
                };
            bump(&re.stats.prefilter_hits);
            if let Some((pre_min, suf_min)) = self.universal {
                if cs - input.start() >= pre_min
                    && input.end() - ce >= suf_min
                {
                    return Some(Span {
                        start: input.start(),
                        end: input.end(),
                    });
                }
                bump(&re.stats.prefilter_abandoned);
                at = cs + 1;
                continue;
            }
            let revin = Input::new(h)
                .span(input.start()..cs)
                .anchored(Anchored::Yes);
            bump(&re.stats.dfa_searches);
            match self.prerev.try_search_rev(&mut state.revdfa, &revin) {
                Ok(Some(hm)) => {
                    let fwdin = Input::new(h)
                        .span(hm.offset()..input.end())
                        .anchored(Anchored::Yes);
                    match re.core_search(state, &fwdin) {
                        Some(span) => return Some(span),
                        None => {
                            bump(&re.stats.prefilter_abandoned);
                            at = cs + 1;
                        }
                    }
                }
                Ok(None) => {
                    bump(&re.stats.prefilter_abandoned);
                    at = cs + 1;
                }
                Err(err) => {
                    re.note_dfa_error(&err);
                    return re.nfa_search(state, input);
                }
            }
        }
    }

    fn is_match(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> bool {
        let h = input.haystack();
        let mut at = input.start();
        loop {
            let (cs, ce) =
                match self.candidates.find(h, at, input.end()) {
                    None => {
                        bump(&re.stats.prefilter_misses);
                        return false;
                    }
                    Some(c) => c,
                };
            bump(&re.stats.prefilter_hits);
            if let Some((pre_min, suf_min)) = self.universal {
                if cs - input.start() >= pre_min
                    && input.end() - ce >= suf_min
                {
                    return true;
                }
                bump(&re.stats.prefilter_abandoned);
                at = cs + 1;
                continue;
            }
            let revin = Input::new(h)
                .span(input.start()..cs)
                .anchored(Anchored::Yes)
                .earliest(true);
            bump(&re.stats.dfa_searches);
            match self.prerev.try_search_rev(&mut state.revdfa, &revin) {
                Ok(Some(hm)) => {
                    let fwdin = Input::new(h)
                        .span(hm.offset()..input.end())
                        .anchored(Anchored::Yes)
                        .earliest(true);
                    if re.core_search(state, &fwdin).is_some() {
                        return true;
                    }
                    bump(&re.stats.prefilter_abandoned);
                    at = cs + 1;
                }
                Ok(None) => {
                    bump(&re.stats.prefilter_abandoned);
                    at = cs + 1;
                }
                Err(err) => {
                    re.note_dfa_error(&err);
                    return re.nfa_search(state, input).is_some();
                }
            }
        }
    }
}

/// `(?m)^prefix.*suffix`: like the suffix searcher, but a candidate is
/// verified against its own line. A known prefix literal gives a cheap
/// rejection at the line start before the reverse DFA runs.
#[derive(Debug)]
pub(crate) struct MultilineSuffix {
    pub(crate) rev: RevDfa,
    candidates: CandidateSearcher,
    line_prefix: Option<Vec<u8>>,
}

impl MultilineSuffix {
    pub(crate) fn new(
        info: &RegexInfo,
        hir: &Hir,
        shape: MultilineShape,
    ) -> Option<MultilineSuffix> {
        let rev = RevDfa::new(info, hir)?;
        let candidates =
            CandidateSearcher::new(&[shape.suffix.clone()])?;
        Some(MultilineSuffix {
            rev,
            candidates,
            line_prefix: shape.line_prefix,
        })
    }

    /// Cheap candidate rejection: the nearest line start must carry the
    /// prefix literal. `(?m)^/.*\.php` tests one byte per candidate.
    fn line_start_ok(
        &self,
        haystack: &[u8],
        search_start: usize,
        candidate_start: usize,
    ) -> bool {
        let prefix = match self.line_prefix {
            None => return true,
            Some(ref prefix) => prefix,
        };
        let line_start = memrchr(b'\n', &haystack[search_start..candidate_start])
            .map(|i| search_start + i + 1)
            .unwrap_or(search_start);
        line_start + prefix.len() <= candidate_start
            && &haystack[line_start..line_start + prefix.len()]
                == prefix.as_slice()
    }

    fn find(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        let h = input.haystack();
        let mut at = input.start();
        loop {
            let (cs, ce) =
                match self.candidates.find(h, at, input.end()) {
                    None => {
                        bump(&re.stats.prefilter_misses);
                        return None;
                    }
                    Some(c) => c,
                };
            bump(&re.stats.prefilter_hits);
            if !self.line_start_ok(h, input.start(), cs) {
                bump(&re.stats.prefilter_abandoned);
                at = cs + 1;
                continue;
            }
            let revin = Input::new(h)
                .span(input.start()..ce)
                .anchored(Anchored::Yes);
            bump(&re.stats.dfa_searches);
            match self.rev.try_search_rev(&mut state.revdfa, &revin) {
                Ok(Some(hm)) => {
                    // The reverse NFA contains the line-start assertion, so
                    // the reported start is a valid line start. Resolve the
                    // greedy end within the line going forward.
                    let fwdin = Input::new(h)
                        .span(hm.offset()..input.end())
                        .anchored(Anchored::Yes);
                    return re.core_search(state, &fwdin);
                }
                Ok(None) => {
                    bump(&re.stats.prefilter_abandoned);
                    at = cs + 1;
                }
                Err(err) => {
                    re.note_dfa_error(&err);
                    return re.nfa_search(state, input);
                }
            }
        }
    }

    fn is_match(
        &self,
        re: &RegexI,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> bool {
        let h = input.haystack();
        let mut at = input.start();
        loop {
            let (cs, ce) =
                match self.candidates.find(h, at, input.end()) {
                    None => {
                        bump(&re.stats.prefilter_misses);
                        return false;
                    }
                    Some(c) => c,
                };
            bump(&re.stats.prefilter_hits);
            if !self.line_start_ok(h, input.start(), cs) {
                bump(&re.stats.prefilter_abandoned);
                at = cs + 1;
                continue;
            }
            let revin = Input::new(h)
                .span(input.start()..ce)
                .anchored(Anchored::Yes)
                .earliest(true);
            bump(&re.stats.dfa_searches);
            match self.rev.try_search_rev(&mut state.revdfa, &revin) {
                Ok(Some(_)) => return true,
                Ok(None) => {
                    bump(&re.stats.prefilter_abandoned);
                    at = cs + 1;
                }
                Err(err) => {
                    re.note_dfa_error(&err);
                    return re.nfa_search(state, input).is_some();
                }
            }
        }
    }
}
