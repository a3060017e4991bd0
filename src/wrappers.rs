/*!
Thin wrappers around the primitive engines.

Each wrapper encapsulates whether its engine was built at all (most are
optional) and the conditions under which it may be used for a given search.
The corresponding cache types mirror the option-ness so a `SearchState` can
be assembled uniformly regardless of which engines exist.
*/

use log::{debug, trace};
use regex_automata::{
    dfa::onepass,
    hybrid,
    nfa::thompson::{self, backtrack, pikevm, WhichCaptures, NFA},
    util::{prefilter::Prefilter, primitives::NonMaxUsize},
    Anchored, HalfMatch, Input, Match, MatchError, MatchKind, PatternID,
};
use regex_syntax::hir::Hir;

use crate::{engine::RegexInfo, error::BuildError};

/// Rough bytes-per-cached-DFA-state, used to translate the configured state
/// bound into the lazy DFA's byte-denominated cache capacity.
const BYTES_PER_DFA_STATE: usize = 64;

pub(crate) fn thompson_config(reverse: bool) -> thompson::Config {
    let which =
        if reverse { WhichCaptures::None } else { WhichCaptures::All };
    thompson::Config::new()
        .utf8(false)
        .reverse(reverse)
        // Reverse NFAs feed DFAs, where a smaller NFA is worth the extra
        // compile work. Forward NFAs are searched directly.
        .shrink(reverse)
        .which_captures(which)
}

pub(crate) fn compile_nfa(
    hir: &Hir,
    reverse: bool,
) -> Result<NFA, thompson::BuildError> {
    thompson::Compiler::new()
        .configure(thompson_config(reverse))
        .build_from_hir(hir)
}

fn hybrid_config(info: &RegexInfo, kind: MatchKind) -> hybrid::dfa::Config {
    let config = info.config();
    let capacity = (config.get_max_dfa_states() as usize)
        .saturating_mul(BYTES_PER_DFA_STATE);
    hybrid::dfa::Config::new()
        .match_kind(kind)
        .unicode_word_boundary(true)
        .cache_capacity(capacity)
        .skip_cache_capacity_check(false)
        // Together these make the lazy DFA give up when it thrashes: after a
        // few cache clears, a search that creates states faster than the
        // configured bytes-per-state threshold quits and the caller falls
        // back to the NFA.
        .minimum_cache_clear_count(Some(3))
        .minimum_bytes_per_state(Some(
            config.get_determinization_limit() as usize
        ))
}

pub(crate) fn is_gaveup(err: &MatchError) -> bool {
    matches!(*err.kind(), regex_automata::MatchErrorKind::GaveUp { .. })
}

#[derive(Debug)]
pub(crate) struct PikeVM(pikevm::PikeVM);

impl PikeVM {
    pub(crate) fn new(
        pre: Option<Prefilter>,
        nfa: &NFA,
        kind: MatchKind,
    ) -> Result<PikeVM, BuildError> {
        let config = pikevm::Config::new().match_kind(kind).prefilter(pre);
        let engine = pikevm::Builder::new()
            .configure(config)
            .build_from_nfa(nfa.clone())
            .map_err(BuildError::nfa)?;
        trace!("PikeVM built ({:?})", kind);
        Ok(PikeVM(engine))
    }

    #[inline(always)]
    pub(crate) fn get(&self) -> &pikevm::PikeVM {
        &self.0
    }

    pub(crate) fn create_cache(&self) -> pikevm::Cache {
        self.0.create_cache()
    }

    #[inline(always)]
    pub(crate) fn search(
        &self,
        cache: &mut pikevm::Cache,
        input: &Input<'_>,
    ) -> Option<Match> {
        let mut slots = [None, None];
        let pid = self.0.search_slots(cache, input, &mut slots)?;
        let start = slots[0]?.get();
        let end = slots[1]?.get();
        Some(Match::new(pid, start..end))
    }
}

#[derive(Debug)]
pub(crate) struct BoundedBacktracker(Option<BoundedBacktrackerEngine>);

impl BoundedBacktracker {
    pub(crate) fn new(
        pre: Option<Prefilter>,
        nfa: &NFA,
    ) -> BoundedBacktracker {
        let config = backtrack::Config::new().prefilter(pre);
        let result = backtrack::Builder::new()
            .configure(config)
            .build_from_nfa(nfa.clone());
        let engine = match result {
            Ok(engine) => engine,
            Err(err) => {
                // The backtracker is an accelerator, never a requirement.
                debug!("BoundedBacktracker failed to build: {}", err);
                return BoundedBacktracker(None);
            }
        };
        trace!("BoundedBacktracker built");
        BoundedBacktracker(Some(BoundedBacktrackerEngine(engine)))
    }

    pub(crate) fn create_cache(&self) -> BoundedBacktrackerCache {
        BoundedBacktrackerCache(
            self.0.as_ref().map(|e| e.0.create_cache()),
        )
    }

    /// Hands out the engine only when it can actually run this search.
    ///
    /// The backtracker blindly mushes forward, so "earliest" searches are
    /// better served by engines that can stop sooner. And an input beyond
    /// its visited-set capacity would only produce an error.
    #[inline(always)]
    pub(crate) fn get(
        &self,
        input: &Input<'_>,
    ) -> Option<&BoundedBacktrackerEngine> {
        let engine = self.0.as_ref()?;
        if input.get_earliest() {
            return None;
        }
        if input.get_span().len() > engine.0.max_haystack_len() {
            return None;
        }
        Some(engine)
    }
}

#[derive(Debug)]
pub(crate) struct BoundedBacktrackerEngine(backtrack::BoundedBacktracker);

impl BoundedBacktrackerEngine {
    #[inline(always)]
    pub(crate) fn try_search(
        &self,
        cache: &mut BoundedBacktrackerCache,
        input: &Input<'_>,
    ) -> Result<Option<Match>, MatchError> {
        let mut slots = [None, None];
        let pid =
            self.0.try_search_slots(cache.expect_mut(), input, &mut slots)?;
        Ok(pid.and_then(|pid| {
            let start = slots[0]?.get();
            let end = slots[1]?.get();
            Some(Match::new(pid, start..end))
        }))
    }

    #[inline(always)]
    pub(crate) fn try_search_slots(
        &self,
        cache: &mut BoundedBacktrackerCache,
        input: &Input<'_>,
        slots: &mut [Option<NonMaxUsize>],
    ) -> Result<Option<PatternID>, MatchError> {
        self.0.try_search_slots(cache.expect_mut(), input, slots)
    }
}

#[derive(Debug)]
pub(crate) struct BoundedBacktrackerCache(Option<backtrack::Cache>);

impl BoundedBacktrackerCache {
    pub(crate) fn none() -> BoundedBacktrackerCache {
        BoundedBacktrackerCache(None)
    }

    fn expect_mut(&mut self) -> &mut backtrack::Cache {
        self.0.as_mut().expect("backtracker cache must exist when engine does")
    }
}

#[derive(Debug)]
pub(crate) struct OnePass(Option<OnePassEngine>);

impl OnePass {
    pub(crate) fn new(info: &RegexInfo, nfa: &NFA) -> OnePass {
        // Without explicit groups there is nothing the one-pass DFA answers
        // faster than the lazy DFA; it exists to decide capture positions
        // without backtracking.
        if info.analysis().explicit_captures == 0 {
            return OnePass(None);
        }
        let config = onepass::Config::new()
            .match_kind(MatchKind::LeftmostFirst)
            .starts_for_each_pattern(true);
        let result = onepass::Builder::new()
            .configure(config)
            .build_from_nfa(nfa.clone());
        let engine = match result {
            Ok(engine) => engine,
            Err(err) => {
                // Expected to fail often: most regexes aren't one-pass.
                debug!("OnePass failed to build: {}", err);
                return OnePass(None);
            }
        };
        trace!("OnePass built");
        OnePass(Some(OnePassEngine(engine)))
    }

    pub(crate) fn create_cache(&self) -> OnePassCache {
        OnePassCache(self.0.as_ref().map(|e| e.0.create_cache()))
    }

    /// The one-pass DFA only supports anchored searches.
    #[inline(always)]
    pub(crate) fn get(&self, input: &Input<'_>) -> Option<&OnePassEngine> {
        let engine = self.0.as_ref()?;
        if !input.get_anchored().is_anchored() {
            return None;
        }
        Some(engine)
    }
}

#[derive(Debug)]
pub(crate) struct OnePassEngine(onepass::DFA);

impl OnePassEngine {
    #[inline(always)]
    pub(crate) fn try_search_slots(
        &self,
        cache: &mut OnePassCache,
        input: &Input<'_>,
        slots: &mut [Option<NonMaxUsize>],
    ) -> Result<Option<PatternID>, MatchError> {
        let cache = cache
            .0
            .as_mut()
            .expect("one-pass cache must exist when engine does");
        self.0.try_search_slots(cache, input, slots)
    }
}

#[derive(Debug)]
pub(crate) struct OnePassCache(Option<onepass::Cache>);

#[derive(Debug)]
pub(crate) struct Hybrid(Option<HybridEngine>);

impl Hybrid {
    pub(crate) fn none() -> Hybrid {
        Hybrid(None)
    }

    /// Builds the lazy forward DFA, plus the reverse DFA needed to resolve
    /// match starts when `nfarev` is given. Callers that only ever run
    /// anchored searches (the reverse searchers resolving ends) skip the
    /// reverse half.
    pub(crate) fn new(
        info: &RegexInfo,
        pre: Option<Prefilter>,
        nfa: &NFA,
        nfarev: Option<&NFA>,
    ) -> Hybrid {
        Hybrid(HybridEngine::new(info, pre, nfa, nfarev))
    }

    pub(crate) fn is_some(&self) -> bool {
        self.0.is_some()
    }

    pub(crate) fn create_cache(&self) -> HybridCache {
        HybridCache {
            fwd: self.0.as_ref().map(|e| e.fwd.create_cache()),
            rev: self
                .0
                .as_ref()
                .and_then(|e| e.rev.as_ref())
                .map(|rev| rev.create_cache()),
        }
    }

    /// A forward-only DFA cannot resolve the start of an unanchored match,
    /// so it is only handed out for anchored searches.
    #[inline(always)]
    pub(crate) fn get(&self, input: &Input<'_>) -> Option<&HybridEngine> {
        let engine = self.0.as_ref()?;
        if !input.get_anchored().is_anchored() && engine.rev.is_none() {
            return None;
        }
        Some(engine)
    }
}

#[derive(Debug)]
pub(crate) struct HybridEngine {
    fwd: hybrid::dfa::DFA,
    rev: Option<hybrid::dfa::DFA>,
}

impl HybridEngine {
    fn new(
        info: &RegexInfo,
        pre: Option<Prefilter>,
        nfa: &NFA,
        nfarev: Option<&NFA>,
    ) -> Option<HybridEngine> {
        if !info.config().get_dfa() {
            return None;
        }
        let fwd_config = hybrid_config(info, MatchKind::LeftmostFirst)
            .prefilter(pre.clone())
            .specialize_start_states(pre.is_some());
        let fwd = match hybrid::dfa::Builder::new()
            .configure(fwd_config)
            .build_from_nfa(nfa.clone())
        {
            Ok(fwd) => fwd,
            Err(err) => {
                debug!("forward lazy DFA failed to build: {}", err);
                return None;
            }
        };
        let rev = match nfarev {
            None => None,
            Some(nfarev) => {
                // MatchKind::All makes the reverse scan keep going to the
                // leftmost possible start instead of stopping at the first
                // match state.
                let rev_config = hybrid_config(info, MatchKind::All);
                match hybrid::dfa::Builder::new()
                    .configure(rev_config)
                    .build_from_nfa(nfarev.clone())
                {
                    Ok(rev) => Some(rev),
                    Err(err) => {
                        debug!("reverse lazy DFA failed to build: {}", err);
                        return None;
                    }
                }
            }
        };
        trace!("lazy DFA built (reverse: {})", rev.is_some());
        Some(HybridEngine { fwd, rev })
    }

    /// Full leftmost search: forward scan for the end, then (for unanchored
    /// searches) a reverse scan pinned at the end for the start.
    #[inline(always)]
    pub(crate) fn try_search(
        &self,
        cache: &mut HybridCache,
        input: &Input<'_>,
    ) -> Result<Option<Match>, MatchError> {
        let fwdcache =
            cache.fwd.as_mut().expect("hybrid cache must exist");
        let end = match self.fwd.try_search_fwd(fwdcache, input)? {
            None => return Ok(None),
            Some(hm) => hm,
        };
        if input.get_anchored().is_anchored() {
            return Ok(Some(Match::new(
                end.pattern(),
                input.start()..end.offset(),
            )));
        }
        let rev = self
            .rev
            .as_ref()
            .expect("unanchored hybrid search requires a reverse DFA");
        let revcache =
            cache.rev.as_mut().expect("hybrid reverse cache must exist");
        let revin = Input::new(input.haystack())
            .span(input.start()..end.offset())
            .anchored(Anchored::Yes);
        let start = rev
            .try_search_rev(revcache, &revin)?
            .expect("reverse search must match if forward search does");
        Ok(Some(Match::new(end.pattern(), start.offset()..end.offset())))
    }

    /// Forward-only scan; enough for "is there a match" and for callers that
    /// already know the start.
    #[inline(always)]
    pub(crate) fn try_search_half_fwd(
        &self,
        cache: &mut HybridCache,
        input: &Input<'_>,
    ) -> Result<Option<HalfMatch>, MatchError> {
        let fwdcache =
            cache.fwd.as_mut().expect("hybrid cache must exist");
        self.fwd.try_search_fwd(fwdcache, input)
    }
}

#[derive(Debug)]
pub(crate) struct HybridCache {
    fwd: Option<hybrid::dfa::Cache>,
    rev: Option<hybrid::dfa::Cache>,
}


/// A reverse NFA plus the lazy DFA over it, owned by one of the reverse
/// searchers. Built with `MatchKind::All` so a reverse scan reports the
/// leftmost start a match could have.
#[derive(Debug)]
pub(crate) struct RevDfa {
    dfa: hybrid::dfa::DFA,
}

impl RevDfa {
    pub(crate) fn new(info: &RegexInfo, hir: &Hir) -> Option<RevDfa> {
        if !info.config().get_dfa() {
            return None;
        }
        let nfarev = match compile_nfa(hir, true) {
            Ok(nfarev) => nfarev,
            Err(err) => {
                debug!("reverse NFA failed to build: {}", err);
                return None;
            }
        };
        let config = hybrid_config(info, MatchKind::All);
        let dfa = match hybrid::dfa::Builder::new()
            .configure(config)
            .build_from_nfa(nfarev)
        {
            Ok(dfa) => dfa,
            Err(err) => {
                debug!("reverse lazy DFA failed to build: {}", err);
                return None;
            }
        };
        trace!("reverse lazy DFA built");
        Some(RevDfa { dfa })
    }

    pub(crate) fn create_cache(&self) -> RevDfaCache {
        RevDfaCache(Some(self.dfa.create_cache()))
    }

    /// Scans `input` right to left without allocating a reversed copy of
    /// the haystack. Returns the start offset of the leftmost-starting
    /// match whose end is pinned at `input.end()` (when anchored).
    #[inline(always)]
    pub(crate) fn try_search_rev(
        &self,
        cache: &mut RevDfaCache,
        input: &Input<'_>,
    ) -> Result<Option<HalfMatch>, MatchError> {
        let cache =
            cache.0.as_mut().expect("reverse DFA cache must exist");
        self.dfa.try_search_rev(cache, input)
    }
}

#[derive(Debug)]
pub(crate) struct RevDfaCache(Option<hybrid::dfa::Cache>);

impl RevDfaCache {
    pub(crate) fn none() -> RevDfaCache {
        RevDfaCache(None)
    }
}
