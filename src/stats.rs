use std::sync::atomic::{AtomicU64, Ordering};

/// Search counters, incremented concurrently by every worker sharing a
/// regex. No lock guards them; each is a relaxed atomic add. `AtomicU64`
/// gives the alignment needed for 64-bit atomics on 32-bit hosts.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    pub(crate) nfa_searches: AtomicU64,
    pub(crate) dfa_searches: AtomicU64,
    pub(crate) onepass_searches: AtomicU64,
    pub(crate) aho_corasick_searches: AtomicU64,
    pub(crate) prefilter_hits: AtomicU64,
    pub(crate) prefilter_misses: AtomicU64,
    pub(crate) prefilter_abandoned: AtomicU64,
    pub(crate) dfa_cache_full: AtomicU64,
}

impl Stats {
    pub(crate) fn new() -> Stats {
        Stats::default()
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            nfa_searches: self.nfa_searches.load(Ordering::Relaxed),
            dfa_searches: self.dfa_searches.load(Ordering::Relaxed),
            onepass_searches: self.onepass_searches.load(Ordering::Relaxed),
            aho_corasick_searches: self
                .aho_corasick_searches
                .load(Ordering::Relaxed),
            prefilter_hits: self.prefilter_hits.load(Ordering::Relaxed),
            prefilter_misses: self.prefilter_misses.load(Ordering::Relaxed),
            prefilter_abandoned: self
                .prefilter_abandoned
                .load(Ordering::Relaxed),
            dfa_cache_full: self.dfa_cache_full.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.nfa_searches.store(0, Ordering::Relaxed);
        self.dfa_searches.store(0, Ordering::Relaxed);
        self.onepass_searches.store(0, Ordering::Relaxed);
        self.aho_corasick_searches.store(0, Ordering::Relaxed);
        self.prefilter_hits.store(0, Ordering::Relaxed);
        self.prefilter_misses.store(0, Ordering::Relaxed);
        self.prefilter_abandoned.store(0, Ordering::Relaxed);
        self.dfa_cache_full.store(0, Ordering::Relaxed);
    }
}

/// Convenience for the hot increment sites.
pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// A point-in-time snapshot of a regex's search counters.
///
/// Counters are incremented with relaxed atomics, so a snapshot taken while
/// searches are in flight reflects some interleaving of them, not necessarily
/// a single consistent cut.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatsSnapshot {
    /// Searches answered by the PikeVM or the bounded backtracker.
    pub nfa_searches: u64,
    /// Searches that consulted the lazy DFA.
    pub dfa_searches: u64,
    /// Capture searches answered by the one-pass DFA.
    pub onepass_searches: u64,
    /// Searches answered by an Aho-Corasick automaton, including the Fat
    /// Teddy small-haystack fallback.
    pub aho_corasick_searches: u64,
    /// Candidate positions proposed by a prefilter.
    pub prefilter_hits: u64,
    /// Prefilter scans that found no candidate.
    pub prefilter_misses: u64,
    /// Candidates that failed verification.
    pub prefilter_abandoned: u64,
    /// Lazy DFA searches abandoned because the state cache was thrashing.
    pub dfa_cache_full: u64,
}
