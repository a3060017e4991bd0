/*!
The meta engine itself: compile-once construction, the per-verb dispatch on
the strategy tag, and the state pool that makes one compiled regex usable
from any number of threads.
*/

use std::panic::{RefUnwindSafe, UnwindSafe};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, trace};
use regex_automata::{
    nfa::thompson::{pikevm, NFA},
    util::{
        captures::Captures,
        pool::{Pool, PoolGuard},
        prefilter::Prefilter,
        primitives::NonMaxUsize,
    },
    Anchored, Input, MatchError, MatchKind, PatternID, Span,
};
use regex_syntax::hir::Hir;

use crate::{
    analysis::{self, Analysis},
    classes::{BranchDispatcher, CharClassSearcher, CompositeSearcher},
    config::Config,
    error::BuildError,
    literal::AnchoredLiteral,
    prefilter::{self, MultiLiteral},
    reverse::{self, ReverseSearcher},
    stats::{bump, Stats, StatsSnapshot},
    strategy::{self, Strategy},
    wrappers,
};

/// The read-only configuration and analysis shared by every component of a
/// compiled regex.
#[derive(Clone, Debug)]
pub(crate) struct RegexInfo(Arc<RegexInfoI>);

#[derive(Debug)]
struct RegexInfoI {
    config: Config,
    analysis: Analysis,
}

impl RegexInfo {
    pub(crate) fn new(config: Config, analysis: Analysis) -> RegexInfo {
        RegexInfo(Arc::new(RegexInfoI { config, analysis }))
    }

    pub(crate) fn config(&self) -> &Config {
        &self.0.config
    }

    pub(crate) fn analysis(&self) -> &Analysis {
        &self.0.analysis
    }
}

/// A single match in a haystack.
///
/// Carries the span and a reference to the haystack it was found in;
/// producing one allocates nothing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Match<'h> {
    haystack: &'h [u8],
    start: usize,
    end: usize,
}

impl<'h> Match<'h> {
    fn new(haystack: &'h [u8], span: Span) -> Match<'h> {
        Match { haystack, start: span.start, end: span.end }
    }

    /// The byte offset where the match begins.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The byte offset immediately past the end of the match.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> core::ops::Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// The matched bytes.
    pub fn as_bytes(&self) -> &'h [u8] {
        &self.haystack[self.start..self.end]
    }
}

type StatePoolFn =
    Box<dyn Fn() -> SearchState + Send + Sync + UnwindSafe + RefUnwindSafe>;
type StatePool = Pool<SearchState, StatePoolFn>;

/// A compiled regex.
///
/// Compilation analyzes the pattern once, picks the most efficient of the
/// sixteen execution strategies, and materializes only the engines that
/// strategy needs. After that the value is immutable (statistics counters
/// aside) and may be shared freely across threads; per-search scratch lives
/// in an internal pool.
pub struct Regex {
    imp: Arc<RegexI>,
    pool: StatePool,
}

impl Regex {
    /// Compile a pattern with the default configuration.
    pub fn new(pattern: &str) -> Result<Regex, BuildError> {
        Regex::builder().build(pattern)
    }

    pub fn config() -> Config {
        Config::new()
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Whether the pattern matches anywhere in the haystack.
    ///
    /// Short-circuits at the first position known to be inside a match.
    pub fn is_match<H: ?Sized + AsRef<[u8]>>(&self, haystack: &H) -> bool {
        self.is_match_at(haystack, 0)
    }

    /// Like [`Regex::is_match`], but only considers matches beginning at or
    /// after `at`.
    pub fn is_match_at<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
        at: usize,
    ) -> bool {
        let haystack = haystack.as_ref();
        if at > haystack.len() {
            return false;
        }
        if at > 0 && self.imp.info.analysis().start_anchored {
            return false;
        }
        let mut state = self.pool.get();
        let input =
            Input::new(haystack).span(at..haystack.len()).earliest(true);
        self.imp.is_match_imp(&mut state, &input)
    }

    /// The leftmost match, if any.
    pub fn find<'h, H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &'h H,
    ) -> Option<Match<'h>> {
        self.find_at(haystack, 0)
    }

    /// The leftmost match beginning at or after `at`. Offsets in the
    /// returned match are absolute, not relative to `at`.
    pub fn find_at<'h, H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &'h H,
        at: usize,
    ) -> Option<Match<'h>> {
        let haystack = haystack.as_ref();
        if at > haystack.len() {
            return None;
        }
        if at > 0 && self.imp.info.analysis().start_anchored {
            // A start-anchored pattern can only match at offset zero.
            return None;
        }
        let mut state = self.pool.get();
        let input = Input::new(haystack).span(at..haystack.len());
        let span = self.imp.search(&mut state, &input)?;
        Some(Match::new(haystack, span))
    }

    /// Like [`Regex::find`], but returns only the offsets.
    pub fn find_indices<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
    ) -> Option<(usize, usize)> {
        self.find_indices_at(haystack, 0)
    }

    pub fn find_indices_at<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
        at: usize,
    ) -> Option<(usize, usize)> {
        self.find_at(haystack, at).map(|m| (m.start(), m.end()))
    }

    /// An iterator over every non-overlapping match.
    pub fn find_iter<'r, 'h, H: ?Sized + AsRef<[u8]>>(
        &'r self,
        haystack: &'h H,
    ) -> FindMatches<'r, 'h> {
        FindMatches {
            imp: &self.imp,
            state: self.pool.get(),
            haystack: haystack.as_ref(),
            it: SpanIter::new(),
        }
    }

    /// Collects the spans of every non-overlapping match, up to `limit`
    /// when one is given.
    pub fn find_all_indices<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
        limit: Option<usize>,
    ) -> Vec<(usize, usize)> {
        let mut sink = vec![];
        self.find_all_indices_into(haystack, limit, &mut sink);
        sink
    }

    /// Like [`Regex::find_all_indices`], but appends into a caller-provided
    /// sink so the whole scan can run without allocating.
    pub fn find_all_indices_into<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
        limit: Option<usize>,
        sink: &mut Vec<(usize, usize)>,
    ) {
        if limit == Some(0) {
            return;
        }
        let haystack = haystack.as_ref();
        let mut state = self.pool.get();
        let mut it = SpanIter::new();
        let mut count = 0;
        while let Some(span) = it.next(&self.imp, &mut state, haystack) {
            sink.push((span.start, span.end));
            count += 1;
            if limit.map_or(false, |limit| count >= limit) {
                return;
            }
        }
    }

    /// The number of non-overlapping matches, up to `limit` when one is
    /// given. One piece of per-search state is acquired for the whole loop.
    pub fn count<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
        limit: Option<usize>,
    ) -> usize {
        if limit == Some(0) {
            return 0;
        }
        let haystack = haystack.as_ref();
        let mut state = self.pool.get();
        let mut it = SpanIter::new();
        let mut count = 0;
        while it.next(&self.imp, &mut state, haystack).is_some() {
            count += 1;
            if limit.map_or(false, |limit| count >= limit) {
                break;
            }
        }
        count
    }

    /// The leftmost match with all capture groups resolved.
    ///
    /// Prefers the one-pass DFA when it exists; it resolves captures in one
    /// deterministic scan instead of backtracking.
    pub fn captures<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
    ) -> Option<Captures> {
        self.captures_at(haystack, 0)
    }

    pub fn captures_at<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
        at: usize,
    ) -> Option<Captures> {
        let haystack = haystack.as_ref();
        if at > haystack.len() {
            return None;
        }
        if at > 0 && self.imp.info.analysis().start_anchored {
            return None;
        }
        let mut caps = self.create_captures();
        let mut state = self.pool.get();
        let input = Input::new(haystack).span(at..haystack.len());
        self.imp.search_captures(&mut state, &input, &mut caps);
        if caps.is_match() {
            Some(caps)
        } else {
            None
        }
    }

    /// Fresh, empty capture storage sized for this regex.
    pub fn create_captures(&self) -> Captures {
        Captures::all(self.imp.nfa.group_info().clone())
    }

    /// The strategy chosen at compile time. Stable for the life of the
    /// value; its display form is a stable diagnostic string.
    pub fn strategy(&self) -> Strategy {
        self.imp.strategy
    }

    /// Whether every match must begin at offset zero.
    pub fn is_start_anchored(&self) -> bool {
        self.imp.info.analysis().start_anchored
    }

    /// A point-in-time snapshot of the search counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.imp.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.imp.stats.reset();
    }

    /// Number of capture groups, including the implicit whole-match group.
    pub fn capture_len(&self) -> usize {
        self.imp.nfa.group_info().group_len(PatternID::ZERO)
    }

    /// The capture group names, `None` for unnamed groups. Index 0 is the
    /// implicit whole-match group.
    pub fn capture_names(
        &self,
    ) -> impl Iterator<Item = Option<&str>> + '_ {
        let group_info = self.imp.nfa.group_info();
        (0..group_info.group_len(PatternID::ZERO))
            .map(move |i| group_info.to_name(PatternID::ZERO, i))
    }

    /// Switches between leftmost-first (default) and leftmost-longest match
    /// semantics. For `a|ab` against `ab`, leftmost-first reports `a`,
    /// leftmost-longest `ab`.
    ///
    /// Intended for test setup: callers must not race this with in-flight
    /// searches.
    pub fn set_longest(&self, yes: bool) {
        self.imp.longest.store(yes, Ordering::SeqCst);
    }

    pub fn get_longest(&self) -> bool {
        self.imp.longest.load(Ordering::SeqCst)
    }

    /// The pattern this regex was compiled from.
    pub fn pattern(&self) -> &str {
        &self.imp.pattern
    }
}

impl Clone for Regex {
    fn clone(&self) -> Regex {
        // The read-only component is shared; the pool is not, which gives
        // the clone its own thread-owner fast path.
        let imp = Arc::clone(&self.imp);
        let pool = new_pool(&imp);
        Regex { imp, pool }
    }
}

impl core::fmt::Debug for Regex {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Regex")
            .field("pattern", &self.imp.pattern)
            .field("strategy", &self.imp.strategy)
            .finish()
    }
}

fn new_pool(imp: &Arc<RegexI>) -> StatePool {
    let imp = Arc::clone(imp);
    let create: StatePoolFn = Box::new(move || SearchState::new(&imp));
    Pool::new(create)
}

/// Builder for a [`Regex`] with a non-default configuration.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { config: Config::default() }
    }

    pub fn configure(&mut self, config: Config) -> &mut Builder {
        self.config = self.config.overwrite(config);
        self
    }

    pub fn build(&self, pattern: &str) -> Result<Regex, BuildError> {
        self.config.validate()?;
        let hir = regex_syntax::ParserBuilder::new()
            .nest_limit(self.config.get_max_recursion_depth())
            .utf8(false)
            .build()
            .parse(pattern)
            .map_err(BuildError::syntax)?;
        let analysis = Analysis::new(&hir);
        let info = RegexInfo::new(self.config.clone(), analysis);
        let nfa =
            wrappers::compile_nfa(&hir, false).map_err(BuildError::nfa)?;
        let imp = Arc::new(RegexI::new(info, pattern, &hir, nfa)?);
        let pool = new_pool(&imp);
        Ok(Regex { imp, pool })
    }
}

/// ASCII variants of the NFA engines, built only for patterns containing
/// the any-byte metacharacter and consulted only for pure-ASCII haystacks.
#[derive(Debug)]
pub(crate) struct AsciiEngines {
    pub(crate) pikevm: wrappers::PikeVM,
    pub(crate) backtrack: wrappers::BoundedBacktracker,
}

/// The read-only interior of a compiled regex. Everything here except
/// `stats` and `longest` is immutable after construction.
pub(crate) struct RegexI {
    pub(crate) info: RegexInfo,
    pattern: String,
    strategy: Strategy,
    nfa: NFA,
    pikevm: wrappers::PikeVM,
    /// A second PikeVM in `MatchKind::All` mode; resolves leftmost-longest
    /// spans and slots once the leftmost start is known.
    pikevm_all: wrappers::PikeVM,
    backtrack: wrappers::BoundedBacktracker,
    onepass: wrappers::OnePass,
    hybrid: wrappers::Hybrid,
    ascii: Option<AsciiEngines>,
    literal: Option<AnchoredLiteral>,
    branch: Option<BranchDispatcher>,
    charclass: Option<CharClassSearcher>,
    composite: Option<CompositeSearcher>,
    multi: Option<MultiLiteral>,
    reverse: Option<ReverseSearcher>,
    pub(crate) stats: Stats,
    longest: AtomicBool,
}

impl core::fmt::Debug for RegexI {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("RegexI")
            .field("pattern", &self.pattern)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl RegexI {
    fn new(
        info: RegexInfo,
        pattern: &str,
        hir: &Hir,
        nfa: NFA,
    ) -> Result<RegexI, BuildError> {
        let mut strategy = strategy::choose(&info, hir, &nfa);
        debug!("strategy {} selected for {:?}", strategy, pattern);

        let mut literal = None;
        let mut branch = None;
        let mut charclass = None;
        let mut composite = None;
        let mut multi = None;
        let mut rev = None;
        // Build what the tag needs. A builder that comes up empty
        // downgrades the tag and loops; the chain always terminates in one
        // of the core tags, which need nothing beyond the universal
        // engines.
        let strategy = loop {
            match strategy {
                Strategy::AnchoredLiteral => {
                    match AnchoredLiteral::new(hir) {
                        Some(l) => {
                            literal = Some(l);
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::BranchDispatch => {
                    match BranchDispatcher::new(info.analysis(), hir) {
                        Some(b) => {
                            branch = Some(b);
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::CharClassSearcher => {
                    match CharClassSearcher::new(hir) {
                        Some(s) => {
                            charclass = Some(s);
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::CompositeSearcher => {
                    match CompositeSearcher::new(hir) {
                        Some(s) => {
                            composite = Some(s);
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::Teddy => {
                    let lits =
                        analysis::alternation_literals(info.analysis(), hir);
                    match lits.as_deref().and_then(MultiLiteral::teddy) {
                        Some(m) => {
                            multi = Some(m);
                            break strategy;
                        }
                        None => {
                            debug!("Teddy unavailable, trying Aho-Corasick");
                            strategy = Strategy::AhoCorasick;
                        }
                    }
                }
                Strategy::AhoCorasick => {
                    let lits =
                        analysis::alternation_literals(info.analysis(), hir);
                    match lits.as_deref().and_then(MultiLiteral::aho_corasick)
                    {
                        Some(m) => {
                            multi = Some(m);
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::ReverseAnchored => {
                    match reverse::ReverseAnchored::new(&info, hir) {
                        Some(s) => {
                            rev = Some(ReverseSearcher::Anchored(s));
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::ReverseSuffix | Strategy::ReverseSuffixSet => {
                    let searcher = reverse::suffix_shape(&info, hir)
                        .and_then(|shape| {
                            reverse::ReverseSuffix::new(&info, hir, shape)
                        });
                    match searcher {
                        Some(s) => {
                            rev = Some(ReverseSearcher::Suffix(s));
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::ReverseInner => {
                    let searcher = reverse::inner_shape(&info, hir)
                        .and_then(|shape| {
                            reverse::ReverseInner::new(&info, hir, shape)
                        });
                    match searcher {
                        Some(s) => {
                            rev = Some(ReverseSearcher::Inner(s));
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::MultilineReverseSuffix => {
                    let searcher =
                        reverse::multiline_suffix_shape(&info, hir)
                            .and_then(|shape| {
                                reverse::MultilineSuffix::new(
                                    &info, hir, shape,
                                )
                            });
                    match searcher {
                        Some(s) => {
                            rev = Some(ReverseSearcher::MultilineSuffix(s));
                            break strategy;
                        }
                        None => strategy = strategy::core(&info, hir, &nfa),
                    }
                }
                Strategy::DigitPrefilter
                | Strategy::BoundedBacktracker
                | Strategy::Nfa
                | Strategy::Both
                | Strategy::Dfa => break strategy,
            }
        };

        // A prefilter leads the lazy DFA only for the core DFA strategies.
        // Building one from the prefix of a start-anchored pattern would
        // match anywhere and bypass the anchor; `prefix_prefilter` refuses.
        let pre = match strategy {
            Strategy::Dfa | Strategy::Both => prefix_prefilter(&info, hir),
            _ => None,
        };
        let pikevm =
            wrappers::PikeVM::new(pre.clone(), &nfa, MatchKind::LeftmostFirst)?;
        let pikevm_all = wrappers::PikeVM::new(None, &nfa, MatchKind::All)?;
        let backtrack = wrappers::BoundedBacktracker::new(pre.clone(), &nfa);
        let onepass = wrappers::OnePass::new(&info, &nfa);
        let ascii = build_ascii(&info, hir);

        let (hybrid, strategy) = match strategy {
            Strategy::Dfa | Strategy::Both => {
                let hybrid = match wrappers::compile_nfa(hir, true) {
                    Ok(nfarev) => wrappers::Hybrid::new(
                        &info,
                        pre.clone(),
                        &nfa,
                        Some(&nfarev),
                    ),
                    Err(err) => {
                        debug!("reverse NFA failed to build: {}", err);
                        wrappers::Hybrid::none()
                    }
                };
                if hybrid.is_some() {
                    (hybrid, strategy)
                } else {
                    debug!("lazy DFA unavailable, degrading to NFA");
                    (wrappers::Hybrid::none(), Strategy::Nfa)
                }
            }
            // The suffix/inner searchers resolve match ends with a forward
            // scan that is always anchored, so the forward half alone
            // suffices.
            Strategy::ReverseSuffix
            | Strategy::ReverseSuffixSet
            | Strategy::ReverseInner
            | Strategy::MultilineReverseSuffix => {
                (wrappers::Hybrid::new(&info, None, &nfa, None), strategy)
            }
            _ => (wrappers::Hybrid::none(), strategy),
        };
        debug!("strategy {} built for {:?}", strategy, pattern);

        Ok(RegexI {
            info,
            pattern: pattern.to_string(),
            strategy,
            nfa,
            pikevm,
            pikevm_all,
            backtrack,
            onepass,
            hybrid,
            ascii,
            literal,
            branch,
            charclass,
            composite,
            multi,
            reverse: rev,
            stats: Stats::new(),
            longest: AtomicBool::new(false),
        })
    }

    fn longest(&self) -> bool {
        self.longest.load(Ordering::Relaxed)
    }

    /// The main span search: one dispatch arm per strategy tag.
    pub(crate) fn search(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        if self.longest() {
            return self.search_longest(state, input);
        }
        match self.strategy {
            Strategy::AnchoredLiteral => {
                if input.start() > 0 {
                    return None;
                }
                let lit = self
                    .literal
                    .as_ref()
                    .expect("anchored-literal strategy has literal info");
                lit.find(input.haystack())
                    .map(|(start, end)| Span { start, end })
            }
            Strategy::BranchDispatch => {
                let branch = self
                    .branch
                    .as_ref()
                    .expect("branch-dispatch strategy has dispatcher");
                branch
                    .find(input.haystack(), input.start(), input.end())
                    .map(|(start, end)| Span { start, end })
            }
            Strategy::CharClassSearcher => {
                let searcher = self
                    .charclass
                    .as_ref()
                    .expect("char-class strategy has searcher");
                searcher
                    .find(input.haystack(), input.start(), input.end())
                    .map(|(start, end)| Span { start, end })
            }
            Strategy::CompositeSearcher => {
                let searcher = self
                    .composite
                    .as_ref()
                    .expect("composite strategy has searcher");
                searcher
                    .find(input.haystack(), input.start(), input.end())
                    .map(|(start, end)| Span { start, end })
            }
            Strategy::Teddy | Strategy::AhoCorasick => {
                let multi = self
                    .multi
                    .as_ref()
                    .expect("literal-alternation strategy has searcher");
                multi
                    .find(
                        input.haystack(),
                        input.start(),
                        input.end(),
                        &self.stats,
                    )
                    .map(|(start, end)| Span { start, end })
            }
            Strategy::DigitPrefilter => self.digit_search(state, input),
            Strategy::ReverseAnchored
            | Strategy::ReverseSuffix
            | Strategy::ReverseSuffixSet
            | Strategy::ReverseInner
            | Strategy::MultilineReverseSuffix => {
                let rev = self
                    .reverse
                    .as_ref()
                    .expect("reverse strategy has searcher");
                rev.find(self, state, input)
            }
            Strategy::BoundedBacktracker
            | Strategy::Nfa
            | Strategy::Dfa
            | Strategy::Both => self.core_search(state, input),
        }
    }

    pub(crate) fn is_match_imp(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> bool {
        match self.strategy {
            Strategy::AnchoredLiteral => {
                let lit = self
                    .literal
                    .as_ref()
                    .expect("anchored-literal strategy has literal info");
                input.start() == 0 && lit.is_match(input.haystack())
            }
            Strategy::BranchDispatch => {
                let branch = self
                    .branch
                    .as_ref()
                    .expect("branch-dispatch strategy has dispatcher");
                branch
                    .find(input.haystack(), input.start(), input.end())
                    .is_some()
            }
            Strategy::CharClassSearcher => {
                let searcher = self
                    .charclass
                    .as_ref()
                    .expect("char-class strategy has searcher");
                searcher.is_match(
                    input.haystack(),
                    input.start(),
                    input.end(),
                )
            }
            Strategy::CompositeSearcher => {
                let searcher = self
                    .composite
                    .as_ref()
                    .expect("composite strategy has searcher");
                searcher.is_match(
                    input.haystack(),
                    input.start(),
                    input.end(),
                )
            }
            // A complete literal searcher's find is the whole answer.
            Strategy::Teddy | Strategy::AhoCorasick => {
                let multi = self
                    .multi
                    .as_ref()
                    .expect("literal-alternation strategy has searcher");
                multi.is_match(
                    input.haystack(),
                    input.start(),
                    input.end(),
                    &self.stats,
                )
            }
            Strategy::DigitPrefilter => {
                self.digit_search(state, input).is_some()
            }
            Strategy::ReverseAnchored
            | Strategy::ReverseSuffix
            | Strategy::ReverseSuffixSet
            | Strategy::ReverseInner
            | Strategy::MultilineReverseSuffix => {
                let rev = self
                    .reverse
                    .as_ref()
                    .expect("reverse strategy has searcher");
                rev.is_match(self, state, input)
            }
            Strategy::BoundedBacktracker
            | Strategy::Nfa
            | Strategy::Dfa
            | Strategy::Both => self.core_is_match(state, input),
        }
    }

    /// DFA-first search with transparent NFA fallback. Reverse searchers
    /// also land here for end resolution with anchored inputs.
    pub(crate) fn core_search(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        if let Some(e) = self.hybrid.get(input) {
            bump(&self.stats.dfa_searches);
            match e.try_search(&mut state.hybrid, input) {
                Ok(m) => {
                    return m.map(|m| Span { start: m.start(), end: m.end() })
                }
                Err(err) => self.note_dfa_error(&err),
            }
        }
        self.nfa_search(state, input)
    }

    fn core_is_match(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> bool {
        if let Some(e) = self.hybrid.get(input) {
            bump(&self.stats.dfa_searches);
            match e.try_search_half_fwd(&mut state.hybrid, input) {
                Ok(m) => return m.is_some(),
                Err(err) => self.note_dfa_error(&err),
            }
        }
        self.nfa_search(state, input).is_some()
    }

    /// The infallible path: backtracker when it can take the input, PikeVM
    /// otherwise. Routes to the ASCII variants when they exist and the
    /// haystack is certified pure ASCII; both gates must hold.
    pub(crate) fn nfa_search(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        if let Some(ref ascii) = self.ascii {
            if input.haystack().is_ascii() {
                return self.ascii_search(ascii, state, input);
            }
        }
        if let Some(e) = self.backtrack.get(input) {
            bump(&self.stats.nfa_searches);
            match e.try_search(&mut state.backtrack, input) {
                Ok(m) => {
                    return m.map(|m| Span { start: m.start(), end: m.end() })
                }
                Err(err) => {
                    trace!("backtracker declined search: {}", err);
                }
            }
        }
        bump(&self.stats.nfa_searches);
        self.pikevm
            .search(&mut state.pikevm, input)
            .map(|m| Span { start: m.start(), end: m.end() })
    }

    fn ascii_search(
        &self,
        ascii: &AsciiEngines,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        if let Some(e) = ascii.backtrack.get(input) {
            bump(&self.stats.nfa_searches);
            match e.try_search(&mut state.ascii_backtrack, input) {
                Ok(m) => {
                    return m.map(|m| Span { start: m.start(), end: m.end() })
                }
                Err(err) => {
                    trace!("ASCII backtracker declined search: {}", err);
                }
            }
        }
        bump(&self.stats.nfa_searches);
        let cache = state
            .ascii_pikevm
            .as_mut()
            .expect("ASCII cache must exist when ASCII engines do");
        ascii
            .pikevm
            .search(cache, input)
            .map(|m| Span { start: m.start(), end: m.end() })
    }

    pub(crate) fn note_dfa_error(&self, err: &MatchError) {
        if wrappers::is_gaveup(err) {
            bump(&self.stats.dfa_cache_full);
        }
        trace!("lazy DFA failed, using fallback: {}", err);
    }

    /// Candidate loop for digit-lead patterns: jump to the next digit,
    /// attempt an anchored match there, advance on failure. Every match of
    /// a digit-lead pattern starts at a digit, so scanning candidates in
    /// order preserves leftmost semantics.
    fn digit_search(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        let haystack = input.haystack();
        let mut at = input.start();
        loop {
            let cand =
                match prefilter::find_digit(haystack, at, input.end()) {
                    None => {
                        bump(&self.stats.prefilter_misses);
                        return None;
                    }
                    Some(cand) => cand,
                };
            bump(&self.stats.prefilter_hits);
            let attempt = Input::new(haystack)
                .span(cand..input.end())
                .anchored(Anchored::Yes)
                .earliest(input.get_earliest());
            if let Some(span) = self.nfa_search(state, &attempt) {
                return Some(span);
            }
            bump(&self.stats.prefilter_abandoned);
            at = cand + 1;
        }
    }

    /// Leftmost-longest: find the leftmost start with the default engines,
    /// then let the `MatchKind::All` PikeVM run every thread to death from
    /// that start; the last match standing is the longest.
    fn search_longest(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
    ) -> Option<Span> {
        bump(&self.stats.nfa_searches);
        let first = self.pikevm.search(&mut state.pikevm, input)?;
        let revised = Input::new(input.haystack())
            .span(first.start()..input.end())
            .anchored(Anchored::Yes);
        bump(&self.stats.nfa_searches);
        let longest = self
            .pikevm_all
            .search(&mut state.pikevm_all, &revised)
            .expect("anchored search at a known match start must match");
        Some(Span { start: first.start(), end: longest.end() })
    }

    pub(crate) fn search_captures(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
        caps: &mut Captures,
    ) {
        caps.set_pattern(None);
        let pid = self.search_slots(state, input, caps.slots_mut());
        caps.set_pattern(pid);
    }

    fn search_slots(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
        slots: &mut [Option<NonMaxUsize>],
    ) -> Option<PatternID> {
        if self.longest() {
            return self.search_slots_longest(state, input, slots);
        }
        // Without explicit groups there is nothing to resolve beyond the
        // span itself.
        if slots.len() <= self.nfa.group_info().implicit_slot_len() {
            let span = self.search(state, input)?;
            copy_span_to_slots(span, slots);
            return Some(PatternID::ZERO);
        }
        match self.strategy {
            Strategy::BoundedBacktracker
            | Strategy::Nfa
            | Strategy::Dfa
            | Strategy::Both => {
                if let Some(e) = self.hybrid.get(input) {
                    bump(&self.stats.dfa_searches);
                    match e.try_search(&mut state.hybrid, input) {
                        Ok(None) => return None,
                        Ok(Some(m)) => {
                            // Bounds known; resolve groups over just the
                            // match span.
                            let span_input = Input::new(input.haystack())
                                .span(m.start()..m.end())
                                .anchored(Anchored::Yes);
                            return self
                                .slots_nofail(state, &span_input, slots);
                        }
                        Err(err) => self.note_dfa_error(&err),
                    }
                }
                self.slots_nofail(state, input, slots)
            }
            _ => {
                let span = self.search(state, input)?;
                let span_input = Input::new(input.haystack())
                    .span(span.start..span.end)
                    .anchored(Anchored::Yes);
                self.slots_nofail(state, &span_input, slots)
            }
        }
    }

    /// Group resolution that cannot fail: one-pass DFA when the input is
    /// anchored and the pattern is one-pass, then backtracker, then PikeVM.
    fn slots_nofail(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
        slots: &mut [Option<NonMaxUsize>],
    ) -> Option<PatternID> {
        if let Some(e) = self.onepass.get(input) {
            bump(&self.stats.onepass_searches);
            match e.try_search_slots(&mut state.onepass, input, slots) {
                Ok(pid) => return pid,
                Err(err) => {
                    trace!("one-pass declined capture search: {}", err);
                }
            }
        }
        if let Some(e) = self.backtrack.get(input) {
            bump(&self.stats.nfa_searches);
            match e.try_search_slots(&mut state.backtrack, input, slots) {
                Ok(pid) => return pid,
                Err(err) => {
                    trace!("backtracker declined capture search: {}", err);
                }
            }
        }
        bump(&self.stats.nfa_searches);
        self.pikevm.get().search_slots(&mut state.pikevm, input, slots)
    }

    fn search_slots_longest(
        &self,
        state: &mut SearchState,
        input: &Input<'_>,
        slots: &mut [Option<NonMaxUsize>],
    ) -> Option<PatternID> {
        bump(&self.stats.nfa_searches);
        let first = self.pikevm.search(&mut state.pikevm, input)?;
        let revised = Input::new(input.haystack())
            .span(first.start()..input.end())
            .anchored(Anchored::Yes);
        bump(&self.stats.nfa_searches);
        self.pikevm_all.get().search_slots(
            &mut state.pikevm_all,
            &revised,
            slots,
        )
    }
}

fn copy_span_to_slots(span: Span, slots: &mut [Option<NonMaxUsize>]) {
    if let Some(slot) = slots.get_mut(0) {
        *slot = NonMaxUsize::new(span.start);
    }
    if let Some(slot) = slots.get_mut(1) {
        *slot = NonMaxUsize::new(span.end);
    }
}

fn prefix_prefilter(info: &RegexInfo, hir: &Hir) -> Option<Prefilter> {
    let config = info.config();
    if !config.get_prefilter() || info.analysis().start_anchored {
        return None;
    }
    let lits = prefilter::prefix_literals(
        config.get_min_literal_len() as usize,
        config.get_max_literals() as usize,
        hir,
    )?;
    let pre = Prefilter::new(MatchKind::LeftmostFirst, &lits);
    if pre.is_none() {
        debug!("prefix prefilter failed to build");
    }
    pre
}

fn build_ascii(info: &RegexInfo, hir: &Hir) -> Option<AsciiEngines> {
    if !info.analysis().has_any_byte
        || !info.config().get_ascii_optimization()
    {
        return None;
    }
    let ascii_hir = analysis::ascii_narrow(hir);
    let nfa = match wrappers::compile_nfa(&ascii_hir, false) {
        Ok(nfa) => nfa,
        Err(err) => {
            debug!("ASCII NFA failed to build: {}", err);
            return None;
        }
    };
    let pikevm =
        match wrappers::PikeVM::new(None, &nfa, MatchKind::LeftmostFirst) {
            Ok(pikevm) => pikevm,
            Err(err) => {
                debug!("ASCII PikeVM failed to build: {}", err);
                return None;
            }
        };
    let backtrack = wrappers::BoundedBacktracker::new(None, &nfa);
    trace!("ASCII engines built");
    Some(AsciiEngines { pikevm, backtrack })
}

/// Per-search scratch, borrowed from the pool for the duration of one verb
/// call (or one whole iteration loop) and never shared between workers.
///
/// Each state owns a dedicated PikeVM cache; PikeVM thread queues mutate
/// during a scan and must never be shared. Resets of the individual caches
/// are handled inside the primitive engines and are O(1) amortized.
pub(crate) struct SearchState {
    pub(crate) pikevm: pikevm::Cache,
    pub(crate) pikevm_all: pikevm::Cache,
    pub(crate) backtrack: wrappers::BoundedBacktrackerCache,
    pub(crate) onepass: wrappers::OnePassCache,
    pub(crate) hybrid: wrappers::HybridCache,
    pub(crate) revdfa: wrappers::RevDfaCache,
    pub(crate) ascii_pikevm: Option<pikevm::Cache>,
    pub(crate) ascii_backtrack: wrappers::BoundedBacktrackerCache,
}

impl SearchState {
    fn new(imp: &RegexI) -> SearchState {
        SearchState {
            pikevm: imp.pikevm.create_cache(),
            pikevm_all: imp.pikevm_all.create_cache(),
            backtrack: imp.backtrack.create_cache(),
            onepass: imp.onepass.create_cache(),
            hybrid: imp.hybrid.create_cache(),
            revdfa: imp
                .reverse
                .as_ref()
                .map(|r| r.rev_dfa().create_cache())
                .unwrap_or_else(wrappers::RevDfaCache::none),
            ascii_pikevm: imp.ascii.as_ref().map(|a| a.pikevm.create_cache()),
            ascii_backtrack: imp
                .ascii
                .as_ref()
                .map(|a| a.backtrack.create_cache())
                .unwrap_or_else(wrappers::BoundedBacktrackerCache::none),
        }
    }
}

/// The shared advance discipline for "all matches" loops: the next search
/// begins at the previous end, an empty match advances by one byte to
/// guarantee termination, and an empty match flush against the previous
/// match's end is skipped.
struct SpanIter {
    at: usize,
    last_match_end: Option<usize>,
}

impl SpanIter {
    fn new() -> SpanIter {
        SpanIter { at: 0, last_match_end: None }
    }

    fn next(
        &mut self,
        imp: &RegexI,
        state: &mut SearchState,
        haystack: &[u8],
    ) -> Option<Span> {
        loop {
            if self.at > haystack.len() {
                return None;
            }
            let input = Input::new(haystack).span(self.at..haystack.len());
            let span = match imp.search(state, &input) {
                None => {
                    self.at = haystack.len() + 1;
                    return None;
                }
                Some(span) => span,
            };
            if span.is_empty() && Some(span.end) == self.last_match_end {
                self.at = span.end + 1;
                continue;
            }
            self.last_match_end = Some(span.end);
            self.at = if span.is_empty() { span.end + 1 } else { span.end };
            return Some(span);
        }
    }
}

/// Iterator over every non-overlapping match in a haystack.
pub struct FindMatches<'r, 'h> {
    imp: &'r RegexI,
    state: PoolGuard<'r, SearchState, StatePoolFn>,
    haystack: &'h [u8],
    it: SpanIter,
}

impl<'r, 'h> Iterator for FindMatches<'r, 'h> {
    type Item = Match<'h>;

    #[inline]
    fn next(&mut self) -> Option<Match<'h>> {
        let FindMatches { imp, ref mut state, haystack, ref mut it } = *self;
        it.next(imp, &mut **state, haystack)
            .map(|span| Match::new(haystack, span))
    }
}

impl<'r, 'h> core::fmt::Debug for FindMatches<'r, 'h> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("FindMatches")
            .field("pattern", &self.imp.pattern)
            .field("at", &self.it.at)
            .finish()
    }
}
