/*!
Strategy selection: a pure function from the analyzed pattern to one of the
sixteen execution strategies. First match in the priority order wins, and
the chosen tag is fixed for the life of the engine.

The builder may still downgrade a tag when an engine it needs fails to
build; downgrades re-enter this module through [`core`].
*/

use core::fmt;

use log::debug;
use regex_automata::nfa::thompson::NFA;
use regex_syntax::hir::Hir;

use crate::{analysis, classes, engine::RegexInfo, literal, prefilter, reverse};

/// NFAs at or below this size get a bounded backtracker attached; they are
/// also the only ones the digit prefilter considers worth the candidate
/// loop.
const SMALL_NFA: usize = 50;

/// Above this size, a pattern with a strong literal prefix runs DFA-first.
const LARGE_NFA: usize = 250;

/// Bounds for the digit-prefilter benefit test. IP-style patterns blow the
/// nested-repetition check, never these.
const DIGIT_MAX_BRANCHES: usize = 8;
const DIGIT_MAX_DEPTH: usize = 4;

/// The execution strategy a compiled regex routes every search through.
///
/// The display form of each variant is stable; diagnostics and tests rely
/// on the exact strings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// PikeVM, with a backtracker attached for small NFAs. The catch-all.
    Nfa,
    /// Lazy DFA led by a literal prefilter, NFA fallback on cache pressure.
    Dfa,
    /// Lazy DFA first, NFA fallback; no strong literals to lead with.
    Both,
    /// End-anchored pattern searched right-to-left.
    ReverseAnchored,
    /// `.*LITERAL`: candidate scan on the suffix literal.
    ReverseSuffix,
    /// `.*\.(a|b|…)`: candidate scan on a suffix literal set.
    ReverseSuffixSet,
    /// A literal inside the pattern drives a bidirectional verification.
    ReverseInner,
    /// `(?m)^prefix.*suffix`: line-aware suffix scan.
    MultilineReverseSuffix,
    /// Simple char-class shapes where backtracking beats the PikeVM.
    BoundedBacktracker,
    /// A single quantified byte class.
    CharClassSearcher,
    /// A concatenation of quantified byte classes.
    CompositeSearcher,
    /// `^(alt|alt|…)` with distinct first bytes.
    BranchDispatch,
    /// Exact-literal alternation, 2-64 branches, SIMD packed scan.
    Teddy,
    /// Digit-lead pattern driven by a digit candidate scan.
    DigitPrefilter,
    /// Exact-literal alternation with more than 64 branches.
    AhoCorasick,
    /// `^prefix.*[class+]suffix$` matched without automata.
    AnchoredLiteral,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Strategy::Nfa => "UseNFA",
            Strategy::Dfa => "UseDFA",
            Strategy::Both => "UseBoth",
            Strategy::ReverseAnchored => "UseReverseAnchored",
            Strategy::ReverseSuffix => "UseReverseSuffix",
            Strategy::ReverseSuffixSet => "UseReverseSuffixSet",
            Strategy::ReverseInner => "UseReverseInner",
            Strategy::MultilineReverseSuffix => "UseMultilineReverseSuffix",
            Strategy::BoundedBacktracker => "UseBoundedBacktracker",
            Strategy::CharClassSearcher => "UseCharClassSearcher",
            Strategy::CompositeSearcher => "UseCompositeSearcher",
            Strategy::BranchDispatch => "UseBranchDispatch",
            Strategy::Teddy => "UseTeddy",
            Strategy::DigitPrefilter => "UseDigitPrefilter",
            Strategy::AhoCorasick => "UseAhoCorasick",
            Strategy::AnchoredLiteral => "UseAnchoredLiteral",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the strategy for an analyzed pattern. Pure: no engine is built
/// here, only shapes recognized.
pub(crate) fn choose(info: &RegexInfo, hir: &Hir, nfa: &NFA) -> Strategy {
    let a = info.analysis();
    let config = info.config();

    if literal::AnchoredLiteral::new(hir).is_some() {
        return Strategy::AnchoredLiteral;
    }
    if classes::BranchDispatcher::new(a, hir).is_some() {
        return Strategy::BranchDispatch;
    }
    if a.end_anchored && config.get_dfa() {
        return Strategy::ReverseAnchored;
    }
    if config.get_dfa() && config.get_prefilter() {
        if reverse::multiline_suffix_shape(info, hir).is_some() {
            return Strategy::MultilineReverseSuffix;
        }
        if let Some(shape) = reverse::suffix_shape(info, hir) {
            return if shape.lits.len() >= 2 {
                Strategy::ReverseSuffixSet
            } else {
                Strategy::ReverseSuffix
            };
        }
        if reverse::inner_shape(info, hir).is_some() {
            return Strategy::ReverseInner;
        }
    }
    if let Some(lits) = analysis::alternation_literals(a, hir) {
        let max = config.get_max_literals() as usize;
        if (2..=max).contains(&lits.len())
            && lits.iter().all(|l| !l.is_empty())
        {
            return if lits.len() > 64 {
                Strategy::AhoCorasick
            } else {
                Strategy::Teddy
            };
        }
    }
    if config.get_prefilter()
        && a.digit_lead
        && !a.simple_char_class
        && !a.start_anchored
        && !a.can_match_empty
        && nfa.states().len() <= SMALL_NFA
        && a.alt.branches <= DIGIT_MAX_BRANCHES
        && a.alt.depth <= DIGIT_MAX_DEPTH
        && !a.alt.nested_repetition
    {
        return Strategy::DigitPrefilter;
    }
    if classes::CompositeSearcher::new(hir).is_some() {
        return Strategy::CompositeSearcher;
    }
    if classes::CharClassSearcher::new(hir).is_some() {
        return Strategy::CharClassSearcher;
    }
    if a.simple_char_class {
        return Strategy::BoundedBacktracker;
    }
    core(info, hir, nfa)
}

/// The DFA/Both/NFA split for patterns with no exploitable shape, and the
/// landing spot for every build-time downgrade.
pub(crate) fn core(info: &RegexInfo, hir: &Hir, nfa: &NFA) -> Strategy {
    let a = info.analysis();
    let config = info.config();
    if !config.get_dfa() {
        return Strategy::Nfa;
    }
    let states = nfa.states().len();
    if states <= SMALL_NFA {
        // Small NFAs get the backtracker attached; the DFA's cache rarely
        // pays for itself at this size.
        return Strategy::Nfa;
    }
    let strong_literals = config.get_prefilter()
        && !a.start_anchored
        && prefilter::prefix_literals(
            config.get_min_literal_len() as usize,
            config.get_max_literals() as usize,
            hir,
        )
        .is_some();
    if strong_literals && states > LARGE_NFA {
        Strategy::Dfa
    } else {
        debug!(
            "core strategy: {} NFA states, strong literals: {}",
            states, strong_literals,
        );
        Strategy::Both
    }
}
