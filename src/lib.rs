/*!
A meta regex engine.

This crate compiles a pattern once, analyzes it, and picks the most
efficient of many specialized execution strategies: byte-table searchers for
char-class shapes, SIMD multi-literal scans for alternations, reverse
searches for end-heavy patterns, an automaton-free fast path for
`^prefix.*suffix$` shapes, and DFA/NFA pipelines for everything else. Every
search verb is then routed through the chosen strategy with leftmost match
semantics.

The primitive matching engines are consumed from `regex-automata` and
`aho-corasick`; this crate's job is the orchestration: analysis, strategy
selection, dispatch, and the per-search state pool that lets one compiled
[`Regex`] serve any number of threads.

# Example

```
use metaregex::Regex;

let re = Regex::new(r"\d+\.\d+\.\d+")?;
let m = re.find("version 1.2.3 and 4.5.6 end").unwrap();
assert_eq!((8, 13), (m.start(), m.end()));
assert_eq!(2, re.count("version 1.2.3 and 4.5.6 end", None));
# Ok::<(), metaregex::BuildError>(())
```

# Semantics

Searches are byte-oriented and infallible: once a `Regex` is built, every
verb returns a match or "no match", never an error. Engines that can decline
a search at runtime (the bounded backtracker on long inputs, the lazy DFA
under cache pressure) fall back to the PikeVM transparently; the fallbacks
are visible in [`Regex::stats`].

The chosen strategy is observable via [`Regex::strategy`], whose display
form is a stable string for diagnostics and tests.
*/

mod analysis;
mod classes;
mod config;
mod engine;
mod error;
mod literal;
mod prefilter;
mod reverse;
mod stats;
mod strategy;
mod wrappers;

pub use crate::{
    config::Config,
    engine::{Builder, FindMatches, Match, Regex},
    error::BuildError,
    stats::StatsSnapshot,
    strategy::Strategy,
};

/// Capture storage for submatch searches, re-exported from the underlying
/// engine crate.
pub use regex_automata::util::captures::Captures;
