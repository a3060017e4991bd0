use crate::error::BuildError;

/// The configuration of a [`Regex`](crate::Regex).
///
/// As with other configuration types in the ecosystem this crate builds on,
/// every knob is an option so that "default" and "not set" can be told apart.
/// This makes it possible to combine multiple configurations without default
/// values overwriting explicitly specified values. See the 'overwrite' method.
///
/// A configuration is validated before any building work happens. Validation
/// errors identify the offending field and its valid range. Fields that only
/// apply to a disabled feature are not validated.
#[derive(Clone, Debug, Default)]
pub struct Config {
    // For docs on the fields below, see the corresponding method setters.
    dfa: Option<bool>,
    prefilter: Option<bool>,
    ascii_optimization: Option<bool>,
    max_dfa_states: Option<u32>,
    determinization_limit: Option<u32>,
    min_literal_len: Option<u32>,
    max_literals: Option<u32>,
    max_recursion_depth: Option<u32>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Whether to build the lazy forward DFA. Disabling this cascades through
    /// strategy selection: every strategy that leans on the DFA is demoted to
    /// an NFA-backed one.
    pub fn dfa(self, yes: bool) -> Config {
        Config { dfa: Some(yes), ..self }
    }

    /// Whether to build literal prefilters at all.
    pub fn prefilter(self, yes: bool) -> Config {
        Config { prefilter: Some(yes), ..self }
    }

    /// Whether to also build an ASCII NFA for patterns containing the
    /// any-byte metacharacter. The ASCII variant is only consulted when the
    /// haystack itself is pure ASCII.
    pub fn ascii_optimization(self, yes: bool) -> Config {
        Config { ascii_optimization: Some(yes), ..self }
    }

    /// Bounds the lazy DFA's state cache. Valid in `[1, 1_000_000]`.
    pub fn max_dfa_states(self, limit: u32) -> Config {
        Config { max_dfa_states: Some(limit), ..self }
    }

    /// The cache-full give-up threshold: the minimum number of haystack
    /// bytes processed per new lazy DFA state before the DFA declares itself
    /// ineffective and the search falls back to the NFA. Valid in
    /// `[10, 100_000]`.
    pub fn determinization_limit(self, limit: u32) -> Config {
        Config { determinization_limit: Some(limit), ..self }
    }

    /// The minimum length of a literal to enroll in a prefilter. Valid in
    /// `[1, 64]`.
    ///
    /// The default is 1 and raising it is almost always a mistake: a single
    /// byte like `@` is what makes email-shaped patterns fast.
    pub fn min_literal_len(self, len: u32) -> Config {
        Config { min_literal_len: Some(len), ..self }
    }

    /// The maximum number of literals to extract for any literal-driven
    /// strategy. Valid in `[1, 1000]`.
    pub fn max_literals(self, limit: u32) -> Config {
        Config { max_literals: Some(limit), ..self }
    }

    /// Bounds the recursion depth of the parsed pattern. Valid in
    /// `[10, 1000]`.
    pub fn max_recursion_depth(self, limit: u32) -> Config {
        Config { max_recursion_depth: Some(limit), ..self }
    }

    pub fn get_dfa(&self) -> bool {
        self.dfa.unwrap_or(true)
    }

    pub fn get_prefilter(&self) -> bool {
        self.prefilter.unwrap_or(true)
    }

    pub fn get_ascii_optimization(&self) -> bool {
        self.ascii_optimization.unwrap_or(true)
    }

    pub fn get_max_dfa_states(&self) -> u32 {
        self.max_dfa_states.unwrap_or(10_000)
    }

    pub fn get_determinization_limit(&self) -> u32 {
        self.determinization_limit.unwrap_or(10)
    }

    pub fn get_min_literal_len(&self) -> u32 {
        self.min_literal_len.unwrap_or(1)
    }

    pub fn get_max_literals(&self) -> u32 {
        self.max_literals.unwrap_or(250)
    }

    pub fn get_max_recursion_depth(&self) -> u32 {
        self.max_recursion_depth.unwrap_or(250)
    }

    /// Check every explicitly set field against its valid range.
    ///
    /// DFA-specific fields are only checked when the DFA is enabled, and
    /// prefilter-specific fields only when prefilters are enabled.
    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.get_dfa() {
            check(
                "max_dfa_states",
                u64::from(self.get_max_dfa_states()),
                1,
                1_000_000,
            )?;
            check(
                "determinization_limit",
                u64::from(self.get_determinization_limit()),
                10,
                100_000,
            )?;
        }
        if self.get_prefilter() {
            check(
                "min_literal_len",
                u64::from(self.get_min_literal_len()),
                1,
                64,
            )?;
            check("max_literals", u64::from(self.get_max_literals()), 1, 1000)?;
        }
        check(
            "max_recursion_depth",
            u64::from(self.get_max_recursion_depth()),
            10,
            1000,
        )?;
        Ok(())
    }

    /// Overwrite the default configuration such that the options in `o` are
    /// always used. If an option in `o` is not set, then the corresponding
    /// option in `self` is used. If it's not set in `self` either, then it
    /// remains not set.
    pub(crate) fn overwrite(&self, o: Config) -> Config {
        Config {
            dfa: o.dfa.or(self.dfa),
            prefilter: o.prefilter.or(self.prefilter),
            ascii_optimization: o.ascii_optimization.or(self.ascii_optimization),
            max_dfa_states: o.max_dfa_states.or(self.max_dfa_states),
            determinization_limit: o
                .determinization_limit
                .or(self.determinization_limit),
            min_literal_len: o.min_literal_len.or(self.min_literal_len),
            max_literals: o.max_literals.or(self.max_literals),
            max_recursion_depth: o
                .max_recursion_depth
                .or(self.max_recursion_depth),
        }
    }
}

fn check(
    field: &'static str,
    given: u64,
    min: u64,
    max: u64,
) -> Result<(), BuildError> {
    if given < min || given > max {
        return Err(BuildError::config(field, given, min, max));
    }
    Ok(())
}
