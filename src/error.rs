use std::fmt;

/// An error that can occur when building a [`Regex`](crate::Regex).
///
/// Searches themselves never fail; once a `Regex` has been built, every
/// search returns either a match or "no match."
#[derive(Clone, Debug)]
pub struct BuildError {
    kind: BuildErrorKind,
}

#[derive(Clone, Debug)]
enum BuildErrorKind {
    /// The pattern is ill-formed. The parser's own message is surfaced
    /// untransformed, since callers expect it verbatim.
    Syntax(regex_syntax::Error),
    /// The pattern parsed but exceeded the configured recursion depth.
    Recursion { limit: u32 },
    /// A configuration field is outside its valid range. The field name and
    /// the range are part of the message so callers can identify the knob.
    Config { field: &'static str, given: u64, min: u64, max: u64 },
    /// NFA construction failed (for example, the size limit was exceeded).
    Nfa(regex_automata::nfa::thompson::BuildError),
}

impl BuildError {
    pub(crate) fn syntax(err: regex_syntax::Error) -> BuildError {
        // The parser reports nest-limit violations as a syntax error, but the
        // two are distinct failure classes for callers: one means "fix your
        // pattern," the other means "raise max_recursion_depth."
        if let regex_syntax::Error::Parse(ref ast_err) = err {
            if let regex_syntax::ast::ErrorKind::NestLimitExceeded(limit) =
                *ast_err.kind()
            {
                return BuildError {
                    kind: BuildErrorKind::Recursion { limit },
                };
            }
        }
        BuildError { kind: BuildErrorKind::Syntax(err) }
    }

    pub(crate) fn nfa(
        err: regex_automata::nfa::thompson::BuildError,
    ) -> BuildError {
        BuildError { kind: BuildErrorKind::Nfa(err) }
    }

    pub(crate) fn config(
        field: &'static str,
        given: u64,
        min: u64,
        max: u64,
    ) -> BuildError {
        BuildError { kind: BuildErrorKind::Config { field, given, min, max } }
    }

    /// Returns true if this error was caused by an invalid configuration
    /// value.
    pub fn is_config(&self) -> bool {
        matches!(self.kind, BuildErrorKind::Config { .. })
    }

    /// Returns true if this error was caused by a pattern exceeding the
    /// configured recursion depth.
    pub fn is_recursion(&self) -> bool {
        matches!(self.kind, BuildErrorKind::Recursion { .. })
    }

    /// Returns the underlying syntax error, if this error was caused by an
    /// ill-formed pattern.
    pub fn syntax_error(&self) -> Option<&regex_syntax::Error> {
        match self.kind {
            BuildErrorKind::Syntax(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            BuildErrorKind::Syntax(ref err) => err.fmt(f),
            BuildErrorKind::Recursion { limit } => write!(
                f,
                "pattern exceeds the maximum recursion depth \
                 (max_recursion_depth: {})",
                limit,
            ),
            BuildErrorKind::Config { field, given, min, max } => write!(
                f,
                "invalid configuration: {} is {} but must be in [{}, {}]",
                field, given, min, max,
            ),
            BuildErrorKind::Nfa(ref err) => err.fmt(f),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind {
            BuildErrorKind::Syntax(ref err) => Some(err),
            BuildErrorKind::Nfa(ref err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_field_and_range() {
        let err = BuildError::config("min_literal_len", 0, 1, 64);
        assert!(err.is_config());
        let msg = err.to_string();
        assert!(msg.contains("min_literal_len"), "{}", msg);
        assert!(msg.contains("[1, 64]"), "{}", msg);
    }

    #[test]
    fn nest_limit_is_recursion() {
        let err = regex_syntax::ast::parse::ParserBuilder::new()
            .nest_limit(5)
            .build()
            .parse("((((((((((a))))))))))")
            .unwrap_err();
        let err = BuildError::syntax(regex_syntax::Error::Parse(err));
        assert!(err.is_recursion());
    }
}
