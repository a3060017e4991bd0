/*!
Pure analyses over the parsed pattern.

Everything in this module is a function of the HIR alone. The results feed
strategy selection and the construction of the specialized searchers. None of
it looks at a haystack.
*/

use regex_syntax::hir::{
    Class, ClassBytes, ClassBytesRange, Hir, HirKind, Look,
};

/// Everything strategy selection wants to know about a pattern, computed once
/// before any engine is built.
#[derive(Clone, Debug)]
pub(crate) struct Analysis {
    /// Every match must begin at the start of the haystack (`^` in default
    /// mode, `\A` always).
    pub(crate) start_anchored: bool,
    /// Every match must end at the end of the haystack.
    pub(crate) end_anchored: bool,
    /// Every match begins at a line start (`(?m)^`).
    pub(crate) multiline_start: bool,
    /// The pattern can match the empty string.
    pub(crate) can_match_empty: bool,
    /// The pattern contains the any-byte metacharacter (`.` in some form).
    pub(crate) has_any_byte: bool,
    /// Every accepting path begins with an ASCII digit (or the lead byte
    /// of a non-ASCII digit).
    pub(crate) digit_lead: bool,
    /// The pattern is a char class, optionally quantified, optionally
    /// wrapped in captures, or a concatenation of such.
    pub(crate) simple_char_class: bool,
    /// Number of explicit capture groups.
    pub(crate) explicit_captures: usize,
    /// The pattern contains look-around assertions of any kind.
    pub(crate) has_look: bool,
    /// Shape metrics for the digit-prefilter benefit test.
    pub(crate) alt: AltComplexity,
}

/// Alternation shape metrics. The digit prefilter only pays for itself on
/// patterns that are small and flat; these are the knobs that test says.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AltComplexity {
    /// Top-level branch count, after parser-internal factorization.
    pub(crate) branches: usize,
    /// Maximum nesting depth of the HIR tree.
    pub(crate) depth: usize,
    /// Whether a repetition contains another repetition, as in IP-style
    /// patterns like `(\d{1,3}\.){3}\d{1,3}`.
    pub(crate) nested_repetition: bool,
}

impl Analysis {
    pub(crate) fn new(hir: &Hir) -> Analysis {
        let props = hir.properties();
        Analysis {
            start_anchored: props.look_set_prefix().contains(Look::Start),
            end_anchored: props.look_set_suffix().contains(Look::End),
            multiline_start: props.look_set_prefix().contains(Look::StartLF),
            can_match_empty: props.minimum_len() == Some(0),
            has_any_byte: has_any_byte(hir),
            digit_lead: is_digit_lead(hir),
            simple_char_class: is_simple_char_class(hir),
            explicit_captures: props.explicit_captures_len(),
            has_look: !props.look_set().is_empty(),
            alt: alt_complexity(hir),
        }
    }
}

/// A char class lowered to a byte membership table.
///
/// `byte_exact` records whether the table is a faithful rendition of the
/// class: true for byte-oriented classes and for Unicode classes that never
/// leave ASCII. When false, the table only covers the class's ASCII subset
/// and byte-at-a-time searchers must not be built from it.
#[derive(Clone)]
pub(crate) struct ClassTable {
    pub(crate) table: [bool; 256],
    pub(crate) byte_exact: bool,
}

impl core::fmt::Debug for ClassTable {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let members: Vec<u8> = (0..=255u8)
            .filter(|&b| self.table[usize::from(b)])
            .collect();
        f.debug_struct("ClassTable")
            .field("len", &members.len())
            .field("byte_exact", &self.byte_exact)
            .finish()
    }
}

impl ClassTable {
    #[inline(always)]
    pub(crate) fn contains(&self, byte: u8) -> bool {
        self.table[usize::from(byte)]
    }
}

pub(crate) fn class_table(class: &Class) -> ClassTable {
    let mut table = [false; 256];
    let mut byte_exact = true;
    match *class {
        Class::Unicode(ref cls) => {
            for range in cls.ranges() {
                let (start, end) = (range.start() as u32, range.end() as u32);
                if end > 0x7F {
                    byte_exact = false;
                }
                let hi = end.min(0x7F);
                if start <= hi {
                    for cp in start..=hi {
                        table[cp as usize] = true;
                    }
                }
            }
        }
        Class::Bytes(ref cls) => {
            for range in cls.ranges() {
                for b in range.start()..=range.end() {
                    table[usize::from(b)] = true;
                }
            }
        }
    }
    ClassTable { table, byte_exact }
}

/// Classification of a `.`-like class.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Wildcard {
    /// Matches absolutely anything (`(?s:.)`).
    Any,
    /// Matches anything except the line terminator (plain `.`).
    AnyExceptNewline,
}

/// Recognizes the two shapes the parser produces for `.`.
pub(crate) fn wildcard_class(class: &Class) -> Option<Wildcard> {
    // The only gap a wildcard class may have is the line terminator. Any
    // other uncovered value disqualifies it immediately.
    let nl = u32::from(b'\n');
    let mut misses_newline = false;
    let mut gap = |next: u32, start: u32| -> bool {
        if next >= start {
            return true;
        }
        if next == nl && start == nl + 1 {
            misses_newline = true;
            return true;
        }
        false
    };
    let covered_to = match *class {
        Class::Unicode(ref cls) => {
            let mut next: u32 = 0;
            for range in cls.ranges() {
                if !gap(next, range.start() as u32) {
                    return None;
                }
                next = (range.end() as u32).saturating_add(1);
            }
            (next, 0x10FFFF + 1)
        }
        Class::Bytes(ref cls) => {
            let mut next: u32 = 0;
            for range in cls.ranges() {
                if !gap(next, u32::from(range.start())) {
                    return None;
                }
                next = u32::from(range.end()) + 1;
            }
            (next, 0xFF + 1)
        }
    };
    if covered_to.0 < covered_to.1 {
        return None;
    }
    if misses_newline {
        Some(Wildcard::AnyExceptNewline)
    } else {
        Some(Wildcard::Any)
    }
}

/// A greedy unbounded wildcard repetition: `.*` or `.+`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WildcardRep {
    pub(crate) min: u32,
    pub(crate) kind: Wildcard,
}

pub(crate) fn wildcard_rep(hir: &Hir) -> Option<WildcardRep> {
    let rep = match *hir.kind() {
        HirKind::Repetition(ref rep) => rep,
        _ => return None,
    };
    if rep.min > 1 || rep.max.is_some() || !rep.greedy {
        return None;
    }
    let class = match *rep.sub.kind() {
        HirKind::Class(ref class) => class,
        _ => return None,
    };
    wildcard_class(class).map(|kind| WildcardRep { min: rep.min, kind })
}

fn has_any_byte(hir: &Hir) -> bool {
    match *hir.kind() {
        HirKind::Empty | HirKind::Literal(_) | HirKind::Look(_) => false,
        HirKind::Class(ref class) => wildcard_class(class).is_some(),
        HirKind::Repetition(ref rep) => has_any_byte(&rep.sub),
        HirKind::Capture(ref cap) => has_any_byte(&cap.sub),
        HirKind::Concat(ref subs) | HirKind::Alternation(ref subs) => {
            subs.iter().any(has_any_byte)
        }
    }
}

/// A class qualifies as digit-lead when its ASCII members are digits and
/// nothing else, and there is at least one of them. Non-ASCII members are
/// allowed: their UTF-8 encodings start with a non-ASCII byte, and the
/// digit candidate scanner stops at those too.
fn class_is_digits(class: &Class) -> bool {
    let table = class_table(class);
    let mut any = false;
    for byte in 0..=0x7Fu8 {
        if table.table[usize::from(byte)] {
            if !byte.is_ascii_digit() {
                return false;
            }
            any = true;
        }
    }
    any
}

/// Does every accepting path through this pattern begin with a byte in
/// `[0-9]`?
///
/// The test recurses through concatenation (a nullable prefix item must be
/// digit-lead when entered, and the first non-nullable item decides),
/// alternation (all branches), captures (transparent), classes (subset of
/// digits), literals (first byte) and repeats (`min >= 1` is transparent,
/// `min = 0` forces the test onto the remainder as well).
pub(crate) fn is_digit_lead(hir: &Hir) -> bool {
    match *hir.kind() {
        HirKind::Empty | HirKind::Look(_) => false,
        HirKind::Literal(ref lit) => {
            lit.0.first().map_or(false, u8::is_ascii_digit)
        }
        HirKind::Class(ref class) => class_is_digits(class),
        HirKind::Capture(ref cap) => is_digit_lead(&cap.sub),
        HirKind::Repetition(ref rep) => {
            rep.min >= 1 && is_digit_lead(&rep.sub)
        }
        HirKind::Alternation(ref subs) => subs.iter().all(is_digit_lead),
        HirKind::Concat(ref subs) => {
            for sub in subs.iter() {
                // Zero-width items neither start a match nor disqualify one.
                if matches!(*sub.kind(), HirKind::Empty | HirKind::Look(_)) {
                    continue;
                }
                if sub.properties().minimum_len() == Some(0) {
                    // A nullable item may be skipped, so the remainder must
                    // pass. But when it isn't skipped, its own first byte
                    // must be a digit too.
                    if !nullable_is_digit_lead(sub) {
                        return false;
                    }
                    continue;
                }
                return is_digit_lead(sub);
            }
            false
        }
    }
}

/// Digit-lead test for a nullable item, considering only the paths on which
/// it consumes at least one byte.
fn nullable_is_digit_lead(hir: &Hir) -> bool {
    match *hir.kind() {
        HirKind::Empty | HirKind::Look(_) => true,
        HirKind::Capture(ref cap) => nullable_is_digit_lead(&cap.sub),
        HirKind::Repetition(ref rep) => is_digit_lead(&rep.sub),
        HirKind::Alternation(ref subs) => {
            subs.iter().all(nullable_is_digit_lead)
        }
        // A nullable literal is the empty literal; a nullable class does not
        // exist; a nullable concat is all-nullable parts.
        HirKind::Literal(_) | HirKind::Class(_) => is_digit_lead(hir),
        HirKind::Concat(ref subs) => subs.iter().all(nullable_is_digit_lead),
    }
}

/// A char class, optionally quantified, optionally wrapped in captures, or a
/// concatenation of such.
pub(crate) fn is_simple_char_class(hir: &Hir) -> bool {
    match *hir.kind() {
        HirKind::Class(_) => true,
        HirKind::Repetition(ref rep) => is_simple_char_class(&rep.sub),
        HirKind::Capture(ref cap) => is_simple_char_class(&cap.sub),
        HirKind::Concat(ref subs) => {
            !subs.is_empty() && subs.iter().all(is_simple_char_class)
        }
        _ => false,
    }
}

fn alt_complexity(hir: &Hir) -> AltComplexity {
    AltComplexity {
        branches: top_level_branches(hir),
        depth: depth(hir),
        nested_repetition: nested_repetition(hir, false),
    }
}

fn top_level_branches(hir: &Hir) -> usize {
    match *hir.kind() {
        HirKind::Alternation(ref subs) => subs.len(),
        HirKind::Capture(ref cap) => top_level_branches(&cap.sub),
        _ => 1,
    }
}

fn depth(hir: &Hir) -> usize {
    match *hir.kind() {
        HirKind::Empty
        | HirKind::Literal(_)
        | HirKind::Class(_)
        | HirKind::Look(_) => 1,
        HirKind::Repetition(ref rep) => 1 + depth(&rep.sub),
        HirKind::Capture(ref cap) => 1 + depth(&cap.sub),
        HirKind::Concat(ref subs) | HirKind::Alternation(ref subs) => {
            1 + subs.iter().map(depth).max().unwrap_or(0)
        }
    }
}

fn nested_repetition(hir: &Hir, inside_rep: bool) -> bool {
    match *hir.kind() {
        HirKind::Empty
        | HirKind::Literal(_)
        | HirKind::Class(_)
        | HirKind::Look(_) => false,
        HirKind::Repetition(ref rep) => {
            inside_rep || nested_repetition(&rep.sub, true)
        }
        HirKind::Capture(ref cap) => nested_repetition(&cap.sub, inside_rep),
        HirKind::Concat(ref subs) | HirKind::Alternation(ref subs) => {
            subs.iter().any(|sub| nested_repetition(sub, inside_rep))
        }
    }
}

/// Flattens a literal-only HIR into its bytes. Returns `None` if anything
/// other than literals (or empties) is present.
pub(crate) fn flatten_literal(hir: &Hir) -> Option<Vec<u8>> {
    let mut bytes = vec![];
    fn imp(hir: &Hir, bytes: &mut Vec<u8>) -> bool {
        match *hir.kind() {
            HirKind::Empty => true,
            HirKind::Literal(ref lit) => {
                bytes.extend_from_slice(&lit.0);
                true
            }
            HirKind::Concat(ref subs) => {
                subs.iter().all(|sub| imp(sub, bytes))
            }
            _ => false,
        }
    }
    if imp(hir, &mut bytes) {
        Some(bytes)
    } else {
        None
    }
}

/// The byte strings a single item can match, where the item is a literal
/// or an alternation of literals, possibly wrapped in a capture group (the
/// group is transparent for span searches; slots are resolved separately).
fn item_alternates(item: &Hir) -> Option<Vec<Vec<u8>>> {
    match *item.kind() {
        HirKind::Capture(ref cap) => item_alternates(&cap.sub),
        HirKind::Alternation(ref subs) => {
            let mut alts = Vec::with_capacity(subs.len());
            for sub in subs.iter() {
                alts.push(flatten_literal(sub)?);
            }
            Some(alts)
        }
        _ => flatten_literal(item).map(|lit| vec![lit]),
    }
}

/// Expands a sequence of HIR items into the set of byte strings it matches,
/// where every item is a literal or an alternation of literals. The result
/// is the cross product of the per-item sets, capped at `max` entries.
///
/// This is what turns `\.(txt|log|md)` into `{".txt", ".log", ".md"}`.
pub(crate) fn literal_set(items: &[Hir], max: usize) -> Option<Vec<Vec<u8>>> {
    let mut set: Vec<Vec<u8>> = vec![vec![]];
    for item in items.iter() {
        let alternates = item_alternates(item)?;
        if set.len().checked_mul(alternates.len())? > max {
            return None;
        }
        let mut next = Vec::with_capacity(set.len() * alternates.len());
        for prefix in set.iter() {
            for alt in alternates.iter() {
                let mut lit = prefix.clone();
                lit.extend_from_slice(alt);
                next.push(lit);
            }
        }
        set = next;
    }
    Some(set)
}

/// Pulls the branches out of a plain alternation of literals, e.g.
/// `foo|bar|quux`. This is the shape that Teddy and Aho-Corasick take over
/// wholesale.
///
/// Requires that the pattern has no look-arounds and no capture groups,
/// since a pure literal searcher can't honor either.
pub(crate) fn alternation_literals(
    analysis: &Analysis,
    hir: &Hir,
) -> Option<Vec<Vec<u8>>> {
    if analysis.has_look
        || analysis.explicit_captures > 0
        || !hir.properties().is_alternation_literal()
    {
        return None;
    }
    let alts = match *hir.kind() {
        HirKind::Alternation(ref alts) => alts,
        // A single literal isn't worth a multi-pattern searcher.
        _ => return None,
    };
    let mut lits = Vec::with_capacity(alts.len());
    for alt in alts.iter() {
        lits.push(flatten_literal(alt)?);
    }
    Some(lits)
}

/// Rewrites the pattern with every class narrowed to its ASCII subset. The
/// result matches the same byte strings as the original whenever the
/// haystack is pure ASCII, but compiles to a much smaller NFA because the
/// multi-byte UTF-8 arms vanish.
pub(crate) fn ascii_narrow(hir: &Hir) -> Hir {
    match *hir.kind() {
        HirKind::Empty => Hir::empty(),
        HirKind::Literal(ref lit) => Hir::literal(lit.0.clone()),
        HirKind::Look(look) => Hir::look(look),
        HirKind::Class(ref class) => {
            let table = class_table(class);
            let mut ranges = vec![];
            let mut b = 0u16;
            while b <= 0x7F {
                if table.table[b as usize] {
                    let start = b as u8;
                    while b <= 0x7F && table.table[b as usize] {
                        b += 1;
                    }
                    ranges.push(ClassBytesRange::new(start, (b - 1) as u8));
                } else {
                    b += 1;
                }
            }
            if ranges.is_empty() {
                Hir::fail()
            } else {
                Hir::class(Class::Bytes(ClassBytes::new(ranges)))
            }
        }
        HirKind::Repetition(ref rep) => {
            let mut rep = rep.clone();
            rep.sub = Box::new(ascii_narrow(&rep.sub));
            Hir::repetition(rep)
        }
        HirKind::Capture(ref cap) => {
            let mut cap = cap.clone();
            cap.sub = Box::new(ascii_narrow(&cap.sub));
            Hir::capture(cap)
        }
        HirKind::Concat(ref subs) => {
            Hir::concat(subs.iter().map(ascii_narrow).collect())
        }
        HirKind::Alternation(ref subs) => {
            Hir::alternation(subs.iter().map(ascii_narrow).collect())
        }
    }
}
