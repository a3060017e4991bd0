/*!
Strategy-selection laws and end-to-end scenarios.

The strategy a pattern compiles to is part of this crate's contract: a
regression that silently demotes the email pattern from the reverse-inner
searcher, or the anchored-literal shape to the NFA, is a performance bug
even though every search still returns the right answer. These tests pin
the mapping down, along with concrete search results for each strategy.
*/

use metaregex::{Regex, Strategy};

fn re(pattern: &str) -> Regex {
    let _ = env_logger::try_init();
    Regex::new(pattern).unwrap()
}

#[test]
fn strategy_laws() {
    assert_eq!(
        Strategy::ReverseInner,
        re(r"[\w.+-]+@[\w.-]+\.[\w.-]+").strategy(),
    );
    assert_eq!(
        Strategy::AnchoredLiteral,
        re(r"^/.*[\w-]+\.php$").strategy(),
    );
    assert_eq!(Strategy::CharClassSearcher, re(r"[a-z]+").strategy());
    assert_eq!(Strategy::BoundedBacktracker, re(r"(\w)+").strategy());
    assert_eq!(Strategy::CompositeSearcher, re(r"[a-z]+[0-9]+").strategy());
    assert_eq!(Strategy::ReverseAnchored, re(r"world$").strategy());
    assert_eq!(
        Strategy::ReverseSuffixSet,
        re(r".*\.(txt|log|md)").strategy(),
    );
    assert_eq!(Strategy::ReverseSuffix, re(r".*\.txt").strategy());
    assert_eq!(
        Strategy::MultilineReverseSuffix,
        re(r"(?m)^/.*\.php").strategy(),
    );
    assert_eq!(Strategy::DigitPrefilter, re(r"\d+\.\d+\.\d+").strategy());
    // IP-style patterns have nested repetition; the candidate loop never
    // pays off for them.
    assert_ne!(
        Strategy::DigitPrefilter,
        re(r"(\d{1,3}\.){3}\d{1,3}").strategy(),
    );
    assert_eq!(
        Strategy::BranchDispatch,
        re(r"^(get|put|head)").strategy(),
    );
}

#[test]
fn strategy_display_strings_are_stable() {
    let cases: &[(&str, &str)] = &[
        (r"[\w.+-]+@[\w.-]+\.[\w.-]+", "UseReverseInner"),
        (r"^/.*[\w-]+\.php$", "UseAnchoredLiteral"),
        (r"[a-z]+", "UseCharClassSearcher"),
        (r"(\w)+", "UseBoundedBacktracker"),
        (r"[a-z]+[0-9]+", "UseCompositeSearcher"),
        (r"world$", "UseReverseAnchored"),
        (r".*\.(txt|log|md)", "UseReverseSuffixSet"),
        (r".*\.txt", "UseReverseSuffix"),
        (r"(?m)^/.*\.php", "UseMultilineReverseSuffix"),
        (r"\d+\.\d+\.\d+", "UseDigitPrefilter"),
        (r"^(get|put|head)", "UseBranchDispatch"),
    ];
    for &(pattern, display) in cases {
        assert_eq!(display, re(pattern).strategy().to_string(), "{}", pattern);
    }
}

#[test]
fn literal_alternation_sizes() {
    let mk = |n: usize| {
        let words: Vec<String> =
            (0..n).map(|i| format!("pat{:03}", i)).collect();
        re(&words.join("|"))
    };
    assert_eq!(Strategy::Teddy, mk(10).strategy());
    assert_eq!(Strategy::Teddy, mk(32).strategy());
    assert_eq!(Strategy::Teddy, mk(64).strategy());
    assert_eq!(Strategy::AhoCorasick, mk(65).strategy());
    assert_eq!(Strategy::AhoCorasick, mk(200).strategy());
}

// Scenario: a 67-literal alternation routed through Aho-Corasick.
#[test]
fn scenario_aho_corasick_alternation() {
    let mut words =
        vec!["alpha".to_string(), "bravo".to_string(), "tango".to_string()];
    for i in 0..63 {
        words.push(format!("filler{:02}", i));
    }
    words.push("oak".to_string());
    assert_eq!(67, words.len());
    let re = re(&words.join("|"));
    assert_eq!(Strategy::AhoCorasick, re.strategy());

    let haystack = "this is alpha and omega, with bravo and tango at the end";
    assert!(re.is_match(haystack));
    let m = re.find(haystack).unwrap();
    assert_eq!(b"alpha", m.as_bytes());
    assert_eq!(3, re.count(haystack, None));
}

// Scenario: the anchored-literal fast path, including its deliberately
// byte-wise treatment of the class bridge.
#[test]
fn scenario_anchored_literal() {
    let re = re(r"^/.*[\w-]+\.php$");
    assert_eq!(Strategy::AnchoredLiteral, re.strategy());
    let m = re.find("/path/to/file.php").unwrap();
    assert_eq!((0, 17), (m.start(), m.end()));
    assert!(re.find("/.php").is_none());
    // `[\w-]+` does not accept the UTF-8 bytes of Cyrillic letters.
    assert!(re.find("/файл.php").is_none());
    assert!(!re.is_match("no-leading-slash.php"));
}

// Scenario: suffix-set scan over file extensions.
#[test]
fn scenario_reverse_suffix_set() {
    let re = re(r".*\.(txt|log|md)");
    assert_eq!(Strategy::ReverseSuffixSet, re.strategy());
    assert_eq!(Some((0, 10)), re.find_indices("readme.txt"));
    assert_eq!(Some((0, 9)), re.find_indices("error.log"));
    assert_eq!(Some((0, 9)), re.find_indices("README.md"));
    assert_eq!(None, re.find_indices("style.css"));
}

// Scenario: end-anchored pattern searched in reverse.
#[test]
fn scenario_reverse_anchored() {
    let re = re(r"world$");
    assert_eq!(Strategy::ReverseAnchored, re.strategy());
    let m = re.find("hello world").unwrap();
    assert_eq!((6, 11), (m.start(), m.end()));
    assert!(re.find("world hello").is_none());
    assert!(re.is_match("hello world"));
    assert!(!re.is_match("worlds"));
}

// Scenario: version numbers through the digit candidate loop.
#[test]
fn scenario_digit_prefilter() {
    let re = re(r"\d+\.\d+\.\d+");
    assert_eq!(Strategy::DigitPrefilter, re.strategy());
    let haystack = "version 1.2.3 and 4.5.6 end";
    assert_eq!(b"1.2.3", re.find(haystack).unwrap().as_bytes());
    let m = re.find_at(haystack, 14).unwrap();
    assert_eq!(b"4.5.6", m.as_bytes());
    assert_eq!((18, 23), (m.start(), m.end()));
    assert_eq!(2, re.count(haystack, None));
}

// Scenario: Fat Teddy hands short haystacks to its Aho-Corasick companion.
#[test]
fn scenario_fat_teddy_small_haystack_fallback() {
    let words: Vec<String> = (0..50).map(|i| format!("p{:02}", i)).collect();
    let re = re(&words.join("|"));
    assert_eq!(Strategy::Teddy, re.strategy());

    let haystack = "prefix p25 middle p42 suffix p01 end";
    assert!(haystack.len() < 64);
    re.reset_stats();
    let m = re.find(haystack).unwrap();
    assert_eq!(b"p25", m.as_bytes());
    let stats = re.stats();
    assert_eq!(1, stats.aho_corasick_searches);
    assert_eq!(0, stats.prefilter_hits);

    // Past the cutover, Teddy itself runs.
    let mut long = haystack.to_string();
    long.push_str(&" ".repeat(64));
    re.reset_stats();
    assert_eq!(b"p25", re.find(&long).unwrap().as_bytes());
    let stats = re.stats();
    assert_eq!(1, stats.prefilter_hits);
    assert_eq!(0, stats.aho_corasick_searches);
}

// Scenario: start-anchored search rejects any non-zero starting position.
#[test]
fn scenario_anchored_find_at() {
    let re = re(r"^(foo|bar|baz)");
    assert!(re.is_start_anchored());
    let m = re.find_at("foo123", 0).unwrap();
    assert_eq!(b"foo", m.as_bytes());
    assert!(re.find_at("foo123", 1).is_none());
    // Out-of-range starts are "no match", not a panic.
    assert!(re.find_at("foo123", 7).is_none());
    // At most one result out of iteration.
    assert_eq!(vec![(0, 3)], re.find_all_indices("foofoo", None));
}

// Scenario: multiline reverse suffix finds the right line.
#[test]
fn scenario_multiline_reverse_suffix() {
    let re = re(r"(?m)^/.*\.php");
    assert_eq!(Strategy::MultilineReverseSuffix, re.strategy());
    let haystack = "readme.txt\n/page.php\nother.txt";
    let m = re.find(haystack).unwrap();
    assert_eq!(b"/page.php", m.as_bytes());
    assert_eq!((11, 20), (m.start(), m.end()));
    assert!(!re.is_match("readme.txt\npage.php\nother.txt"));
}

// Scenario: configuration validation rejects a zero literal minimum and
// names the field.
#[test]
fn scenario_config_validation() {
    let err = Regex::builder()
        .configure(Regex::config().min_literal_len(0))
        .build(r"foo")
        .unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("min_literal_len"));
}

#[test]
fn reverse_inner_email() {
    let re = re(r"[\w.+-]+@[\w.-]+\.[\w.-]+");
    assert_eq!(Strategy::ReverseInner, re.strategy());
    let haystack = "contact us at support@example.com or sales@corp.example.org";
    assert_eq!(
        vec![(14, 33), (37, 59)],
        re.find_all_indices(haystack, None),
    );
    assert_eq!(
        b"support@example.com",
        re.find(haystack).unwrap().as_bytes(),
    );
    assert!(!re.is_match("no at-sign here"));
}

#[test]
fn reverse_suffix_single() {
    let re = re(r".*\.txt");
    assert_eq!(Strategy::ReverseSuffix, re.strategy());
    assert_eq!(Some((0, 5)), re.find_indices("a.txt"));
    // The default `.` does not cross lines.
    assert_eq!(
        vec![(0, 5), (6, 11)],
        re.find_all_indices("a.txt\nb.txt", None),
    );
    assert_eq!(None, re.find_indices("a.log"));
}

#[test]
fn charclass_and_composite_results() {
    let classes = re(r"[a-z]+");
    assert_eq!(
        vec![(0, 5), (6, 11), (12, 16)],
        classes.find_all_indices("hello world test", None),
    );
    let composite = re(r"[a-z]+[0-9]+");
    assert_eq!(Some((3, 8)), composite.find_indices("12 abc12 x"));
    assert_eq!(None, composite.find_indices("abc xyz"));
}

#[test]
fn count_limits() {
    let re = re(r"[a-z]+");
    let haystack = "one two three four five";
    assert_eq!(5, re.count(haystack, None));
    assert_eq!(3, re.count(haystack, Some(3)));
    assert_eq!(5, re.count(haystack, Some(99)));
    assert_eq!(0, re.count(haystack, Some(0)));
    assert_eq!(
        re.count(haystack, None),
        re.find_all_indices(haystack, None).len(),
    );
}

#[test]
fn find_all_indices_into_reuses_sink() {
    let re = re(r"[0-9]+");
    let mut sink = Vec::with_capacity(8);
    re.find_all_indices_into("a1b22c333", None, &mut sink);
    assert_eq!(vec![(1, 2), (3, 5), (6, 9)], sink);
    sink.clear();
    re.find_all_indices_into("a1b22c333", Some(2), &mut sink);
    assert_eq!(vec![(1, 2), (3, 5)], sink);
}

#[test]
fn submatches() {
    let re = re(r"(\w+)@(\w+)\.com");
    let caps = re.captures("mail me: bob@example.com today").unwrap();
    let overall = caps.get_match().unwrap();
    assert_eq!((9, 24), (overall.start(), overall.end()));
    assert_eq!(9..12, caps.get_group(1).map(|s| s.range()).unwrap());
    assert_eq!(13..20, caps.get_group(2).map(|s| s.range()).unwrap());
    assert!(re.captures("no email").is_none());
}

#[test]
fn named_submatches() {
    let re = re(r"(?P<key>\w+)=(?P<value>\w+)");
    assert_eq!(3, re.capture_len());
    let names: Vec<Option<&str>> = re.capture_names().collect();
    assert_eq!(vec![None, Some("key"), Some("value")], names);
    let caps = re.captures("retries=3").unwrap();
    assert_eq!(0..7, caps.get_group_by_name("key").unwrap().range());
    assert_eq!(8..9, caps.get_group_by_name("value").unwrap().range());
}

#[test]
fn leftmost_longest() {
    let ab = re(r"a|ab");
    assert_eq!(b"a", ab.find("ab").unwrap().as_bytes());
    ab.set_longest(true);
    assert_eq!(b"ab", ab.find("ab").unwrap().as_bytes());
    ab.set_longest(false);
    assert_eq!(b"a", ab.find("ab").unwrap().as_bytes());

    let sam = re(r"sam|samwise");
    assert_eq!(b"sam", sam.find("samwise").unwrap().as_bytes());
    sam.set_longest(true);
    assert_eq!(b"samwise", sam.find("samwise").unwrap().as_bytes());
}

#[test]
fn empty_matches_advance() {
    let re = re(r"a*");
    assert_eq!(vec![(0, 2), (3, 3)], re.find_all_indices("aab", None));
    assert_eq!(vec![(0, 0)], re.find_all_indices("", None));
    // An empty match flush against the previous match's end is skipped.
    assert_eq!(vec![(0, 3)], re.find_all_indices("aaa", None));
}

#[test]
fn empty_haystacks() {
    assert!(re(r"a*").is_match(""));
    assert!(re(r"a*$").is_match(""));
    assert_eq!(Some((0, 0)), re(r"a*$").find_indices(""));
    assert!(!re(r"a+$").is_match(""));
    assert!(!re(r"world$").is_match(""));
    assert!(!re(r".*\.txt").is_match(""));
}

#[test]
fn verb_agreement() {
    // IsMatch, Find and FindIndices agree for every strategy.
    let patterns = [
        r"^/.*[\w-]+\.php$",
        r"^(get|put|head)",
        r"world$",
        r".*\.txt",
        r".*\.(txt|log|md)",
        r"[\w.+-]+@[\w.-]+\.[\w.-]+",
        r"(?m)^/.*\.php",
        r"\d+\.\d+\.\d+",
        r"[a-z]+",
        r"[a-z]+[0-9]+",
        r"(\w)+",
        r"foo|bar|quux",
        r"a*",
    ];
    let haystacks = [
        "",
        "/path/to/file.php",
        "get it",
        "hello world",
        "readme.txt",
        "user@host.example",
        "readme.txt\n/page.php",
        "version 1.2.3",
        "abc123",
        "12345",
        "nothing-here!",
    ];
    for pattern in patterns {
        let re = re(pattern);
        for haystack in haystacks {
            let found = re.find_indices(haystack);
            assert_eq!(
                re.is_match(haystack),
                found.is_some(),
                "IsMatch / Find disagree for {} on {:?}",
                pattern,
                haystack,
            );
            if let Some((start, end)) = found {
                assert!(start <= end && end <= haystack.len());
            }
        }
    }
}

#[test]
fn find_at_bounds() {
    let re = re(r"[a-z]+");
    let haystack = "abc def";
    for at in 0..=haystack.len() {
        if let Some((start, end)) = re.find_indices_at(haystack, at) {
            assert!(at <= start && start <= end && end <= haystack.len());
        }
    }
    assert!(re.find_at(haystack, haystack.len() + 1).is_none());
}

#[test]
fn config_knobs_cascade() {
    // Disabling the DFA demotes every DFA-led strategy.
    let no_dfa = Regex::builder()
        .configure(Regex::config().dfa(false))
        .build(r"world$")
        .unwrap();
    assert_eq!(Strategy::Nfa, no_dfa.strategy());
    assert_eq!(Some((6, 11)), no_dfa.find_indices("hello world"));

    let no_pre = Regex::builder()
        .configure(Regex::config().prefilter(false))
        .build(r".*\.(txt|log|md)")
        .unwrap();
    assert_ne!(Strategy::ReverseSuffixSet, no_pre.strategy());
    assert_eq!(Some((0, 10)), no_pre.find_indices("readme.txt"));

    // Raising the literal minimum demotes the email pattern; search results
    // are unchanged. This is why the default minimum must stay at one byte.
    let min2 = Regex::builder()
        .configure(Regex::config().min_literal_len(2))
        .build(r"[\w.+-]+@[\w.-]+\.[\w.-]+")
        .unwrap();
    assert_ne!(Strategy::ReverseInner, min2.strategy());
    assert_eq!(
        Some((0, 16)),
        min2.find_indices("user@example.com"),
    );
}

#[test]
fn stats_accumulate() {
    let re = re(r"(\w)+");
    re.reset_stats();
    assert!(re.is_match("hello"));
    re.find("hello world");
    let stats = re.stats();
    assert!(stats.nfa_searches > 0);
    re.reset_stats();
    assert_eq!(0, re.stats().nfa_searches);
}

#[test]
fn syntax_and_recursion_errors() {
    let err = Regex::new(r"foo(bar").unwrap_err();
    assert!(!err.is_config());
    assert!(err.syntax_error().is_some());

    let deep = format!("{}a{}", "(".repeat(100), ")".repeat(100));
    let err = Regex::builder()
        .configure(Regex::config().max_recursion_depth(50))
        .build(&deep)
        .unwrap_err();
    assert!(err.is_recursion());
}
