/*!
One compiled regex shared by many workers must behave exactly like one
used serially: the pool hands each in-flight search its own scratch, and
nothing but the statistics counters is ever written after construction.
*/

use std::sync::Arc;
use std::thread;

use metaregex::Regex;

const WORKERS: usize = 16;
const ITERATIONS: usize = 100;

// Scenario: 16 workers x 100 iterations all see the same first match.
#[test]
fn shared_find_is_deterministic() {
    let _ = env_logger::try_init();
    let re = Arc::new(Regex::new(r"(\w+)").unwrap());
    let haystack = "hello world test";
    let expected = re.find_indices(haystack);
    assert_eq!(Some((0, 5)), expected);

    thread::scope(|scope| {
        for _ in 0..WORKERS {
            let re = Arc::clone(&re);
            scope.spawn(move || {
                for _ in 0..ITERATIONS {
                    let m = re.find(haystack).unwrap();
                    assert_eq!((0, 5), (m.start(), m.end()));
                    assert_eq!(b"hello", m.as_bytes());
                }
            });
        }
    });
}

// Every strategy family, searched concurrently with differing haystacks,
// must produce the same answers as a serial run.
#[test]
fn shared_engines_match_serial_results() {
    let _ = env_logger::try_init();
    let cases: Vec<(Regex, Vec<&str>)> = vec![
        (
            Regex::new(r"[\w.+-]+@[\w.-]+\.[\w.-]+").unwrap(),
            vec!["a@b.c", "no match", "x y z a@b.cd e", ""],
        ),
        (
            Regex::new(r"world$").unwrap(),
            vec!["hello world", "world hello", "world", ""],
        ),
        (
            Regex::new(r".*\.(txt|log|md)").unwrap(),
            vec!["readme.txt", "style.css", "a.md\nb.log", ""],
        ),
        (
            Regex::new(r"\d+\.\d+\.\d+").unwrap(),
            vec!["1.2.3", "no digits", "v 10.20.30 end", ""],
        ),
        (
            Regex::new(r"[a-z]+[0-9]+").unwrap(),
            vec!["abc123", "123abc", "x1", ""],
        ),
        (
            Regex::new(r"^/.*[\w-]+\.php$").unwrap(),
            vec!["/a/b.php", "b.php", "/x.php", ""],
        ),
    ];

    // Serial baseline first.
    let baselines: Vec<Vec<Option<(usize, usize)>>> = cases
        .iter()
        .map(|(re, haystacks)| {
            haystacks.iter().map(|h| re.find_indices(h)).collect()
        })
        .collect();

    thread::scope(|scope| {
        for _ in 0..WORKERS {
            let cases = &cases;
            let baselines = &baselines;
            scope.spawn(move || {
                for _ in 0..ITERATIONS {
                    for (case, baseline) in cases.iter().zip(baselines) {
                        let (re, haystacks) = case;
                        for (haystack, expected) in
                            haystacks.iter().zip(baseline)
                        {
                            assert_eq!(
                                *expected,
                                re.find_indices(haystack),
                                "{} on {:?}",
                                re.pattern(),
                                haystack,
                            );
                        }
                    }
                }
            });
        }
    });
}

// Iterators hold pool state across their whole loop; interleaved iteration
// from many threads must not bleed between workers.
#[test]
fn concurrent_iteration() {
    let _ = env_logger::try_init();
    let re = Arc::new(Regex::new(r"[a-z]+").unwrap());
    let haystack = "one two three four five six seven";
    let expected: Vec<(usize, usize)> =
        re.find_iter(haystack).map(|m| (m.start(), m.end())).collect();
    assert_eq!(7, expected.len());

    thread::scope(|scope| {
        for _ in 0..WORKERS {
            let re = Arc::clone(&re);
            let expected = expected.clone();
            scope.spawn(move || {
                for _ in 0..ITERATIONS {
                    let got: Vec<(usize, usize)> = re
                        .find_iter(haystack)
                        .map(|m| (m.start(), m.end()))
                        .collect();
                    assert_eq!(expected, got);
                }
            });
        }
    });
}

// Counters must keep counting under contention; exact totals depend on
// engine routing, but every worker's searches must be visible.
#[test]
fn stats_under_contention() {
    let _ = env_logger::try_init();
    let re = Arc::new(Regex::new(r"(\w)+").unwrap());
    re.reset_stats();
    thread::scope(|scope| {
        for _ in 0..WORKERS {
            let re = Arc::clone(&re);
            scope.spawn(move || {
                for _ in 0..ITERATIONS {
                    assert!(re.is_match("hello"));
                }
            });
        }
    });
    let stats = re.stats();
    assert!(
        stats.nfa_searches >= (WORKERS * ITERATIONS) as u64,
        "{:?}",
        stats,
    );
}

// Cloning shares the compiled engines but not the pool.
#[test]
fn clones_share_read_only_state() {
    let _ = env_logger::try_init();
    let re = Regex::new(r"world$").unwrap();
    let clone = re.clone();
    assert_eq!(re.strategy(), clone.strategy());
    assert_eq!(
        re.find_indices("hello world"),
        clone.find_indices("hello world"),
    );
}
