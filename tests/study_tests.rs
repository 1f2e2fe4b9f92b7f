#![allow(clippy::uninlined_format_args)]

use regback::{Anchoring, Flags, Regex, StartClass};

fn compile(pattern: &str, flags: &str) -> Regex {
    match Regex::with_flags(pattern, flags) {
        Ok(re) => re,
        Err(err) => panic!("Failed to parse {}: {}", pattern, err),
    }
}

fn check_bytes(re: &Regex) -> Option<Vec<u8>> {
    re.study().check.as_ref().map(|c| c.searcher.bytes().to_vec())
}

#[test]
fn test_length_bounds() {
    let re = compile("ab(c|de)f", "");
    assert_eq!((re.min_len(), re.max_len()), (4, Some(5)));

    let re = compile("a{2,4}b*", "");
    assert_eq!((re.min_len(), re.max_len()), (2, None));

    let re = compile("(?=abc)a", "");
    assert_eq!((re.min_len(), re.max_len()), (1, Some(1)));

    let re = compile("", "");
    assert_eq!((re.min_len(), re.max_len()), (0, Some(0)));
}

#[test]
fn test_min_len_rejects_short_subjects() {
    let re = compile("abcd|efgh", "");
    assert_eq!(re.min_len(), 4);
    assert!(re.find("abc").is_none());
    assert!(re.find("xxefgh").is_some());
}

#[test]
fn test_anchoring_is_reported() {
    assert_eq!(compile(r"\Afoo", "").study().anchor, Anchoring::StartOfText);
    assert_eq!(
        compile("^foo", "m").study().anchor,
        Anchoring::StartOfLine { implicit: false }
    );
    assert_eq!(compile("foo", "").study().anchor, Anchoring::None);
}

#[test]
fn test_anchored_searches() {
    let re = compile("^b", "m");
    let text = "ab\nbc\nb";
    let starts: Vec<usize> = re.find_iter(text).map(|m| m.start()).collect();
    assert_eq!(starts, vec![3, 6]);

    // Implicit anchoring from a leading .* still finds later lines.
    let re = compile(".*x", "");
    let ranges: Vec<_> = re.find_iter("ab\ncx\nx").map(|m| m.range()).collect();
    assert_eq!(ranges, vec![3..5, 6..7]);

    let re = compile("^a", "");
    assert_eq!(re.find_at(b"aa", 1), None);

    let re = compile(r"\Ga", "");
    assert_eq!(re.find_at(b"baa", 1).map(|m| m.range()), Some(1..2));
    assert_eq!(re.find_at(b"bba", 1), None);
}

#[test]
fn test_required_substring_is_reported() {
    let re = compile(r"\d+-needle-\d+", "");
    assert_eq!(check_bytes(&re), Some(b"-needle-".to_vec()));
    let floating = re.study().floating_substr.as_ref().expect("floating substring");
    assert_eq!(floating.min_offset, 1);
    assert_eq!(floating.max_offset, None);

    let re = compile("prefix[0-9]", "");
    let anchored = re.study().anchored_substr.as_ref().expect("anchored substring");
    assert!(anchored.is_anchored());
    assert_eq!(anchored.searcher.bytes(), b"prefix");
}

#[test]
fn test_required_substring_searches() {
    let re = compile(r"\d+-needle-\d+", "");
    let text = "12-noodle-34 56-needle-78";
    assert_eq!(re.find(text).map(|m| m.range()), Some(13..25));
    assert!(re.find("12-needle").is_none());

    // Lookbehind may look at bytes before the search start.
    let re = compile("a(?<=xa)b", "");
    assert_eq!(re.find_at(b"xab", 1).map(|m| m.range()), Some(1..3));
}

#[test]
fn test_start_class() {
    let re = compile("[qz]uux|wuux", "");
    assert_eq!(
        re.study().start_class,
        Some(StartClass::Three([b'q', b'w', b'z']))
    );
    let starts: Vec<usize> = re
        .find_iter("aquux zuux wuux quu")
        .map(|m| m.start())
        .collect();
    assert_eq!(starts, vec![1, 6, 11]);

    // A class that admits everything is no class at all.
    assert_eq!(compile("[\\d\\D]a", "").study().start_class, None);
}

#[test]
fn test_cost_grows_with_pattern() {
    let small = compile("a", "");
    let large = compile("(a|b)*c(d|e)+(?=f)", "");
    assert!(large.cost() > small.cost());
}

#[test]
fn test_hints_do_not_change_results() {
    let cases: &[(&str, &str, &str)] = &[
        ("abc.*defgh", "", "abc defg abcxdefgh defgh"),
        ("^foo", "m", "foo\nbar\nfoo"),
        (".*bar", "", "foo\nfoobar\nbar"),
        ("[xy]+z", "", "aaxz yyz z"),
        (r"\bword\b", "", "swordfish word words"),
        ("a{2,3}b", "", "ab aab aaab aaaab"),
        ("(?i)hello", "", "HeLLo hello"),
        ("(a)\\1b", "", "aab aaab ab"),
        ("x*", "", "axxb"),
    ];
    for (pattern, flags, text) in cases {
        let mut no_opt = Flags::from(*flags);
        no_opt.no_opt = true;
        let plain = compile(pattern, flags);
        let unoptimized = match Regex::with_flags(pattern, no_opt) {
            Ok(re) => re,
            Err(err) => panic!("Failed to parse {}: {}", pattern, err),
        };
        let lhs: Vec<_> = plain.find_iter(text).collect();
        let rhs: Vec<_> = unoptimized.find_iter(text).collect();
        assert_eq!(lhs, rhs, "Optimized results differ for {}", pattern);
    }
}
