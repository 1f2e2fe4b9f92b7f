// Work around dead code warnings: rust-lang issue #46379
pub mod common;

// Work around dead code warnings: rust-lang issue #46379
use common::*;
use pretty_assertions::assert_eq;

fn test_zero_length_matches_tc(tc: TestConfig) {
    tc.compile(".*?").match_all("a").test_eq(vec!["", ""]);
    tc.compile("a*").match_all("baaab").test_eq(vec!["", "aaa", "", ""]);
    tc.compile("x*").match_all("").test_eq(vec![""]);
}

#[test]
fn test_zero_length_matches() {
    test_with_configs(test_zero_length_matches_tc)
}

fn test_greedy_and_lazy_tc(tc: TestConfig) {
    assert_eq!(tc.compile("a*").match1_range("aaa"), 0..3);
    assert_eq!(tc.compile("a*?").match1_range("aaa"), 0..0);
    assert_eq!(tc.compile("a+?").match1_range("aaa"), 0..1);
    assert_eq!(tc.compile("a??").match1_range("aaa"), 0..0);
    assert_eq!(tc.compile("a{2,}?").match1_range("aaaa"), 0..2);
    assert_eq!(tc.compile("a{1,3}").match1_range("aaaa"), 0..3);
    tc.compile("<.*>").match1f("<a><b>").test_eq("<a><b>");
    tc.compile("<.*?>").match1f("<a><b>").test_eq("<a>");
    tc.compile("<.+?>c").match1f("<a><b>c").test_eq("<a><b>c");
    tc.compile("(a+?)(a*)").match1f("aaa").test_eq("aaa,a,aa");
    tc.compile("(a*?)(a+)$").match1f("aaa").test_eq("aaa,,aaa");
}

#[test]
fn test_greedy_and_lazy() {
    test_with_configs(test_greedy_and_lazy_tc)
}

fn test_quantifier_bounds_tc(tc: TestConfig) {
    assert_eq!(tc.compile("a{0,0}").match1_range("aaa"), 0..0);
    tc.compile("ab{0,0}c").match1f("ac").test_eq("ac");
    tc.compile("ab{0,0}c").test_fails("abc");
    tc.compile("x{2}").match1f("xxx").test_eq("xx");
    tc.compile("x{2}y").test_fails("xy");
    tc.compile("x{2,3}y").match1f("xxxxy").test_eq("xxxy");
    tc.compile("(?:ab){2,3}c").match1f("abababc").test_eq("abababc");
    tc.compile("(?:ab){2,3}c").test_fails("abc");
    tc.compile("(?:ab){2,3}?ab").match1f("abababab").test_eq("ababab");
    tc.compile("(?:ab){2,}ab").match1f("abababab").test_eq("abababab");
    tc.compile("(?:ab){1,2}?c").match1f("ababc").test_eq("ababc");
    tc.compile("(?:a.c){2}").match1f("abcaxcz").test_eq("abcaxc");
    tc.compile("(?:[ab]c){0,2}d").match1f("acbcbcd").test_eq("bcbcd");

    // Braces that are not quantifiers are literal.
    tc.compile("a{,3}").match1f("a{,3}").test_eq("a{,3}");
    tc.compile("a{x}").match1f("a{x}").test_eq("a{x}");
    tc.compile("{").match1f("{").test_eq("{");
}

#[test]
fn test_quantifier_bounds() {
    test_with_configs(test_quantifier_bounds_tc)
}

fn test_leftmost_match_tc(tc: TestConfig) {
    let re = tc.compile("a.?");
    assert_eq!(re.match1_range("xaxab"), 1..3);
    re.match_all("xaxab").test_eq(vec!["ax", "ab"]);
    tc.compile("b|ab").match1f("ab").test_eq("ab");
    tc.compile("abc|b").match1f("abd").test_eq("b");
    tc.compile("x*y").match1f("aaxxy").test_eq("xxy");
}

#[test]
fn test_leftmost_match() {
    test_with_configs(test_leftmost_match_tc)
}

fn test_alternation_tc(tc: TestConfig) {
    tc.compile("a|ab").match1f("ab").test_eq("a");
    tc.compile("(a|ab)c").match1f("abc").test_eq("abc,ab");
    tc.compile("(a|ab)(c|bcd)(d*)")
        .match1f("abcd")
        .test_eq("abcd,a,bcd,");
    tc.compile("a|").match1f("b").test_eq("");
    tc.compile("|a").match1f("a").test_eq("");
    tc.compile("(?:)").match1f("abc").test_eq("");
    tc.compile("cat|dog|bird")
        .match_all("a dog, a cat, a bird")
        .test_eq(vec!["dog", "cat", "bird"]);
    tc.compile("(?:a|b|c)+d").match1f("xabcabd").test_eq("abcabd");
}

#[test]
fn test_alternation() {
    test_with_configs(test_alternation_tc)
}

fn test_captures_tc(tc: TestConfig) {
    assert_eq!(
        tc.compile("(a+)(a+)").match1_vec("aaa"),
        vec![Some("aaa"), Some("aa"), Some("a")]
    );
    assert_eq!(
        tc.compile("aa(b)?aa").match1_vec("aaaa"),
        vec![Some("aaaa"), None]
    );
    assert_eq!(
        tc.compile("(a)|b").match1_vec("b"),
        vec![Some("b"), None]
    );
    assert_eq!(
        tc.compile("(a)|(b)").match1_vec("b"),
        vec![Some("b"), None, Some("b")]
    );
    // Captures from a failed alternative do not leak.
    assert_eq!(
        tc.compile("(?:(a)c|ab)").match1_vec("ab"),
        vec![Some("ab"), None]
    );
    assert_eq!(
        tc.compile("((a)|b)+").match1_vec("ab"),
        vec![Some("ab"), Some("b"), Some("a")]
    );
    tc.compile(r"(\d+)-(\d+)")
        .match1f("call 555-1234 now")
        .test_eq("555-1234,555,1234");
    tc.compile("((a)(b))").match1f("ab").test_eq("ab,ab,a,b");
}

#[test]
fn test_captures() {
    test_with_configs(test_captures_tc)
}

fn test_captures_in_loops_tc(tc: TestConfig) {
    // A group keeps the value from the last iteration that set it.
    assert_eq!(
        tc.compile("(?:(a)|b)*").match1_vec("ab"),
        vec![Some("ab"), Some("a")]
    );
    assert_eq!(
        tc.compile("(ab)*c").match1_vec("ababc"),
        vec![Some("ababc"), Some("ab")]
    );
    assert_eq!(
        tc.compile("(a|b)*?c").match1_vec("abc"),
        vec![Some("abc"), Some("b")]
    );
    assert_eq!(
        tc.compile("x(a)*").match1_vec("x"),
        vec![Some("x"), None]
    );
    assert_eq!(
        tc.compile("(a)*b").match1_vec("aab"),
        vec![Some("aab"), Some("a")]
    );
    assert_eq!(
        tc.compile("(a)*?b").match1_vec("aab"),
        vec![Some("aab"), Some("a")]
    );
    assert_eq!(
        tc.compile("(a)+ab").match1_vec("aaab"),
        vec![Some("aaab"), Some("a")]
    );
    assert_eq!(
        tc.compile("(a*)*").match1_vec("b"),
        vec![Some(""), Some("")]
    );
    assert_eq!(
        tc.compile("(a*)+b").match1_vec("aab"),
        vec![Some("aab"), Some("")]
    );
    assert_eq!(
        tc.compile("([ab])+?b").match1_vec("aab"),
        vec![Some("aab"), Some("a")]
    );
}

#[test]
fn test_captures_in_loops() {
    test_with_configs(test_captures_in_loops_tc)
}

fn test_backrefs_tc(tc: TestConfig) {
    tc.compile(r"(a)\1").match1f("aa").test_eq("aa,a");
    tc.compile(r"(a)\1").test_fails("ab");
    tc.compile(r"(\w+)\s+\1").match1f("hello hello world").test_eq("hello hello,hello");
    tc.compile(r"(\w+)\s+\1\b").test_fails("hello helloworld");
    tc.compilef(r"(a)\1", "i").match1f("aA").test_eq("aA,a");
    tc.compile(r"(a)\1").test_fails("aA");
    // A backreference to a group that has not matched fails.
    tc.compile(r"(a)|\1b").test_fails("b");
    tc.compile(r"(?:(a)|b)\1").test_fails("b");
    tc.compile(r"(a*)b\1").match1f("aabaa").test_eq("aabaa,aa");
    tc.compile(r"(a*)b\1").match1f("aaba").test_eq("aba,a");
    tc.compile(r"(.)(.)\2\1").match1f("xabbay").test_eq("abba,a,b");
    // \10 is a backreference only when ten groups are open.
    tc.compile(r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)\10")
        .match1f("abcdefghijj")
        .test_eq("abcdefghijj,a,b,c,d,e,f,g,h,i,j");
    tc.compile(r"(a)\10").match1f("a\x08").test_eq("a\x08,a");
}

#[test]
fn test_backrefs() {
    test_with_configs(test_backrefs_tc)
}

fn test_anchors_tc(tc: TestConfig) {
    let re = tc.compile("^abc$");
    re.match1f("abc").test_eq("abc");
    re.test_fails("x\nabc\ny");
    re.test_fails("abcd");
    // $ allows a final newline.
    re.match1f("abc\n").test_eq("abc");

    let re = tc.compilef("^abc$", "m");
    assert_eq!(re.match1_range("x\nabc\ny"), 2..5);
    tc.compilef(r"^\d", "m")
        .match_all("aaa\n789\nccc\n345")
        .test_eq(vec!["7", "3"]);
    tc.compilef(r"\d$", "m")
        .match_all("aaa789\n789\nccc10\n345")
        .test_eq(vec!["9", "9", "0", "5"]);
    tc.compilef("(a*)^(a*)$", "m")
        .match1f("aa\naaa")
        .test_eq("aa,,aa");
    tc.compile("(a*)^(a*)$").test_fails("aa\naaa");
    tc.compilef("[ab]$", "").match1f("a\nb").test_eq("b");
    tc.compilef("[ab]$", "m").match1f("a\nb").test_eq("a");
    // ^ with m does not match after a final newline.
    tc.compilef("^", "m").match_all("a\n").test_eq(vec![""]);

    tc.compile(r"\Aab").test_fails("xab");
    tc.compilef(r"\Aab", "m").test_fails("x\nab");
    tc.compile(r"ab\z").match1f("ab").test_eq("ab");
    tc.compile(r"ab\z").test_fails("ab\n");
    tc.compile(r"ab\Z").match1f("ab\n").test_eq("ab");
    tc.compile(r"ab\Z").test_fails("ab\n\n");
    tc.compilef(r"ab\Z", "m").test_fails("ab\nc");
}

#[test]
fn test_anchors() {
    test_with_configs(test_anchors_tc)
}

fn test_search_start_tc(tc: TestConfig) {
    let re = tc.compile(r"\Gb");
    assert_eq!(re.re.find_at(b"ab", 1).map(|m| m.range()), Some(1..2));
    assert_eq!(re.re.find_at(b"ab", 0), None);
    // Iteration resumes at the end of the previous match.
    tc.compile(r"\Ga").match_all("aaba").test_eq(vec!["a", "a"]);
    assert_eq!(tc.compile("b").match_all_from("abab", 2), vec![3..4]);
}

#[test]
fn test_search_start() {
    test_with_configs(test_search_start_tc)
}

fn test_dotall_tc(tc: TestConfig) {
    tc.compile(r".").test_fails("\n");
    tc.compilef(r".", "s").match1f("\n").test_eq("\n");
    tc.compile(r".").match1f("\r").test_eq("\r");
    tc.compile("abc.def").test_fails("abc\ndef");
    tc.compilef("abc.def", "s").match1f("abc\ndef").test_eq("abc\ndef");
    tc.compile(".*").match1f("abc\ndef").test_eq("abc");
    tc.compilef(".*", "s").match1f("abc\ndef").test_eq("abc\ndef");
    tc.compile(".*b").match1f("aa\nab").test_eq("ab");
    tc.compilef(".*b", "s").match1f("aa\nab").test_eq("aa\nab");
    tc.compile(r"\C+").match1f("a\nb").test_eq("a\nb");
}

#[test]
fn test_dotall() {
    test_with_configs(test_dotall_tc)
}

fn test_char_classes_tc(tc: TestConfig) {
    let re = tc.compile("[^a-z]");
    re.match1f("A").test_eq("A");
    re.match1f("1").test_eq("1");
    re.match1f(" ").test_eq(" ");
    re.test_fails("m");

    tc.compile("[]a]+").match1f("x]a]").test_eq("]a]");
    tc.compile("[^]a]+").match1f("]ab").test_eq("b");
    tc.compile("[a-]+").match1f("x-a-").test_eq("-a-");
    tc.compile("[-a]+").match1f("x-a-").test_eq("-a-");
    tc.compile(r"[\w.]+").match1f("  foo.bar ").test_eq("foo.bar");
    tc.compile(r"[\d-z]+").match1f("a1-z").test_eq("1-z");
    tc.compile(r"[^\d\s]+").match1f("12 ab 3").test_eq("ab");
    tc.compile(r"[\b]").match1f("a\x08").test_eq("\x08");
    tc.compile(r"[\x41-\x43]+").match1f("xABCD").test_eq("ABC");
    tc.compile("[[:digit:]]+").match1f("ab123").test_eq("123");
    tc.compile("[[:^alpha:]]+").match1f("ab12cd").test_eq("12");
    tc.compile("[[:upper:][:digit:]]+").match1f("abC1d").test_eq("C1");
    tc.compile("[[:punct:]]").match1f("ab!").test_eq("!");
    tc.compile("[[:xdigit:]]+").match1f("xyzBEEFg").test_eq("BEEF");
    tc.compile("[[:space:]]").match1f("a\x0Bb").test_eq("\x0B");
    tc.compile(r"\s").test_fails("a\x0Bb");
    tc.compile("[[:word:]]+").match1f("!a_1!").test_eq("a_1");
    // An incomplete POSIX class is literal.
    tc.compile("[[:alpha]+").match1f("x[:a").test_eq("[:a");
}

#[test]
fn test_char_classes() {
    test_with_configs(test_char_classes_tc)
}

fn test_escapes_tc(tc: TestConfig) {
    tc.compile(r"\d+").match1f("ab123c").test_eq("123");
    tc.compile(r"\D+").match1f("123ab4").test_eq("ab");
    tc.compile(r"\w+").match1f("  a_1 ").test_eq("a_1");
    tc.compile(r"\W+").match1f("ab, cd").test_eq(", ");
    tc.compile(r"\s+").match1f("a \t\r\n\x0Cb").test_eq(" \t\r\n\x0C");
    tc.compile(r"\S+").match1f("  ab ").test_eq("ab");
    tc.compile(r"\x41\x{42}\103").match1f("ABC").test_eq("ABC");
    tc.compile(r"\t\n\r\f\e\a").match1f("\t\n\r\x0C\x1B\x07").test_eq("\t\n\r\x0C\x1B\x07");
    tc.compile(r"\cA\cz").match1f("\x01\x1A").test_eq("\x01\x1A");
    tc.compile(r"\0").match1f("a\0").test_eq("\0");
    tc.compile(r"\.\*\+\?").match1f("a.*+?").test_eq(".*+?");
    tc.compile(r"\q").match1f("q").test_eq("q");
}

#[test]
fn test_escapes() {
    test_with_configs(test_escapes_tc)
}

fn test_word_boundaries_tc(tc: TestConfig) {
    tc.compile(r"\bfoo\b").match1f("a foo b").test_eq("foo");
    tc.compile(r"\bfoo\b").test_fails("afoo");
    tc.compile(r"\bfoo\b").test_fails("foob");
    tc.compile(r"\Boo\B").match1f("foo fooo").test_eq("oo");
    tc.compile(r"\b").match_all("ab cd").test_eq(vec!["", "", "", ""]);
    tc.compile(r"\w+\b").match_all("ab, cd").test_eq(vec!["ab", "cd"]);
}

#[test]
fn test_word_boundaries() {
    test_with_configs(test_word_boundaries_tc)
}

fn test_case_insensitive_tc(tc: TestConfig) {
    tc.compilef("ABC", "i").match1f("xabc").test_eq("abc");
    tc.compilef("abc", "i").match1f("xAbC").test_eq("AbC");
    tc.compilef("[a-c]+", "i").match1f("xCAB").test_eq("CAB");
    tc.compilef("[^a-c]+", "i").match1f("CABxy").test_eq("xy");
    tc.compilef("a+", "i").match1f("AaA").test_eq("AaA");
    tc.compilef("(?:ab)+", "i").match1f("AbaB").test_eq("AbaB");
    tc.compile("abc").test_fails("ABC");
    // Only ASCII letters fold without the locale flag.
    tc.compilef("[a-z]", "i").test_fails("1");
    tc.compilef("a@", "i").test_fails("A`");
}

#[test]
fn test_case_insensitive() {
    test_with_configs(test_case_insensitive_tc)
}

fn test_locale_tc(tc: TestConfig) {
    let subject = b"\xE9t\xE9 ";
    assert_eq!(tc.compilef(r"\w+", "l").re.find_bytes(subject).map(|m| m.range()), Some(0..3));
    assert_eq!(tc.compilef(r"\w+", "").re.find_bytes(subject).map(|m| m.range()), Some(1..2));
    assert_eq!(
        tc.compilef(r"\xE9", "il").re.find_bytes(b"a\xC9").map(|m| m.range()),
        Some(1..2)
    );
    assert_eq!(tc.compilef(r"\xE9", "i").re.find_bytes(b"a\xC9"), None);
    assert_eq!(
        tc.compilef(r"\b\w", "l").re.find_bytes(b"\xE9a").map(|m| m.range()),
        Some(0..1)
    );
    assert_eq!(
        tc.compilef("[[:alpha:]]+", "l").re.find_bytes(b"1\xC0\xFF2").map(|m| m.range()),
        Some(1..3)
    );
}

#[test]
fn test_locale() {
    test_with_configs(test_locale_tc)
}

fn test_inline_flags_tc(tc: TestConfig) {
    tc.compile("(?i)abc").match1f("ABC").test_eq("ABC");
    tc.compile("a(?i)b").match1f("aB").test_eq("aB");
    tc.compile("a(?i)b").test_fails("AB");
    tc.compile("(?i:a)b").match1f("Ab").test_eq("Ab");
    tc.compile("(?i:a)b").test_fails("AB");
    // Flags set inside a group end with the group.
    tc.compile("(a(?i)b)c").match1f("aBc").test_eq("aBc,aB");
    tc.compile("(a(?i)b)c").test_fails("aBC");
    tc.compilef("a(?-i)b", "i").match1f("Ab").test_eq("Ab");
    tc.compilef("a(?-i)b", "i").test_fails("AB");
    tc.compile("(?s).").match1f("\n").test_eq("\n");
    tc.compile("(?m)^b").match1f("a\nb").test_eq("b");
    tc.compile("(?x) a b ").match1f("ab").test_eq("ab");
    tc.compile("a(?#comment)b").match1f("ab").test_eq("ab");
}

#[test]
fn test_inline_flags() {
    test_with_configs(test_inline_flags_tc)
}

fn test_extended_tc(tc: TestConfig) {
    tc.compilef("a b c # comment\n d", "x")
        .match1f("abcd")
        .test_eq("abcd");
    tc.compilef(r"a\ b", "x").match1f("a b").test_eq("a b");
    tc.compilef("[ ]", "x").match1f("a b").test_eq(" ");
    tc.compilef("a +", "x").match1f("aaa").test_eq("aaa");
    tc.compilef("a b", "").test_fails("ab");
}

#[test]
fn test_extended() {
    test_with_configs(test_extended_tc)
}

fn test_lookaheads_tc(tc: TestConfig) {
    assert_eq!(tc.compile("a(?=b)").match1_range("ab"), 0..1);
    tc.compile("a(?=b)").test_fails("ac");
    assert_eq!(tc.compile("a(?!b)").match1_range("abac"), 2..3);
    tc.compile(r"(?=(\w+))\w").match1f("abc").test_eq("a,abc");
    // Captures inside a negative lookahead are never set.
    assert_eq!(
        tc.compile(r"(?!(a)b)a.").match1_vec("ac"),
        vec![Some("ac"), None]
    );
    tc.compile(r"\w+(?=,)").match1f("ab, cd").test_eq("ab");
    tc.compile(r"(?=a)").match_all("aba").test_eq(vec!["", ""]);
    tc.compile(r"(?:(?=(a))a)+").match1f("aa").test_eq("aa,a");
    tc.compile(r"^(?=.*\d)(?=.*[a-z]).{6,}$").match1f("abc123").test_eq("abc123");
    tc.compile(r"^(?=.*\d)(?=.*[a-z]).{6,}$").test_fails("abcdef");
}

#[test]
fn test_lookaheads() {
    test_with_configs(test_lookaheads_tc)
}

fn test_lookbehinds_tc(tc: TestConfig) {
    tc.compile(r"(?<=efg)..")
        .match1f("abcdefghijk123456")
        .test_eq("hi");
    tc.compile(r"(?<=\d{3}).*")
        .match1f("abcdefghijk123456")
        .test_eq("456");
    tc.compile(r"(?<![a-z])..")
        .match1f("abcdefghijk123456")
        .test_eq("ab");
    tc.compile(r"(?<![a-z])\d{2}")
        .match1f("abcdefghijk123456")
        .test_eq("23");
    tc.compile(r"(?<=x{3})\d")
        .match1f("1yxx2xxx3xxxx4")
        .test_eq("3");
    tc.compile(r"(?<=(?:xx){3})\d")
        .match1f("1yxx2xxx3xxxx4xxxxx5xxxxxx6")
        .test_eq("6");
    tc.compile(r"(?<=a|b)c").match1f("xacbc").test_eq("c");
    tc.compile(r"(?<=(a))c").match1f("xac").test_eq("c,a");
    tc.compile(r"(?<=^)a").match1f("a").test_eq("a");
    tc.compile(r"(?<!^)a").match1f("aa").test_eq("a");
    assert_eq!(tc.compile(r"(?<!^)a").match1_range("aa"), 1..2);
    // Lookbehind sees bytes before the search start.
    let re = tc.compile(r"(?<=x)y");
    assert_eq!(re.re.find_at(b"xyxy", 1).map(|m| m.range()), Some(1..2));
    assert_eq!(re.re.find_bytes(&b"xyxy"[1..]).map(|m| m.range()), Some(2..3));
}

#[test]
fn test_lookbehinds() {
    test_with_configs(test_lookbehinds_tc)
}

fn test_independent_tc(tc: TestConfig) {
    tc.compile("(?>a+)b").match1f("aaab").test_eq("aaab");
    tc.compile("(?>a+)a").test_fails("aaa");
    tc.compile("(?>a|ab)c").test_fails("abc");
    tc.compile("(?>(a+))b").match1f("aab").test_eq("aab,aa");
    tc.compile("(?>x*)y").match1f("xxy").test_eq("xxy");
    tc.compile(r"(?>\d+)(\d)").test_fails("123");
    tc.compile(r"(?:(?>a*)b)+").match1f("abaab").test_eq("abaab");
}

#[test]
fn test_independent() {
    test_with_configs(test_independent_tc)
}

fn test_conditionals_tc(tc: TestConfig) {
    let re = tc.compile(r"^(\()?blah(?(1)\))$");
    re.match1f("(blah)").test_eq("(blah),(");
    re.match1f("blah").test_eq("blah,");
    re.test_fails("(blah");
    re.test_fails("blah)");

    let re = tc.compile(r"(?(?=a)ab|cd)");
    re.match1f("cd").test_eq("cd");
    re.match1f("ab").test_eq("ab");
    re.test_fails("ad");

    let re = tc.compile(r"(?(?!a)cd|ab)");
    re.match1f("cd").test_eq("cd");
    re.match1f("ab").test_eq("ab");

    tc.compile(r"(?(?<=x)a|b)")
        .match_all("xa b a")
        .test_eq(vec!["a", "b"]);
    tc.compile(r"(?(?<!x)a|b)").match1f("xba").test_eq("b");

    // A missing no-arm matches the empty string.
    tc.compile(r"(a)?(?(1)b)c").match1f("abc").test_eq("abc,a");
    tc.compile(r"(a)?(?(1)b)c").match1f("c").test_eq("c,");
    tc.compile(r"^(a)?(?(1)b)c").test_fails("ac");
}

#[test]
fn test_conditionals() {
    test_with_configs(test_conditionals_tc)
}

fn test_nested_loops_tc(tc: TestConfig) {
    tc.compile("(?:a|b)*c").match1f("abbac").test_eq("abbac");
    tc.compile("(?:a*b)*c").match1f("abaabc").test_eq("abaabc");
    tc.compile("(?:(?:ab)*c)+").match1f("abcababcc").test_eq("abcababcc");
    tc.compile("(?:a?)*b").match1f("aab").test_eq("aab");
    tc.compile("(?:a*)*b").match1f("aab").test_eq("aab");
    tc.compile("(?:a*)+").match1f("aaa").test_eq("aaa");
    tc.compile("(?:a|)*?b").match1f("aab").test_eq("aab");
    tc.compile("(a{1,2}){2}").match1f("aaaa").test_eq("aaaa,aa");
    tc.compile("(a{1,2}){2}").match1f("aaa").test_eq("aaa,a");
    tc.compile("(a{1,2}?){2}").match1f("aaa").test_eq("aa,a");
    tc.compile(r"(\d+(?:\.\d+)?)+").match1f("1.5").test_eq("1.5,1.5");
}

#[test]
fn test_nested_loops() {
    test_with_configs(test_nested_loops_tc)
}

fn test_deeply_nested_loops_tc(tc: TestConfig) {
    let stars = format!("{}a{}", "(?:".repeat(40), ")*".repeat(40));
    tc.compile(&stars).match1f("aaa").test_eq("aaa");

    // Counted loops around a general loop multiply when unrolled.
    let mut counted = String::from("(?:ab)*c");
    for _ in 0..7 {
        counted = format!("(?:{}){{5}}", counted);
    }
    let cr = tc.compile(&counted);
    let subject = "c".repeat(78125);
    assert_eq!(cr.match1_range(&subject), 0..78125);
    cr.test_fails(&subject[1..]);

    let many = "(?:(?:ab)*c){3}".repeat(13108);
    let cr = tc.compile(&many);
    let subject = "abc".repeat(13108 * 3);
    assert_eq!(cr.match1_range(&subject), 0..subject.len());
}

#[test]
fn test_deeply_nested_loops() {
    test_with_configs(test_deeply_nested_loops_tc)
}

fn test_end_min_tc(tc: TestConfig) {
    let re = tc.compile("a*?");
    assert_eq!(regback::find(&re.re, b"aaa", 0, 2).map(|m| m.range()), Some(0..2));
    assert_eq!(regback::find(&re.re, b"aaa", 1, 2).map(|m| m.range()), Some(1..3));
    assert_eq!(regback::find(&re.re, b"aaa", 1, 3), None);
    let re = tc.compile("b|ab");
    // The first match at 0 is too short, so the search moves on.
    assert_eq!(regback::find(&re.re, b"abab", 0, 3).map(|m| m.range()), Some(2..4));
    // Start past the end.
    assert_eq!(regback::find(&re.re, b"ab", 3, 0), None);
}

#[test]
fn test_end_min() {
    test_with_configs(test_end_min_tc)
}

fn test_bytes_tc(tc: TestConfig) {
    tc.compile(r"\xFF+").match1f_bytes(b"a\xFF\xFFb");
    assert_eq!(
        tc.compile(r"\xFF+").re.find_bytes(b"a\xFF\xFFb").map(|m| m.range()),
        Some(1..3)
    );
    assert_eq!(
        tc.compile(r"[\x80-\xFF]").re.find_bytes(b"ab\x80").map(|m| m.range()),
        Some(2..3)
    );
    assert_eq!(
        tc.compile(r"\0+").re.find_bytes(b"a\0\0").map(|m| m.range()),
        Some(1..3)
    );
    // A multibyte character in the pattern is a byte sequence.
    assert_eq!(tc.compile("é+").match1_range("xéé"), 1..5);
    assert_eq!(tc.compile(".").match1_range("é"), 0..1);
}

#[test]
fn test_bytes() {
    test_with_configs(test_bytes_tc)
}

fn test_determinism_tc(tc: TestConfig) {
    let re = tc.compile(r"(\w+)@(\w+)\.com");
    let subject = "mail bob@example.com or amy@test.com";
    let first = re.matches(subject, 0);
    let second = re.matches(subject, 0);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(
        re.run_global_match(subject),
        "bob@example.com,bob,example,amy@test.com,amy,test"
    );
}

#[test]
fn test_determinism() {
    test_with_configs(test_determinism_tc)
}

#[test]
fn test_match_accessors() {
    let re = regback::Regex::new(r"(a)(x)?(b)").unwrap();
    let m = re.find("zab").unwrap();
    assert_eq!(m.start(), 1);
    assert_eq!(m.end(), 3);
    assert_eq!(m.range(), 1..3);
    assert_eq!(m.group(0), Some(1..3));
    assert_eq!(m.group(1), Some(1..2));
    assert_eq!(m.group(2), None);
    assert_eq!(m.group(3), Some(2..3));
    assert_eq!(m.group(4), None);
    assert_eq!(
        m.groups().collect::<Vec<_>>(),
        vec![Some(1..3), Some(1..2), None, Some(2..3)]
    );
    assert_eq!(re.group_count(), 3);
}

#[test]
fn test_compile_and_find() {
    let re = regback::compile("b+", regback::Flags::default()).unwrap();
    assert_eq!(regback::find(&re, b"abbc", 0, 0).map(|m| m.range()), Some(1..3));
    assert_eq!(regback::find(&re, b"abbc", 2, 0).map(|m| m.range()), Some(2..3));
    assert_eq!(regback::find(&re, b"abbc", 3, 0), None);
    let re: regback::Regex = "c$".parse().unwrap();
    assert!(re.find("abc").is_some());
}

#[test]
fn test_flags() {
    let flags = regback::Flags::from("imsxlq");
    assert!(flags.icase && flags.multiline && flags.dot_all && flags.extended && flags.locale);
    assert!(!flags.no_opt);
    assert_eq!(flags.to_string(), "imsxl");
    assert_eq!(regback::Flags::from("mi").to_string(), "im");
    assert_eq!(regback::Flags::default().to_string(), "");
}

#[test]
fn test_step_budget() {
    let re = regback::Regex::new(r"(a*)*[bc]").unwrap();
    let subject = [b'a'; 40];
    let opts = regback::ExecOptions {
        start: 0,
        end_min: 0,
        step_budget: Some(50_000),
    };
    assert_eq!(
        re.exec(&subject, opts),
        Err(regback::MatchError::BudgetExhausted(50_000))
    );

    // find reports exhaustion as no match.
    let limited = re.clone().with_step_budget(50_000);
    assert_eq!(limited.find_bytes(&subject), None);
    assert_eq!(limited.find_iter_bytes(&subject).count(), 0);

    // A generous budget does not change results.
    let re = regback::Regex::new(r"(\w+)\s(\w+)").unwrap().with_step_budget(10_000);
    let m = re.find("hello world").unwrap();
    assert_eq!(m.group(2), Some(6..11));
    let opts = regback::ExecOptions {
        step_budget: Some(10_000),
        ..Default::default()
    };
    assert_eq!(re.exec(b"hello world", opts).unwrap(), Some(m));
}

#[test]
fn test_shared_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let re = Arc::new(regback::Regex::new(r"(\d+)-(\d+)").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let re = Arc::clone(&re);
            thread::spawn(move || {
                let subject = format!("x {}-{} y", i, i * 10);
                let m = re.find(&subject).unwrap();
                subject[m.group(2).unwrap()].to_string()
            })
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec!["0", "10", "20", "30"]);
}

#[test]
fn test_pathological_patterns_with_budget() {
    // Nested quantifiers that would take exponential time finish quickly
    // under a budget.
    let re = regback::Regex::new(r"^(a+)+$").unwrap().with_step_budget(100_000);
    let mut subject = vec![b'a'; 30];
    subject.push(b'!');
    assert_eq!(re.find_bytes(&subject), None);
    assert!(re.find_bytes(&subject[..30]).is_some());
}
