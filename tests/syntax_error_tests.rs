#![allow(clippy::uninlined_format_args)]

use regback::{CompileError, ErrorKind};

#[track_caller]
fn compile_error(pattern: &str, flags: &str) -> CompileError {
    match regback::Regex::with_flags(pattern, flags) {
        Ok(_) => panic!("Pattern should not have parsed: {}", pattern),
        Err(err) => err,
    }
}

#[track_caller]
fn test_1_error(pattern: &str, expected_err: &str) {
    let err = compile_error(pattern, "").to_string();
    assert!(
        err.contains(expected_err),
        "Error text '{}' did not contain '{}' for pattern '{}'",
        err,
        expected_err,
        pattern
    );
}

#[track_caller]
fn test_1_span(pattern: &str, kind: ErrorKind, span: core::ops::Range<usize>) {
    let err = compile_error(pattern, "");
    assert_eq!(err.kind, kind, "Wrong error for pattern '{}'", pattern);
    assert_eq!(err.span, span, "Wrong span for pattern '{}'", pattern);
    assert_eq!(err.offset(), span.start);
}

#[test]
fn test_excessive_capture_groups() {
    let mut captures = String::from("s");
    let mut loops = String::from("s");
    for _ in 0..65536 {
        captures.push_str("(x)");
        loops.push_str("x{3,5}");
    }
    test_1_error(captures.as_str(), "Too many capture groups");
    test_1_error(loops.as_str(), "Too many loops");
}

#[test]
fn test_limits_are_inclusive() {
    let captures = "(x)".repeat(65535);
    let re = regback::Regex::new(&captures).expect("65535 groups should parse");
    assert_eq!(re.group_count(), 65535);
    let m = re.find(&"x".repeat(65535)).expect("Should have matched");
    assert_eq!(m.group(65535), Some(65534..65535));

    let too_many = format!("{}(x)", captures);
    let err = compile_error(&too_many, "");
    assert_eq!(err.kind, ErrorKind::TooManyGroups);
    assert_eq!(err.span, 196605..196606);

    let loops = "(?:ab)*".repeat(65535);
    assert!(regback::Regex::new(&loops).is_ok());
    let err = compile_error(&format!("{}c+", loops), "");
    assert_eq!(err.kind, ErrorKind::TooManyLoops);
}

#[test]
fn test_excessive_nesting() {
    let pattern = format!("{}a{}", "(".repeat(5000), ")".repeat(5000));
    test_1_error(&pattern, "Pattern nested too deeply");
}

#[test]
fn test_syntax_errors() {
    test_1_error(r"*", "Quantifier follows nothing");
    test_1_error(r"?", "Quantifier follows nothing");
    test_1_error(r"{3,5}", "Quantifier follows nothing");
    test_1_error(r"a|*", "Quantifier follows nothing");
    test_1_error(r"x**", "Nested quantifiers");
    test_1_error(r"x+?+", "Nested quantifiers");
    test_1_error(r"x{5,3}", "Can't do {n,m} with n > m");
    test_1_error(r"x{40000}", "Quantifier in {,} bigger than 32766");

    test_1_error(r"[abc", "Unmatched [");
    test_1_error(r"[]", "Unmatched [");
    test_1_error(r"(", "Unmatched (");
    test_1_error(r"(?!", "Unmatched (");
    test_1_error(r"(?i", "Unmatched (");
    test_1_error(r"abc)", "Unmatched )");

    test_1_error(r"[z-a]", "Invalid [] range");
    test_1_error(r"[[:foo:]]", "Character class [:foo:] unknown");
    test_1_error(r"[[=a=]]", "POSIX syntax [= =] is reserved for future extensions");
    test_1_error(r"[[.a.]]", "POSIX syntax [. .] is reserved for future extensions");
    test_1_error("[é]", "Code point too large in character class");

    test_1_error("\\", "Trailing \\");
    test_1_error(r"\c", "Missing control char name in \\c");
    test_1_error(r"\x{41", "Missing right brace on \\x{}");
    test_1_error(r"\p{L}", "Unsupported escape \\p");
    test_1_error(r"\X", "Unsupported escape \\X");

    test_1_error(r"\2(a)", "Reference to nonexistent group");
    test_1_error(r"(a)\2", "Reference to nonexistent group");
    test_1_error(r"(?(2)a|b)(x)", "Reference to nonexistent group");

    test_1_error("(?q:abc)", "Sequence (?q...) not recognized");
    test_1_error("(?<x>abc)", "Sequence (?<...) not recognized");
    test_1_error("(?#abc", "Sequence (?#... not terminated");
    test_1_error("(?(x)a|b)", "Unknown switch condition (?(...))");
    test_1_error("(?(1)a|b|c)(x)", "contains too many branches");
    test_1_error("(?<=a+)b", "Variable length lookbehind not implemented");
    test_1_error("(?<!a|bc)b", "Variable length lookbehind not implemented");
}

#[test]
fn test_embedded_code_is_unsupported() {
    for pattern in &["(?{ 1 })", "a(??{ $re })", "(?p{ x })"] {
        let err = compile_error(pattern, "");
        assert_eq!(err.kind, ErrorKind::EmbeddedCode);
        assert!(err.message().contains("unsupported extension"));
    }
}

#[test]
fn test_error_spans() {
    test_1_span("a{3,2}", ErrorKind::MinGreaterThanMax, 1..6);
    test_1_span("xa{3,2}b", ErrorKind::MinGreaterThanMax, 2..7);
    test_1_span("(abc", ErrorKind::UnmatchedOpen, 0..1);
    test_1_span("abc)", ErrorKind::UnmatchedClose, 3..4);
    test_1_span("ab[cd", ErrorKind::UnmatchedBracket, 2..3);
    test_1_span("*a", ErrorKind::QuantifierFollowsNothing, 0..1);
    test_1_span("a**", ErrorKind::NestedQuantifiers, 2..3);
    test_1_span("a{40000}", ErrorKind::QuantifierTooBig(32766), 1..8);
    test_1_span(r"(a)\2", ErrorKind::NonexistentGroup, 3..5);
    test_1_span("abc\\", ErrorKind::TrailingBackslash, 3..4);
    test_1_span("[z-a]", ErrorKind::InvalidRange, 1..4);
    test_1_span(
        "[[:foo:]]",
        ErrorKind::UnknownPosixClass("foo".to_string()),
        1..8,
    );
    test_1_span("x(?{ 1 })", ErrorKind::EmbeddedCode, 1..4);
    test_1_span("(?Q)", ErrorKind::UnknownGroupSyntax('Q'), 0..3);
    test_1_span("(?<=a+)b", ErrorKind::VariableLookbehind, 0..6);
}

#[test]
fn test_error_display() {
    let err = compile_error("a{3,2}", "");
    assert_eq!(err.to_string(), "Can't do {n,m} with n > m at offset 1");
    assert_eq!(err.message(), "Can't do {n,m} with n > m");
}

#[test]
fn test_things_that_parse() {
    for pattern in &[
        "",
        "a{,3}",
        "a{x}",
        "{",
        "}",
        "]",
        "[]]",
        "[^]]",
        r"[a-\d]",
        r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)\10",
        r"(a)\10",
        "(?i)(?-i)(?s-m:a)",
        "(?#comment)",
        "(?(1)a)(b)",
        "(?(?=a)a|b)",
        "(?>a+)",
        "(?<=ab|cd)e",
        "x{32766}",
    ] {
        assert!(
            regback::Regex::new(pattern).is_ok(),
            "Pattern should have parsed: {}",
            pattern
        );
    }
    assert!(regback::Regex::with_flags("a b # comment", "x").is_ok());
}
