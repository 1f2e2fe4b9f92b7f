#![allow(clippy::uninlined_format_args)]
#![allow(dead_code)]

/// Test that \p pattern fails to parse with default flags.
#[track_caller]
pub fn test_parse_fails(pattern: &str) {
    let res = regback::Regex::new(pattern);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);
}

/// Test that \p pattern fails to parse with flags.
#[track_caller]
pub fn test_parse_fails_flags(pattern: &str, flags: &str) {
    let res = regback::Regex::with_flags(pattern, flags);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);
}

/// Format a Match by inserting commas between all capture groups.
fn format_match(r: &regback::Match, input: &[u8]) -> String {
    let mut result = String::from_utf8_lossy(&input[r.range()]).into_owned();
    for cg in r.captures.iter() {
        result.push(',');
        if let Some(cg) = cg {
            result.push_str(&String::from_utf8_lossy(&input[cg.clone()]))
        }
    }
    result
}

pub trait StringTestHelpers {
    /// "Fluent" style helper for testing that a String is equal to a str.
    fn test_eq(&self, s: &str);
}

impl StringTestHelpers for String {
    #[track_caller]
    fn test_eq(&self, rhs: &str) {
        pretty_assertions::assert_eq!(self.as_str(), rhs)
    }
}

pub trait VecTestHelpers {
    /// "Fluent" style helper for testing that a Vec<&str> is equal to a
    /// Vec<&str>.
    fn test_eq(&self, rhs: Vec<&str>);
}

impl VecTestHelpers for Vec<&str> {
    #[track_caller]
    fn test_eq(&self, rhs: Vec<&str>) {
        pretty_assertions::assert_eq!(*self, rhs)
    }
}

/// A compiled regex which remembers a TestConfig.
#[derive(Debug, Clone)]
pub struct TestCompiledRegex {
    pub re: regback::Regex,
    tc: TestConfig,
}

impl TestCompiledRegex {
    /// Search for self in \p input, returning a list of all matches.
    pub fn matches_bytes(&self, input: &[u8], start: usize) -> Vec<regback::Match> {
        self.re.find_iter_at(input, start).collect()
    }

    /// Search for self in \p input, returning a list of all matches.
    pub fn matches(&self, input: &str, start: usize) -> Vec<regback::Match> {
        self.matches_bytes(input.as_bytes(), start)
    }

    /// Search for self in \p input, returning the first Match, or None if
    /// none.
    pub fn find(&self, input: &str) -> Option<regback::Match> {
        self.find_bytes(input.as_bytes())
    }

    /// Like find(), but for bytes.
    pub fn find_bytes(&self, input: &[u8]) -> Option<regback::Match> {
        let found = self.re.find_bytes(input);
        // The iterator must agree with a single search.
        assert_eq!(
            found,
            self.matches_bytes(input, 0).into_iter().next(),
            "find and find_iter disagree"
        );
        found
    }

    /// Match against a string, returning the first formatted match.
    #[track_caller]
    pub fn match1f(&self, input: &str) -> String {
        match self.find(input) {
            Some(m) => format_match(&m, input.as_bytes()),
            None => panic!("Failed to match {}", input),
        }
    }

    /// Match against bytes, returning the first formatted match.
    #[track_caller]
    pub fn match1f_bytes(&self, input: &[u8]) -> String {
        match self.find_bytes(input) {
            Some(m) => format_match(&m, input),
            None => panic!("Failed to match {:?}", input),
        }
    }

    /// Match against a string, returning the match as a Vec containing None
    /// for unmatched groups, or the matched strings.
    #[track_caller]
    pub fn match1_vec<'b>(&self, input: &'b str) -> Vec<Option<&'b str>> {
        let mut result = Vec::new();
        let m: regback::Match = self.find(input).expect("Failed to match");
        result.push(Some(&input[m.range()]));
        for cr in m.captures {
            result.push(cr.map(|r| &input[r]));
        }
        result
    }

    /// Return the range of the first match.
    #[track_caller]
    pub fn match1_range(&self, input: &str) -> regback::Range {
        match self.find(input) {
            Some(m) => m.range(),
            None => panic!("Failed to match {}", input),
        }
    }

    /// Test that matching against \p input fails.
    #[track_caller]
    pub fn test_fails(&self, input: &str) {
        assert!(self.find(input).is_none(), "Should not have matched {}", input)
    }

    /// Test that matching against \p input succeeds.
    #[track_caller]
    pub fn test_succeeds(&self, input: &str) {
        assert!(self.find(input).is_some(), "Should have matched {}", input)
    }

    /// Return a list of all non-overlapping total match ranges from a given
    /// start.
    pub fn match_all_from(&self, input: &str, start: usize) -> Vec<regback::Range> {
        self.matches(input, start)
            .into_iter()
            .map(move |m| m.range())
            .collect()
    }

    /// Return a list of all non-overlapping matches.
    pub fn match_all<'b>(&self, input: &'b str) -> Vec<&'b str> {
        self.matches(input, 0)
            .into_iter()
            .map(move |m| &input[m.range()])
            .collect()
    }

    /// Collect all matches into a String, separated by commas.
    pub fn run_global_match(&self, input: &str) -> String {
        self.matches(input, 0)
            .into_iter()
            .map(move |m| format_match(&m, input.as_bytes()))
            .collect::<Vec<String>>()
            .join(",")
    }
}

/// Description of how to test a regex.
#[derive(Debug, Copy, Clone)]
pub struct TestConfig {
    // Whether to optimize.
    optimize: bool,

    // A step budget large enough that no test pattern reaches it.
    budget: Option<u64>,
}

impl TestConfig {
    /// Compile a pattern to a regex, with default flags.
    #[track_caller]
    pub fn compile(&self, pattern: &str) -> TestCompiledRegex {
        self.compilef(pattern, "")
    }

    /// Compile a pattern to a regex, with given flags.
    #[track_caller]
    pub fn compilef(&self, pattern: &str, flags_str: &str) -> TestCompiledRegex {
        let mut flags = regback::Flags::from(flags_str);
        flags.no_opt = !self.optimize;

        let re = match regback::Regex::with_flags(pattern, flags) {
            Ok(re) => re,
            Err(err) => panic!(
                "Failed to parse! flags: {} pattern: {}, error: {}",
                flags_str, pattern, err
            ),
        };
        let re = match self.budget {
            Some(budget) => re.with_step_budget(budget),
            None => re,
        };
        TestCompiledRegex { re, tc: *self }
    }

    /// Test that \p pattern and \p flags successfully parses, and matches
    /// \p input.
    #[track_caller]
    pub fn test_match_succeeds(&self, pattern: &str, flags_str: &str, input: &str) {
        let cr = self.compilef(pattern, flags_str);
        cr.test_succeeds(input)
    }

    /// Test that \p pattern and \p flags successfully parses, and does not
    /// match \p input.
    #[track_caller]
    pub fn test_match_fails(&self, pattern: &str, flags_str: &str, input: &str) {
        let cr = self.compilef(pattern, flags_str);
        cr.test_fails(input)
    }
}

/// Invoke \p F with each test config, in turn.
pub fn test_with_configs<F>(func: F)
where
    F: Fn(TestConfig),
{
    // Note we wish to be able to determine the TestConfig from the line number.
    func(TestConfig {
        optimize: false,
        budget: None,
    });
    func(TestConfig {
        optimize: true,
        budget: None,
    });
    func(TestConfig {
        optimize: true,
        budget: Some(100_000_000),
    });
}
