/*!

# regback - a backtracking regex engine with Perl 5 syntax

This crate provides a regular expression engine over bytes which targets Perl 5 regular expression syntax, including backreferences, lookaround, independent subexpressions and conditionals.

# Example: finding a match

```rust
use regback::Regex;
let re = Regex::with_flags(r"^to:\s*(\S+)$", "im").unwrap();
let header = "From: a@example.com\nTo: b@example.com\n";
let m = re.find(header).unwrap();
assert_eq!(&header[m.group(1).unwrap()], "b@example.com");
```

# Example: every match, with a backreference

`find_iter` yields non-overlapping matches from left to right.

```rust
use regback::Regex;
let re = Regex::new(r"\b(\w+) \1\b").unwrap();
let text = "this is is a test test of of the thing";
let doubled: Vec<&str> = re.find_iter(text).map(|m| &text[m.range()]).collect();
assert_eq!(doubled, vec!["is is", "test test", "of of"]);
```

# Example: groups that did not take part

A group outside the winning path is `None`, never an empty range.

```rust
use regback::Regex;
let re = Regex::new(r"(\d+)(?:px|(em))").unwrap();
let m = re.find("width: 12px").unwrap();
assert_eq!(m.group(1), Some(7..9));
assert_eq!(m.group(2), None);
```

# Example: searching from an offset

`find` takes a start offset and a minimum match end, relative to the start.
Anchors and lookbehind still see the bytes before the start.

```rust
use regback::{compile, find, Flags};
let re = compile(r"\bcat", Flags::default()).unwrap();
assert!(find(&re, b"concat cat", 3, 0).map(|m| m.range()) == Some(7..10));
```

# Supported Syntax

regback targets the Perl 5 regex syntax of its era: alternation, greedy and lazy quantifiers, bracket classes with POSIX names, `\w \s \d \b` and their negations, `\A \z \Z \G`, numeric backreferences, lookahead, fixed-width lookbehind, `(?>...)`, `(?(1)yes|no)` conditionals, inline flags `(?imsx-imsx)` and `(?#...)` comments.

The embedded code constructs `(?{...})` and `(??{...})` are rejected at compile time as an unsupported extension.

Subjects are bytes. Case folding is ASCII, or ISO-8859-1 with the `l` flag. There is no Unicode awareness.

# Catastrophic backtracking

Like other classical backtracking engines, some patterns take exponential time on some inputs. A step budget bounds the work of a search:

```rust
use regback::{ExecOptions, MatchError, Regex};
let re = Regex::new(r"(a*)*[bc]").unwrap();
let opts = ExecOptions { step_budget: Some(10_000), ..Default::default() };
assert!(matches!(re.exec(&[b'a'; 64], opts), Err(MatchError::BudgetExhausted(_))));
```

# Architecture

regback has a parser, intermediate representation, optimizer which acts on the IR, a two-pass bytecode emitter, a study pass that computes search hints, and a bytecode interpreter using an explicit backtracking stack.

*/

#![warn(clippy::all)]
#![allow(clippy::upper_case_acronyms, clippy::match_like_matches_macro)]
// Clippy's manual_range_contains suggestion produces worse codegen.
#![allow(clippy::manual_range_contains)]

pub use crate::api::*;
pub use crate::bytesearch::{LiteralSearcher, StartClass};
pub use crate::error::{CompileError, ErrorKind, MatchError};
pub use crate::study::{Anchoring, RequiredSubstring, StudyData};

#[macro_use]
mod util;

mod api;
mod bytesearch;
mod charclass;
mod classicalbacktrack;
mod emit;
mod error;
mod exec;
mod folds;
mod insn;
mod ir;
mod matchers;
mod optimizer;
mod parse;
mod scm;
mod study;
mod types;
