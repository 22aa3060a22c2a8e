use super::error::BadRoutePattern;

use regex::Regex;
use smallvec::SmallVec;

/// Regex used by placeholders declared without a constraint.
pub const DEFAULT_PLACEHOLDER_REGEX: &str = "[^/]+";

const SLASH: char = '/';
const OPEN_BRACE: char = '{';
const CLOSE_BRACE: char = '}';
const OPEN_BRACKET: char = '[';
const CLOSE_BRACKET: char = ']';
const COLON: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Literal(Box<str>),
    Placeholder { name: Box<str>, regex: Box<str> },
}

/// One concrete shape of a pattern. `/a[/{b}]` has two: `/a` and `/a/{b}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteVariant {
    parts: Vec<Part>,
}

/// A parsed route pattern: the source text plus its variants, shortest first.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: Box<str>,
    variants: Vec<RouteVariant>,
}

impl RouteVariant {
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn is_static(&self) -> bool {
        self.parts.iter().all(|p| matches!(p, Part::Literal(_)))
    }

    /// The exact path matched by this variant, if it has no placeholders.
    pub fn static_path(&self) -> Option<String> {
        let mut path = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(s) => path.push_str(s),
                Part::Placeholder { .. } => return None,
            }
        }
        Some(path)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parts.iter().filter_map(|p| match p {
            Part::Placeholder { name, .. } => Some(&**name),
            Part::Literal(_) => None,
        })
    }

    /// Unanchored regex source; every placeholder becomes one capture group.
    pub fn to_regex(&self) -> String {
        let mut re = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(s) => re.push_str(&regex::escape(s)),
                Part::Placeholder { regex, .. } => {
                    re.push('(');
                    re.push_str(regex);
                    re.push(')');
                }
            }
        }
        re
    }
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, BadRoutePattern> {
        let bad = || -> Box<str> { pattern.into() };

        if !pattern.starts_with(SLASH) {
            return Err(BadRoutePattern::MissingLeadingSlash { pattern: bad() });
        }

        let without_closing = pattern.trim_end_matches(CLOSE_BRACKET);
        let num_optionals = pattern.len() - without_closing.len();

        let (segments, inner_close) = split_optionals(without_closing);

        match inner_close {
            // a `]` before any `[` closes nothing
            Some(0) => return Err(BadRoutePattern::UnbalancedBrackets { pattern: bad() }),
            Some(_) => return Err(BadRoutePattern::NonSuffixOptional { pattern: bad() }),
            None => {}
        }

        if num_optionals != segments.len() - 1 {
            return Err(BadRoutePattern::UnbalancedBrackets { pattern: bad() });
        }

        let mut variants: Vec<RouteVariant> = Vec::with_capacity(segments.len());
        let mut current = String::with_capacity(without_closing.len());

        for (n, segment) in segments.iter().enumerate() {
            if segment.is_empty() && n != 0 {
                return Err(BadRoutePattern::EmptyOptional { pattern: bad() });
            }
            current.push_str(segment);
            variants.push(parse_parts(&current, pattern)?);
        }

        // the longest variant carries every placeholder of the pattern
        if let Some(longest) = variants.last() {
            check_placeholders(longest, pattern)?;
        }

        Ok(Self {
            source: pattern.into(),
            variants,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn variants(&self) -> &[RouteVariant] {
        &self.variants
    }

    pub fn is_static(&self) -> bool {
        self.variants.len() == 1 && self.variants[0].is_static()
    }
}

/// Splits on `[` outside placeholders.
///
/// The second value is set when a `]` outside placeholders is left in `s`
/// (trailing ones are trimmed by the caller). It holds the number of `[`
/// seen before the first such `]`.
fn split_optionals(s: &str) -> (SmallVec<[&str; 4]>, Option<usize>) {
    let mut segments: SmallVec<[&str; 4]> = SmallVec::new();
    let mut inner_close: Option<usize> = None;
    let mut depth: usize = 0;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            OPEN_BRACE => depth += 1,
            CLOSE_BRACE => depth = depth.saturating_sub(1),
            OPEN_BRACKET if depth == 0 => {
                segments.push(&s[start..i]);
                start = i + 1;
            }
            CLOSE_BRACKET if depth == 0 && inner_close.is_none() => {
                inner_close = Some(segments.len());
            }
            _ => {}
        }
    }
    segments.push(&s[start..]);

    (segments, inner_close)
}

fn parse_parts(s: &str, pattern: &str) -> Result<RouteVariant, BadRoutePattern> {
    let mut parts: Vec<Part> = Vec::new();
    let mut literal = String::new();
    let mut rest = s;

    while let Some(open) = rest.find(OPEN_BRACE) {
        literal.push_str(&rest[..open]);
        let close = match find_closing_brace(&rest[open..]) {
            Some(off) => open + off,
            None => {
                return Err(BadRoutePattern::UnbalancedBrace {
                    pattern: pattern.into(),
                })
            }
        };

        let inner = &rest[open + 1..close];
        let (name, regex) = match inner.find(COLON) {
            Some(i) => (inner[..i].trim(), inner[i + 1..].trim()),
            None => (inner.trim(), ""),
        };

        if !is_valid_name(name) {
            return Err(BadRoutePattern::InvalidPlaceholderName {
                pattern: pattern.into(),
                name: name.into(),
            });
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal.as_str().into()));
            literal.clear();
        }

        let regex = if regex.is_empty() {
            DEFAULT_PLACEHOLDER_REGEX
        } else {
            regex
        };
        parts.push(Part::Placeholder {
            name: name.into(),
            regex: regex.into(),
        });

        rest = &rest[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(Part::Literal(literal.into()));
    }

    Ok(RouteVariant { parts })
}

/// `s` starts with `{`. Returns the byte offset of the matching `}`.
fn find_closing_brace(s: &str) -> Option<usize> {
    let mut depth: usize = 0;
    for (i, c) in s.char_indices() {
        match c {
            OPEN_BRACE => depth += 1,
            CLOSE_BRACE => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn check_placeholders(variant: &RouteVariant, pattern: &str) -> Result<(), BadRoutePattern> {
    let mut seen: SmallVec<[&str; 8]> = SmallVec::new();

    for part in variant.parts() {
        let (name, regex) = match part {
            Part::Placeholder { name, regex } => (&**name, &**regex),
            Part::Literal(_) => continue,
        };

        if seen.contains(&name) {
            return Err(BadRoutePattern::DuplicatePlaceholder {
                pattern: pattern.into(),
                name: name.into(),
            });
        }
        seen.push(name);

        let compiled = Regex::new(regex).map_err(|source| BadRoutePattern::InvalidRegex {
            pattern: pattern.into(),
            name: name.into(),
            source,
        })?;

        if compiled.captures_len() > 1 {
            return Err(BadRoutePattern::CapturingGroup {
                pattern: pattern.into(),
                name: name.into(),
                regex: regex.into(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Part {
        Part::Literal(s.into())
    }

    fn var(name: &str, regex: &str) -> Part {
        Part::Placeholder {
            name: name.into(),
            regex: regex.into(),
        }
    }

    #[test]
    fn parse_static() {
        let p = RoutePattern::parse("/test").unwrap();
        assert!(p.is_static());
        assert_eq!(p.variants()[0].parts(), &[lit("/test")]);
        assert_eq!(p.variants()[0].static_path().as_deref(), Some("/test"));
    }

    #[test]
    fn parse_placeholders() {
        let p = RoutePattern::parse("/user/{ id }/post/{slug:[a-z-]+}").unwrap();
        assert!(!p.is_static());
        assert_eq!(
            p.variants()[0].parts(),
            &[
                lit("/user/"),
                var("id", DEFAULT_PLACEHOLDER_REGEX),
                lit("/post/"),
                var("slug", "[a-z-]+"),
            ]
        );
        let names: Vec<&str> = p.variants()[0].names().collect();
        assert_eq!(names, ["id", "slug"]);
    }

    #[test]
    fn parse_nested_braces_and_brackets_in_regex() {
        let p = RoutePattern::parse("/year/{y:\\d{4}}/{tag:[0-9]+}").unwrap();
        assert_eq!(p.variants().len(), 1);
        assert_eq!(
            p.variants()[0].parts(),
            &[
                lit("/year/"),
                var("y", "\\d{4}"),
                lit("/"),
                var("tag", "[0-9]+"),
            ]
        );
    }

    #[test]
    fn parse_optional_groups() {
        let p = RoutePattern::parse("/user[/{id:\\d+}[/{name}]]").unwrap();
        let v = p.variants();
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].parts(), &[lit("/user")]);
        assert_eq!(v[1].parts(), &[lit("/user/"), var("id", "\\d+")]);
        assert_eq!(
            v[2].parts(),
            &[
                lit("/user/"),
                var("id", "\\d+"),
                lit("/"),
                var("name", DEFAULT_PLACEHOLDER_REGEX),
            ]
        );
        assert!(!p.is_static());
    }

    #[test]
    fn to_regex_escapes_literals() {
        let p = RoutePattern::parse("/file.{ext:json|xml}").unwrap();
        assert_eq!(p.variants()[0].to_regex(), "/file\\.(json|xml)");
    }

    #[test]
    fn parse_errors() {
        let cases: &[&str] = &[
            "test",
            "/a/{id",
            "/a/{1id}",
            "/a[/b",
            "/a/b]",
            "/a[/b]/c",
            "/a[/b][/c]",
            "/a[]",
            "/a/{id}/{id}",
            "/a[/{id}[/{id}]]",
            "/a/{id:(\\d+)}",
            "/a/{id:(?P<n>\\d+)}",
            "/a/{id:[}",
            "/a/b]c",
            "/a[/b]/c]",
            "/a]b[/c]",
        ];
        for &pattern in cases {
            let err = RoutePattern::parse(pattern).unwrap_err();
            assert_eq!(err.pattern(), pattern, "{}", err);
        }

        assert!(matches!(
            RoutePattern::parse("/a[/b]/c"),
            Err(BadRoutePattern::NonSuffixOptional { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/a[/b"),
            Err(BadRoutePattern::UnbalancedBrackets { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/a/b]c"),
            Err(BadRoutePattern::UnbalancedBrackets { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/a]b[/c]"),
            Err(BadRoutePattern::UnbalancedBrackets { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/a[/b]/c]"),
            Err(BadRoutePattern::NonSuffixOptional { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/a/{id}/{id}"),
            Err(BadRoutePattern::DuplicatePlaceholder { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/a/{id:(\\d+)}"),
            Err(BadRoutePattern::CapturingGroup { .. })
        ));
    }

    #[test]
    fn non_capturing_groups_are_allowed() {
        assert!(RoutePattern::parse("/a/{id:(?:\\d+|new)}").is_ok());
        assert!(RoutePattern::parse("/a/{id:(?i)abc}").is_ok());
    }
}
