use http::Method;

/// Registration-time failure. The offending route is never added.
#[derive(Debug, thiserror::Error)]
pub enum BadRoutePattern {
    #[error("pattern must start with '/': pattern = {pattern:?}")]
    MissingLeadingSlash { pattern: Box<str> },

    #[error("unbalanced '{{' in placeholder: pattern = {pattern:?}")]
    UnbalancedBrace { pattern: Box<str> },

    #[error("invalid placeholder name {name:?}: pattern = {pattern:?}")]
    InvalidPlaceholderName { pattern: Box<str>, name: Box<str> },

    #[error("number of opening '[' and closing ']' does not match: pattern = {pattern:?}")]
    UnbalancedBrackets { pattern: Box<str> },

    #[error("optional segments can only occur at the end of a route: pattern = {pattern:?}")]
    NonSuffixOptional { pattern: Box<str> },

    #[error("empty optional part: pattern = {pattern:?}")]
    EmptyOptional { pattern: Box<str> },

    #[error("cannot use the same placeholder {name:?} twice: pattern = {pattern:?}")]
    DuplicatePlaceholder { pattern: Box<str>, name: Box<str> },

    #[error("invalid regex for placeholder {name:?}: pattern = {pattern:?}: {source}")]
    InvalidRegex {
        pattern: Box<str>,
        name: Box<str>,
        #[source]
        source: regex::Error,
    },

    #[error("regex {regex:?} for placeholder {name:?} contains a capturing group: pattern = {pattern:?}")]
    CapturingGroup {
        pattern: Box<str>,
        name: Box<str>,
        regex: Box<str>,
    },

    #[error("method {method} is not supported by this kind of route: pattern = {pattern:?}")]
    UnsupportedMethod { pattern: Box<str>, method: Method },

    #[error("route registered without any method: pattern = {pattern:?}")]
    NoMethod { pattern: Box<str> },

    #[error("cannot register two routes matching {route:?} for method {method}: pattern = {pattern:?}")]
    Duplicate {
        pattern: Box<str>,
        route: Box<str>,
        method: Method,
    },

    #[error("static route {route:?} is shadowed by previously defined variable route {shadowed_by:?} for method {method}")]
    ShadowedStatic {
        route: Box<str>,
        shadowed_by: Box<str>,
        method: Method,
    },

    #[error("failed to compile routes for method {method}: {source}")]
    Compile {
        method: Method,
        #[source]
        source: regex::Error,
    },
}

impl BadRoutePattern {
    /// The pattern text the error refers to.
    pub fn pattern(&self) -> &str {
        match self {
            Self::MissingLeadingSlash { pattern }
            | Self::UnbalancedBrace { pattern }
            | Self::InvalidPlaceholderName { pattern, .. }
            | Self::UnbalancedBrackets { pattern }
            | Self::NonSuffixOptional { pattern }
            | Self::EmptyOptional { pattern }
            | Self::DuplicatePlaceholder { pattern, .. }
            | Self::InvalidRegex { pattern, .. }
            | Self::CapturingGroup { pattern, .. }
            | Self::NoMethod { pattern }
            | Self::UnsupportedMethod { pattern, .. }
            | Self::Duplicate { pattern, .. } => pattern,
            Self::ShadowedStatic { route, .. } => route,
            Self::Compile { .. } => "",
        }
    }
}
