mod error;
mod params;
mod pattern;

pub use self::error::BadRoutePattern;
pub use self::params::{IntoIter, Iter, Params};
pub use self::pattern::{Part, RoutePattern, RouteVariant, DEFAULT_PLACEHOLDER_REGEX};
