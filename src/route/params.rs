use std::collections::HashMap;
use std::iter::{DoubleEndedIterator, ExactSizeIterator, FusedIterator};
use std::ops::Range;
use std::str::FromStr;
use std::sync::Arc;

/// Path variables extracted by a match, in the order they appear in the pattern.
///
/// Values are stored as ranges into the decoded request path, so cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct Params {
    path: Option<Arc<str>>,
    offset: Vec<(Arc<str>, usize, usize)>, // (name, start, end)
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        let path = self.path.as_ref()?;
        self.offset
            .iter()
            .find_map(|&(ref n, s, e)| some_if(&**n == name, || &path[s..e]))
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.get(name).map(T::from_str)
    }

    pub fn len(&self) -> usize {
        self.offset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offset.is_empty()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            path: self.path.as_deref(),
            offset: self.offset.iter(),
        }
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = IntoIter;
    fn into_iter(self) -> IntoIter {
        IntoIter {
            path: self.path,
            offset: self.offset.into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Params {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new<'n>(
        path: &str,
        ranges: impl IntoIterator<Item = (&'n Arc<str>, Range<usize>)>,
    ) -> Self {
        let offset: Vec<(Arc<str>, usize, usize)> = ranges
            .into_iter()
            .map(|(name, r)| (Arc::clone(name), r.start, r.end))
            .collect();
        let path = some_if(!offset.is_empty(), || Arc::from(path));
        Self { path, offset }
    }
}

#[inline(always)]
fn some_if<T>(cond: bool, f: impl FnOnce() -> T) -> Option<T> {
    if cond {
        Some(f())
    } else {
        None
    }
}

pub struct Iter<'a> {
    path: Option<&'a str>,
    offset: std::slice::Iter<'a, (Arc<str>, usize, usize)>,
}

pub struct IntoIter {
    path: Option<Arc<str>>,
    offset: std::vec::IntoIter<(Arc<str>, usize, usize)>,
}

macro_rules! delegate {
    (iter, $method:tt) => {
        fn $method(&mut self) -> Option<Self::Item> {
            let &(ref n, s, e) = self.offset.$method()?;
            let path = self.path?;
            Some((&**n, &path[s..e]))
        }
    };

    (into_iter, $method:tt) => {
        fn $method(&mut self) -> Option<Self::Item> {
            let (n, s, e) = self.offset.$method()?;
            let path = self.path.as_ref()?;
            Some((n.to_string(), path[s..e].to_owned()))
        }
    };

    (size_hint) => {
        fn size_hint(&self) -> (usize, Option<usize>) {
            self.offset.size_hint()
        }
    };

    (len) => {
        fn len(&self) -> usize {
            self.offset.len()
        }
    };
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);
    delegate!(iter, next);
    delegate!(size_hint);
}

impl DoubleEndedIterator for Iter<'_> {
    delegate!(iter, next_back);
}

impl Iterator for IntoIter {
    type Item = (String, String);
    delegate!(into_iter, next);
    delegate!(size_hint);
}

impl DoubleEndedIterator for IntoIter {
    delegate!(into_iter, next_back);
}

impl FusedIterator for Iter<'_> {}
impl FusedIterator for IntoIter {}

impl ExactSizeIterator for Iter<'_> {
    delegate!(len);
}

impl ExactSizeIterator for IntoIter {
    delegate!(len);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_lookup() {
        let path = "/user/42/post/hello";
        let id: Arc<str> = Arc::from("id");
        let slug: Arc<str> = Arc::from("slug");
        let params = Params::new(path, vec![(&id, 6..8), (&slug, 14..19)]);

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("slug"), Some("hello"));
        assert_eq!(params.get("nope"), None);
        assert_eq!(params.parse::<u32>("id"), Some(Ok(42)));

        let v: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(v, [("id", "42"), ("slug", "hello")]);
        let v: Vec<(&str, &str)> = params.iter().rev().collect();
        assert_eq!(v, [("slug", "hello"), ("id", "42")]);

        let owned: Vec<(String, String)> = params.clone().into_iter().collect();
        assert_eq!(owned[1], ("slug".to_owned(), "hello".to_owned()));
        assert_eq!(params.to_map().get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn empty_params() {
        let params = Params::empty();
        assert!(params.is_empty());
        assert_eq!(params.get("id"), None);
        assert_eq!(params.iter().count(), 0);
    }
}
