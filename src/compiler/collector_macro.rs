/// Builds a [`RouteCollector`](crate::RouteCollector) from
/// `METHOD "pattern" => data` lines.
///
/// A bracketed list such as `[GET, HEAD]` registers one endpoint for several
/// methods. Evaluates to `Result<RouteCollector<_>, BadRoutePattern>`.
#[macro_export]
macro_rules! routes {
    {$($method:tt $pattern:expr => $data:expr),+ $(,)?} => {{
        (|| -> ::core::result::Result<_, $crate::BadRoutePattern> {
            let mut __collector = $crate::RouteCollector::new();
            $($crate::routes!(@entry __collector, $method, $pattern, $data)?;)+
            ::core::result::Result::Ok(__collector)
        })()
    }};

    {@entry $collector:ident, [$($method:ident),+], $pattern:expr, $data:expr} => {
        $collector.add_route(&[$($crate::Method::$method),+], $pattern, $data)
    };
    {@entry $collector:ident, $method:ident, $pattern:expr, $data:expr} => {
        $collector.add_route(&[$crate::Method::$method], $pattern, $data)
    };
}
