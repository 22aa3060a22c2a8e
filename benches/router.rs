use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use route_shim::{Dispatcher, Method, RouteCollector};

fn many_routes(n: usize) -> Dispatcher<usize> {
    let mut c = RouteCollector::new();
    for i in 0..n {
        c.add_route(&[Method::GET], &format!("/static/{}", i), i)
            .unwrap();
        c.add_route(&[Method::GET], &format!("/r{}/{{id:\\d+}}/{{name}}", i), i)
            .unwrap();
    }
    Dispatcher::from_collector(c).unwrap()
}

fn router_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("router-dispatch");

    group.bench_function("single-route", |b| {
        let mut collector = RouteCollector::new();
        collector
            .add_route(&[Method::GET], "/hello/{name}", 1)
            .unwrap();
        let d = Dispatcher::from_collector(collector).unwrap();
        b.iter_with_large_drop(|| d.dispatch(&Method::GET, "/hello/world").found())
    });

    let d = many_routes(100);

    group.bench_function("static-100", |b| {
        b.iter(|| d.dispatch(&Method::GET, "/static/99").is_found())
    });

    group.bench_function("dynamic-100-last", |b| {
        b.iter_with_large_drop(|| d.dispatch(&Method::GET, "/r99/42/abc").found())
    });

    group.bench_function("not-found-100", |b| {
        b.iter(|| d.dispatch(&Method::GET, "/missing/path").is_found())
    });
}

fn router_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("router-insert");

    group.bench_function("single-route", |b| {
        b.iter_batched_ref(
            RouteCollector::new,
            |collector: &mut RouteCollector<usize>| {
                collector
                    .add_route(&[Method::GET], "/hello/{name}", 1)
                    .unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("compile-100", |b| {
        b.iter_with_large_drop(|| many_routes(100))
    });
}

criterion_group!(benches, router_dispatch, router_insert);
criterion_main!(benches);
