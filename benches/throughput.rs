use criterion::{criterion_group, criterion_main, Criterion};
use routegate::content::{body, field};
use routegate::normalize::normalize_path;
use routegate::render::JsonResult;
use routegate::{
    Dispatcher, HttpService, Messages, Operation, Request, RouteRegistry, ServiceDeclaration,
    ServiceRegistry, Settings,
};
use serde_json::{json, Value};
use std::hint::black_box;
use std::sync::Arc;

struct Zoo;

impl HttpService for Zoo {
    fn operations() -> Vec<Operation<Self>> {
        vec![
            Operation::get("/zoo/animals").handle0(|_: &Zoo| Ok(JsonResult::ok(json!([])))),
            Operation::get("/zoo/animals/find")
                .handle1(field::<u64>("id"), |_: &Zoo, id| Ok(JsonResult::ok(json!({ "id": id })))),
            Operation::post("/zoo/animals/save")
                .handle2(field::<u64>("id"), body::<Value>(), |_: &Zoo, id, animal| {
                    Ok(JsonResult::ok(json!({ "id": id, "animal": animal })))
                }),
        ]
    }
}

fn dispatcher() -> Dispatcher {
    Dispatcher::new(
        Arc::new(RouteRegistry::from_services([ServiceDeclaration::of::<Zoo>()])),
        Arc::new(ServiceRegistry::new().with(Zoo)),
        Arc::new(Messages::new("en")),
        Arc::new(Settings::default()),
    )
}

fn bench_normalize(c: &mut Criterion) {
    let paths = ["/Zoo/Animals/", "zoo/animals", "  /zoo/animals/find//", "/"];
    c.bench_function("normalize_path", |b| {
        b.iter(|| {
            for path in paths.iter() {
                black_box(normalize_path(Some(*path)));
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = dispatcher();
    let requests = [
        Request::new("GET", "/zoo/animals"),
        Request::new("GET", "/zoo/animals/find?id=42"),
        Request::new("POST", "/zoo/animals/save?id=7")
            .with_json(&json!({"name": "okapi", "legs": 4})),
        Request::new("GET", "/zoo/nowhere"),
    ];
    c.bench_function("dispatch", |b| {
        b.iter(|| {
            for request in requests.iter() {
                black_box(dispatcher.dispatch(request));
            }
        })
    });
}

criterion_group!(benches, bench_normalize, bench_dispatch);
criterion_main!(benches);
