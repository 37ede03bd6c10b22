#![allow(dead_code)]

pub mod fixtures {
    use anyhow::Context;
    use http::StatusCode;
    use routegate::content::{body, field, files, optional_field, request_info, session};
    use routegate::render::{CsvResult, JsonResult, ReturnKind, ServletResult};
    use routegate::server::Part;
    use routegate::{
        Dispatcher, HttpService, MessageError, Messages, Operation, RouteRegistry,
        ServiceDeclaration, ServiceRegistry, Settings,
    };
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Deserialize)]
    pub struct NewItem {
        pub name: String,
        pub price: u32,
    }

    #[derive(Debug, Serialize)]
    pub struct ItemRow {
        pub id: u32,
        pub name: String,
    }

    /// Service exercising every operation shape the dispatcher supports.
    pub struct Catalog {
        pub label: String,
    }

    impl HttpService for Catalog {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::get("/Items/").handle0(|_: &Catalog| Ok(JsonResult::ok(json!({"a": 1})))),
                Operation::get("/items/find").handle1(field::<u32>("id"), |svc: &Catalog, id| {
                    Ok(JsonResult::ok(json!({"id": id, "label": svc.label})))
                }),
                Operation::post("/items/save").handle1(body::<NewItem>(), |_: &Catalog, item| {
                    Ok(JsonResult::new(
                        StatusCode::CREATED,
                        json!({"name": item.name, "price": item.price}),
                    ))
                }),
                Operation::post("/items/rename").handle2(
                    field::<u32>("id"),
                    field::<String>("name"),
                    |_: &Catalog, id, name| {
                        Ok(ServletResult::coded(StatusCode::OK, "item.renamed", [id.to_string(), name]))
                    },
                ),
                Operation::get("/items/page").handle2(
                    optional_field::<u32>("page"),
                    request_info(),
                    |_: &Catalog, page, info| {
                        Ok(JsonResult::ok(json!({
                            "page": page.unwrap_or(1),
                            "path": info.path,
                            "method": info.method.as_str(),
                        })))
                    },
                ),
                Operation::get("/items/export").handle0(|_: &Catalog| {
                    let rows = vec![
                        ItemRow { id: 1, name: "plain".into() },
                        ItemRow { id: 2, name: "with, comma".into() },
                    ];
                    Ok(CsvResult::from_records("items", &rows)?)
                }),
                Operation::get("/items/fail").handle0(|_: &Catalog| -> anyhow::Result<JsonResult> {
                    let inner = MessageError::coded("x.y.z", ["q"]);
                    let outer = MessageError::new("lookup failed").with_cause(inner);
                    Err(anyhow::Error::new(outer)).context("catalog unavailable")
                }),
                Operation::get("/items/plain-fail").handle0(|_: &Catalog| -> anyhow::Result<()> {
                    let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
                    Err(io).context("saving catalog")
                }),
                Operation::get("/items/panic")
                    .handle0(|_: &Catalog| -> anyhow::Result<()> { panic!("boom") }),
                Operation::post("/items/touch").handle1(field::<u32>("id"), |_: &Catalog, _id| Ok(())),
                Operation::get("/items/maybe").handle0(|_: &Catalog| Ok(None::<JsonResult>)),
                Operation::get("/items/bulk").unbindable(3, ReturnKind::Result),
                Operation::post("/items/fire").unbindable(4, ReturnKind::Void),
                Operation::get("/account").secured().handle1(session(), |_: &Catalog, session| {
                    let id = session.as_ref().and_then(|s| s.id()).unwrap_or_default().to_string();
                    Ok(JsonResult::ok(json!({"session": id})))
                }),
                Operation::post("/upload").handle2(
                    field::<String>("title"),
                    files(),
                    |_: &Catalog, title, parts: Vec<Part>| {
                        let names: Vec<String> =
                            parts.iter().filter_map(|p| p.filename.clone()).collect();
                        Ok(JsonResult::ok(json!({"title": title, "files": names})))
                    },
                ),
                Operation::post("/echo").handle1(body::<String>(), |_: &Catalog, text| {
                    Ok(ServletResult::message(StatusCode::OK, text))
                }),
            ]
        }
    }

    /// Declared but never given an instance.
    pub struct Orphan;

    impl HttpService for Orphan {
        fn operations() -> Vec<Operation<Self>> {
            vec![Operation::get("/orphan").handle0(|_: &Orphan| Ok(JsonResult::ok(json!({}))))]
        }
    }

    pub fn messages() -> Messages {
        Messages::new("en")
            .with_message("x.y.z", "Value {0} is not acceptable")
            .with_message("item.renamed", "Item {0} renamed to {1}")
    }

    pub fn settings() -> Settings {
        Settings {
            max_request_size: 1024,
            max_file_size: 64,
            ..Settings::default()
        }
    }

    pub fn dispatcher() -> Dispatcher {
        let registry = RouteRegistry::from_services([
            ServiceDeclaration::of::<Catalog>(),
            ServiceDeclaration::of::<Orphan>(),
        ]);
        let services = ServiceRegistry::new().with(Catalog {
            label: "main".into(),
        });
        Dispatcher::new(
            Arc::new(registry),
            Arc::new(services),
            Arc::new(messages()),
            Arc::new(settings()),
        )
    }
}

pub mod temp_files {
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Write `content` to `name` inside a fresh temporary directory. The
    /// directory lives as long as the returned guard.
    pub fn write(name: &str, content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }
}
