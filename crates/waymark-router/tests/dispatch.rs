//! End-to-end dispatch tests.
//!
//! Covers the full state machine: method lookup, path resolution, global
//! middleware, route middleware, handler.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{Method, Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use waymark_config::{ErrorFormat, RouterConfig};
use waymark_router::{
    DispatchError, FnMiddleware, Middleware, MiddlewareError, Params, Request, Response,
    ResponseExt, RouteError, Router,
};

type Log = Arc<Mutex<Vec<String>>>;

fn make_request(method: Method, path: &str) -> Request {
    HttpRequest::builder()
        .method(method)
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn body(response: Response) -> String {
    let collected = tokio_test::block_on(response.into_body().collect()).unwrap();
    String::from_utf8(collected.to_bytes().to_vec()).unwrap()
}

/// Handler that renders params as a JSON object.
fn params_json(_req: &Request, params: &Params) -> Response {
    let map: serde_json::Map<String, serde_json::Value> = params
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
        .collect();
    Response::text(serde_json::Value::Object(map).to_string())
}

fn trace(log: &Log, name: &'static str) -> impl Middleware {
    let log = Arc::clone(log);
    FnMiddleware::new(name, move |_req, _params| {
        log.lock().unwrap().push(name.to_string());
        Ok(())
    })
}

#[test]
fn test_items_example() {
    let router = Router::new();
    router.get("/items/:id", params_json).unwrap();

    let response = router.dispatch(&make_request(Method::GET, "/items/42"));
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body(response)).unwrap();
    assert_eq!(json, serde_json::json!({"id": "42"}));

    let response = router.dispatch(&make_request(Method::GET, "/items/42/extra"));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_multiple_params_bind_exactly() {
    let router = Router::new();
    router
        .get("/orgs/{org}/teams/:team/members/:member", params_json)
        .unwrap();

    let response = router.dispatch(&make_request(
        Method::GET,
        "/orgs/acme/teams/core/members/ada",
    ));
    let json: serde_json::Value = serde_json::from_str(&body(response)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"org": "acme", "team": "core", "member": "ada"})
    );
}

#[test]
fn test_trailing_slash_is_ignored() {
    let router = Router::new();
    router.get("/users/", params_json).unwrap();

    assert_eq!(
        router.dispatch(&make_request(Method::GET, "/users")).status(),
        StatusCode::OK
    );
    assert_eq!(
        router.dispatch(&make_request(Method::GET, "/users/")).status(),
        StatusCode::OK
    );
}

#[test]
fn test_literal_and_param_siblings() {
    let router = Router::new();
    router.get("/files/:name", |_r, _p| Response::text("param")).unwrap();
    router.get("/files/latest", |_r, _p| Response::text("literal")).unwrap();
    router
        .get("/files/latest/meta", |_r, _p| Response::text("meta"))
        .unwrap();

    assert_eq!(
        body(router.dispatch(&make_request(Method::GET, "/files/latest"))),
        "literal"
    );
    assert_eq!(
        body(router.dispatch(&make_request(Method::GET, "/files/report"))),
        "param"
    );
    assert_eq!(
        body(router.dispatch(&make_request(Method::GET, "/files/latest/meta"))),
        "meta"
    );
}

#[test]
fn test_full_chain_order() {
    let router = Router::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    router.use_middleware("/api/users", 0, trace(&log, "users-0")).unwrap();
    router.use_middleware("/", 3, trace(&log, "root-3")).unwrap();
    router.use_middleware("", 10, trace(&log, "global-10")).unwrap();
    router.use_middleware("", 1, trace(&log, "global-1")).unwrap();
    router.use_middleware("/api", 3, trace(&log, "api-3")).unwrap();

    let handler_log = Arc::clone(&log);
    router
        .get("/api/users/:id", move |_req, _params| {
            handler_log.lock().unwrap().push("handler".to_string());
            Response::text("ok")
        })
        .unwrap();

    router.use_middleware("/api/users/:id", -1, trace(&log, "id-neg1")).unwrap();

    let response = router.dispatch(&make_request(Method::GET, "/api/users/7"));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["global-1", "global-10", "id-neg1", "users-0", "root-3", "api-3", "handler"]
    );
}

#[test]
fn test_abort_surfaces_exact_status_and_message() {
    let router = Router::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    router.use_middleware("", 0, trace(&log, "global")).unwrap();
    router
        .use_middleware(
            "/admin",
            0,
            FnMiddleware::new("admin-only", |req, _params| {
                match req.headers().get("x-role").and_then(|v| v.to_str().ok()) {
                    Some("admin") => Ok(()),
                    Some(_) => Err(MiddlewareError::forbidden("admins only")),
                    None => Err(MiddlewareError::unauthorized("who are you")),
                }
            }),
        )
        .unwrap();
    router.use_middleware("/admin", 1, trace(&log, "after-guard")).unwrap();
    router.get("/admin/panel", |_r, _p| Response::text("panel")).unwrap();

    let err = router
        .try_dispatch(&make_request(Method::GET, "/admin/panel"))
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::MiddlewareAbort(MiddlewareError::unauthorized("who are you"))
    );
    assert_eq!(*log.lock().unwrap(), vec!["global"]);

    let request = HttpRequest::builder()
        .uri("/admin/panel")
        .header("x-role", "guest")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = router.dispatch(&request);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(response), "admins only\n");

    log.lock().unwrap().clear();
    let request = HttpRequest::builder()
        .uri("/admin/panel")
        .header("x-role", "admin")
        .body(Full::new(Bytes::new()))
        .unwrap();
    assert_eq!(body(router.dispatch(&request)), "panel");
    assert_eq!(*log.lock().unwrap(), vec!["global", "after-guard"]);
}

#[test]
fn test_not_found_never_invokes_anything() {
    let router = Router::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    router.use_middleware("", 0, trace(&log, "global")).unwrap();
    router.use_middleware("/", 0, trace(&log, "root")).unwrap();
    router.use_middleware("/items", 0, trace(&log, "items")).unwrap();
    router.get("/items/:id", params_json).unwrap();

    for (method, path) in [
        (Method::GET, "/items"),
        (Method::GET, "/items/1/2"),
        (Method::POST, "/items/1"),
        (Method::GET, "/other"),
    ] {
        let response = router.dispatch(&make_request(method, path));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_json_error_format() {
    let router = Router::with_config(RouterConfig {
        error_format: ErrorFormat::Json,
        not_found_message: "nothing here".to_string(),
        ..RouterConfig::default()
    });

    let response = router.dispatch(&make_request(Method::GET, "/missing"));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let json: serde_json::Value = serde_json::from_str(&body(response)).unwrap();
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(json["error"]["message"], "nothing here");
}

#[test]
fn test_registration_errors() {
    let router = Router::new();
    router.get("/a/:x", params_json).unwrap();

    assert!(matches!(
        router.get("/a/:x", params_json),
        Err(RouteError::DuplicateRoute { .. })
    ));
    assert!(matches!(
        router.get("/a/:y/b", params_json),
        Err(RouteError::ParamConflict { .. })
    ));
    assert!(matches!(
        router.get("/a//b", params_json),
        Err(RouteError::InvalidPath { .. })
    ));
    assert!(matches!(
        router.use_middleware("/a/:", 0, FnMiddleware::new("n", |_r, _p| Ok(()))),
        Err(RouteError::InvalidPath { .. })
    ));
    assert_eq!(router.len(), 1);
}

#[test]
fn test_middleware_panic_is_recovered() {
    let router = Router::new();
    router
        .use_middleware(
            "",
            0,
            FnMiddleware::new("explodes", |_req, _params| panic!("middleware bug")),
        )
        .unwrap();
    router.get("/x", params_json).unwrap();

    let err = router
        .try_dispatch(&make_request(Method::GET, "/x"))
        .unwrap_err();
    assert!(matches!(err, DispatchError::HandlerPanic { .. }));

    // The router stays usable after a recovered panic.
    router.get("/y", params_json).unwrap();
    assert_eq!(
        router.dispatch(&make_request(Method::GET, "/y")).status(),
        StatusCode::OK
    );
}
