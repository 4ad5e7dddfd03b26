use std::sync::Arc;

use http::Method;
use serde_json::{json, Value};
use strada::cookies::Cookie;
use strada::dispatcher::Dispatcher;
use strada::error::HttpError;
use strada::model::RouteModel;
use strada::request::RawRequest;
use strada::response::{HttpResponse, Payload, Reply};
use strada::router::Router;

mod tracing_util;
use tracing_util::TestTracing;

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn orders_dispatcher() -> Dispatcher {
    let mut router = Router::new();
    router
        .register(
            Method::POST,
            "/orders/:id",
            |ctx| {
                Ok(Reply::json(json!({
                    "id": ctx.params["id"],
                    "amount": ctx.body["amount"],
                })))
            },
            Some(
                RouteModel::new()
                    .params(json!({"id": "number"}))
                    .body(json!({
                        "type": "object",
                        "properties": {"amount": {"type": "number"}},
                        "required": ["amount"]
                    })),
            ),
        )
        .unwrap();
    Dispatcher::new(router)
}

fn post_order(dispatcher: &Dispatcher, id: &str, body: &str) -> strada::WireResponse {
    dispatcher.handle(
        RawRequest::new(Method::POST, &format!("/orders/{id}"))
            .with_header("Content-Type", "application/json")
            .with_body(body),
    )
}

#[test]
fn test_end_to_end_params_failure() {
    let _tracing = TestTracing::init();
    let dispatcher = orders_dispatcher();
    let wire = post_order(&dispatcher, "abc", r#"{"amount": 10}"#);
    assert_eq!(wire.status, 422);
    let message = body_json(&wire.body)["message"].as_str().unwrap().to_string();
    assert!(message.contains("id"), "message: {message}");
}

#[test]
fn test_end_to_end_body_failure() {
    let dispatcher = orders_dispatcher();
    let wire = post_order(&dispatcher, "7", r#"{"amount": "ten"}"#);
    assert_eq!(wire.status, 422);
    let message = body_json(&wire.body)["message"].as_str().unwrap().to_string();
    assert!(message.contains("amount"), "message: {message}");
}

#[test]
fn test_end_to_end_success() {
    let dispatcher = orders_dispatcher();
    let wire = post_order(&dispatcher, "7", r#"{"amount": 10}"#);
    assert_eq!(wire.status, 200);
    assert_eq!(body_json(&wire.body), json!({"id": 7, "amount": 10}));
}

#[test]
fn test_default_not_found_response() {
    let dispatcher = orders_dispatcher();
    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/nowhere"));
    assert_eq!(wire.status, 404);
    assert_eq!(
        body_json(&wire.body),
        json!({"error": true, "message": "GET on /nowhere does not exist."})
    );
}

#[test]
fn test_default_method_not_allowed_response() {
    let dispatcher = orders_dispatcher();
    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/orders/7"));
    assert_eq!(wire.status, 405);
    assert_eq!(
        body_json(&wire.body),
        json!({"error": "GET does not exist."})
    );
}

#[test]
fn test_preflight_bypasses_routing() {
    let dispatcher = orders_dispatcher();
    let wire = dispatcher.handle(
        RawRequest::new(Method::OPTIONS, "/definitely/not/registered")
            .with_header("Access-Control-Request-Method", "POST"),
    );
    assert_eq!(wire.status, 200);
    assert_eq!(wire.body, b"Departed");
}

#[test]
fn test_plain_options_still_routes() {
    let dispatcher = orders_dispatcher();
    let wire = dispatcher.handle(RawRequest::new(Method::OPTIONS, "/nowhere"));
    assert_eq!(wire.status, 404);
}

#[test]
fn test_custom_not_found_last_registration_wins() {
    let mut dispatcher = orders_dispatcher();
    dispatcher.set_on_not_found(Arc::new(|_req: &RawRequest| {
        HttpResponse::json(404, json!({"first": true}))
    }));
    dispatcher.set_on_not_found(Arc::new(|req: &RawRequest| {
        HttpResponse::json(404, json!({"gone": req.path}))
    }));

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/missing"));
    assert_eq!(body_json(&wire.body), json!({"gone": "/missing"}));
}

#[test]
fn test_after_response_hook_rewrites_final_response() {
    let mut dispatcher = orders_dispatcher();
    dispatcher.set_on_after_response(Arc::new(|response: HttpResponse| {
        response.with_header("X-Served-By", "strada")
    }));

    let wire = post_order(&dispatcher, "7", r#"{"amount": 10}"#);
    assert_eq!(wire.headers.get("X-Served-By"), Some("strada"));

    // Recovered responses pass through the hook too.
    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/missing"));
    assert_eq!(wire.headers.get("X-Served-By"), Some("strada"));
}

#[test]
fn test_text_and_timestamp_replies() {
    use chrono::TimeZone;

    let mut router = Router::new();
    router
        .register(Method::GET, "/motd", |_ctx| Ok(Reply::text("hello")), None)
        .unwrap();
    router
        .register(
            Method::GET,
            "/now",
            |_ctx| {
                let ts = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
                Ok(Reply::timestamp(ts))
            },
            None,
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/motd"));
    assert_eq!(wire.headers.get("Content-Type"), Some("text/plain"));
    assert_eq!(wire.body, b"hello");

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/now"));
    assert_eq!(wire.body, b"2024-03-01T12:30:00.000Z");
}

#[test]
fn test_custom_error_handler_override() {
    let mut dispatcher = orders_dispatcher();
    dispatcher.set_on_error(Arc::new(|err: &HttpError| {
        HttpResponse::text(err.status(), format!("custom: {}", err.message()))
    }));

    let wire = post_order(&dispatcher, "abc", r#"{"amount": 10}"#);
    assert_eq!(wire.status, 422);
    let body = String::from_utf8(wire.body).unwrap();
    assert!(body.starts_with("custom: "), "body: {body}");
}

#[test]
fn test_handler_error_carries_declared_status() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/teapot",
            |_ctx| Err(HttpError::with_status(418, "short and stout")),
            None,
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/teapot"));
    assert_eq!(wire.status, 418);
    assert_eq!(
        body_json(&wire.body),
        json!({"error": true, "message": "short and stout"})
    );
}

#[test]
fn test_handler_error_without_status_is_500() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/boom",
            |_ctx| Err(HttpError::internal_server_error("boom")),
            None,
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/boom"));
    assert_eq!(wire.status, 500);
}

#[test]
fn test_draft_cookies_emit_one_header_each() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/login",
            |ctx| {
                ctx.res.cookies.set(Cookie::new("session", "abc"));
                ctx.res.cookies.set(Cookie::new("theme", "dark"));
                Ok(Reply::json(json!({"ok": true})))
            },
            None,
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/login"));
    assert_eq!(
        wire.headers.get_all("Set-Cookie"),
        vec!["session=abc", "theme=dark"]
    );
}

#[test]
fn test_unsupported_response_body_is_500() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/blob",
            |_ctx| Ok(Reply::Payload(Payload::Bytes(vec![1, 2, 3]))),
            None,
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/blob"));
    assert_eq!(wire.status, 500);
    let message = body_json(&wire.body)["message"].as_str().unwrap().to_string();
    assert!(message.contains("Unsupported response body"));
}

#[test]
fn test_response_schema_violation_is_server_fault() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/strict",
            |_ctx| Ok(Reply::json(json!({"name": 42}))),
            Some(RouteModel::new().response(json!({"name": "string"}))),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/strict"));
    assert_eq!(wire.status, 500);
}

#[test]
fn test_search_schema_failure_is_422() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/list",
            |_ctx| Ok(Reply::empty()),
            Some(RouteModel::new().search(json!({"limit": "number"}))),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/list?limit=ten"));
    assert_eq!(wire.status, 422);
    let message = body_json(&wire.body)["message"].as_str().unwrap().to_string();
    assert!(message.contains("limit"), "message: {message}");
}

#[test]
fn test_trailing_param_missing_value_is_validation_not_routing() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/items/:id",
            |ctx| Ok(Reply::json(ctx.params.clone())),
            Some(RouteModel::new().params(json!({"id": "number"}))),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/items/"));
    assert_eq!(wire.status, 422);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/items/9"));
    assert_eq!(wire.status, 200);
}

#[test]
fn test_handler_returning_prebuilt_response() {
    let mut router = Router::new();
    router
        .register(
            Method::GET,
            "/old",
            |_ctx| Ok(HttpResponse::redirect("/new").into()),
            None,
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let wire = dispatcher.handle(RawRequest::new(Method::GET, "/old"));
    assert_eq!(wire.status, 302);
    assert_eq!(wire.reason, "Found");
    assert_eq!(wire.headers.get("Location"), Some("/new"));
}

#[test]
fn test_field_rules_and_json_schema_vendors_interchange() {
    let mut router = Router::new();
    router
        .register(
            Method::POST,
            "/compact",
            |_ctx| Ok(Reply::empty()),
            Some(RouteModel::new().body(json!({"amount": "number"}))),
        )
        .unwrap();
    router
        .register(
            Method::POST,
            "/full",
            |_ctx| Ok(Reply::empty()),
            Some(RouteModel::new().body(json!({
                "type": "object",
                "properties": {"amount": {"type": "number"}},
                "required": ["amount"]
            }))),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    for path in ["/compact", "/full"] {
        let ok = dispatcher.handle(
            RawRequest::new(Method::POST, path)
                .with_header("Content-Type", "application/json")
                .with_body(r#"{"amount": 5}"#),
        );
        assert_eq!(ok.status, 200, "path {path}");

        let bad = dispatcher.handle(
            RawRequest::new(Method::POST, path)
                .with_header("Content-Type", "application/json")
                .with_body(r#"{"amount": "five"}"#),
        );
        assert_eq!(bad.status, 422, "path {path}");
    }
}

#[test]
fn test_custom_schema_function_vendor() {
    use strada::model::{Issue, SchemaSource};

    let mut router = Router::new();
    router
        .register(
            Method::POST,
            "/custom",
            |ctx| Ok(Reply::json(ctx.body.clone())),
            Some(RouteModel::new().body(SchemaSource::function(|value| {
                if value.get("token").is_some() {
                    Ok(value.clone())
                } else {
                    Err(vec![Issue::new(vec!["token".into()], "is required")])
                }
            }))),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router);

    let bad = dispatcher.handle(
        RawRequest::new(Method::POST, "/custom")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{}"#),
    );
    assert_eq!(bad.status, 422);
    assert_eq!(
        body_json(&bad.body)["message"],
        json!("token: is required")
    );
}
