mod common;

use brrtbind::dispatcher::{Dispatcher, HandlerResponse};
use brrtbind::logging::{RedactionLevel, Redactor};
use brrtbind::runtime_config::BindConfig;
use brrtbind::server::RawRequest;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn echo_dispatcher(config: BindConfig) -> Dispatcher {
    let router = common::tutorial_router();
    let names: Vec<String> = router
        .routes()
        .iter()
        .map(|r| r.handler_name.to_string())
        .collect();
    let mut dispatcher =
        Dispatcher::with_config(router, config).with_redactor(Redactor::new(RedactionLevel::Full));
    for name in names {
        dispatcher.register_handler(&name, |req| HandlerResponse::json(200, req.to_json()));
    }
    dispatcher
}

#[test]
fn test_dispatch_from_http_request() {
    let dispatcher = echo_dispatcher(BindConfig::default());
    let request = http::Request::builder()
        .method("PUT")
        .uri("/items/5")
        .header("content-type", "application/json")
        .body(r#"{"item": {"name": "Foo", "price": 35.4}}"#)
        .unwrap();

    let resp = dispatcher.dispatch(&RawRequest::from_http(request));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["item_id"], 5);
    assert_eq!(resp.body["item"]["name"], "Foo");
    assert_eq!(resp.body["item"]["tags"], json!([]));
    assert_eq!(resp.body["item"]["description"], serde_json::Value::Null);
}

#[test]
fn test_bind_failure_payload_and_status() {
    let dispatcher = echo_dispatcher(BindConfig {
        error_status: 400,
        ..BindConfig::default()
    });
    let resp = dispatcher.dispatch(&RawRequest::new(
        http::Method::GET,
        "/items_validation/5?size=9&q=ab",
    ));
    assert_eq!(resp.status, 400);
    let fields: Vec<&str> = resp.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["item_id", "size"]);

    let resp = dispatcher.dispatch(&RawRequest::new(
        http::Method::GET,
        "/items/?item-query=ab&limit=ten",
    ));
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["errors"][0]["field"], "limit");
    assert_eq!(resp.body["errors"][1]["field"], "item-query");
    assert_eq!(resp.body["errors"][1]["value"], "ab");
}

#[test]
fn test_routing_failures() {
    let dispatcher = echo_dispatcher(BindConfig::default());

    let resp = dispatcher.dispatch(&RawRequest::new(http::Method::GET, "/missing"));
    assert_eq!(resp.status, 404);

    let resp = dispatcher.dispatch(&RawRequest::new(http::Method::DELETE, "/items/5"));
    assert_eq!(resp.status, 405);
    assert_eq!(resp.body["allowed"], json!(["GET", "PUT"]));
}

#[test]
fn test_handler_without_registration_is_501() {
    let dispatcher = Dispatcher::new(common::tutorial_router());
    let resp = dispatcher.dispatch(&RawRequest::new(http::Method::GET, "/foods/dairy"));
    assert_eq!(resp.status, 501);
    assert_eq!(resp.body["handler"], "get_food");
}

#[test]
fn test_panicking_handler_does_not_poison_dispatcher() {
    let mut dispatcher = Dispatcher::new(common::tutorial_router());
    dispatcher.register_handler("get_food", |req| {
        if req.get_str("food_name") == Some("dairy") {
            panic!("no dairy today");
        }
        HandlerResponse::json(200, req.to_json())
    });

    let resp = dispatcher.dispatch(&RawRequest::new(http::Method::GET, "/foods/dairy"));
    assert_eq!(resp.status, 500);
    let resp = dispatcher.dispatch(&RawRequest::new(http::Method::GET, "/foods/fruits"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({"food_name": "fruits"}));
}

#[test]
fn test_concurrent_dispatch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = Dispatcher::new(common::tutorial_router());
    let counter = Arc::clone(&calls);
    dispatcher.register_handler("read_user_item", move |req| {
        counter.fetch_add(1, Ordering::SeqCst);
        HandlerResponse::json(200, req.to_json())
    });
    let dispatcher = Arc::new(dispatcher);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                let target = format!("/users/{i}/items/item-{i}?short=true");
                let resp = dispatcher.dispatch(&RawRequest::new(http::Method::GET, &target));
                assert_eq!(resp.status, 200);
                assert_eq!(resp.body["user_id"], i);
                assert_eq!(resp.body["item_id"], format!("item-{i}"));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 8);
}
