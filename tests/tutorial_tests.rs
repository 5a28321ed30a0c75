//! The tutorial route table, bound end to end.

mod common;

use brrtbind::binder::{BindError, Binder, BoundRequest, ErrorKind};
use brrtbind::server::RawRequest;
use common::json_request;
use http::{HeaderMap, HeaderValue, Method};
use serde_json::json;

fn bind(request: &RawRequest) -> Result<BoundRequest, BindError> {
    let router = common::tutorial_router();
    let matched = router
        .route(&request.method, &request.path)
        .unwrap_or_else(|| panic!("no route for {} {}", request.method, request.path));
    Binder::default().bind_match(&matched, request)
}

#[test]
fn test_tutorial_routes_load() {
    let router = common::tutorial_router();
    assert_eq!(router.len(), 10);
}

#[test]
fn test_food_enum() {
    let bound = bind(&RawRequest::new(Method::GET, "/foods/vegetables")).unwrap();
    assert_eq!(bound.to_json(), json!({"food_name": "vegetables"}));

    let err = bind(&RawRequest::new(Method::GET, "/foods/meat")).unwrap_err();
    let error = err.for_field("food_name").unwrap();
    assert_eq!(error.kind, ErrorKind::TypeCoercionFailed);
    assert_eq!(
        error.message,
        "value is not a valid enumeration member; permitted: 'fruits', 'vegetables', 'dairy'"
    );
}

#[test]
fn test_items_listing_defaults() {
    let bound = bind(&RawRequest::new(Method::GET, "/items/")).unwrap();
    assert_eq!(
        bound.to_json(),
        json!({
            "skip": 0,
            "limit": 10,
            "q": null,
            "cookie_id": null,
            "accept_encoding": null,
            "sec_ch_ua": null,
            "user_agent": null,
            "x_token": null
        })
    );

    let bound = bind(&RawRequest::new(Method::GET, "/items/?skip=20&limit=5")).unwrap();
    assert_eq!(bound.get_i64("skip"), Some(20));
    assert_eq!(bound.get_i64("limit"), Some(5));

    let err = bind(&RawRequest::new(Method::GET, "/items/?skip=-1&limit=ten")).unwrap_err();
    assert_eq!(err.len(), 1);
    assert!(err.has("limit", ErrorKind::TypeCoercionFailed));
}

#[test]
fn test_items_listing_aliased_query() {
    let bound = bind(&RawRequest::new(Method::GET, "/items/?item-query=fixedquery")).unwrap();
    assert_eq!(bound.get_str("q"), Some("fixedquery"));

    let ignored = bind(&RawRequest::new(Method::GET, "/items/?q=fixedquery")).unwrap();
    assert!(ignored.get("q").unwrap().is_null());

    let err = bind(&RawRequest::new(Method::GET, "/items/?item-query=ab")).unwrap_err();
    let error = err.for_field("item-query").unwrap();
    assert_eq!(error.constraint, Some("min_length"));

    let err = bind(&RawRequest::new(Method::GET, "/items/?item-query=elevenchars")).unwrap_err();
    assert_eq!(err.for_field("item-query").unwrap().constraint, Some("max_length"));
}

#[test]
fn test_items_listing_headers_and_cookies() {
    let mut headers = HeaderMap::new();
    headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));
    headers.insert("accept-encoding", HeaderValue::from_static("gzip, deflate"));
    headers.insert("sec-ch-ua", HeaderValue::from_static("\"Chromium\";v=\"92\""));
    headers.append("x-token", HeaderValue::from_static("foo"));
    headers.append("x-token", HeaderValue::from_static("bar"));
    headers.insert("cookie", HeaderValue::from_static("cookie_id=abc123"));

    let bound = bind(&RawRequest::new(Method::GET, "/items/").with_headers(headers)).unwrap();
    assert_eq!(bound.get_str("user_agent"), Some("Mozilla/5.0"));
    assert_eq!(bound.get_str("accept_encoding"), Some("gzip, deflate"));
    assert_eq!(bound.get_str("sec_ch_ua"), Some("\"Chromium\";v=\"92\""));
    assert_eq!(bound.get("x_token").unwrap().to_json(), json!(["foo", "bar"]));
    assert_eq!(bound.get_str("cookie_id"), Some("abc123"));
}

#[test]
fn test_read_item_query_flags() {
    let bound = bind(&RawRequest::new(Method::GET, "/items/foo?short=1")).unwrap();
    assert_eq!(
        bound.to_json(),
        json!({"item_id": "foo", "q": null, "short": true})
    );

    let err = bind(&RawRequest::new(Method::GET, "/items/foo?short=maybe")).unwrap_err();
    assert!(err.has("short", ErrorKind::TypeCoercionFailed));
}

#[test]
fn test_user_item_path_parameters() {
    let bound = bind(&RawRequest::new(Method::GET, "/users/3/items/foo?q=bar")).unwrap();
    assert_eq!(bound.get_i64("user_id"), Some(3));
    assert_eq!(bound.get_str("item_id"), Some("foo"));
    assert_eq!(bound.get_str("q"), Some("bar"));
}

#[test]
fn test_validated_item() {
    let bound = bind(&RawRequest::new(
        Method::GET,
        "/items_validation/42?size=3.5",
    ))
    .unwrap();
    assert_eq!(
        bound.to_json(),
        json!({"item_id": 42, "q": "hello", "size": 3.5})
    );

    let bound = bind(&RawRequest::new(Method::GET, "/items_validation/42?size=1&q=foo")).unwrap();
    assert_eq!(bound.get_str("q"), Some("foo"));

    let err = bind(&RawRequest::new(Method::GET, "/items_validation/101")).unwrap_err();
    let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["item_id", "size"]);
}

#[test]
fn test_embedded_item_body() {
    let bound = bind(&json_request(
        Method::PUT,
        "/items/5",
        &json!({"item": {"name": "Foo", "description": "A very nice Item", "price": 35.4}}),
    ))
    .unwrap();
    assert_eq!(bound.get_i64("item_id"), Some(5));
    assert!(bound.get("q").unwrap().is_null());
    let item = bound.get("item").unwrap();
    assert_eq!(item.get("price").and_then(|v| v.as_f64()), Some(35.4));
    assert!(item.get("image").unwrap().is_null());

    let err = bind(&json_request(
        Method::PUT,
        "/items/5",
        &json!({"name": "Foo", "price": 35.4}),
    ))
    .unwrap_err();
    assert!(err.has("item", ErrorKind::MissingRequired));

    let err = bind(&json_request(
        Method::PUT,
        "/items/151",
        &json!({"item": {"name": "Foo", "price": 35.4}}),
    ))
    .unwrap_err();
    assert_eq!(err.for_field("item_id").unwrap().constraint, Some("le"));
}

#[test]
fn test_several_body_parameters() {
    let bound = bind(&json_request(
        Method::PUT,
        "/items/5/owner",
        &json!({
            "item": {"name": "Foo", "price": 42.0},
            "user": {"username": "dave", "full_name": "Dave Grohl"},
            "importance": 5
        }),
    ))
    .unwrap();
    assert_eq!(bound.get_i64("importance"), Some(5));
    assert_eq!(
        bound.get("user").unwrap().get("username").and_then(|v| v.as_str()),
        Some("dave")
    );

    let err = bind(&json_request(
        Method::PUT,
        "/items/5/owner",
        &json!({"item": {"name": "Foo"}, "importance": 0}),
    ))
    .unwrap_err();
    let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["item.price", "user", "importance"]);
}

#[test]
fn test_nested_offer() {
    let offer = json!({
        "name": "Summer sale",
        "price": 99.5,
        "items": [
            {"name": "Foo", "price": 35.4, "image": [{"url": "http://example.com/foo.png", "name": "foo"}]},
            {"name": "Bar", "price": 12.0, "tags": ["x"]}
        ]
    });
    let bound = bind(&json_request(Method::POST, "/offers/", &offer)).unwrap();
    let items = bound.get("offer").unwrap().get("items").unwrap().as_list().unwrap();
    assert_eq!(items.len(), 2);

    let bad = json!({
        "name": "Summer sale",
        "price": 99.5,
        "items": [
            {"name": "Foo", "price": 35.4},
            {"name": "Bar", "price": 12.0, "image": [{"url": "not a url", "name": "bar"}]}
        ]
    });
    let err = bind(&json_request(Method::POST, "/offers/", &bad)).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors[0].field, "offer.items.1.image.0.url");
    assert_eq!(err.errors[0].value.as_deref(), Some("not a url"));
}

#[test]
fn test_multiple_images_body() {
    let err = bind(&json_request(
        Method::POST,
        "/images/multiple/",
        &json!({"url": "http://example.com/a.png", "name": "a"}),
    ))
    .unwrap_err();
    assert!(err.has("images", ErrorKind::TypeCoercionFailed));
}

#[test]
fn test_extra_data_types() {
    let bound = bind(&json_request(
        Method::PUT,
        "/items_extra/3fa85f64-5717-4562-b3fc-2c963f66afa6",
        &json!({
            "start_date": "2008-09-15T15:53:00Z",
            "end_date": "2008-09-16T15:53:00Z",
            "process_after": 3600
        }),
    ))
    .unwrap();
    assert_eq!(
        bound.to_json(),
        json!({
            "item_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "start_date": "2008-09-15T15:53:00+00:00",
            "end_date": "2008-09-16T15:53:00+00:00",
            "repeat_at": null,
            "process_after": 3600.0
        })
    );
}

#[test]
fn test_extra_data_types_are_optional() {
    let bound = bind(
        &RawRequest::new(Method::PUT, "/items_extra/3fa85f64-5717-4562-b3fc-2c963f66afa6"),
    )
    .unwrap();
    assert_eq!(
        bound.to_json(),
        json!({
            "item_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "start_date": null,
            "end_date": null,
            "repeat_at": null,
            "process_after": null
        })
    );
}
