mod common;

use brrtbind::binder::{BindError, Binder, BoundRequest, BoundValue, ErrorKind};
use brrtbind::router::Router;
use brrtbind::runtime_config::BindConfig;
use brrtbind::server::RawRequest;
use brrtbind::spec::{FieldSpec, ObjectSchema, ParameterSpec, RouteSpec, ValueType};
use common::json_request;
use http::{HeaderMap, HeaderValue, Method};
use serde_json::json;
use std::sync::Arc;

fn bind_with(binder: Binder, route: RouteSpec, request: &RawRequest) -> Result<BoundRequest, BindError> {
    let mut router = Router::new();
    router.register(route).unwrap();
    let matched = router
        .route(&request.method, &request.path)
        .expect("request should match the route");
    binder.bind_match(&matched, request)
}

fn bind(route: RouteSpec, request: &RawRequest) -> Result<BoundRequest, BindError> {
    bind_with(Binder::default(), route, request)
}

fn validated_item_route() -> RouteSpec {
    RouteSpec::builder(Method::GET, "/items_validation/{item_id}")
        .handler("read_validated_item")
        .param(ParameterSpec::path(FieldSpec::integer("item_id").gt(10.0).le(100.0)))
        .param(ParameterSpec::query(FieldSpec::string("q").default("hello")))
        .param(ParameterSpec::query(FieldSpec::number("size").gt(0.0).lt(7.75)))
        .build()
}

fn item_schema() -> Arc<ObjectSchema> {
    Arc::new(
        ObjectSchema::new("Item")
            .field(FieldSpec::string("name"))
            .field(FieldSpec::string("description").optional().max_length(300))
            .field(FieldSpec::number("price").gt(0.0))
            .field(FieldSpec::number("tax").optional()),
    )
}

#[test]
fn test_required_field_absent_is_reported_by_name() {
    let err = bind(
        validated_item_route(),
        &RawRequest::new(Method::GET, "/items_validation/42"),
    )
    .unwrap_err();
    assert_eq!(err.len(), 1);
    let error = err.for_field("size").unwrap();
    assert_eq!(error.kind, ErrorKind::MissingRequired);
    assert_eq!(error.message, "field required");
    assert!(error.value.is_none());
}

#[test]
fn test_absent_optional_fields_take_their_default() {
    let bound = bind(
        validated_item_route(),
        &RawRequest::new(Method::GET, "/items_validation/42?size=3.5"),
    )
    .unwrap();
    assert_eq!(bound.get_i64("item_id"), Some(42));
    assert_eq!(bound.get_str("q"), Some("hello"));
    assert_eq!(bound.get_f64("size"), Some(3.5));
}

#[test]
fn test_exclusive_bounds_reject_exact_boundary() {
    for size in ["0", "7.75"] {
        let target = format!("/items_validation/42?size={size}");
        let err = bind(validated_item_route(), &RawRequest::new(Method::GET, &target)).unwrap_err();
        let error = err.for_field("size").unwrap();
        assert_eq!(error.kind, ErrorKind::ConstraintViolated, "size={size}");
        assert_eq!(error.value.as_deref(), Some(size));
    }

    let err = bind(
        validated_item_route(),
        &RawRequest::new(Method::GET, "/items_validation/42?size=0"),
    )
    .unwrap_err();
    assert_eq!(
        err.for_field("size").unwrap().message,
        "ensure this value is greater than 0"
    );
    assert_eq!(err.for_field("size").unwrap().constraint, Some("gt"));

    for size in ["0.01", "7.7"] {
        let target = format!("/items_validation/42?size={size}");
        assert!(bind(validated_item_route(), &RawRequest::new(Method::GET, &target)).is_ok());
    }
}

#[test]
fn test_inclusive_bound_accepts_exact_boundary() {
    let bound = bind(
        validated_item_route(),
        &RawRequest::new(Method::GET, "/items_validation/100?size=1"),
    )
    .unwrap();
    assert_eq!(bound.get_i64("item_id"), Some(100));

    let err = bind(
        validated_item_route(),
        &RawRequest::new(Method::GET, "/items_validation/10?size=1"),
    )
    .unwrap_err();
    assert!(err.has("item_id", ErrorKind::ConstraintViolated));
}

#[test]
fn test_binding_is_idempotent() {
    let route = RouteSpec::builder(Method::PUT, "/items/{item_id}")
        .handler("update_item")
        .param(ParameterSpec::path(FieldSpec::integer("item_id")))
        .param(ParameterSpec::body(FieldSpec::object("item", item_schema())).embed())
        .build();
    let mut router = Router::new();
    router.register(route).unwrap();

    let request = json_request(
        Method::PUT,
        "/items/5",
        &json!({"item": {"name": "Foo", "price": 35.4}}),
    );
    let matched = router.route(&request.method, &request.path).unwrap();
    let binder = Binder::default();
    let first = binder.bind_match(&matched, &request).unwrap();
    let second = binder.bind_match(&matched, &request).unwrap();
    assert_eq!(first, second);

    let bad = json_request(Method::PUT, "/items/x", &json!({"item": {"price": -1}}));
    let first = binder.bind_match(&matched, &bad).unwrap_err();
    let second = binder.bind_match(&matched, &bad).unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn test_all_simultaneous_errors_are_reported_in_order() {
    let err = bind(
        validated_item_route(),
        &RawRequest::new(Method::GET, "/items_validation/abc?size=8"),
    )
    .unwrap_err();
    assert_eq!(err.len(), 2);
    assert_eq!(err.errors[0].field, "item_id");
    assert_eq!(err.errors[0].kind, ErrorKind::TypeCoercionFailed);
    assert_eq!(err.errors[0].message, "value is not a valid integer");
    assert_eq!(err.errors[1].field, "size");
    assert_eq!(err.errors[1].kind, ErrorKind::ConstraintViolated);
}

#[test]
fn test_enum_member_binds_with_original_casing() {
    let route = RouteSpec::builder(Method::GET, "/foods/{food_name}")
        .handler("get_food")
        .param(ParameterSpec::path(FieldSpec::enumeration(
            "food_name",
            ["fruits", "vegetables", "dairy"],
        )))
        .build();

    let bound = bind(route.clone(), &RawRequest::new(Method::GET, "/foods/vegetables")).unwrap();
    assert_eq!(bound.get_str("food_name"), Some("vegetables"));

    let err = bind(route.clone(), &RawRequest::new(Method::GET, "/foods/meat")).unwrap_err();
    assert!(err.has("food_name", ErrorKind::TypeCoercionFailed));
    assert_eq!(err.for_field("food_name").unwrap().value.as_deref(), Some("meat"));

    let err = bind(route, &RawRequest::new(Method::GET, "/foods/Vegetables")).unwrap_err();
    assert!(err.has("food_name", ErrorKind::TypeCoercionFailed));
}

#[test]
fn test_embedded_body_errors_use_dotted_paths() {
    let route = RouteSpec::builder(Method::PUT, "/items/{item_id}")
        .handler("update_item")
        .param(ParameterSpec::path(FieldSpec::integer("item_id")))
        .param(ParameterSpec::body(FieldSpec::object("item", item_schema())).embed())
        .build();

    let err = bind(
        route,
        &json_request(
            Method::PUT,
            "/items/5",
            &json!({"item": {"name": "Foo", "price": 0, "description": "x".repeat(301)}}),
        ),
    )
    .unwrap_err();

    let fields: Vec<(&str, ErrorKind)> = err
        .errors
        .iter()
        .map(|e| (e.field.as_str(), e.kind))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("item.description", ErrorKind::ConstraintViolated),
            ("item.price", ErrorKind::ConstraintViolated),
        ]
    );
    assert_eq!(
        err.for_field("item.description").unwrap().message,
        "ensure this value has at most 300 characters"
    );
}

#[test]
fn test_non_string_json_value_for_string_field_is_rejected() {
    let route = RouteSpec::builder(Method::POST, "/items/")
        .handler("create_item")
        .param(ParameterSpec::body(FieldSpec::object("item", item_schema())))
        .build();
    let err = bind(
        route,
        &json_request(Method::POST, "/items/", &json!({"name": 3, "price": 2.5})),
    )
    .unwrap_err();
    let error = err.for_field("item.name").unwrap();
    assert_eq!(error.kind, ErrorKind::TypeCoercionFailed);
    assert_eq!(error.value.as_deref(), Some("3"));
}

#[test]
fn test_integral_json_float_binds_to_integer_field() {
    let route = || {
        RouteSpec::builder(Method::POST, "/counters/")
            .handler("create_counter")
            .param(ParameterSpec::body(FieldSpec::integer("count")).embed())
            .build()
    };

    let bound = bind(
        route(),
        &json_request(Method::POST, "/counters/", &json!({"count": 5.0})),
    )
    .unwrap();
    assert_eq!(bound.get_i64("count"), Some(5));

    let err = bind(
        route(),
        &json_request(Method::POST, "/counters/", &json!({"count": 5.5})),
    )
    .unwrap_err();
    let error = err.for_field("count").unwrap();
    assert_eq!(error.kind, ErrorKind::TypeCoercionFailed);
    assert_eq!(error.value.as_deref(), Some("5.5"));
}

#[test]
fn test_integer_bounds_are_exact_beyond_float_precision() {
    // 2^53: the first integer whose successor has no exact f64
    let route = || {
        RouteSpec::builder(Method::GET, "/ids/")
            .handler("read_ids")
            .param(ParameterSpec::query(FieldSpec::integer("v").le(9_007_199_254_740_992.0)))
            .build()
    };

    assert!(bind(route(), &RawRequest::new(Method::GET, "/ids/?v=9007199254740992")).is_ok());
    let err = bind(route(), &RawRequest::new(Method::GET, "/ids/?v=9007199254740993")).unwrap_err();
    assert!(err.has("v", ErrorKind::ConstraintViolated));
}

#[test]
fn test_nested_lists_of_models() {
    let image = Arc::new(
        ObjectSchema::new("Image")
            .field(FieldSpec::url("url"))
            .field(FieldSpec::string("name")),
    );
    let route = RouteSpec::builder(Method::POST, "/images/multiple/")
        .handler("create_multiple_images")
        .param(ParameterSpec::body(FieldSpec::array(
            "images",
            ValueType::Object(Arc::clone(&image)),
        )))
        .build();

    let ok = bind(
        route.clone(),
        &json_request(
            Method::POST,
            "/images/multiple/",
            &json!([
                {"url": "http://example.com/baz.jpg", "name": "The Foo live"},
                {"url": "https://example.com/dave.jpg", "name": "The Baz"}
            ]),
        ),
    )
    .unwrap();
    assert_eq!(ok.get("images").unwrap().as_list().unwrap().len(), 2);

    let err = bind(
        route,
        &json_request(
            Method::POST,
            "/images/multiple/",
            &json!([{"url": "ftp://example.com/a.jpg", "name": "a"}, {"url": "http://example.com"}]),
        ),
    )
    .unwrap_err();
    assert!(err.has("images.0.url", ErrorKind::TypeCoercionFailed));
    assert!(err.has("images.1.name", ErrorKind::MissingRequired));
}

#[test]
fn test_header_and_cookie_sources() {
    let route = RouteSpec::builder(Method::GET, "/items/")
        .handler("read_items")
        .param(ParameterSpec::header(FieldSpec::string("user_agent").optional()))
        .param(ParameterSpec::header(FieldSpec::array("x_token", ValueType::String).optional()))
        .param(ParameterSpec::cookie(FieldSpec::string("ads_id")))
        .build();

    let mut headers = HeaderMap::new();
    headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));
    headers.append("x-token", HeaderValue::from_static("foo"));
    headers.append("x-token", HeaderValue::from_static("bar, baz"));
    headers.insert("cookie", HeaderValue::from_static("ads_id=abc%20123; other=1"));
    let bound = bind(
        route.clone(),
        &RawRequest::new(Method::GET, "/items/").with_headers(headers),
    )
    .unwrap();
    assert_eq!(bound.get_str("user_agent"), Some("curl/8.0"));
    assert_eq!(
        bound.get("x_token"),
        Some(&BoundValue::List(vec!["foo".into(), "bar, baz".into()]))
    );
    assert_eq!(bound.get_str("ads_id"), Some("abc 123"));

    let err = bind(route, &RawRequest::new(Method::GET, "/items/")).unwrap_err();
    assert!(err.has("ads_id", ErrorKind::MissingRequired));
    assert_eq!(err.len(), 1);
}

#[test]
fn test_oversized_body_is_one_constraint_error() {
    let route = RouteSpec::builder(Method::POST, "/items/")
        .handler("create_item")
        .param(ParameterSpec::body(FieldSpec::object("item", item_schema())))
        .build();
    let binder = Binder::new(BindConfig {
        max_body_bytes: 8,
        ..BindConfig::default()
    });
    let err = bind_with(
        binder,
        route,
        &json_request(Method::POST, "/items/", &json!({"name": "Foo", "price": 1})),
    )
    .unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors[0].field, "body");
    assert_eq!(err.errors[0].kind, ErrorKind::ConstraintViolated);
}

#[test]
fn test_error_payload_shape() {
    let err = bind(
        validated_item_route(),
        &RawRequest::new(Method::GET, "/items_validation/5?size=7.75"),
    )
    .unwrap_err();
    assert_eq!(
        err.to_json(),
        json!({"errors": [
            {
                "field": "item_id",
                "kind": "constraint",
                "message": "ensure this value is greater than 10",
                "value": "5"
            },
            {
                "field": "size",
                "kind": "constraint",
                "message": "ensure this value is less than 7.75",
                "value": "7.75"
            }
        ]})
    );
}
