use brrtbind::router::Router;
use brrtbind::spec::{FieldSpec, ParameterSpec, RouteSpec, ValueType};
use http::Method;

fn route(method: Method, path: &str, handler: &str, params: &[&str]) -> RouteSpec {
    RouteSpec::builder(method, path)
        .handler(handler)
        .params(
            params
                .iter()
                .map(|name| ParameterSpec::path(FieldSpec::string(*name))),
        )
        .build()
}

fn zoo_router() -> Router {
    Router::from_routes([
        route(Method::GET, "/", "root_handler", &[]),
        route(Method::GET, "/zoo/animals", "get_animals", &[]),
        route(Method::POST, "/zoo/animals", "create_animal", &[]),
        route(Method::GET, "/zoo/animals/{id}", "get_animal", &["id"]),
        route(Method::PUT, "/zoo/animals/{id}", "update_animal", &["id"]),
        route(Method::DELETE, "/zoo/animals/{id}", "delete_animal", &["id"]),
        route(Method::GET, "/zoo/animals/search", "search_animals", &[]),
        route(
            Method::GET,
            "/zoo/animals/{id}/toys/{toy_id}",
            "animal_toy",
            &["id", "toy_id"],
        ),
    ])
    .unwrap()
}

#[test]
fn test_routes_match_expected_handlers() {
    let router = zoo_router();
    let cases = [
        (Method::GET, "/", Some("root_handler")),
        (Method::GET, "/zoo/animals", Some("get_animals")),
        (Method::POST, "/zoo/animals", Some("create_animal")),
        (Method::GET, "/zoo/animals/42", Some("get_animal")),
        (Method::PUT, "/zoo/animals/42", Some("update_animal")),
        (Method::GET, "/zoo/animals/search", Some("search_animals")),
        (Method::GET, "/zoo/animals/7/toys/ball", Some("animal_toy")),
        (Method::GET, "/zoo/animals/7/toys", None),
        (Method::PATCH, "/zoo/animals/42", None),
        (Method::GET, "/does/not/exist", None),
    ];
    for (method, path, expected) in cases {
        let matched = router.route(&method, path);
        assert_eq!(
            matched.as_ref().map(|m| m.handler_name.as_ref()),
            expected,
            "{method} {path}"
        );
    }
}

#[test]
fn test_path_params_are_extracted_raw() {
    let router = zoo_router();
    let matched = router
        .route(&Method::GET, "/zoo/animals/7/toys/red%20ball")
        .unwrap();
    assert_eq!(matched.get_path_param("id"), Some("7"));
    assert_eq!(matched.get_path_param("toy_id"), Some("red%20ball"));
    assert_eq!(matched.route.path_pattern, "/zoo/animals/{id}/toys/{toy_id}");
}

#[test]
fn test_allowed_methods_for_known_path() {
    let router = zoo_router();
    let allowed = router.allowed_methods("/zoo/animals/42");
    assert_eq!(allowed, vec![Method::DELETE, Method::GET, Method::PUT]);
    assert!(router.allowed_methods("/nowhere").is_empty());
}

#[test]
fn test_duplicate_route_is_rejected_even_with_other_placeholder_names() {
    let mut router = zoo_router();
    let err = router
        .register(route(Method::GET, "/zoo/animals/{animal_id}", "other", &["animal_id"]))
        .unwrap_err();
    assert!(err.issues.iter().any(|i| i.kind == "DuplicateRoute"));

    let matched = router.route(&Method::GET, "/zoo/animals/1").unwrap();
    assert_eq!(matched.handler_name.as_ref(), "get_animal");
}

#[test]
fn test_registration_collects_every_issue() {
    let bad = RouteSpec::builder(Method::GET, "/items/{item_id}")
        .handler("")
        .param(ParameterSpec::path(FieldSpec::integer("item_id").optional()))
        .param(ParameterSpec::query(FieldSpec::string("q").gt(1.0)))
        .param(ParameterSpec::cookie(FieldSpec::array("ids", ValueType::Integer)))
        .param(ParameterSpec::query(FieldSpec::number("size").gt(5.0).lt(5.0)))
        .build();

    let err = Router::new().register(bad).unwrap_err();
    let kinds: Vec<&str> = err.issues.iter().map(|i| i.kind.as_str()).collect();
    for expected in [
        "MissingHandler",
        "OptionalPathParameter",
        "InvalidConstraint",
        "UnsupportedType",
        "EmptyRange",
    ] {
        assert!(kinds.contains(&expected), "missing {expected} in {kinds:?}");
    }
}

#[test]
fn test_from_routes_reports_all_rejected_routes() {
    let result = Router::from_routes([
        route(Method::GET, "/a/{id}", "a", &[]),
        route(Method::GET, "/b", "b", &["id"]),
        route(Method::GET, "/c", "c", &[]),
    ]);
    let err = result.unwrap_err();
    let kinds: Vec<&str> = err.issues.iter().map(|i| i.kind.as_str()).collect();
    assert!(kinds.contains(&"UndeclaredPathParameter"));
    assert!(kinds.contains(&"UnknownPathParameter"));
}
