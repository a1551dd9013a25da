//! Unit tests for request customisation.

use rstest::rstest;

use super::*;

#[test]
fn shared_headers_reach_both_kinds() {
    let headers = StaticHeaders::new()
        .with_header("X-Token", "abc")
        .expect("valid header");

    for kind in [RequestKind::Registry, RequestKind::Artifact] {
        assert_eq!(
            headers.headers(kind).get("x-token").map(HeaderValue::as_bytes),
            Some(b"abc".as_slice())
        );
    }
}

#[test]
fn kind_specific_headers_stay_apart() {
    let headers = StaticHeaders::new()
        .with_registry_header("myHeader", "repository")
        .and_then(|built| built.with_artifact_header("myHeader", "jar"))
        .expect("valid headers");

    assert_eq!(
        headers.headers(RequestKind::Registry).get("myheader"),
        Some(&HeaderValue::from_static("repository"))
    );
    assert_eq!(
        headers.headers(RequestKind::Artifact).get("myheader"),
        Some(&HeaderValue::from_static("jar"))
    );
}

#[rstest]
#[case::bad_name("bad header", "value")]
#[case::bad_value("X-Token", "line\nbreak")]
fn invalid_headers_are_preconditions(#[case] name: &str, #[case] value: &str) {
    let error = StaticHeaders::new()
        .with_header(name, value)
        .expect_err("invalid header");
    assert!(error.is_precondition(), "{error}");
}
