/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use xdm_url::{Host, ImmutableOrigin, OriginSyntaxError, Url};

#[test]
fn test_parse_serialized_tuple_origin() {
    let origin = ImmutableOrigin::parse_serialized("https://example.com").unwrap();
    assert_eq!(origin.scheme(), Some("https"));
    assert_eq!(origin.host(), Some(&Host::Domain("example.com".to_owned())));
    assert_eq!(origin.port(), Some(443));
    assert_eq!(origin.ascii_serialization(), "https://example.com");
}

#[test]
fn test_parse_serialized_keeps_explicit_port() {
    let origin = ImmutableOrigin::parse_serialized("http://example.com:8080").unwrap();
    assert_eq!(origin.port(), Some(8080));
    assert_eq!(origin.ascii_serialization(), "http://example.com:8080");
}

#[test]
fn test_parse_serialized_tolerates_root_path() {
    let with_slash = ImmutableOrigin::parse_serialized("https://example.com/").unwrap();
    let without_slash = ImmutableOrigin::parse_serialized("https://example.com").unwrap();
    assert_eq!(with_slash, without_slash);
}

#[test]
fn test_parse_serialized_default_port_is_same_origin() {
    let implicit = ImmutableOrigin::parse_serialized("https://example.com").unwrap();
    let explicit = ImmutableOrigin::parse_serialized("https://example.com:443").unwrap();
    assert!(implicit.same_origin(&explicit));
}

#[test]
fn test_parse_serialized_rejects_non_origins() {
    assert!(matches!(
        ImmutableOrigin::parse_serialized("bogus targetOrigin"),
        Err(OriginSyntaxError::InvalidUrl(_))
    ));
    assert!(matches!(
        ImmutableOrigin::parse_serialized("example.com"),
        Err(OriginSyntaxError::InvalidUrl(_))
    ));
    assert!(matches!(
        ImmutableOrigin::parse_serialized("null"),
        Err(OriginSyntaxError::InvalidUrl(_))
    ));
    assert_eq!(
        ImmutableOrigin::parse_serialized("https://example.com/path"),
        Err(OriginSyntaxError::HasPath)
    );
    assert_eq!(
        ImmutableOrigin::parse_serialized("https://example.com?q=1"),
        Err(OriginSyntaxError::HasQuery)
    );
    assert_eq!(
        ImmutableOrigin::parse_serialized("https://example.com#top"),
        Err(OriginSyntaxError::HasFragment)
    );
    assert_eq!(
        ImmutableOrigin::parse_serialized("https://user:pw@example.com"),
        Err(OriginSyntaxError::HasCredentials)
    );
    assert_eq!(
        ImmutableOrigin::parse_serialized("file:///"),
        Err(OriginSyntaxError::Opaque)
    );
}

#[test]
fn test_opaque_origins_are_only_equal_to_themselves() {
    let first = ImmutableOrigin::new_opaque();
    let second = ImmutableOrigin::new_opaque();
    assert!(first.same_origin(&first.clone()));
    assert!(!first.same_origin(&second));
    assert!(!first.is_tuple());
    assert_eq!(first.ascii_serialization(), "null");
}

#[test]
fn test_from_url_matches_url_origin() {
    let url = Url::parse("https://example.com/some/page.html?x#y").unwrap();
    let origin = ImmutableOrigin::from_url(&url);
    assert_eq!(
        origin,
        ImmutableOrigin::parse_serialized("https://example.com").unwrap()
    );

    let data = Url::parse("data:text/html,hello").unwrap();
    assert!(!ImmutableOrigin::from_url(&data).is_tuple());
}
