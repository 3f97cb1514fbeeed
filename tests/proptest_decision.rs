//! Property-based testing for host classification and allow decisions.
//!
//! Uses proptest to generate header values, policies and server identities
//! and checks that the decision rules hold for all of them.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use axum::body::Body;
use devhost_guard::config::GuardConfig;
use devhost_guard::handlers::{app_router, AppState};
use devhost_guard::{classify, evaluate, is_allowed, AllowPolicy, ClassifiedHost, ServerIdentity};
use http::{header::HOST, Request, StatusCode};
use proptest::prelude::*;
use tower::util::ServiceExt;

// ============================================================================
// STRATEGIES
// ============================================================================

/// Strategy for generating DNS labels
pub fn arb_label() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,10}"
}

/// Strategy for generating dotted hostnames outside `.localhost`
pub fn arb_hostname() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_label(), 1..4)
        .prop_map(|labels| format!("{}.test", labels.join(".")))
}

/// Strategy for generating host patterns, exact or wildcard
pub fn arb_pattern() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_hostname(),
        arb_hostname().prop_map(|h| format!(".{}", h)),
    ]
}

/// Strategy for generating any policy other than `All`
pub fn arb_restrictive_policy() -> impl Strategy<Value = AllowPolicy> {
    prop_oneof![
        Just(AllowPolicy::Empty),
        prop::collection::vec(arb_pattern(), 1..5)
            .prop_map(|patterns| AllowPolicy::list(patterns).unwrap()),
    ]
}

/// Strategy for generating any policy
pub fn arb_policy() -> impl Strategy<Value = AllowPolicy> {
    prop_oneof![Just(AllowPolicy::All), arb_restrictive_policy()]
}

/// Strategy for generating server identities
pub fn arb_server() -> impl Strategy<Value = ServerIdentity> {
    prop_oneof![
        Just(ServerIdentity::none()),
        Just(ServerIdentity::new("127.0.0.1")),
        arb_hostname().prop_map(ServerIdentity::new),
    ]
}

/// Strategy for generating optional port suffixes
pub fn arb_port_suffix() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), any::<u16>().prop_map(|p| format!(":{}", p))]
}

/// Strategy for generating paths and queries, including ones that embed
/// another URL or authority marker
pub fn arb_path() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9/._-]{0,20}",
        Just("x://localhost".to_string()),
        Just("?next=http://localhost:5173/".to_string()),
        Just("redirect//127.0.0.1".to_string()),
        Just("chrome-extension://abc".to_string()),
        ("[a-z]{1,8}", arb_hostname()).prop_map(|(scheme, host)| format!("{}://{}", scheme, host)),
        ("[a-z0-9/]{0,8}", "[a-z+.-]{1,8}")
            .prop_map(|(prefix, scheme)| format!("{}?u={}://localhost", prefix, scheme)),
    ]
}

// ============================================================================
// CLASSIFICATION INVARIANTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_full_origin_yields_first_authority(
        host in arb_hostname(),
        port in arb_port_suffix(),
        path in arb_path(),
    ) {
        let header = format!("http://{}{}/{}", host, port, path);
        prop_assert_eq!(classify(Some(&header)), ClassifiedHost::Hostname(host.clone()));

        let allowed = is_allowed(&classify(Some(&header)), &AllowPolicy::Empty, &ServerIdentity::none());
        prop_assert!(!allowed);
    }
}

// ============================================================================
// DECISION INVARIANTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_all_allows_any_header(header in ".{0,64}", server in arb_server()) {
        prop_assert!(is_allowed(&classify(Some(&header)), &AllowPolicy::All, &server));
    }

    #[test]
    fn prop_empty_header_denied(policy in arb_restrictive_policy(), server in arb_server()) {
        prop_assert!(!is_allowed(&classify(Some("")), &policy, &server));
        prop_assert!(!is_allowed(&classify(None), &policy, &server));
    }

    #[test]
    fn prop_file_scheme_allowed(path in "[a-z/]{0,20}", policy in arb_policy(), server in arb_server()) {
        let header = format!("file://x/{}", path);
        prop_assert!(is_allowed(&classify(Some(&header)), &policy, &server));
    }

    #[test]
    fn prop_extension_scheme_allowed(
        vendor in arb_label(),
        rest in "[a-z0-9/.]{0,20}",
        policy in arb_policy(),
        server in arb_server(),
    ) {
        let header = format!("{}-extension://{}", vendor, rest);
        prop_assert!(is_allowed(&classify(Some(&header)), &policy, &server));
    }

    #[test]
    fn prop_localhost_subdomains_allowed(
        labels in prop::collection::vec(arb_label(), 0..3),
        port in arb_port_suffix(),
        policy in arb_policy(),
        server in arb_server(),
    ) {
        let mut name = labels.join(".");
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str("localhost");

        let header = format!("{}{}", name, port);
        prop_assert!(is_allowed(&classify(Some(&header)), &policy, &server));
    }

    #[test]
    fn prop_ipv4_literals_allowed(
        addr in any::<Ipv4Addr>(),
        port in arb_port_suffix(),
        policy in arb_policy(),
        server in arb_server(),
    ) {
        let header = format!("{}{}", addr, port);
        prop_assert!(is_allowed(&classify(Some(&header)), &policy, &server));
    }

    #[test]
    fn prop_ipv6_literals_allowed(
        addr in any::<Ipv6Addr>(),
        port in arb_port_suffix(),
        policy in arb_policy(),
        server in arb_server(),
    ) {
        let bare = addr.to_string();
        let bracketed = format!("[{}]{}", addr, port);
        prop_assert!(is_allowed(&classify(Some(&bare)), &policy, &server));
        prop_assert!(is_allowed(&classify(Some(&bracketed)), &policy, &server));
    }

    #[test]
    fn prop_exact_pattern_rejects_subdomains(host in arb_hostname(), sub in arb_label()) {
        let policy = AllowPolicy::list([host.as_str()]).unwrap();
        let server = ServerIdentity::none();

        prop_assert!(is_allowed(&classify(Some(&host)), &policy, &server));
        let subdomain = format!("{}.{}", sub, host);
        prop_assert!(!is_allowed(&classify(Some(&subdomain)), &policy, &server));
    }

    #[test]
    fn prop_wildcard_pattern_allows_subdomains(
        host in arb_hostname(),
        labels in prop::collection::vec(arb_label(), 1..3),
    ) {
        let policy = AllowPolicy::list([format!(".{}", host)]).unwrap();
        let server = ServerIdentity::none();

        let subdomain = format!("{}.{}", labels.join("."), host);
        prop_assert!(is_allowed(&classify(Some(&host)), &policy, &server));
        prop_assert!(is_allowed(&classify(Some(&subdomain)), &policy, &server));

        // Suffix match must fall on a label boundary
        let glued = format!("{}{}", labels[0], host);
        prop_assert!(!is_allowed(&classify(Some(&glued)), &policy, &server));
    }

    #[test]
    fn prop_server_identity_allowed(host in arb_hostname(), other in arb_hostname()) {
        let server = ServerIdentity::new(host.clone());

        prop_assert!(is_allowed(&classify(Some(&host)), &AllowPolicy::Empty, &server));
        if !other.eq_ignore_ascii_case(&host) {
            prop_assert!(!is_allowed(&classify(Some(&other)), &AllowPolicy::Empty, &server));
        }
    }

    #[test]
    fn prop_port_does_not_change_decision(
        host in arb_hostname(),
        port in any::<u16>(),
        policy in arb_policy(),
        server in arb_server(),
    ) {
        let with_port = format!("{}:{}", host, port);
        prop_assert_eq!(
            is_allowed(&classify(Some(&host)), &policy, &server),
            is_allowed(&classify(Some(&with_port)), &policy, &server)
        );
    }

    #[test]
    fn prop_decision_is_deterministic(
        header in ".{0,64}",
        policy in arb_policy(),
        server in arb_server(),
    ) {
        let first = evaluate(&classify(Some(&header)), &policy, &server);
        let second = evaluate(&classify(Some(&header)), &policy, &server);
        prop_assert_eq!(first, second);
    }
}

// ============================================================================
// MIDDLEWARE INVARIANTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_middleware_agrees_with_decision(host in arb_hostname(), policy in arb_policy()) {
        let config = GuardConfig::new().with_hosts(policy);
        let expected = config.is_allowed(Some(&host));
        let app = app_router(Arc::new(AppState::new(config)));

        let request = Request::builder()
            .uri("/")
            .header(HOST, host.as_str())
            .body(Body::empty())
            .unwrap();
        let response = tokio_test::block_on(app.oneshot(request)).unwrap();

        let expected_status = if expected { StatusCode::OK } else { StatusCode::BAD_REQUEST };
        prop_assert_eq!(response.status(), expected_status);
    }
}
