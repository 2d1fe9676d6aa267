//! Property tests for the address grammar.

use corral_bus::parse_address;
use corral_core::models::Address;
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}".prop_filter("reserved", |s| s != "anyone" && s != "everyone")
}

fn scope() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,15}"
}

proptest! {
    #[test]
    fn direct_addresses_render_back_to_themselves(
        agent in segment(),
        instance in proptest::option::of(segment()),
        scope in proptest::option::of(scope()),
    ) {
        let mut raw = agent.clone();
        if let Some(i) = &instance {
            raw.push('.');
            raw.push_str(i);
        }
        if let Some(s) = &scope {
            raw.push('@');
            raw.push_str(s);
        }
        let parsed = parse_address(&raw).unwrap();
        prop_assert_eq!(parsed.to_string(), raw);
        prop_assert_eq!(parsed, Address::Direct { agent, instance, scope });
    }

    #[test]
    fn keyword_addresses_keep_their_scope(scope in proptest::option::of(scope()), everyone in any::<bool>()) {
        let keyword = if everyone { "@everyone" } else { "@anyone" };
        let raw = match &scope {
            Some(s) => format!("{keyword}@{s}"),
            None => keyword.to_string(),
        };
        let parsed = parse_address(&raw).unwrap();
        prop_assert_eq!(parsed.is_broadcast(), everyone);
        prop_assert_eq!(parsed.is_anyone(), !everyone);
        prop_assert_eq!(parsed.scope(), scope.as_deref());
    }

    #[test]
    fn arbitrary_input_never_panics(raw in ".{0,64}") {
        let _ = parse_address(&raw);
    }

    #[test]
    fn whitespace_inside_is_rejected(a in segment(), b in segment()) {
        let raw = format!("{a} {b}");
        prop_assert!(parse_address(&raw).is_err());
    }
}
