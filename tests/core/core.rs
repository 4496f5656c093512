use stash::core::address;
use stash::core::config::Config;
use stash::core::error::StashError;
use stash::core::output::{self, Formatter, ListOptions, Sink};
use stash::core::registry::{self, Registry};
use stash::core::resolver::{self, SuggestStrategy};
use stash::core::store::{Namespace, OpenMode, ScanOptions, StoreOptions};
use stash::{Access, open_namespace};
use std::fs;
use tempfile::tempdir;

fn set(registry: &Registry, config: &Config, addr: &str, value: &[u8]) {
    let addr = address::parse(addr).expect("valid address");
    let mut ns = open_namespace(registry, config, &addr.db, Access::Write).expect("open write");
    ns.with_txn(false, |txn| txn.set(&addr.key, value)).expect("set");
    ns.close().expect("close");
}

fn list_raw(
    registry: &Registry,
    config: &Config,
    db_arg: Option<&str>,
    opts: &ListOptions,
) -> Vec<u8> {
    let db = address::db_from_arg(db_arg).expect("db arg");
    let mut ns = open_namespace(registry, config, &db, Access::Read).expect("open read");
    let mut fmt = Formatter::new(Vec::new(), Sink::Redirected, opts.show_binary);
    output::iterate(&mut ns, opts, &mut fmt).expect("iterate");
    ns.close().expect("close");
    fmt.into_inner()
}

#[test]
fn set_then_list_prints_tab_separated_pair() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();

    set(&registry, &config, "foo@db1", b"bar");

    let out = list_raw(&registry, &config, Some("@db1"), &ListOptions::default());
    assert_eq!(out, b"foo\tbar\n");
    assert_eq!(registry.list().expect("list"), vec!["db1"]);
}

#[test]
fn keys_are_lowercased_on_write_and_read() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();

    set(&registry, &config, "MiXeD@Notes", b"v");

    let addr = address::parse("mixed@NOTES").expect("address");
    let mut ns = open_namespace(&registry, &config, &addr.db, Access::Read).expect("open");
    assert_eq!(ns.with_txn(true, |txn| txn.get(&addr.key)).expect("get"), b"v");
    ns.close().expect("close");
}

#[test]
fn binary_values_round_trip_byte_for_byte() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();
    let value: Vec<u8> = (0..=255u8).rev().collect();

    set(&registry, &config, "blob", &value);

    let mut ns = open_namespace(&registry, &config, "", Access::Read).expect("open");
    assert_eq!(ns.name(), "default");
    let got = ns.with_txn(true, |txn| txn.get(b"blob")).expect("get");
    assert_eq!(got, value);
}

#[test]
fn reading_a_named_missing_database_suggests_and_creates_nothing() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();
    set(&registry, &config, "k@notebook", b"v");

    let err = open_namespace(&registry, &config, "note", Access::Read).unwrap_err();
    match err {
        StashError::DatabaseNotFound { name, suggestions } => {
            assert_eq!(name, "note");
            assert_eq!(suggestions.names(), ["@notebook"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!registry.exists("note").expect("exists"));
}

#[test]
fn reading_the_default_database_always_works() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();

    let out = list_raw(&registry, &config, None, &ListOptions::default());
    assert!(out.is_empty());
    assert!(registry.exists("default").expect("exists"));
}

#[test]
fn delete_of_absent_key_leaves_namespace_unchanged() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();
    set(&registry, &config, "a@db", b"1");
    set(&registry, &config, "b@db", b"2");
    let before = list_raw(&registry, &config, Some("@db"), &ListOptions::default());

    let mut ns = open_namespace(&registry, &config, "db", Access::Write).expect("open");
    ns.with_txn(false, |txn| txn.delete(b"zzz")).expect("delete absent");
    ns.close().expect("close");

    let after = list_raw(&registry, &config, Some("@db"), &ListOptions::default());
    assert_eq!(before, after);
}

#[test]
fn reverse_listing_mirrors_forward_listing() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();
    for (k, v) in [("b", "2"), ("a", "1"), ("c", "3"), ("aa", "11")] {
        set(&registry, &config, &format!("{}@ord", k), v.as_bytes());
    }

    let forward = list_raw(&registry, &config, Some("@ord"), &ListOptions::default());
    let reverse = list_raw(
        &registry,
        &config,
        Some("@ord"),
        &ListOptions {
            reverse: true,
            ..ListOptions::default()
        },
    );
    assert_eq!(forward, b"a\t1\naa\t11\nb\t2\nc\t3\n");

    let mut forward_lines: Vec<&[u8]> = forward.split(|b| *b == b'\n').collect();
    let reverse_lines: Vec<&[u8]> = reverse
        .split(|b| *b == b'\n')
        .filter(|l| !l.is_empty())
        .collect();
    forward_lines.retain(|l| !l.is_empty());
    forward_lines.reverse();
    assert_eq!(forward_lines, reverse_lines);
}

#[test]
fn keys_only_and_values_only_listing() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();
    set(&registry, &config, "k1@db", b"v1");
    set(&registry, &config, "k2@db", b"v2");

    let keys = list_raw(
        &registry,
        &config,
        Some("@db"),
        &ListOptions {
            keys_only: true,
            ..ListOptions::default()
        },
    );
    assert_eq!(keys, b"k1\nk2\n");

    let values = list_raw(
        &registry,
        &config,
        Some("@db"),
        &ListOptions {
            values_only: true,
            ..ListOptions::default()
        },
    );
    assert_eq!(values, b"v1\nv2\n");
}

#[test]
fn terminal_listing_redacts_binary_values() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let config = Config::default();
    set(&registry, &config, "bin@db", b"\xff\xfe");

    let mut ns = open_namespace(&registry, &config, "db", Access::Read).expect("open");
    let mut fmt = Formatter::new(Vec::new(), Sink::Terminal, false);
    output::iterate(&mut ns, &ListOptions::default(), &mut fmt).expect("iterate");
    assert_eq!(fmt.into_inner(), b"bin\t(omitted binary data)\n");

    let mut fmt = Formatter::new(Vec::new(), Sink::Terminal, true);
    output::iterate(&mut ns, &ListOptions::default(), &mut fmt).expect("iterate");
    assert_eq!(fmt.into_inner(), b"bin\t\xff\xfe\n");
}

#[test]
fn panicking_transaction_body_leaves_state_unchanged() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    let mut ns = Namespace::open(&registry, "crash", OpenMode::Create, &StoreOptions::default())
        .expect("open");
    ns.with_txn(false, |txn| txn.set(b"k", b"before")).expect("seed");

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _: Result<(), StashError> = ns.with_txn(false, |txn| {
            txn.set(b"k", b"after").expect("set inside");
            panic!("SIMULATED CRASH");
        });
    }));
    assert!(result.is_err());

    let value = ns.with_txn(true, |txn| txn.get(b"k")).expect("get");
    assert_eq!(value, b"before");
    let mut keys = 0;
    ns.with_txn(true, |txn| {
        txn.scan(ScanOptions::default(), |_, _| {
            keys += 1;
            Ok(())
        })
    })
    .expect("scan");
    assert_eq!(keys, 1);
}

#[test]
fn registry_feeds_resolver_for_explicit_lookups() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path());
    for name in ["alpha", "alphabet", "zulu"] {
        fs::create_dir_all(registry.namespace_path(name).expect("path")).expect("mkdir");
    }
    let known = registry.list().expect("list");
    assert_eq!(registry::format_dbs(&known), vec!["@alpha", "@alphabet", "@zulu"]);

    assert!(resolver::resolve("alpha", &known, SuggestStrategy::LengthBound).is_ok());
    let path = resolver::find_db(&registry, "@zulu", SuggestStrategy::LengthBound).expect("find");
    assert!(path.ends_with("kv/zulu"));

    let threshold = SuggestStrategy::ThresholdPrefix { max_distance: 2 };
    match resolver::find_db(&registry, "alp", threshold) {
        Err(StashError::DatabaseNotFound { suggestions, .. }) => {
            assert_eq!(suggestions.names(), ["@alpha", "@alphabet"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    match resolver::find_db(&registry, "", SuggestStrategy::LengthBound) {
        Err(StashError::DatabaseNotFound { name, suggestions }) => {
            assert!(name.is_empty());
            assert_eq!(suggestions.len(), 3);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn database_names_match_listed_directories_only() {
    let tmp = tempdir().expect("tempdir");
    let registry = Registry::new(tmp.path().join("root"));
    let config = Config::default();
    set(&registry, &config, "k@outer", b"v");
    let kv = registry.kv_dir().expect("kv dir");
    fs::create_dir_all(kv.join("outer").join("inner")).expect("nested dir");

    assert_eq!(registry.list().expect("list"), vec!["outer"]);

    for name in [".", "..", "outer/inner", "../root", "../../escaped"] {
        for access in [Access::Read, Access::Write] {
            let err = open_namespace(&registry, &config, name, access).unwrap_err();
            assert!(matches!(err, StashError::Format(_)), "{name:?}: {err:?}");
        }
        let err = resolver::find_db(&registry, name, SuggestStrategy::LengthBound).unwrap_err();
        assert!(matches!(err, StashError::Format(_)), "{name:?}: {err:?}");
    }

    assert!(!tmp.path().join("escaped").exists());
    assert!(kv.join("outer").join("inner").is_dir());
    assert_eq!(registry.list().expect("list"), vec!["outer"]);
}
