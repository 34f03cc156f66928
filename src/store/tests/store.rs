use std::io::Cursor;

use crate::store::snapshot::{Snapshot, validate_key};
use crate::store::{ConfigError, ConfigurationProvider, XmlConfigStore};

#[test]
fn new_keys_start_as_escaped_text() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("k", "v");

    assert!(!snapshot.get("k").unwrap().raw_block);
}

#[test]
fn set_preserves_the_raw_flag_of_existing_entries() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set_raw("k", "v1");
    snapshot.set("k", "v2");

    let entry = snapshot.get("k").unwrap();
    assert_eq!(entry.value.as_deref(), Some("v2"));
    assert!(entry.raw_block);
}

#[test]
fn set_raw_promotes_existing_plain_entries() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("k", "v1");
    snapshot.set_raw("k", "v2");

    assert!(snapshot.get("k").unwrap().raw_block);
}

#[test]
fn lookups_are_case_insensitive_and_keep_first_writer_casing() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("Logging:Level", "info");
    snapshot.set("logging:level", "debug");

    assert_eq!(snapshot.len(), 1);
    let entry = snapshot.get("LOGGING:LEVEL").unwrap();
    assert_eq!(entry.key, "Logging:Level");
    assert_eq!(entry.value.as_deref(), Some("debug"));
}

#[test]
fn insert_new_rejects_duplicate_normalized_keys() {
    let mut snapshot = Snapshot::new("configuration");
    assert!(snapshot.insert_new("Key", Some("1".to_string()), false));
    assert!(!snapshot.insert_new("key", Some("2".to_string()), false));
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn entries_iterate_in_insertion_order() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("z", "1");
    snapshot.set("a", "2");
    snapshot.set("m", "3");

    let keys: Vec<&str> = snapshot.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn validate_key_rejects_malformed_paths() {
    assert!(validate_key("").is_err());
    assert!(validate_key("a::b").is_err());
    assert!(validate_key(":a").is_err());
    assert!(validate_key("a:").is_err());
    assert!(validate_key("bad key").is_err());
    assert!(validate_key("1leading").is_err());

    assert!(validate_key("a").is_ok());
    assert!(validate_key("app:logging:level").is_ok());
    assert!(validate_key("_private:x-y.z").is_ok());
}

#[test]
fn empty_stores_have_no_backing_path() {
    let store = XmlConfigStore::empty();

    assert_eq!(store.root_name(), "configuration");
    assert!(store.try_get("anything").is_none());
    assert!(matches!(
        store.save(),
        Err(ConfigError::InvalidConfiguration { .. })
    ));
    assert!(matches!(
        store.load(),
        Err(ConfigError::InvalidConfiguration { .. })
    ));
}

#[test]
fn store_set_rejects_invalid_keys() {
    let store = XmlConfigStore::empty();

    assert!(matches!(
        store.set("a::b", "v"),
        Err(ConfigError::InvalidConfiguration { .. })
    ));
    assert!(matches!(
        store.set_raw("", "v"),
        Err(ConfigError::InvalidConfiguration { .. })
    ));
}

#[test]
fn root_name_assignment_is_validated() {
    let store = XmlConfigStore::empty();

    assert!(matches!(
        store.set_root_name("   "),
        Err(ConfigError::InvalidConfiguration { .. })
    ));
    store.set_root_name("appSettings").unwrap();
    assert_eq!(store.root_name(), "appSettings");
}

#[test]
fn load_from_replaces_the_whole_snapshot() {
    let store = XmlConfigStore::empty();

    store
        .load_from(Cursor::new("<configuration><a>1</a><b>2</b></configuration>"))
        .unwrap();
    assert_eq!(store.try_get("a").as_deref(), Some("1"));

    store
        .load_from(Cursor::new("<settings><c>3</c></settings>"))
        .unwrap();
    assert!(store.try_get("a").is_none());
    assert!(store.try_get("b").is_none());
    assert_eq!(store.try_get("c").as_deref(), Some("3"));
    assert_eq!(store.root_name(), "settings");
}

#[test]
fn absent_values_read_as_empty_strings() {
    let store = XmlConfigStore::empty();
    let mut snapshot = Snapshot::new("configuration");
    assert!(snapshot.insert_new("k", None, false));
    store.replace_snapshot(snapshot);

    assert_eq!(store.try_get("k").as_deref(), Some(""));
}

#[test]
fn stores_are_usable_through_the_provider_trait() {
    fn read(provider: &dyn ConfigurationProvider, key: &str) -> Option<String> {
        provider.try_get(key)
    }

    let store = XmlConfigStore::empty();
    store.set("k", "v").unwrap();

    assert_eq!(read(&store, "k").as_deref(), Some("v"));
}
