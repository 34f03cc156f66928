use crate::store::ConfigError;
use crate::store::loader::parse_document;
use crate::store::saver::render;
use crate::store::snapshot::Snapshot;
use crate::store::tests::triples;

fn render_to_string(snapshot: &Snapshot) -> String {
    String::from_utf8(render(snapshot).unwrap()).unwrap()
}

#[test]
fn writes_the_xml_declaration_and_root_element() {
    let snapshot = Snapshot::new("configuration");
    let output = render_to_string(&snapshot);

    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(output.contains("<configuration></configuration>"));
}

#[test]
fn sibling_entries_share_their_prefix_element() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("database:host", "localhost");
    snapshot.set("database:port", "5432");

    let output = render_to_string(&snapshot);
    assert_eq!(output.matches("<database>").count(), 1);
    assert!(output.contains("<host>localhost</host>"));
    assert!(output.contains("<port>5432</port>"));
}

#[test]
fn output_follows_snapshot_insertion_order() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("zeta", "1");
    snapshot.set("alpha", "2");

    let output = render_to_string(&snapshot);
    let zeta = output.find("<zeta>").unwrap();
    let alpha = output.find("<alpha>").unwrap();
    assert!(zeta < alpha);
}

#[test]
fn raw_entries_render_as_cdata_sections() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set_raw("script", "if a < b && c > d { run(); }");

    let output = render_to_string(&snapshot);
    assert!(output.contains("<script><![CDATA[if a < b && c > d { run(); }]]></script>"));
}

#[test]
fn plain_entries_render_as_escaped_text() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("k", "x&y<z");

    let output = render_to_string(&snapshot);
    assert!(output.contains("<k>x&amp;y&lt;z</k>"));
    assert!(!output.contains("CDATA"));
}

#[test]
fn absent_values_serialize_as_empty_strings() {
    let mut snapshot = Snapshot::new("configuration");
    assert!(snapshot.insert_new("k", None, false));

    let output = render_to_string(&snapshot);
    assert!(output.contains("<k></k>"));
}

#[test]
fn deep_keys_produce_nested_elements() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("a:b:c", "5");

    let output = render_to_string(&snapshot);
    let flattened: String = output.split_whitespace().collect();
    assert!(flattened.contains("<a><b><c>5</c></b></a>"));
}

#[test]
fn children_win_over_a_value_on_the_same_element() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set("a", "scalar");
    snapshot.set("a:b", "nested");

    let output = render_to_string(&snapshot);
    assert!(output.contains("<b>nested</b>"));
    assert!(!output.contains("scalar"));
}

#[test]
fn raw_values_containing_the_cdata_terminator_are_rejected() {
    let mut snapshot = Snapshot::new("configuration");
    snapshot.set_raw("k", "before ]]> after");

    let result = render(&snapshot);
    assert!(matches!(result, Err(ConfigError::InvalidConfiguration { .. })));
}

#[test]
fn keys_with_empty_segments_are_rejected() {
    let mut snapshot = Snapshot::new("configuration");
    assert!(snapshot.insert_new("a::b", Some("1".to_string()), false));

    let result = render(&snapshot);
    assert!(matches!(result, Err(ConfigError::InvalidConfiguration { .. })));
}

#[test]
fn round_trip_preserves_keys_values_and_raw_flags() {
    let mut snapshot = Snapshot::new("appSettings");
    snapshot.set("logging:level", "debug");
    snapshot.set_raw("templates:greeting", "Hello <b>world</b> & friends");
    snapshot.set("logging:file", "");
    snapshot.set("Names:Unicode", "héllo wörld");

    let output = render_to_string(&snapshot);
    let reloaded = parse_document(&output).unwrap();

    assert_eq!(reloaded.root_name(), "appSettings");
    assert_eq!(triples(&reloaded), triples(&snapshot));
}
