// Validation against realistically shaped grammars: an Atom-like feed
// vocabulary and an attribute-heavy configuration vocabulary. Schemas are
// inline in the compiled JSON form; each case validates a (schema,
// document) pair and checks the expected outcome.

use wend_model::schema_from_str;
use wend_validator::Validator;
use xmlparser::Tokenizer;

const ATOM: &str = "http://www.w3.org/2005/Atom";
const XSD: &str = "http://www.w3.org/2001/XMLSchema-datatypes";

fn validate(schema_json: &str, doc: &str) -> Result<(), String> {
    let schema = schema_from_str(schema_json).map_err(|e| format!("schema load error: {e}"))?;
    let mut v = Validator::new(&schema, Tokenizer::from(doc));
    loop {
        match v.validate_next() {
            Some(Ok(())) => {}
            Some(Err(e)) => return Err(format!("{e:?}")),
            None => break,
        }
    }
    v.finish().map_err(|e| format!("{e:?}"))
}

// ── Atom-like feeds ──────────────────────────────────────────────────────

/// feed: title, id (anyURI), updated (dateTime), then one or more
/// entries with the same three children; entry is a named define
/// reached through a ref.
fn feed_schema() -> String {
    let title = format!(r#"[13,[18,"{ATOM}","title"],[7]]"#);
    let id = format!(r#"[13,[18,"{ATOM}","id"],[2,"anyURI","{XSD}"]]"#);
    let updated = format!(r#"[13,[18,"{ATOM}","updated"],[2,"dateTime","{XSD}"]]"#);
    let meta = format!("[11,{title},[11,{id},{updated}]]");
    let entry = format!(r#"[14,"entry",[13,[18,"{ATOM}","entry"],{meta}]]"#);
    let feed = format!(r#"[13,[18,"{ATOM}","feed"],[11,{meta},[9,[8,"entry"]]]]"#);
    format!(r#"{{"v":3,"o":1,"d":[15,{feed},[0,{entry}]]}}"#)
}

fn entry(id: &str) -> String {
    format!(
        "<entry><title>An entry</title><id>{id}</id>\
         <updated>2024-05-01T10:00:00Z</updated></entry>"
    )
}

fn feed_doc(entries: &str) -> String {
    format!(
        "<feed xmlns=\"{ATOM}\">\n  <title>Example Feed</title>\n  \
         <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>\n  \
         <updated>2024-05-01T12:00:00Z</updated>\n  {entries}\n</feed>"
    )
}

#[test]
fn feed_with_one_entry() {
    validate(&feed_schema(), &feed_doc(&entry("urn:entry:1"))).expect("should be valid");
}

#[test]
fn feed_with_several_entries() {
    let entries = format!(
        "{}{}{}",
        entry("urn:entry:1"),
        entry("urn:entry:2"),
        entry("urn:entry:3")
    );
    validate(&feed_schema(), &feed_doc(&entries)).expect("should be valid");
}

#[test]
fn feed_without_entries_is_invalid() {
    assert!(validate(&feed_schema(), &feed_doc("")).is_err());
}

#[test]
fn feed_with_bad_timestamp_is_invalid() {
    let bad = entry("urn:entry:1").replace("2024-05-01T10:00:00Z", "yesterday");
    assert!(validate(&feed_schema(), &feed_doc(&bad)).is_err());
}

#[test]
fn feed_with_misordered_metadata_is_invalid() {
    // the group requires title before id
    let doc = format!(
        "<feed xmlns=\"{ATOM}\"><id>urn:x</id><title>t</title>\
         <updated>2024-05-01T12:00:00Z</updated>{}</feed>",
        entry("urn:entry:1")
    );
    assert!(validate(&feed_schema(), &doc).is_err());
}

#[test]
fn feed_in_wrong_namespace_is_invalid() {
    let doc = feed_doc(&entry("urn:entry:1")).replace(ATOM, "urn:not-atom");
    assert!(validate(&feed_schema(), &doc).is_err());
}

// ── Configuration documents ──────────────────────────────────────────────

/// config: attribute version { "1" }, one or more
/// element option { attribute name { NCName }, text }.
fn config_schema() -> String {
    let version = format!(r#"[12,[18,"","version"],[5,"1","token","",""]]"#);
    let name = format!(r#"[12,[18,"","name"],[2,"NCName","{XSD}"]]"#);
    let option = format!(r#"[13,[18,"","option"],[11,{name},[7]]]"#);
    let config = format!(r#"[13,[18,"","config"],[11,{version},[9,{option}]]]"#);
    format!(r#"{{"v":3,"o":1,"d":[15,{config},[0]]}}"#)
}

#[test]
fn config_accepts_options() {
    validate(
        &config_schema(),
        r#"<config version="1">
             <option name="retries">5</option>
             <option name="host">example.net</option>
           </config>"#,
    )
    .expect("should be valid");
}

#[test]
fn config_version_literal_is_checked() {
    assert!(validate(
        &config_schema(),
        r#"<config version="2"><option name="a">x</option></config>"#
    )
    .is_err());
}

#[test]
fn config_option_name_must_be_ncname() {
    assert!(validate(
        &config_schema(),
        r#"<config version="1"><option name="not ok">x</option></config>"#
    )
    .is_err());
}

#[test]
fn config_requires_at_least_one_option() {
    assert!(validate(&config_schema(), r#"<config version="1"/>"#).is_err());
}
