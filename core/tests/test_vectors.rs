//! Verify the feed parser and filters against vectors stored in `test-vectors/`.
//!
//! Each case names an XML feed fixture and lists the entries it must produce,
//! the next-page link, and the ids each filter must return. Expected entries
//! are deserialized into `Entry` so comparisons cover every field.

use hatena_blog::{BlogApi, BlogError, Collection, Config, Entry, HttpResponse};

fn feed(name: &str) -> &'static str {
    match name {
        "collection_case1.xml" => include_str!("../../test-vectors/feeds/collection_case1.xml"),
        "collection_case_has_next.xml" => {
            include_str!("../../test-vectors/feeds/collection_case_has_next.xml")
        }
        "collection_no_draft_flag.xml" => {
            include_str!("../../test-vectors/feeds/collection_no_draft_flag.xml")
        }
        "collection_empty.xml" => include_str!("../../test-vectors/feeds/collection_empty.xml"),
        "collection_missing_published.xml" => {
            include_str!("../../test-vectors/feeds/collection_missing_published.xml")
        }
        other => panic!("unknown feed fixture: {other}"),
    }
}

fn ids(entries: &[&Entry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.entry_id.clone().unwrap())
        .collect()
}

fn expected_ids(value: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap()
}

#[test]
fn collection_test_vectors() {
    let raw = include_str!("../../test-vectors/collections.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let xml = feed(case["feed"].as_str().unwrap());
        let result = Collection::parse(xml, None);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Parse" => assert!(matches!(err, BlogError::Parse(_)), "{name}: expected Parse"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let collection = result.unwrap();
        let expected = &case["expected"];
        assert_eq!(
            collection.next_url(),
            expected["next_url"].as_str(),
            "{name}: next_url"
        );
        if let Some(count) = expected.get("entry_count") {
            assert_eq!(collection.len() as u64, count.as_u64().unwrap(), "{name}: entry count");
        }
        if let Some(entries) = expected.get("entries") {
            let entries: Vec<Entry> = serde_json::from_value(entries.clone()).unwrap();
            assert_eq!(collection.entries(), entries.as_slice(), "{name}: entries");
        }

        let Some(filters) = case.get("filters") else {
            continue;
        };
        assert_eq!(
            ids(&collection.public_entries()),
            expected_ids(&filters["public"]),
            "{name}: public_entries"
        );
        assert_eq!(
            ids(&collection.draft_entries()),
            expected_ids(&filters["draft"]),
            "{name}: draft_entries"
        );
        for (category, want) in filters["category"].as_object().unwrap() {
            assert_eq!(
                ids(&collection.category_entries(category)),
                expected_ids(want),
                "{name}: category_entries({category})"
            );
        }
    }
}

#[test]
fn status_gate_runs_before_parsing() {
    let api = BlogApi::new(&Config::new("hatena_id", "blog_id", "api_key"));
    let response = HttpResponse {
        status: 401,
        headers: Vec::new(),
        body: feed("collection_case1.xml").to_string(),
    };
    let err = api.parse_collection(response, None).unwrap_err();
    assert!(matches!(err, BlogError::InvalidRequest { status: 401, .. }));
}
