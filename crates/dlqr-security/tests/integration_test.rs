use dlqr_core::HashOptions;
use dlqr_security::{FieldHasher, JsonPointer, PreviewHasher, pointer, resolve};
use serde_json::json;

#[test]
fn test_resolved_pointers_round_trip_through_accessors() {
    let mut document = json!({
        "orders": [
            { "id": 1, "card": { "number": "4111" } },
            { "id": 2, "card": { "number": "5500" } }
        ],
        "a/b": { "~key": "odd" }
    });

    let pointers = resolve(&document, "$..number").unwrap();
    let rendered: Vec<String> = pointers.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["/orders/0/card/number", "/orders/1/card/number"]);

    for ptr in &pointers {
        pointer::set(&mut document, ptr, json!("x"));
    }
    assert_eq!(document["orders"][1]["card"]["number"], json!("x"));

    let odd = resolve(&document, "$['a/b']['~key']").unwrap();
    assert_eq!(odd[0].to_string(), "/a~1b/~0key");
    assert_eq!(JsonPointer::parse(&odd[0].to_string()), odd[0]);
    assert_eq!(pointer::get(&document, &odd[0]), Some(&json!("odd")));
}

#[test]
fn test_preview_hash_is_stable_and_labelled() {
    let hasher = PreviewHasher;
    let labelled = HashOptions {
        secret_label: Some("REDACTION_KEY".to_string()),
        short_form: false,
    };

    let a = hasher.hash("4111111111111111", &labelled);
    assert_eq!(a, hasher.hash("4111111111111111", &labelled));
    assert_ne!(a, hasher.hash("4111111111111111", &HashOptions::default()));
    assert!(a.starts_with("h:"));
}
