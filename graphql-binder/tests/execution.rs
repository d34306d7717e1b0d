use graphql_binder::FieldSelection;
use graphql_binder::FieldValue;
use graphql_binder::Object;
use insta::assert_json_snapshot;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use crate::fixtures;
use crate::fixtures::User;

fn leaves(data: &indexmap::IndexMap<String, FieldValue>) -> Value {
    data.iter()
        .map(|(key, value)| {
            (key.clone(), value.as_value().cloned().unwrap_or_default())
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

#[test]
fn failed_fields_do_not_stop_their_siblings() {
    let schema = fixtures::schema();
    let selections = [
        FieldSelection::new("active"),
        FieldSelection::new("echo")
            .alias("greeting")
            .argument("message", "hi"),
        FieldSelection::new("shout").alias("loud"),
        FieldSelection::new("nope"),
        FieldSelection::new("shout").argument("message", "hey"),
    ];
    let result = schema.resolve_object("Query", None, &selections, Default::default());

    assert!(!result.is_ok());
    assert_eq!(
        leaves(&result.data),
        json!({"active": true, "greeting": "hi", "shout": "HEY"})
    );
    assert_json_snapshot!(result.errors, @r###"
    [
      {
        "message": "missing required argument `message` for field `shout`",
        "path": [
          "loud"
        ],
        "extensions": {
          "field": "shout",
          "argument": "message",
          "code": "MISSING_REQUIRED_ARGUMENT"
        }
      },
      {
        "message": "type `Query` has no field `nope`",
        "path": [
          "nope"
        ],
        "extensions": {
          "type_name": "Query",
          "field": "nope",
          "code": "UNKNOWN_FIELD"
        }
      }
    ]
    "###);
}

#[test]
fn object_fields_resolve_against_the_source() {
    let schema = fixtures::schema();
    let selections = [
        FieldSelection::new("name"),
        FieldSelection::new("greeting"),
        FieldSelection::new("greeting")
            .alias("welcome")
            .argument("prefix", "Welcome back"),
        FieldSelection::new("role"),
    ];
    let result = schema.resolve_object(
        "User",
        Some(Object::new(User::grace())),
        &selections,
        Default::default(),
    );

    assert!(result.is_ok());
    assert_eq!(
        leaves(&result.data),
        json!({
            "name": "Grace",
            "greeting": "Hi, Grace",
            "welcome": "Welcome back, Grace",
            "role": "MEMBER",
        })
    );
}

#[test]
fn every_field_fails_without_a_source() {
    let schema = fixtures::schema();
    let selections = [FieldSelection::new("id"), FieldSelection::new("title")];
    let result = schema.resolve_object("Post", None, &selections, Default::default());

    assert!(result.data.is_empty());
    let codes: Vec<_> = result
        .errors
        .iter()
        .map(|error| error.extensions["code"].clone())
        .collect();
    assert_eq!(
        codes,
        [json!("SOURCE_TYPE_MISMATCH"), json!("SOURCE_TYPE_MISMATCH")]
    );
}

#[test]
fn selections_deserialize_from_json() {
    let selection: FieldSelection = serde_json::from_value(json!({
        "name": "echo",
        "alias": "said",
        "arguments": {"message": "hi"}
    }))
    .unwrap_or_default();
    assert_eq!(
        selection,
        FieldSelection::new("echo")
            .alias("said")
            .argument("message", "hi")
    );
    assert_eq!(selection.response_key(), "said");
}
