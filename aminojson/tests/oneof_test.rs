use aminojson::prost_reflect::{DescriptorPool, DynamicMessage, Value};
use aminojson::{EncodeError, Encoder, EncoderOptions};
use aminojson_fixtures::{FieldSpec, MessageSpec, SchemaBuilder};

fn marshal_str(encoder: &Encoder, message: &DynamicMessage) -> String {
    String::from_utf8(encoder.marshal(message).unwrap()).unwrap()
}

fn new_message(pool: &DescriptorPool, name: &str) -> DynamicMessage {
    DynamicMessage::new(pool.get_message_by_name(name).unwrap())
}

fn default_encoder() -> Encoder {
    Encoder::new(EncoderOptions::default())
}

/// A transaction-like message with a two-member `sum` oneof plus a plain
/// `memo` field next to it.
fn tx_pool() -> DescriptorPool {
    SchemaBuilder::new("test/test.proto", "test")
        .message(
            MessageSpec::new("Inner")
                .amino_name("test/Inner")
                .field(FieldSpec::string("note", 1)),
        )
        .message(
            MessageSpec::new("Other")
                .amino_name("test/Other")
                .field(FieldSpec::uint32("count", 1)),
        )
        .message(
            MessageSpec::new("Tx")
                .oneof("sum")
                .field(
                    FieldSpec::message("inner", 1, "test.Inner")
                        .oneof_index(0)
                        .oneof_name("sum"),
                )
                .field(
                    FieldSpec::message("other", 2, "test.Other")
                        .oneof_index(0)
                        .oneof_name("sum"),
                )
                .field(FieldSpec::string("memo", 3)),
        )
        .build()
}

#[test]
fn test_unset_oneof_writes_a_single_null() {
    let pool = tx_pool();

    let mut message = new_message(&pool, "test.Tx");
    message.set_field_by_name("memo", Value::String("m".to_string()));

    assert_eq!(
        marshal_str(&default_encoder(), &message),
        r#"{"memo":"m","sum":null}"#
    );
}

#[test]
fn test_set_oneof_member_is_wrapped_with_its_type_tag() {
    let pool = tx_pool();

    let mut inner = new_message(&pool, "test.Inner");
    inner.set_field_by_name("note", Value::String("hi".to_string()));
    let mut message = new_message(&pool, "test.Tx");
    message.set_field_by_name("inner", Value::Message(inner));
    message.set_field_by_name("memo", Value::String("m".to_string()));

    assert_eq!(
        marshal_str(&default_encoder(), &message),
        r#"{"memo":"m","sum":{"type":"test/Inner","value":{"inner":{"note":"hi"}}}}"#
    );
}

#[test]
fn test_each_member_carries_its_own_type_tag() {
    let pool = tx_pool();

    let mut other = new_message(&pool, "test.Other");
    other.set_field_by_name("count", Value::U32(4));
    let mut message = new_message(&pool, "test.Tx");
    message.set_field_by_name("other", Value::Message(other));

    assert_eq!(
        marshal_str(&default_encoder(), &message),
        r#"{"sum":{"type":"test/Other","value":{"other":{"count":4}}}}"#
    );
}

#[test]
fn test_oneof_sorts_under_its_wrapper_name() {
    let pool = SchemaBuilder::new("test/test.proto", "test")
        .message(
            MessageSpec::new("Inner")
                .amino_name("test/Inner")
                .field(FieldSpec::string("note", 1)),
        )
        .message(
            MessageSpec::new("Msg")
                .oneof("choice")
                .field(FieldSpec::string("aaa", 1))
                .field(
                    FieldSpec::message("zzz_member", 2, "test.Inner")
                        .oneof_index(0)
                        .oneof_name("mmm"),
                )
                .field(FieldSpec::string("zzz", 3)),
        )
        .build();

    let mut message = new_message(&pool, "test.Msg");
    message.set_field_by_name("aaa", Value::String("1".to_string()));
    message.set_field_by_name("zzz", Value::String("2".to_string()));

    // The member's own name (zzz_member) would sort last; the wrapper
    // name places the group in the middle.
    assert_eq!(
        marshal_str(&default_encoder(), &message),
        r#"{"aaa":"1","mmm":null,"zzz":"2"}"#
    );
}

#[test]
fn test_oneof_names_with_json_metacharacters_are_escaped() {
    let pool = SchemaBuilder::new("test/test.proto", "test")
        .message(
            MessageSpec::new("Inner")
                .amino_name("test/In\"ner")
                .field(FieldSpec::string("note", 1)),
        )
        .message(
            MessageSpec::new("Tx").oneof("sum").field(
                FieldSpec::message("inner", 1, "test.Inner")
                    .oneof_index(0)
                    .oneof_name("su\"m"),
            ),
        )
        .build();

    let mut inner = new_message(&pool, "test.Inner");
    inner.set_field_by_name("note", Value::String("hi".to_string()));
    let mut message = new_message(&pool, "test.Tx");
    message.set_field_by_name("inner", Value::Message(inner));

    assert_eq!(
        marshal_str(&default_encoder(), &message),
        r#"{"su\"m":{"type":"test/In\"ner","value":{"inner":{"note":"hi"}}}}"#
    );
}

#[test]
fn test_oneof_member_without_wrapper_name_fails() {
    let pool = SchemaBuilder::new("test/test.proto", "test")
        .message(
            MessageSpec::new("Inner")
                .amino_name("test/Inner")
                .field(FieldSpec::string("note", 1)),
        )
        .message(
            MessageSpec::new("Tx")
                .oneof("sum")
                .field(FieldSpec::message("inner", 1, "test.Inner").oneof_index(0)),
        )
        .build();

    let message = new_message(&pool, "test.Tx");

    let err = default_encoder().marshal(&message).unwrap_err();
    assert!(matches!(err, EncodeError::SchemaViolation(_)));
}

#[test]
fn test_oneof_member_type_without_amino_name_fails() {
    let pool = SchemaBuilder::new("test/test.proto", "test")
        .message(MessageSpec::new("Unnamed").field(FieldSpec::string("note", 1)))
        .message(
            MessageSpec::new("Tx").oneof("sum").field(
                FieldSpec::message("inner", 1, "test.Unnamed")
                    .oneof_index(0)
                    .oneof_name("sum"),
            ),
        )
        .build();

    let message = new_message(&pool, "test.Tx");

    let err = default_encoder().marshal(&message).unwrap_err();
    assert!(matches!(err, EncodeError::SchemaViolation(_)));
}
