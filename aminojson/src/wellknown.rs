//! # Built-in encoders
//!
//! The encoders seeded into every new [`Encoder`]: the well-known protobuf
//! types (`Timestamp`, `Duration`, `Any`) plus the legacy encodings the
//! signing format inherited (`cosmos.Dec`/`cosmos.Int` scalars, flattened
//! module accounts, bare public keys, threshold multisigs, inline JSON and
//! never-null coin lists).
//!
//! Each function matches the [`FieldEncoderFn`](crate::FieldEncoderFn) or
//! [`MessageEncoderFn`](crate::MessageEncoderFn) shape and writes a
//! syntactically complete JSON value.

use crate::encoder::Encoder;
use crate::error::EncodeError;
use base64::prelude::*;
use chrono::DateTime;
use prost_reflect::{DynamicMessage, FieldDescriptor, ReflectMessage, Value};
use std::io::Write;

/// Digits after the decimal point in a `cosmos.Dec` value.
const DEC_PRECISION: usize = 18;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Encodes `google.protobuf.Timestamp` as an RFC 3339 UTC string: second
/// precision when `nanos` is zero, a fixed 9-digit fraction otherwise.
pub(crate) fn timestamp(
    _enc: &Encoder,
    message: &DynamicMessage,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let seconds = get_i64(message, "seconds")?;
    let nanos = get_i32(message, "nanos")?;
    if !(0..NANOS_PER_SECOND as i32).contains(&nanos) {
        return Err(EncodeError::SchemaViolation(format!(
            "timestamp nanos out of range: {nanos}"
        )));
    }

    let instant = DateTime::from_timestamp(seconds, nanos as u32).ok_or_else(|| {
        EncodeError::Encoding(format!("timestamp out of range: {seconds}s {nanos}ns"))
    })?;

    let formatted = if nanos == 0 {
        instant.format("%Y-%m-%dT%H:%M:%SZ")
    } else {
        instant.format("%Y-%m-%dT%H:%M:%S%.9fZ")
    };
    write!(writer, "\"{formatted}\"")?;
    Ok(())
}

/// Encodes `google.protobuf.Duration` as a quoted decimal-seconds string,
/// with a 9-digit fraction when `nanos` is non-zero.
pub(crate) fn duration(
    _enc: &Encoder,
    message: &DynamicMessage,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let seconds = get_i64(message, "seconds")?;
    let nanos = i64::from(get_i32(message, "nanos")?);
    if nanos.abs() >= NANOS_PER_SECOND {
        return Err(EncodeError::SchemaViolation(format!(
            "duration nanos out of range: {nanos}"
        )));
    }
    if seconds != 0 && nanos != 0 && (seconds < 0) != (nanos < 0) {
        return Err(EncodeError::SchemaViolation(format!(
            "duration seconds and nanos must share a sign: {seconds}s {nanos}ns"
        )));
    }

    if nanos == 0 {
        write!(writer, "\"{seconds}\"")?;
    } else {
        let sign = if seconds < 0 || nanos < 0 { "-" } else { "" };
        write!(
            writer,
            "\"{sign}{}.{:09}\"",
            seconds.unsigned_abs(),
            nanos.unsigned_abs()
        )?;
    }
    Ok(())
}

/// Encodes `google.protobuf.Any` by resolving the packed type, decoding the
/// payload and re-entering the pipeline with the envelope forced on.
pub(crate) fn any(
    enc: &Encoder,
    message: &DynamicMessage,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let type_url = match message.get_field(&field_of(message, "type_url")?).as_ref() {
        Value::String(s) => s.clone(),
        _ => {
            return Err(EncodeError::SchemaViolation(
                "Any.type_url must be a string field".to_string(),
            ));
        }
    };
    if type_url.is_empty() {
        return Err(EncodeError::SchemaViolation(
            "cannot encode an Any value with an empty type_url".to_string(),
        ));
    }

    let packed = match message.get_field(&field_of(message, "value")?).as_ref() {
        Value::Bytes(bytes) => bytes.clone(),
        _ => {
            return Err(EncodeError::SchemaViolation(
                "Any.value must be a bytes field".to_string(),
            ));
        }
    };

    let pool = message.descriptor().parent_pool().clone();
    let descriptor = enc.resolve_any_type(&type_url, &pool)?;
    let inner = DynamicMessage::decode(descriptor, packed.as_ref())?;
    enc.begin_marshal(&inner, writer, true)
}

/// Encodes a `cosmos.Dec` scalar: the raw value is an integer string scaled
/// by 10^18, rendered as a fixed 18-fraction decimal string.
pub(crate) fn cosmos_dec(
    _enc: &Encoder,
    value: &Value,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let Value::String(raw) = value else {
        return Err(EncodeError::UnsupportedFeature(
            "cosmos.Dec fields must be strings".to_string(),
        ));
    };
    serde_json::to_writer(&mut *writer, &format_dec(raw)?)?;
    Ok(())
}

/// Encodes a `cosmos.Int` scalar: a decimal string passed through quoted,
/// with the empty string normalized to `"0"`.
pub(crate) fn cosmos_int(
    _enc: &Encoder,
    value: &Value,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let Value::String(raw) = value else {
        return Err(EncodeError::UnsupportedFeature(
            "cosmos.Int fields must be strings".to_string(),
        ));
    };
    let normalized = if raw.is_empty() { "0" } else { raw.as_str() };
    serde_json::to_writer(&mut *writer, normalized)?;
    Ok(())
}

/// The `legacy_coins` field encoding: an unset or empty coin list renders
/// as `[]` instead of `null`.
pub(crate) fn null_slice_as_empty(
    enc: &Encoder,
    value: &Value,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    match value {
        Value::List(values) if values.is_empty() => {
            writer.write_all(b"[]")?;
            Ok(())
        }
        Value::List(values) => enc.marshal_list(values, None, writer),
        _ => Err(EncodeError::UnsupportedFeature(
            "legacy_coins encoding expects a repeated field".to_string(),
        )),
    }
}

/// The `inline_json` field encoding: a bytes field already containing JSON
/// is validated, normalized (object keys sorted recursively) and inlined.
pub(crate) fn inline_json(
    _enc: &Encoder,
    value: &Value,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let Value::Bytes(raw) = value else {
        return Err(EncodeError::UnsupportedFeature(
            "inline_json encoding expects a bytes field".to_string(),
        ));
    };
    let normalized: serde_json::Value = serde_json::from_slice(raw.as_ref())?;
    serde_json::to_writer(&mut *writer, &normalized)?;
    Ok(())
}

/// The `key_field` message encoding: the message's `key` bytes field is
/// emitted directly as a base64 string, `null` when empty.
pub(crate) fn key_field(
    _enc: &Encoder,
    message: &DynamicMessage,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let field = field_of(message, "key")?;
    match message.get_field(&field).as_ref() {
        Value::Bytes(bytes) if bytes.is_empty() => writer.write_all(b"null")?,
        Value::Bytes(bytes) => write!(writer, "\"{}\"", BASE64_STANDARD.encode(bytes))?,
        _ => {
            return Err(EncodeError::SchemaViolation(
                "'key' must be a bytes field".to_string(),
            ));
        }
    }
    Ok(())
}

/// The `module_account` message encoding: the nested base account is
/// flattened into the legacy account layout, which predates the sorted
/// field order and must keep its hand-rolled shape.
pub(crate) fn module_account(
    _enc: &Encoder,
    message: &DynamicMessage,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let descriptor = message.descriptor();

    let mut address = String::new();
    let mut account_number = 0u64;
    let mut sequence = 0u64;
    if let Some(base_field) = descriptor.get_field_by_name("base_account") {
        if message.has_field(&base_field) {
            if let Value::Message(base) = message.get_field(&base_field).as_ref() {
                address = get_string(base, "address")?;
                account_number = get_u64(base, "account_number")?;
                sequence = get_u64(base, "sequence")?;
            }
        }
    }

    let name = get_string(message, "name")?;
    let permissions = match message.get_field(&field_of(message, "permissions")?).as_ref() {
        Value::List(values) => values
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(EncodeError::SchemaViolation(
                    "'permissions' must be a repeated string field".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };

    write!(writer, "{{\"address\":")?;
    serde_json::to_writer(&mut *writer, &address)?;
    write!(
        writer,
        ",\"public_key\":\"\",\"account_number\":{account_number},\"sequence\":{sequence},\"name\":"
    )?;
    serde_json::to_writer(&mut *writer, &name)?;
    write!(writer, ",\"permissions\":")?;
    if permissions.is_empty() {
        writer.write_all(b"null")?;
    } else {
        serde_json::to_writer(&mut *writer, &permissions)?;
    }
    writer.write_all(b"}")?;
    Ok(())
}

/// The `threshold_string` message encoding: a multisig public key with the
/// 32-bit threshold rendered as a string and the member keys under the
/// legacy `pubkeys` name.
pub(crate) fn threshold_string(
    enc: &Encoder,
    message: &DynamicMessage,
    writer: &mut dyn Write,
) -> Result<(), EncodeError> {
    let threshold_field = field_of(message, "threshold")?;
    let threshold = match message.get_field(&threshold_field).as_ref() {
        Value::U32(n) => *n,
        _ => {
            return Err(EncodeError::SchemaViolation(
                "'threshold' must be a uint32 field".to_string(),
            ));
        }
    };

    let keys_field = field_of(message, "public_keys")?;
    write!(writer, "{{\"threshold\":\"{threshold}\",\"pubkeys\":")?;
    match message.get_field(&keys_field).as_ref() {
        Value::List(values) => enc.marshal_list(values, Some(&keys_field), writer)?,
        _ => {
            return Err(EncodeError::SchemaViolation(
                "'public_keys' must be a repeated field".to_string(),
            ));
        }
    }
    writer.write_all(b"}")?;
    Ok(())
}

fn format_dec(raw: &str) -> Result<String, EncodeError> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let digits = if digits.is_empty() { "0" } else { digits };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EncodeError::SchemaViolation(format!(
            "invalid cosmos.Dec value '{raw}'"
        )));
    }

    let padded = format!("{digits:0>width$}", width = DEC_PRECISION + 1);
    let (integral, fraction) = padded.split_at(padded.len() - DEC_PRECISION);
    let integral = integral.trim_start_matches('0');
    let integral = if integral.is_empty() { "0" } else { integral };
    let sign = if negative { "-" } else { "" };
    Ok(format!("{sign}{integral}.{fraction}"))
}

fn field_of(message: &DynamicMessage, name: &str) -> Result<FieldDescriptor, EncodeError> {
    message.descriptor().get_field_by_name(name).ok_or_else(|| {
        EncodeError::SchemaViolation(format!(
            "message '{}' must contain a field named '{}'",
            message.descriptor().full_name(),
            name
        ))
    })
}

fn get_i64(message: &DynamicMessage, name: &str) -> Result<i64, EncodeError> {
    match message.get_field(&field_of(message, name)?).as_ref() {
        Value::I64(n) => Ok(*n),
        _ => Err(EncodeError::SchemaViolation(format!(
            "'{name}' must be an int64 field"
        ))),
    }
}

fn get_i32(message: &DynamicMessage, name: &str) -> Result<i32, EncodeError> {
    match message.get_field(&field_of(message, name)?).as_ref() {
        Value::I32(n) => Ok(*n),
        _ => Err(EncodeError::SchemaViolation(format!(
            "'{name}' must be an int32 field"
        ))),
    }
}

fn get_u64(message: &DynamicMessage, name: &str) -> Result<u64, EncodeError> {
    match message.get_field(&field_of(message, name)?).as_ref() {
        Value::U64(n) => Ok(*n),
        _ => Err(EncodeError::SchemaViolation(format!(
            "'{name}' must be a uint64 field"
        ))),
    }
}

fn get_string(message: &DynamicMessage, name: &str) -> Result<String, EncodeError> {
    match message.get_field(&field_of(message, name)?).as_ref() {
        Value::String(s) => Ok(s.clone()),
        _ => Err(EncodeError::SchemaViolation(format!(
            "'{name}' must be a string field"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::format_dec;

    #[test]
    fn format_dec_scales_by_ten_to_the_eighteenth() {
        assert_eq!(format_dec("1000000000000000000").unwrap(), "1.000000000000000000");
        assert_eq!(format_dec("1500000000000000000").unwrap(), "1.500000000000000000");
        assert_eq!(format_dec("10").unwrap(), "0.000000000000000010");
        assert_eq!(format_dec("0").unwrap(), "0.000000000000000000");
        assert_eq!(format_dec("").unwrap(), "0.000000000000000000");
        assert_eq!(
            format_dec("-25000000000000000").unwrap(),
            "-0.025000000000000000"
        );
        assert_eq!(
            format_dec("123450000000000000000").unwrap(),
            "123.450000000000000000"
        );
    }

    #[test]
    fn format_dec_rejects_non_digits() {
        assert!(format_dec("1.5").is_err());
        assert!(format_dec("abc").is_err());
    }
}
