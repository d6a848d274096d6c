use std::borrow::Cow;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use encoding_rs::Encoding;
use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::{Result, VectorError};
use crate::vector::geometry::Geometry;
use crate::vector::native::{NativeDateTime, NativeFeature};
use crate::vector::schema::{FieldDescriptor, FieldType, Schema};

/// Native timezone flag for "no timezone information".
const TZ_UNKNOWN: i32 = 0;
/// Native timezone flag for UTC; every unit away from it is 15 minutes.
const TZ_UTC: i32 = 100;
/// 59.999999 seconds, the last representable instant of a minute.
const MAX_SECOND_MICROS: u32 = 59_999_999;

/// One record, fully copied out of its store.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: String,
    /// `None` values are null or unset fields.
    pub properties: IndexMap<String, Option<FieldValue>>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn new(
        id: impl Into<String>,
        properties: IndexMap<String, Option<FieldValue>>,
        geometry: Option<Geometry>,
    ) -> Self {
        Feature {
            id: id.into(),
            properties,
            geometry,
        }
    }

    /// Get the value of a named property. Returns `None` both for unknown names and for
    /// null values.
    pub fn property(&self, name: &str) -> Option<&FieldValue> {
        self.properties.get(name).and_then(Option::as_ref)
    }

    pub fn to_json(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.as_ref().map_or(Value::Null, FieldValue::to_json)))
            .collect();
        json!({
            "type": "Feature",
            "id": self.id,
            "properties": properties,
            "geometry": self.geometry.as_ref().map_or(Value::Null, Geometry::to_json),
        })
    }

    /// Reads a GeoJSON-like feature. Property values map onto the closest [`FieldValue`];
    /// nested objects and arrays of non-strings become [`FieldValue::JsonValue`].
    pub fn from_json(value: &Value) -> Result<Feature> {
        let id = match value.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "-1".to_string(),
        };
        let properties = match value.get("properties") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                .collect(),
            Some(Value::Null) | None => IndexMap::new(),
            Some(other) => {
                return Err(VectorError::JsonError(format!(
                    "expected a properties object, found {other}"
                )))
            }
        };
        let geometry = match value.get("geometry") {
            Some(Value::Null) | None => None,
            Some(g) => Some(Geometry::from_json(g)?),
        };
        Ok(Feature {
            id,
            properties,
            geometry,
        })
    }
}

/// Property value of a [`Feature`].
///
/// Dates and times are ISO 8601 strings: `YYYY-MM-DD`, `HH:MM:SS[.ffffff][+HH:MM]` and
/// `YYYY-MM-DDTHH:MM:SS[.ffffff][+HH:MM]`.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    IntegerValue(i32),
    Integer64Value(i64),
    BooleanValue(bool),
    RealValue(f64),
    StringValue(String),
    StringListValue(Vec<String>),
    BinaryValue(Vec<u8>),
    JsonValue(Value),
    DateValue(String),
    TimeValue(String),
    DateTimeValue(String),
}

impl FieldValue {
    /// Interpret the value as `String`. Returns `None` if the value is something else.
    pub fn into_string(self) -> Option<String> {
        match self {
            FieldValue::StringValue(rv)
            | FieldValue::DateValue(rv)
            | FieldValue::TimeValue(rv)
            | FieldValue::DateTimeValue(rv) => Some(rv),
            _ => None,
        }
    }

    /// Interpret the value as `f64`. Integers are widened.
    pub fn into_real(self) -> Option<f64> {
        match self {
            FieldValue::RealValue(rv) => Some(rv),
            FieldValue::IntegerValue(rv) => Some(rv as f64),
            FieldValue::Integer64Value(rv) => Some(rv as f64),
            _ => None,
        }
    }

    /// Interpret the value as `i64`.
    pub fn into_int64(self) -> Option<i64> {
        match self {
            FieldValue::IntegerValue(rv) => Some(rv as i64),
            FieldValue::Integer64Value(rv) => Some(rv),
            _ => None,
        }
    }

    pub fn into_bool(self) -> Option<bool> {
        match self {
            FieldValue::BooleanValue(rv) => Some(rv),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::IntegerValue(v) => json!(v),
            FieldValue::Integer64Value(v) => json!(v),
            FieldValue::BooleanValue(v) => json!(v),
            FieldValue::RealValue(v) => json!(v),
            FieldValue::StringValue(v)
            | FieldValue::DateValue(v)
            | FieldValue::TimeValue(v)
            | FieldValue::DateTimeValue(v) => json!(v),
            FieldValue::StringListValue(v) => json!(v),
            FieldValue::BinaryValue(v) => json!(v),
            FieldValue::JsonValue(v) => v.clone(),
        }
    }

    fn from_json(value: &Value) -> Option<FieldValue> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::BooleanValue(*b)),
            Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => match i32::try_from(i) {
                    Ok(i) => FieldValue::IntegerValue(i),
                    Err(_) => FieldValue::Integer64Value(i),
                },
                (None, Some(f)) => FieldValue::RealValue(f),
                (None, None) => FieldValue::JsonValue(value.clone()),
            }),
            Value::String(s) => Some(FieldValue::StringValue(s.clone())),
            Value::Array(items) if items.iter().all(Value::is_string) => {
                Some(FieldValue::StringListValue(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                ))
            }
            other => Some(FieldValue::JsonValue(other.clone())),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldValue::IntegerValue(_) => "integer",
            FieldValue::Integer64Value(_) => "integer64",
            FieldValue::BooleanValue(_) => "boolean",
            FieldValue::RealValue(_) => "real",
            FieldValue::StringValue(_) => "string",
            FieldValue::StringListValue(_) => "string list",
            FieldValue::BinaryValue(_) => "binary",
            FieldValue::JsonValue(_) => "json",
            FieldValue::DateValue(_) => "date",
            FieldValue::TimeValue(_) => "time",
            FieldValue::DateTimeValue(_) => "datetime",
        }
    }
}

/// Converts records between native field storage and [`Feature`]s for one schema.
#[derive(Debug)]
pub struct FeatureBuilder<'a> {
    schema: &'a Schema,
    field_index: &'a IndexMap<String, usize>,
    encoding: &'static Encoding,
    json_strings: bool,
    timezones: bool,
}

impl<'a> FeatureBuilder<'a> {
    /// `field_index` maps every schema field name to its native index.
    pub fn new(schema: &'a Schema, field_index: &'a IndexMap<String, usize>) -> Self {
        FeatureBuilder {
            schema,
            field_index,
            encoding: encoding_rs::UTF_8,
            json_strings: false,
            timezones: true,
        }
    }

    /// Text encoding of native string fields.
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Whether plain string fields may hold JSON documents worth decoding.
    pub fn json_strings(mut self, json_strings: bool) -> Self {
        self.json_strings = json_strings;
        self
    }

    /// Whether the destination keeps timezones. When it does not, offsets are applied on
    /// write and the stored value is UTC.
    pub fn timezones(mut self, timezones: bool) -> Self {
        self.timezones = timezones;
        self
    }

    /// Copies a native record into a [`Feature`] with one property per schema field.
    pub fn build<F: NativeFeature>(&self, handle: &F) -> Result<Feature> {
        let id = handle
            .fid()
            .map_or_else(|| "-1".to_string(), |fid| fid.to_string());
        let mut properties = IndexMap::with_capacity(self.schema.properties.len());
        for (name, descriptor) in &self.schema.properties {
            let value = match self.field_index.get(name) {
                Some(&index) if handle.field_is_set_and_not_null(index) => {
                    self.read_field(handle, index, name, descriptor)
                }
                Some(_) => None,
                None => {
                    warn!("Field '{name}' has no native index, reading it as null");
                    None
                }
            };
            properties.insert(name.clone(), value);
        }
        let geometry = handle.with_geometry(|g| g.map(Geometry::from_native).transpose())?;
        Ok(Feature {
            id,
            properties,
            geometry,
        })
    }

    fn read_field<F: NativeFeature>(
        &self,
        handle: &F,
        index: usize,
        name: &str,
        descriptor: &FieldDescriptor,
    ) -> Option<FieldValue> {
        let value = match descriptor.base_type {
            FieldType::Int16 | FieldType::Int32 if descriptor.is_boolean() => {
                FieldValue::BooleanValue(handle.field_as_integer(index) != 0)
            }
            FieldType::Int16 | FieldType::Int32 => {
                FieldValue::IntegerValue(handle.field_as_integer(index))
            }
            FieldType::Int64 => FieldValue::Integer64Value(handle.field_as_integer64(index)),
            FieldType::Float64 => FieldValue::RealValue(handle.field_as_double(index)),
            FieldType::Str => {
                let text = self.decode(&handle.field_as_string_bytes(index));
                if self.json_strings && looks_like_json(&text) {
                    parse_json_or_string(text)
                } else {
                    FieldValue::StringValue(text)
                }
            }
            FieldType::JsonString => {
                parse_json_or_string(self.decode(&handle.field_as_string_bytes(index)))
            }
            FieldType::Bytes => FieldValue::BinaryValue(handle.field_as_binary(index)),
            FieldType::StringList => FieldValue::StringListValue(
                handle
                    .field_as_string_list(index)
                    .iter()
                    .map(|bytes| self.decode(bytes))
                    .collect(),
            ),
            FieldType::Date | FieldType::Time | FieldType::DateTime => {
                let parts = handle.field_as_datetime(index)?;
                match compose_temporal(descriptor.base_type, parts) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!("Field '{name}': {e}, reading it as null");
                        return None;
                    }
                }
            }
        };
        Some(value)
    }

    /// Writes `feature` into a freshly allocated native record.
    ///
    /// Every property must be declared by the schema. `None` values are written as explicit
    /// nulls.
    pub fn deconstruct<F: NativeFeature>(&self, feature: &Feature, handle: &mut F) -> Result<()> {
        if let Some(geometry) = &feature.geometry {
            handle.set_geometry_directly(geometry.to_native()?)?;
        }
        for (name, value) in &feature.properties {
            let (index, descriptor) = match (
                self.field_index.get(name),
                self.schema.properties.get(name),
            ) {
                (Some(index), Some(descriptor)) => (*index, descriptor),
                _ => {
                    return Err(VectorError::InvalidFieldName {
                        field_name: name.clone(),
                        method_name: "FeatureBuilder::deconstruct",
                    })
                }
            };
            match value {
                None => handle.set_field_null(index)?,
                Some(value) => self.write_field(handle, index, name, descriptor, value)?,
            }
        }
        Ok(())
    }

    fn write_field<F: NativeFeature>(
        &self,
        handle: &mut F,
        index: usize,
        name: &str,
        descriptor: &FieldDescriptor,
        value: &FieldValue,
    ) -> Result<()> {
        let mismatch = || {
            VectorError::SchemaError(format!(
                "Field '{name}' is declared as '{descriptor}' but got a {} value",
                value.type_name()
            ))
        };
        let narrow = |v: i64| {
            let fits = match descriptor.base_type {
                FieldType::Int16 => i16::try_from(v).is_ok(),
                _ => i32::try_from(v).is_ok(),
            };
            match i32::try_from(v) {
                Ok(v) if fits => Ok(v),
                _ => Err(VectorError::SchemaError(format!(
                    "Value {v} of field '{name}' does not fit '{descriptor}'"
                ))),
            }
        };
        match (descriptor.base_type, value) {
            (FieldType::Int16 | FieldType::Int32, FieldValue::BooleanValue(b)) => {
                handle.set_field_integer(index, i32::from(*b))
            }
            (FieldType::Int16 | FieldType::Int32, FieldValue::IntegerValue(v)) => {
                handle.set_field_integer(index, narrow(i64::from(*v))?)
            }
            (FieldType::Int16 | FieldType::Int32, FieldValue::Integer64Value(v)) => {
                handle.set_field_integer(index, narrow(*v)?)
            }
            (FieldType::Int64, FieldValue::BooleanValue(b)) => {
                handle.set_field_integer64(index, i64::from(*b))
            }
            (FieldType::Int64, FieldValue::IntegerValue(v)) => {
                handle.set_field_integer64(index, i64::from(*v))
            }
            (FieldType::Int64, FieldValue::Integer64Value(v)) => {
                handle.set_field_integer64(index, *v)
            }
            (FieldType::Float64, FieldValue::RealValue(v)) => handle.set_field_double(index, *v),
            (FieldType::Float64, FieldValue::IntegerValue(v)) => {
                handle.set_field_double(index, f64::from(*v))
            }
            (FieldType::Float64, FieldValue::Integer64Value(v)) => {
                handle.set_field_double(index, *v as f64)
            }
            (FieldType::Str | FieldType::JsonString, FieldValue::StringValue(s)) => {
                handle.set_field_string_bytes(index, &self.encode(s))
            }
            (FieldType::Str | FieldType::JsonString, FieldValue::JsonValue(v)) => {
                let text = serde_json::to_string(v)?;
                handle.set_field_string_bytes(index, &self.encode(&text))
            }
            (FieldType::Bytes, FieldValue::BinaryValue(bytes)) => {
                handle.set_field_binary(index, bytes)
            }
            (FieldType::StringList, FieldValue::StringListValue(items)) => {
                let encoded: Vec<Vec<u8>> =
                    items.iter().map(|s| self.encode(s).into_owned()).collect();
                handle.set_field_string_list(index, &encoded)
            }
            (
                kind @ (FieldType::Date | FieldType::Time | FieldType::DateTime),
                FieldValue::DateValue(s)
                | FieldValue::TimeValue(s)
                | FieldValue::DateTimeValue(s)
                | FieldValue::StringValue(s),
            ) => {
                let parts = parse_temporal(kind, s, self.timezones)?;
                handle.set_field_datetime(index, parts)
            }
            _ => Err(mismatch()),
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        self.encoding
            .decode_without_bom_handling(bytes)
            .0
            .into_owned()
    }

    fn encode<'s>(&self, text: &'s str) -> Cow<'s, [u8]> {
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            warn!(
                "'{text}' is not representable in {}, unmappable characters were replaced",
                self.encoding.name()
            );
        }
        bytes
    }
}

fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

fn parse_json_or_string(text: String) -> FieldValue {
    match serde_json::from_str(&text) {
        Ok(value) => FieldValue::JsonValue(value),
        Err(_) => FieldValue::StringValue(text),
    }
}

fn invalid(kind: FieldType, value: impl Into<String>) -> VectorError {
    let kind = match kind {
        FieldType::Date => "date",
        FieldType::Time => "time",
        _ => "datetime",
    };
    VectorError::InvalidDateTime {
        kind,
        value: value.into(),
    }
}

/// Renders native date and time parts as an ISO 8601 string of the shape `kind` asks for.
fn compose_temporal(kind: FieldType, parts: NativeDateTime) -> Result<FieldValue> {
    let describe = || format!("{parts:?}");
    // Single precision seconds close to 60 round up to 60.0, which is not a valid second.
    let total_micros = (f64::from(parts.second) * 1e6)
        .round()
        .clamp(0.0, f64::from(MAX_SECOND_MICROS)) as u32;
    let time = NaiveTime::from_hms_micro_opt(
        parts.hour as u32,
        parts.minute as u32,
        total_micros / 1_000_000,
        total_micros % 1_000_000,
    );
    let date = NaiveDate::from_ymd_opt(parts.year, parts.month as u32, parts.day as u32);
    let time_text = |t: NaiveTime| {
        let mut text = if t.nanosecond() == 0 {
            t.format("%H:%M:%S").to_string()
        } else {
            t.format("%H:%M:%S%.6f").to_string()
        };
        // Flags 0 and 1 carry no offset.
        if parts.tz_flag > 1 {
            text.push_str(&format_offset((parts.tz_flag - TZ_UTC) * 15));
        }
        text
    };
    match kind {
        FieldType::Date => date
            .map(|d| FieldValue::DateValue(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| invalid(kind, describe())),
        FieldType::Time => time
            .map(|t| FieldValue::TimeValue(time_text(t)))
            .ok_or_else(|| invalid(kind, describe())),
        _ => match (date, time) {
            (Some(d), Some(t)) => Ok(FieldValue::DateTimeValue(format!(
                "{}T{}",
                d.format("%Y-%m-%d"),
                time_text(t)
            ))),
            _ => Err(invalid(kind, describe())),
        },
    }
}

fn format_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let minutes = minutes.abs();
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Splits a trailing `Z` or `±HH:MM` off a time string.
fn split_offset(text: &str) -> Option<(&str, Option<i32>)> {
    if let Some(body) = text.strip_suffix('Z') {
        return Some((body, Some(0)));
    }
    let bytes = text.as_bytes();
    if bytes.len() > 6 && matches!(bytes[bytes.len() - 6], b'+' | b'-') && bytes[bytes.len() - 3] == b':'
    {
        let (body, offset) = text.split_at(text.len() - 6);
        let hours: i32 = offset[1..3].parse().ok()?;
        let minutes: i32 = offset[4..6].parse().ok()?;
        let total = hours * 60 + minutes;
        return Some((body, Some(if offset.starts_with('-') { -total } else { total })));
    }
    Some((text, None))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Parses an ISO 8601 value into native parts for a field of type `kind`.
///
/// When `timezones` is false an offset is applied to reach UTC and then dropped, the value
/// is never stored with a silently ignored offset.
fn parse_temporal(kind: FieldType, text: &str, timezones: bool) -> Result<NativeDateTime> {
    let text = text.trim();
    let (date, time, offset) = match kind {
        FieldType::Date => {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|_| invalid(kind, text))?;
            (Some(date), NaiveTime::MIN, None)
        }
        FieldType::Time => {
            let (body, offset) = split_offset(text).ok_or_else(|| invalid(kind, text))?;
            let time = parse_time(body).ok_or_else(|| invalid(kind, text))?;
            (None, time, offset)
        }
        _ => {
            let (date_part, time_part) = text
                .split_once(['T', ' '])
                .ok_or_else(|| invalid(kind, text))?;
            let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map_err(|_| invalid(kind, text))?;
            let (body, offset) = split_offset(time_part).ok_or_else(|| invalid(kind, text))?;
            let time = parse_time(body).ok_or_else(|| invalid(kind, text))?;
            (Some(date), time, offset)
        }
    };

    let (date, time, tz_flag) = match offset {
        Some(minutes) if timezones => (date, time, TZ_UTC + minutes / 15),
        Some(minutes) => {
            let shift = chrono::Duration::minutes(i64::from(minutes));
            match date {
                Some(d) => {
                    let utc: NaiveDateTime = d.and_time(time) - shift;
                    (Some(utc.date()), utc.time(), TZ_UNKNOWN)
                }
                None => (None, time.overflowing_sub_signed(shift).0, TZ_UNKNOWN),
            }
        }
        None => (date, time, TZ_UNKNOWN),
    };

    let (year, month, day) = date.map_or((0, 0, 0), |d| (d.year(), d.month() as i32, d.day() as i32));
    Ok(NativeDateTime {
        year,
        month,
        day,
        hour: time.hour() as i32,
        minute: time.minute() as i32,
        second: native_seconds(time),
        tz_flag,
    })
}

/// Seconds with fraction, at microsecond resolution. Leap seconds are folded into the last
/// microsecond of the minute.
fn native_seconds(time: NaiveTime) -> f32 {
    let micros = (time.second() * 1_000_000 + time.nanosecond() / 1_000).min(MAX_SECOND_MICROS);
    (f64::from(micros) / 1e6) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(hour: i32, minute: i32, second: f32, tz_flag: i32) -> NativeDateTime {
        NativeDateTime {
            year: 2011,
            month: 7,
            day: 14,
            hour,
            minute,
            second,
            tz_flag,
        }
    }

    #[test]
    fn test_compose_datetime_with_offset() {
        let value = compose_temporal(FieldType::DateTime, parts(19, 43, 37.0, 80)).unwrap();
        assert_eq!(
            value,
            FieldValue::DateTimeValue("2011-07-14T19:43:37-05:00".to_string())
        );
    }

    #[test]
    fn test_compose_utc_and_unknown() {
        let value = compose_temporal(FieldType::DateTime, parts(1, 2, 3.0, TZ_UTC)).unwrap();
        assert_eq!(
            value.into_string().unwrap(),
            "2011-07-14T01:02:03+00:00"
        );
        let value = compose_temporal(FieldType::Time, parts(1, 2, 3.5, TZ_UNKNOWN)).unwrap();
        assert_eq!(value, FieldValue::TimeValue("01:02:03.500000".to_string()));
        let value = compose_temporal(FieldType::Date, parts(1, 2, 3.0, TZ_UTC)).unwrap();
        assert_eq!(value, FieldValue::DateValue("2011-07-14".to_string()));
    }

    #[test]
    fn test_compose_last_microsecond_of_minute() {
        let parsed = parse_temporal(FieldType::Time, "10:00:59.999999", true).unwrap();
        assert!(parsed.second <= 60.0);
        let value = compose_temporal(FieldType::Time, parsed).unwrap();
        assert_eq!(value, FieldValue::TimeValue("10:00:59.999999".to_string()));

        let value = compose_temporal(FieldType::DateTime, parts(10, 0, 60.0, TZ_UNKNOWN)).unwrap();
        assert_eq!(
            value,
            FieldValue::DateTimeValue("2011-07-14T10:00:59.999999".to_string())
        );
    }

    #[test]
    fn test_compose_invalid_date() {
        let mut invalid_parts = parts(0, 0, 0.0, 0);
        invalid_parts.month = 13;
        assert!(compose_temporal(FieldType::Date, invalid_parts).is_err());
    }

    #[test]
    fn test_parse_keeps_timezone() {
        let parsed =
            parse_temporal(FieldType::DateTime, "2011-07-14T19:43:37-05:00", true).unwrap();
        assert_eq!(parsed, parts(19, 43, 37.0, 80));
    }

    #[test]
    fn test_parse_converts_to_utc_without_timezone_support() {
        let parsed =
            parse_temporal(FieldType::DateTime, "2011-07-14T22:30:00-05:00", false).unwrap();
        assert_eq!(
            (parsed.day, parsed.hour, parsed.minute, parsed.tz_flag),
            (15, 3, 30, TZ_UNKNOWN)
        );

        let parsed = parse_temporal(FieldType::Time, "01:00:00+02:00", false).unwrap();
        assert_eq!((parsed.hour, parsed.tz_flag), (23, TZ_UNKNOWN));
    }

    #[test]
    fn test_parse_zulu_and_fraction() {
        let parsed = parse_temporal(FieldType::Time, "10:20:30.25Z", true).unwrap();
        assert_eq!(parsed.tz_flag, TZ_UTC);
        assert!((parsed.second - 30.25).abs() < 1e-4);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_temporal(FieldType::Date, "14/07/2011", true),
            Err(VectorError::InvalidDateTime { kind: "date", .. })
        ));
    }

    #[test]
    fn test_feature_json() {
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), Some(FieldValue::StringValue("a".into())));
        properties.insert("count".to_string(), Some(FieldValue::IntegerValue(3)));
        properties.insert("missing".to_string(), None);
        let feature = Feature::new(
            "7",
            properties,
            Some(Geometry::Point((1.0, 2.0).into())),
        );
        let value = feature.to_json();
        assert_eq!(value["properties"]["count"], json!(3));
        assert_eq!(value["geometry"]["coordinates"], json!([1.0, 2.0]));
        assert_eq!(Feature::from_json(&value).unwrap(), feature);
    }
}
