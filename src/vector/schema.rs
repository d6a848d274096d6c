//! Field type descriptors and their compact string form.
//!
//! A descriptor renders as `name[:width[.precision]]`, for example `"str:80"` or
//! `"float:15.2"`.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use indexmap::IndexMap;
use tracing::warn;

use crate::errors::{Result, VectorError};
use crate::vector::geometry_type::GeometryTypeCode;
use crate::vector::native::NativeFieldDefn;

// Native field type codes.
const OFT_INTEGER: u32 = 0;
const OFT_REAL: u32 = 2;
const OFT_STRING: u32 = 4;
const OFT_STRING_LIST: u32 = 5;
const OFT_WIDE_STRING: u32 = 6;
const OFT_BINARY: u32 = 8;
const OFT_DATE: u32 = 9;
const OFT_TIME: u32 = 10;
const OFT_DATE_TIME: u32 = 11;
const OFT_INTEGER64: u32 = 12;

// Native field subtype codes.
const OFST_NONE: u32 = 0;
const OFST_BOOLEAN: u32 = 1;
const OFST_INT16: u32 = 2;
const OFST_JSON: u32 = 4;

/// Widths of 10 digits and more do not fit a 32 bit integer.
const INT32_MAX_WIDTH: u32 = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int16,
    Int32,
    Int64,
    Float64,
    Str,
    Bytes,
    Date,
    Time,
    DateTime,
    StringList,
    JsonString,
}

impl FieldType {
    fn name(&self) -> &'static str {
        match self {
            FieldType::Int16 => "int16",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Float64 => "float",
            FieldType::Str => "str",
            FieldType::Bytes => "bytes",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DateTime => "datetime",
            FieldType::StringList => "List[str]",
            FieldType::JsonString => "json",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, FieldType::Int16 | FieldType::Int32 | FieldType::Int64)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Time | FieldType::DateTime)
    }
}

/// Refines a base type without adding one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldSubType {
    /// 0/1 integers read as booleans.
    Boolean,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub base_type: FieldType,
    pub width: Option<u32>,
    pub precision: Option<u32>,
    pub subtype: Option<FieldSubType>,
}

impl FieldDescriptor {
    pub fn new(base_type: FieldType) -> Self {
        FieldDescriptor {
            base_type,
            width: None,
            precision: None,
            subtype: None,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn is_boolean(&self) -> bool {
        self.subtype == Some(FieldSubType::Boolean)
    }

    /// Maps a native field definition, or returns `None` for types with no counterpart.
    pub fn from_native(defn: &NativeFieldDefn) -> Option<FieldDescriptor> {
        let (base_type, subtype) = match (defn.type_code, defn.subtype_code) {
            (OFT_INTEGER, OFST_BOOLEAN) => (FieldType::Int32, Some(FieldSubType::Boolean)),
            (OFT_INTEGER, OFST_INT16) => (FieldType::Int16, None),
            (OFT_INTEGER, _) => (FieldType::Int32, None),
            (OFT_INTEGER64, _) => (FieldType::Int64, None),
            (OFT_REAL, _) => (FieldType::Float64, None),
            (OFT_STRING, OFST_JSON) => (FieldType::JsonString, None),
            (OFT_STRING, _) | (OFT_WIDE_STRING, _) => (FieldType::Str, None),
            (OFT_STRING_LIST, _) => (FieldType::StringList, None),
            (OFT_BINARY, _) => (FieldType::Bytes, None),
            (OFT_DATE, _) => (FieldType::Date, None),
            (OFT_TIME, _) => (FieldType::Time, None),
            (OFT_DATE_TIME, _) => (FieldType::DateTime, None),
            _ => return None,
        };
        let positive = |v: i32| u32::try_from(v).ok().filter(|v| *v > 0);
        Some(FieldDescriptor {
            base_type,
            width: positive(defn.width),
            precision: positive(defn.precision),
            subtype,
        })
    }

    pub fn to_native(&self, name: &str) -> NativeFieldDefn {
        let (type_code, subtype_code) = match (self.base_type, self.subtype) {
            (FieldType::Int16, _) => (OFT_INTEGER, OFST_INT16),
            (FieldType::Int32, Some(FieldSubType::Boolean)) => (OFT_INTEGER, OFST_BOOLEAN),
            (FieldType::Int32, None) => (OFT_INTEGER, OFST_NONE),
            (FieldType::Int64, _) => (OFT_INTEGER64, OFST_NONE),
            (FieldType::Float64, _) => (OFT_REAL, OFST_NONE),
            (FieldType::Str, _) => (OFT_STRING, OFST_NONE),
            (FieldType::JsonString, _) => (OFT_STRING, OFST_JSON),
            (FieldType::StringList, _) => (OFT_STRING_LIST, OFST_NONE),
            (FieldType::Bytes, _) => (OFT_BINARY, OFST_NONE),
            (FieldType::Date, _) => (OFT_DATE, OFST_NONE),
            (FieldType::Time, _) => (OFT_TIME, OFST_NONE),
            (FieldType::DateTime, _) => (OFT_DATE_TIME, OFST_NONE),
        };
        let native = |v: Option<u32>| v.and_then(|v| i32::try_from(v).ok()).unwrap_or(0);
        NativeFieldDefn {
            name: name.to_string(),
            type_code,
            subtype_code,
            width: native(self.width),
            precision: native(self.precision),
        }
    }
}

impl FromStr for FieldDescriptor {
    type Err = VectorError;

    /// Parses the compact form. No width is implied when none is given, except that a plain
    /// `"int"` becomes `int32` below 10 digits of width and `int64` otherwise.
    fn from_str(s: &str) -> Result<Self> {
        let (name, size) = match s.split_once(':') {
            Some((name, size)) => (name, Some(size)),
            None => (s, None),
        };
        let number = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| VectorError::SchemaError(format!("Invalid field size in '{s}'")))
        };
        let (width, precision) = match size {
            None => (None, None),
            Some(size) => {
                let (w, p) = match size.split_once('.') {
                    Some((w, p)) => (w, Some(p)),
                    None => (size, None),
                };
                let width = if w.is_empty() { None } else { Some(number(w)?) };
                (width, p.map(number).transpose()?)
            }
        };
        let (base_type, subtype) = match name.trim() {
            "int" => match width {
                Some(w) if w < INT32_MAX_WIDTH => (FieldType::Int32, None),
                _ => (FieldType::Int64, None),
            },
            "int16" => (FieldType::Int16, None),
            "int32" => (FieldType::Int32, None),
            "int64" => (FieldType::Int64, None),
            "bool" => (FieldType::Int32, Some(FieldSubType::Boolean)),
            "float" | "float64" => (FieldType::Float64, None),
            "str" => (FieldType::Str, None),
            "bytes" => (FieldType::Bytes, None),
            "date" => (FieldType::Date, None),
            "time" => (FieldType::Time, None),
            "datetime" => (FieldType::DateTime, None),
            "List[str]" => (FieldType::StringList, None),
            "json" => (FieldType::JsonString, None),
            other => {
                return Err(VectorError::SchemaError(format!(
                    "Unrecognized field type '{other}'"
                )))
            }
        };
        Ok(FieldDescriptor {
            base_type,
            width,
            precision,
            subtype,
        })
    }
}

impl Display for FieldDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_boolean() {
            f.write_str("bool")?;
        } else {
            f.write_str(self.base_type.name())?;
        }
        if self.width.is_some() || self.precision.is_some() {
            f.write_str(":")?;
        }
        if let Some(width) = self.width {
            write!(f, "{width}")?;
        }
        if let Some(precision) = self.precision {
            write!(f, ".{precision}")?;
        }
        Ok(())
    }
}

/// Geometry type name and ordered field descriptors of a collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    pub geometry_type: String,
    pub properties: IndexMap<String, FieldDescriptor>,
}

impl Schema {
    /// Builds a schema from a geometry type name and compact field types.
    ///
    /// ```
    /// use geofeatures::vector::Schema;
    ///
    /// let schema = Schema::parse("Polygon", &[("name", "str"), ("area", "float:10.2")]).unwrap();
    /// assert_eq!(schema.properties["area"].to_string(), "float:10.2");
    /// ```
    pub fn parse(geometry_type: &str, properties: &[(&str, &str)]) -> Result<Schema> {
        GeometryTypeCode::from_name(geometry_type)?;
        let properties = properties
            .iter()
            .map(|(name, ty)| Ok((name.to_string(), ty.parse()?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Schema {
            geometry_type: geometry_type.to_string(),
            properties,
        })
    }

    /// Reads a schema from native definitions.
    ///
    /// Fields with an empty or duplicate name or an unsupported type are logged and left
    /// out. The returned map gives the native index of every kept field, in schema order.
    pub fn from_native(
        geometry_type: GeometryTypeCode,
        defns: &[NativeFieldDefn],
    ) -> (Schema, IndexMap<String, usize>) {
        let geometry_type = match geometry_type.normalize().and_then(|c| c.name()) {
            Ok(name) => name.to_string(),
            Err(e) => {
                warn!("Layer geometry type not representable, using Unknown: {e}");
                "Unknown".to_string()
            }
        };
        let mut properties = IndexMap::new();
        let mut field_index = IndexMap::new();
        let mut seen = HashSet::new();
        for (index, defn) in defns.iter().enumerate() {
            if defn.name.is_empty() {
                warn!("Skipping field {index}: empty field name");
                continue;
            }
            if !seen.insert(defn.name.as_str()) {
                warn!("Skipping field {index}: duplicate field name '{}'", defn.name);
                continue;
            }
            match FieldDescriptor::from_native(defn) {
                Some(descriptor) => {
                    properties.insert(defn.name.clone(), descriptor);
                    field_index.insert(defn.name.clone(), index);
                }
                None => warn!(
                    "Skipping field '{}': unsupported type code {} (subtype {})",
                    defn.name, defn.type_code, defn.subtype_code
                ),
            }
        }
        (
            Schema {
                geometry_type,
                properties,
            },
            field_index,
        )
    }

    pub fn to_native(&self) -> Vec<NativeFieldDefn> {
        self.properties
            .iter()
            .map(|(name, descriptor)| descriptor.to_native(name))
            .collect()
    }
}
