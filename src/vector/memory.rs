//! A native vector engine kept entirely in memory.
//!
//! [`MemoryStore`] implements the full [`NativeStore`] capability set without linking any
//! native library. Its capabilities are configurable, so the slower code paths taken for
//! stores without indexed seek, cheap counts or transactions can be exercised too.
//!
//! Records are held as native cells: integers, doubles, raw string bytes in the store's
//! text encoding, broken-down dates and so on, exactly as a file based engine would hand
//! them out.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use encoding_rs::Encoding;
use tracing::debug;

use crate::errors::{Result, VectorError};
use crate::options::StoreCapabilities;
use crate::vector::geometry::Bbox;
use crate::vector::geometry_type::{GeometryTypeCode, Shape};
use crate::vector::native::{
    NativeDateTime, NativeFeature, NativeFieldDefn, NativeGeometry, NativeStore,
};
use crate::vector::schema::Schema;

/// An in-memory geometry. Curve and surface types are converted by relabelling, the stored
/// vertices are used as the linear approximation.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryGeometry {
    code: GeometryTypeCode,
    points: Vec<[f64; 3]>,
    children: Vec<MemoryGeometry>,
    is_3d: bool,
}

impl MemoryGeometry {
    fn relabelled(&self) -> MemoryGeometry {
        MemoryGeometry {
            code: self.code.linear_counterpart(),
            points: self.points.clone(),
            children: self.children.iter().map(MemoryGeometry::relabelled).collect(),
            is_3d: self.is_3d,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(self.code.base(), Ok(Shape::Point | Shape::LineString))
    }

    fn envelope(&self) -> Option<Bbox> {
        let own = self.points.iter().map(|p| Bbox::new(p[0], p[1], p[0], p[1]));
        own.chain(self.children.iter().filter_map(MemoryGeometry::envelope))
            .reduce(|a, b| {
                Bbox::new(
                    a.min_x.min(b.min_x),
                    a.min_y.min(b.min_y),
                    a.max_x.max(b.max_x),
                    a.max_y.max(b.max_y),
                )
            })
    }
}

impl NativeGeometry for MemoryGeometry {
    fn create(code: GeometryTypeCode) -> Result<Self> {
        Ok(MemoryGeometry {
            code,
            points: Vec::new(),
            children: Vec::new(),
            is_3d: code.is_3d(),
        })
    }

    fn geometry_type(&self) -> GeometryTypeCode {
        if self.is_3d {
            self.code.to_3d()
        } else {
            self.code
        }
    }

    fn coordinate_dimension(&self) -> usize {
        if self.is_3d {
            3
        } else {
            2
        }
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn get_point(&self, index: usize) -> (f64, f64, f64) {
        let [x, y, z] = self.points.get(index).copied().unwrap_or_default();
        (x, y, z)
    }

    fn geometry_count(&self) -> usize {
        self.children.len()
    }

    fn with_geometry<R>(&self, index: usize, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let child = self.children.get(index).ok_or_else(|| VectorError::NullPointer {
            method_name: "MemoryGeometry::with_geometry",
            msg: format!("no child geometry at index {index}"),
        })?;
        f(child)
    }

    fn linear_geometry(&self) -> Result<Self> {
        Ok(self.relabelled())
    }

    fn force_to_multipolygon(&self) -> Result<Self> {
        Ok(self.relabelled())
    }

    fn force_to_polygon(&self) -> Result<Self> {
        Ok(self.relabelled())
    }

    fn add_point(&mut self, x: f64, y: f64, z: Option<f64>) {
        self.is_3d |= z.is_some();
        let point = [x, y, z.unwrap_or(0.0)];
        if matches!(self.code.base(), Ok(Shape::Point)) {
            self.points = vec![point];
        } else {
            self.points.push(point);
        }
    }

    fn add_geometry_directly(&mut self, child: Self) -> Result<()> {
        if self.is_leaf() {
            return Err(VectorError::StoreError {
                method_name: "MemoryGeometry::add_geometry_directly",
                msg: format!("{:?} cannot hold child geometries", self.code),
            });
        }
        self.is_3d |= child.is_3d;
        self.children.push(child);
        Ok(())
    }

    fn close_rings(&mut self) {
        if let (Some(first), Some(last)) = (self.points.first(), self.points.last()) {
            if first != last {
                let first = *first;
                self.points.push(first);
            }
        }
        self.children.iter_mut().for_each(MemoryGeometry::close_rings);
    }
}

/// One native field value.
#[derive(Clone, Debug, Default, PartialEq)]
enum FieldCell {
    #[default]
    Unset,
    Null,
    Integer(i32),
    Integer64(i64),
    Real(f64),
    String(Vec<u8>),
    Binary(Vec<u8>),
    DateTime(NativeDateTime),
    StringList(Vec<Vec<u8>>),
}

/// An in-memory record.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryFeature {
    fid: Option<u64>,
    cells: Vec<FieldCell>,
    geometry: Option<MemoryGeometry>,
}

impl MemoryFeature {
    fn cell(&self, index: usize) -> &FieldCell {
        static UNSET: FieldCell = FieldCell::Unset;
        self.cells.get(index).unwrap_or(&UNSET)
    }

    fn set(&mut self, index: usize, cell: FieldCell) -> Result<()> {
        let slot = self
            .cells
            .get_mut(index)
            .ok_or(VectorError::InvalidFieldIndex {
                index,
                method_name: "MemoryFeature::set_field",
            })?;
        *slot = cell;
        Ok(())
    }

    /// Clears the field without marking it null, as a record read from a source that does
    /// not have the column.
    pub fn unset_field(&mut self, index: usize) -> Result<()> {
        self.set(index, FieldCell::Unset)
    }

    /// Whether the field has been explicitly set to null.
    pub fn is_field_null(&self, index: usize) -> bool {
        matches!(self.cell(index), FieldCell::Null)
    }
}

impl NativeFeature for MemoryFeature {
    type Geometry = MemoryGeometry;

    fn fid(&self) -> Option<u64> {
        self.fid
    }

    fn field_is_set_and_not_null(&self, index: usize) -> bool {
        !matches!(self.cell(index), FieldCell::Unset | FieldCell::Null)
    }

    fn field_as_integer(&self, index: usize) -> i32 {
        match self.cell(index) {
            FieldCell::Integer(v) => *v,
            FieldCell::Integer64(v) => *v as i32,
            FieldCell::Real(v) => *v as i32,
            _ => 0,
        }
    }

    fn field_as_integer64(&self, index: usize) -> i64 {
        match self.cell(index) {
            FieldCell::Integer(v) => i64::from(*v),
            FieldCell::Integer64(v) => *v,
            FieldCell::Real(v) => *v as i64,
            _ => 0,
        }
    }

    fn field_as_double(&self, index: usize) -> f64 {
        match self.cell(index) {
            FieldCell::Integer(v) => f64::from(*v),
            FieldCell::Integer64(v) => *v as f64,
            FieldCell::Real(v) => *v,
            _ => 0.0,
        }
    }

    fn field_as_string_bytes(&self, index: usize) -> Vec<u8> {
        match self.cell(index) {
            FieldCell::String(bytes) => bytes.clone(),
            FieldCell::Integer(v) => v.to_string().into_bytes(),
            FieldCell::Integer64(v) => v.to_string().into_bytes(),
            FieldCell::Real(v) => v.to_string().into_bytes(),
            _ => Vec::new(),
        }
    }

    fn field_as_binary(&self, index: usize) -> Vec<u8> {
        match self.cell(index) {
            FieldCell::Binary(bytes) | FieldCell::String(bytes) => bytes.clone(),
            _ => Vec::new(),
        }
    }

    fn field_as_datetime(&self, index: usize) -> Option<NativeDateTime> {
        match self.cell(index) {
            FieldCell::DateTime(parts) => Some(*parts),
            _ => None,
        }
    }

    fn field_as_string_list(&self, index: usize) -> Vec<Vec<u8>> {
        match self.cell(index) {
            FieldCell::StringList(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn set_field_null(&mut self, index: usize) -> Result<()> {
        self.set(index, FieldCell::Null)
    }

    fn set_field_integer(&mut self, index: usize, value: i32) -> Result<()> {
        self.set(index, FieldCell::Integer(value))
    }

    fn set_field_integer64(&mut self, index: usize, value: i64) -> Result<()> {
        self.set(index, FieldCell::Integer64(value))
    }

    fn set_field_double(&mut self, index: usize, value: f64) -> Result<()> {
        self.set(index, FieldCell::Real(value))
    }

    fn set_field_string_bytes(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.set(index, FieldCell::String(value.to_vec()))
    }

    fn set_field_binary(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.set(index, FieldCell::Binary(value.to_vec()))
    }

    fn set_field_datetime(&mut self, index: usize, value: NativeDateTime) -> Result<()> {
        self.set(index, FieldCell::DateTime(value))
    }

    fn set_field_string_list(&mut self, index: usize, value: &[Vec<u8>]) -> Result<()> {
        self.set(index, FieldCell::StringList(value.to_vec()))
    }

    fn with_geometry<R>(&self, f: impl FnOnce(Option<&Self::Geometry>) -> Result<R>) -> Result<R> {
        f(self.geometry.as_ref())
    }

    fn set_geometry_directly(&mut self, geometry: Self::Geometry) -> Result<()> {
        self.geometry = Some(geometry);
        Ok(())
    }
}

/// An in-memory layer.
///
/// ```
/// use geofeatures::options::StoreCapabilities;
/// use geofeatures::vector::{MemoryStore, NativeStore, Schema};
///
/// let schema = Schema::parse("Point", &[("name", "str")]).unwrap();
/// let store = MemoryStore::new(&schema).with_capabilities(StoreCapabilities::SEQUENTIAL_WRITE);
/// assert!(!store.capabilities().contains(StoreCapabilities::FAST_SEEK));
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    geometry_type: GeometryTypeCode,
    fields: Vec<NativeFieldDefn>,
    records: Vec<MemoryFeature>,
    pending: Option<Vec<MemoryFeature>>,
    capabilities: StoreCapabilities,
    encoding: &'static Encoding,
    spatial_filter: Option<Bbox>,
    attribute_filter: Option<Predicate>,
    /// Indices into `records` of the records passing the filters.
    filtered: Vec<usize>,
    /// Read position within `filtered`.
    position: usize,
    next_fid: u64,
    commits: usize,
}

impl MemoryStore {
    /// Creates an empty store with the given schema and every capability.
    pub fn new(schema: &Schema) -> Self {
        let geometry_type = GeometryTypeCode::from_name(&schema.geometry_type)
            .unwrap_or_else(|_| GeometryTypeCode::from_native(0));
        MemoryStore::from_field_defns(geometry_type, schema.to_native())
    }

    /// Creates an empty store from raw native definitions.
    pub fn from_field_defns(geometry_type: GeometryTypeCode, fields: Vec<NativeFieldDefn>) -> Self {
        MemoryStore {
            geometry_type,
            fields,
            records: Vec::new(),
            pending: None,
            capabilities: StoreCapabilities::all(),
            encoding: encoding_rs::UTF_8,
            spatial_filter: None,
            attribute_filter: None,
            filtered: Vec::new(),
            position: 0,
            next_fid: 0,
            commits: 0,
        }
    }

    pub fn with_capabilities(mut self, capabilities: StoreCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the encoding string fields are stored in.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Number of committed transactions.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Number of stored records, ignoring filters and uncommitted writes.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn refilter(&mut self) {
        let encoding = self.encoding;
        self.filtered = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                let spatial = match &self.spatial_filter {
                    None => true,
                    Some(bbox) => record
                        .geometry
                        .as_ref()
                        .and_then(MemoryGeometry::envelope)
                        .is_some_and(|env| env.intersects(bbox)),
                };
                spatial
                    && self
                        .attribute_filter
                        .as_ref()
                        .map_or(true, |p| p.matches(record, encoding))
            })
            .map(|(index, _)| index)
            .collect();
        self.position = 0;
    }

    fn append(&mut self, records: Vec<MemoryFeature>) {
        self.records.extend(records);
        self.refilter();
    }

    fn no_transaction(method_name: &'static str) -> VectorError {
        VectorError::TransactionError {
            method_name,
            msg: "no transaction in progress".to_string(),
        }
    }
}

impl NativeStore for MemoryStore {
    type Geometry = MemoryGeometry;
    type Feature = MemoryFeature;

    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    fn text_encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn geometry_type(&self) -> GeometryTypeCode {
        self.geometry_type
    }

    fn field_defns(&self) -> Vec<NativeFieldDefn> {
        self.fields.clone()
    }

    fn feature_count(&mut self, force: bool) -> Option<u64> {
        if force || self.capabilities.contains(StoreCapabilities::FAST_FEATURE_COUNT) {
            Some(self.filtered.len() as u64)
        } else {
            None
        }
    }

    fn reset_reading(&mut self) {
        self.position = 0;
    }

    fn seek_to_index(&mut self, index: u64) -> Result<bool> {
        if !self.capabilities.contains(StoreCapabilities::FAST_SEEK) {
            return Ok(false);
        }
        self.position = usize::try_from(index).unwrap_or(usize::MAX);
        Ok(true)
    }

    fn next_record(&mut self) -> Result<Option<Self::Feature>> {
        let record = self
            .filtered
            .get(self.position)
            .and_then(|&index| self.records.get(index))
            .cloned();
        if record.is_some() {
            self.position += 1;
        }
        Ok(record)
    }

    fn feature_by_id(&mut self, fid: u64) -> Result<Option<Self::Feature>> {
        self.position = self.filtered.len();
        Ok(self.records.iter().find(|r| r.fid == Some(fid)).cloned())
    }

    fn set_spatial_filter_rect(&mut self, bbox: Option<Bbox>) {
        self.spatial_filter = bbox;
        self.refilter();
    }

    fn set_spatial_filter(&mut self, geometry: Option<&Self::Geometry>) {
        self.set_spatial_filter_rect(geometry.and_then(MemoryGeometry::envelope));
    }

    fn set_attribute_filter(&mut self, predicate: Option<&str>) -> Result<()> {
        self.attribute_filter = match predicate {
            None => None,
            Some(text) => Some(Predicate::parse(text, &self.fields).map_err(|msg| {
                VectorError::AttributeFilterError {
                    filter: text.to_string(),
                    msg,
                }
            })?),
        };
        self.refilter();
        Ok(())
    }

    fn create_feature_handle(&self) -> Result<Self::Feature> {
        Ok(MemoryFeature {
            fid: None,
            cells: vec![FieldCell::Unset; self.fields.len()],
            geometry: None,
        })
    }

    fn write_feature(&mut self, feature: &mut Self::Feature) -> Result<()> {
        if !self.capabilities.contains(StoreCapabilities::SEQUENTIAL_WRITE) {
            return Err(VectorError::UnsupportedOperation(
                "store is read only".to_string(),
            ));
        }
        feature.fid = Some(self.next_fid);
        self.next_fid += 1;
        match &mut self.pending {
            Some(pending) => pending.push(feature.clone()),
            None => self.append(vec![feature.clone()]),
        }
        Ok(())
    }

    fn start_transaction(&mut self) -> Result<()> {
        if !self.capabilities.contains(StoreCapabilities::TRANSACTIONS) {
            return Err(VectorError::TransactionError {
                method_name: "start_transaction",
                msg: "store does not support transactions".to_string(),
            });
        }
        if self.pending.is_some() {
            return Err(VectorError::TransactionError {
                method_name: "start_transaction",
                msg: "a transaction is already in progress".to_string(),
            });
        }
        self.pending = Some(Vec::new());
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<()> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| MemoryStore::no_transaction("commit_transaction"))?;
        debug!("Committing {} records", pending.len());
        self.append(pending);
        self.commits += 1;
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| MemoryStore::no_transaction("rollback_transaction"))?;
        debug!("Discarding {} records", pending.len());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Literal {
    Number(f64),
    Text(String),
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn parse(op: &str) -> Option<CompareOp> {
        match op {
            "=" => Some(CompareOp::Eq),
            "!=" | "<>" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            _ => None,
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Clone, Debug)]
struct Comparison {
    field: usize,
    op: CompareOp,
    literal: Literal,
}

/// A conjunction of `field OP literal` comparisons. Null fields never match.
#[derive(Clone, Debug)]
struct Predicate(Vec<Comparison>);

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Op(String),
    Literal(Literal),
}

impl Predicate {
    fn parse(text: &str, fields: &[NativeFieldDefn]) -> std::result::Result<Predicate, String> {
        let tokens = tokenize(text)?;
        let mut tokens = tokens.into_iter();
        let mut comparisons = Vec::new();
        loop {
            let field = match tokens.next() {
                Some(Token::Ident(name)) => fields
                    .iter()
                    .position(|f| f.name == name)
                    .ok_or_else(|| format!("unknown field '{name}'"))?,
                other => return Err(format!("expected a field name, found {other:?}")),
            };
            let op = match tokens.next() {
                Some(Token::Op(op)) => {
                    CompareOp::parse(&op).ok_or_else(|| format!("unknown operator '{op}'"))?
                }
                other => return Err(format!("expected an operator, found {other:?}")),
            };
            let literal = match tokens.next() {
                Some(Token::Literal(literal)) => literal,
                other => return Err(format!("expected a literal, found {other:?}")),
            };
            comparisons.push(Comparison { field, op, literal });
            match tokens.next() {
                None => return Ok(Predicate(comparisons)),
                Some(Token::Ident(word)) if word.eq_ignore_ascii_case("AND") => {}
                Some(other) => return Err(format!("expected AND, found {other:?}")),
            }
        }
    }

    fn matches(&self, record: &MemoryFeature, encoding: &'static Encoding) -> bool {
        self.0.iter().all(|c| {
            let ordering = match (record.cell(c.field), &c.literal) {
                (FieldCell::Integer(v), Literal::Number(n)) => f64::from(*v).partial_cmp(n),
                (FieldCell::Integer64(v), Literal::Number(n)) => (*v as f64).partial_cmp(n),
                (FieldCell::Real(v), Literal::Number(n)) => v.partial_cmp(n),
                (FieldCell::String(bytes), Literal::Text(t)) => {
                    let (text, _) = encoding.decode_without_bom_handling(bytes);
                    Some(text.as_ref().cmp(t.as_str()))
                }
                _ => None,
            };
            ordering.is_some_and(|o| c.op.accepts(o))
        })
    }
}

fn tokenize(text: &str) -> std::result::Result<Vec<Token>, String> {
    let mut chars = text.chars().peekable();
    let mut tokens = Vec::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphabetic() || c == '_' {
            tokens.push(Token::Ident(take_while(&mut chars, |c| {
                c.is_alphanumeric() || c == '_'
            })));
        } else if c == '"' {
            chars.next();
            tokens.push(Token::Ident(quoted(&mut chars, '"')?));
        } else if c == '\'' {
            chars.next();
            tokens.push(Token::Literal(Literal::Text(quoted(&mut chars, '\'')?)));
        } else if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' {
            let number = take_while(&mut chars, |c| {
                c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
            });
            let value = number
                .parse()
                .map_err(|_| format!("invalid number '{number}'"))?;
            tokens.push(Token::Literal(Literal::Number(value)));
        } else if matches!(c, '=' | '!' | '<' | '>') {
            tokens.push(Token::Op(take_while(&mut chars, |c| {
                matches!(c, '=' | '!' | '<' | '>')
            })));
        } else {
            return Err(format!("unexpected character '{c}'"));
        }
    }
    Ok(tokens)
}

fn take_while(chars: &mut Peekable<Chars<'_>>, accept: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !accept(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

/// Reads up to the closing `quote`; a doubled quote stands for itself.
fn quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> std::result::Result<String, String> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        if c == quote {
            if chars.peek() == Some(&quote) {
                chars.next();
                out.push(quote);
            } else {
                return Ok(out);
            }
        } else {
            out.push(c);
        }
    }
    Err("unterminated quoted string".to_string())
}
