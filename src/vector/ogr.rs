//! The capability set implemented over an OGR layer.
//!
//! Only available with the `ogr` cargo feature. Opening datasets is left to the caller, who
//! hands over an `OGRLayerH` it keeps alive for as long as the store is used.

use std::ffi::{c_char, c_int, CStr, CString};
use std::ptr;

use encoding_rs::Encoding;
use gdal_sys::{self, OGRErr, OGRFeatureH, OGRGeometryH, OGRLayerH};

use crate::errors::{Result, VectorError};
use crate::options::StoreCapabilities;
use crate::utils::{_bytes, _bytes_array, _last_null_pointer_err, _last_store_err, _string};
use crate::vector::geometry::Bbox;
use crate::vector::geometry_type::GeometryTypeCode;
use crate::vector::native::{
    NativeDateTime, NativeFeature, NativeFieldDefn, NativeGeometry, NativeStore,
};

fn c_index(index: usize, method_name: &'static str) -> Result<c_int> {
    c_int::try_from(index).map_err(|_| VectorError::InvalidFieldIndex { index, method_name })
}

/// An OGR geometry handle, either owned or borrowed from its parent.
#[derive(Debug)]
pub struct OgrGeometry {
    c_geometry: OGRGeometryH,
    owned: bool,
}

impl OgrGeometry {
    /// Takes ownership of `c_geometry`, which is destroyed on drop.
    ///
    /// # Safety
    /// `c_geometry` must be a valid geometry handle nothing else owns.
    pub unsafe fn from_c_geometry(c_geometry: OGRGeometryH) -> OgrGeometry {
        OgrGeometry {
            c_geometry,
            owned: true,
        }
    }

    /// Borrows `c_geometry`; it is never destroyed through this value.
    unsafe fn borrowed(c_geometry: OGRGeometryH) -> OgrGeometry {
        OgrGeometry {
            c_geometry,
            owned: false,
        }
    }

    pub fn c_geometry(&self) -> OGRGeometryH {
        self.c_geometry
    }

    fn owned_or_err(c_geometry: OGRGeometryH, method_name: &'static str) -> Result<Self> {
        if c_geometry.is_null() {
            return Err(_last_null_pointer_err(method_name));
        }
        Ok(unsafe { OgrGeometry::from_c_geometry(c_geometry) })
    }

    /// Releases ownership to a native parent.
    fn into_c_geometry(mut self) -> OGRGeometryH {
        self.owned = false;
        self.c_geometry
    }
}

impl Drop for OgrGeometry {
    fn drop(&mut self) {
        if self.owned && !self.c_geometry.is_null() {
            unsafe { gdal_sys::OGR_G_DestroyGeometry(self.c_geometry) };
        }
    }
}

impl NativeGeometry for OgrGeometry {
    fn create(code: GeometryTypeCode) -> Result<Self> {
        let c_geometry = unsafe { gdal_sys::OGR_G_CreateGeometry(code.to_native()) };
        OgrGeometry::owned_or_err(c_geometry, "OGR_G_CreateGeometry")
    }

    fn geometry_type(&self) -> GeometryTypeCode {
        GeometryTypeCode::from_native(unsafe { gdal_sys::OGR_G_GetGeometryType(self.c_geometry) })
    }

    fn coordinate_dimension(&self) -> usize {
        unsafe { gdal_sys::OGR_G_GetCoordinateDimension(self.c_geometry) as usize }
    }

    fn point_count(&self) -> usize {
        unsafe { gdal_sys::OGR_G_GetPointCount(self.c_geometry) as usize }
    }

    fn get_point(&self, index: usize) -> (f64, f64, f64) {
        let mut x: f64 = 0.;
        let mut y: f64 = 0.;
        let mut z: f64 = 0.;
        unsafe {
            gdal_sys::OGR_G_GetPoint(self.c_geometry, index as c_int, &mut x, &mut y, &mut z)
        };
        (x, y, z)
    }

    fn geometry_count(&self) -> usize {
        unsafe { gdal_sys::OGR_G_GetGeometryCount(self.c_geometry) as usize }
    }

    fn with_geometry<R>(&self, index: usize, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let c_child =
            unsafe { gdal_sys::OGR_G_GetGeometryRef(self.c_geometry, index as c_int) };
        if c_child.is_null() {
            return Err(_last_null_pointer_err("OGR_G_GetGeometryRef"));
        }
        let child = unsafe { OgrGeometry::borrowed(c_child) };
        f(&child)
    }

    fn linear_geometry(&self) -> Result<Self> {
        let c_geometry = unsafe {
            gdal_sys::OGR_G_GetLinearGeometry(self.c_geometry, 0.0, ptr::null_mut())
        };
        OgrGeometry::owned_or_err(c_geometry, "OGR_G_GetLinearGeometry")
    }

    fn force_to_multipolygon(&self) -> Result<Self> {
        // The force functions consume their input, so they get a clone.
        let clone = unsafe { gdal_sys::OGR_G_Clone(self.c_geometry) };
        if clone.is_null() {
            return Err(_last_null_pointer_err("OGR_G_Clone"));
        }
        let c_geometry = unsafe { gdal_sys::OGR_G_ForceToMultiPolygon(clone) };
        OgrGeometry::owned_or_err(c_geometry, "OGR_G_ForceToMultiPolygon")
    }

    fn force_to_polygon(&self) -> Result<Self> {
        let clone = unsafe { gdal_sys::OGR_G_Clone(self.c_geometry) };
        if clone.is_null() {
            return Err(_last_null_pointer_err("OGR_G_Clone"));
        }
        let c_geometry = unsafe { gdal_sys::OGR_G_ForceToPolygon(clone) };
        OgrGeometry::owned_or_err(c_geometry, "OGR_G_ForceToPolygon")
    }

    fn add_point(&mut self, x: f64, y: f64, z: Option<f64>) {
        match z {
            Some(z) => unsafe { gdal_sys::OGR_G_AddPoint(self.c_geometry, x, y, z) },
            None => unsafe { gdal_sys::OGR_G_AddPoint_2D(self.c_geometry, x, y) },
        }
    }

    fn add_geometry_directly(&mut self, child: Self) -> Result<()> {
        if !child.owned {
            return Err(VectorError::BadArgument(
                "a borrowed geometry cannot be moved into another one".to_string(),
            ));
        }
        let rv = unsafe { gdal_sys::OGR_G_AddGeometryDirectly(self.c_geometry, child.c_geometry) };
        if rv != OGRErr::OGRERR_NONE {
            // Ownership stays with `child`, which releases it.
            return Err(_last_store_err("OGR_G_AddGeometryDirectly"));
        }
        child.into_c_geometry();
        Ok(())
    }

    fn close_rings(&mut self) {
        unsafe { gdal_sys::OGR_G_CloseRings(self.c_geometry) };
    }
}

/// An owned OGR feature handle.
#[derive(Debug)]
pub struct OgrFeature {
    c_feature: OGRFeatureH,
}

impl OgrFeature {
    /// # Safety
    /// `c_feature` must be a valid feature handle nothing else owns.
    pub unsafe fn from_c_feature(c_feature: OGRFeatureH) -> OgrFeature {
        OgrFeature { c_feature }
    }

    pub fn c_feature(&self) -> OGRFeatureH {
        self.c_feature
    }
}

impl Drop for OgrFeature {
    fn drop(&mut self) {
        unsafe { gdal_sys::OGR_F_Destroy(self.c_feature) };
    }
}

impl NativeFeature for OgrFeature {
    type Geometry = OgrGeometry;

    fn fid(&self) -> Option<u64> {
        let fid = unsafe { gdal_sys::OGR_F_GetFID(self.c_feature) };
        u64::try_from(fid).ok()
    }

    fn field_is_set_and_not_null(&self, index: usize) -> bool {
        unsafe { gdal_sys::OGR_F_IsFieldSetAndNotNull(self.c_feature, index as c_int) != 0 }
    }

    fn field_as_integer(&self, index: usize) -> i32 {
        unsafe { gdal_sys::OGR_F_GetFieldAsInteger(self.c_feature, index as c_int) }
    }

    fn field_as_integer64(&self, index: usize) -> i64 {
        unsafe { gdal_sys::OGR_F_GetFieldAsInteger64(self.c_feature, index as c_int) }
    }

    fn field_as_double(&self, index: usize) -> f64 {
        unsafe { gdal_sys::OGR_F_GetFieldAsDouble(self.c_feature, index as c_int) }
    }

    fn field_as_string_bytes(&self, index: usize) -> Vec<u8> {
        _bytes(unsafe { gdal_sys::OGR_F_GetFieldAsString(self.c_feature, index as c_int) })
    }

    fn field_as_binary(&self, index: usize) -> Vec<u8> {
        let mut len: c_int = 0;
        let data =
            unsafe { gdal_sys::OGR_F_GetFieldAsBinary(self.c_feature, index as c_int, &mut len) };
        if data.is_null() || len <= 0 {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(data as *const u8, len as usize) }.to_vec()
    }

    fn field_as_datetime(&self, index: usize) -> Option<NativeDateTime> {
        let mut year: c_int = 0;
        let mut month: c_int = 0;
        let mut day: c_int = 0;
        let mut hour: c_int = 0;
        let mut minute: c_int = 0;
        let mut second: f32 = 0.;
        let mut tz_flag: c_int = 0;
        let success = unsafe {
            gdal_sys::OGR_F_GetFieldAsDateTimeEx(
                self.c_feature,
                index as c_int,
                &mut year,
                &mut month,
                &mut day,
                &mut hour,
                &mut minute,
                &mut second,
                &mut tz_flag,
            )
        };
        (success != 0).then_some(NativeDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            tz_flag,
        })
    }

    fn field_as_string_list(&self, index: usize) -> Vec<Vec<u8>> {
        _bytes_array(unsafe {
            gdal_sys::OGR_F_GetFieldAsStringList(self.c_feature, index as c_int)
        })
    }

    fn set_field_null(&mut self, index: usize) -> Result<()> {
        let index = c_index(index, "OGR_F_SetFieldNull")?;
        unsafe { gdal_sys::OGR_F_SetFieldNull(self.c_feature, index) };
        Ok(())
    }

    fn set_field_integer(&mut self, index: usize, value: i32) -> Result<()> {
        let index = c_index(index, "OGR_F_SetFieldInteger")?;
        unsafe { gdal_sys::OGR_F_SetFieldInteger(self.c_feature, index, value) };
        Ok(())
    }

    fn set_field_integer64(&mut self, index: usize, value: i64) -> Result<()> {
        let index = c_index(index, "OGR_F_SetFieldInteger64")?;
        unsafe { gdal_sys::OGR_F_SetFieldInteger64(self.c_feature, index, value) };
        Ok(())
    }

    fn set_field_double(&mut self, index: usize, value: f64) -> Result<()> {
        let index = c_index(index, "OGR_F_SetFieldDouble")?;
        unsafe { gdal_sys::OGR_F_SetFieldDouble(self.c_feature, index, value) };
        Ok(())
    }

    fn set_field_string_bytes(&mut self, index: usize, value: &[u8]) -> Result<()> {
        let index = c_index(index, "OGR_F_SetFieldString")?;
        let c_str_value = CString::new(value)?;
        unsafe { gdal_sys::OGR_F_SetFieldString(self.c_feature, index, c_str_value.as_ptr()) };
        Ok(())
    }

    fn set_field_binary(&mut self, index: usize, value: &[u8]) -> Result<()> {
        let index = c_index(index, "OGR_F_SetFieldBinary")?;
        let len = c_int::try_from(value.len())
            .map_err(|_| VectorError::BadArgument("binary value too large".to_string()))?;
        unsafe {
            gdal_sys::OGR_F_SetFieldBinary(self.c_feature, index, len, value.as_ptr() as _)
        };
        Ok(())
    }

    fn set_field_datetime(&mut self, index: usize, value: NativeDateTime) -> Result<()> {
        let index = c_index(index, "OGR_F_SetFieldDateTimeEx")?;
        unsafe {
            gdal_sys::OGR_F_SetFieldDateTimeEx(
                self.c_feature,
                index,
                value.year,
                value.month,
                value.day,
                value.hour,
                value.minute,
                value.second,
                value.tz_flag,
            )
        };
        Ok(())
    }

    fn set_field_string_list(&mut self, index: usize, value: &[Vec<u8>]) -> Result<()> {
        let index = c_index(index, "OGR_F_SetFieldStringList")?;
        let c_strings = value
            .iter()
            .map(|v| CString::new(v.as_slice()))
            .collect::<std::result::Result<Vec<CString>, _>>()?;
        let mut c_ptrs: Vec<*mut c_char> = c_strings
            .iter()
            .map(|s| s.as_ptr() as *mut c_char)
            .chain(std::iter::once(ptr::null_mut()))
            .collect();
        unsafe {
            gdal_sys::OGR_F_SetFieldStringList(self.c_feature, index, c_ptrs.as_mut_ptr() as _)
        };
        Ok(())
    }

    fn with_geometry<R>(&self, f: impl FnOnce(Option<&Self::Geometry>) -> Result<R>) -> Result<R> {
        let c_geometry = unsafe { gdal_sys::OGR_F_GetGeometryRef(self.c_feature) };
        if c_geometry.is_null() {
            return f(None);
        }
        let geometry = unsafe { OgrGeometry::borrowed(c_geometry) };
        f(Some(&geometry))
    }

    fn set_geometry_directly(&mut self, geometry: Self::Geometry) -> Result<()> {
        if !geometry.owned {
            return Err(VectorError::BadArgument(
                "a borrowed geometry cannot be moved into a feature".to_string(),
            ));
        }
        let rv =
            unsafe { gdal_sys::OGR_F_SetGeometryDirectly(self.c_feature, geometry.c_geometry) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(_last_store_err("OGR_F_SetGeometryDirectly"));
        }
        geometry.into_c_geometry();
        Ok(())
    }
}

/// An OGR layer. The layer itself stays owned by its dataset.
#[derive(Debug)]
pub struct OgrStore {
    c_layer: OGRLayerH,
    capabilities: StoreCapabilities,
    encoding: &'static Encoding,
}

impl OgrStore {
    /// Wraps a layer, probing its capabilities.
    ///
    /// # Safety
    /// `c_layer` must be a valid layer whose dataset outlives the returned store.
    pub unsafe fn from_c_layer(c_layer: OGRLayerH) -> OgrStore {
        let probes: [(&CStr, StoreCapabilities); 5] = [
            (c"FastSetNextByIndex", StoreCapabilities::FAST_SEEK),
            (c"FastFeatureCount", StoreCapabilities::FAST_FEATURE_COUNT),
            (c"RandomRead", StoreCapabilities::RANDOM_READ),
            (c"Transactions", StoreCapabilities::TRANSACTIONS),
            (c"SequentialWrite", StoreCapabilities::SEQUENTIAL_WRITE),
        ];
        let mut capabilities = StoreCapabilities::empty();
        for (name, flag) in probes {
            if gdal_sys::OGR_L_TestCapability(c_layer, name.as_ptr()) != 0 {
                capabilities |= flag;
            }
        }
        OgrStore {
            c_layer,
            capabilities,
            encoding: encoding_rs::UTF_8,
        }
    }

    /// Adds capabilities OGR cannot report per layer, such as [`StoreCapabilities::TIMEZONES`]
    /// for formats known to keep offsets.
    pub fn with_extra_capabilities(mut self, capabilities: StoreCapabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Sets the encoding string fields are stored in, for layers not reporting UTF-8.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn c_layer(&self) -> OGRLayerH {
        self.c_layer
    }

    fn transaction_result(rv: OGRErr::Type, method_name: &'static str) -> Result<()> {
        if rv != OGRErr::OGRERR_NONE {
            return Err(VectorError::TransactionError {
                method_name,
                msg: _string(unsafe { gdal_sys::CPLGetLastErrorMsg() }),
            });
        }
        Ok(())
    }
}

impl NativeStore for OgrStore {
    type Geometry = OgrGeometry;
    type Feature = OgrFeature;

    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    fn text_encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn geometry_type(&self) -> GeometryTypeCode {
        GeometryTypeCode::from_native(unsafe { gdal_sys::OGR_L_GetGeomType(self.c_layer) })
    }

    fn field_defns(&self) -> Vec<NativeFieldDefn> {
        let c_defn = unsafe { gdal_sys::OGR_L_GetLayerDefn(self.c_layer) };
        if c_defn.is_null() {
            return Vec::new();
        }
        let count = unsafe { gdal_sys::OGR_FD_GetFieldCount(c_defn) };
        (0..count)
            .filter_map(|i| {
                let c_field = unsafe { gdal_sys::OGR_FD_GetFieldDefn(c_defn, i) };
                if c_field.is_null() {
                    return None;
                }
                Some(unsafe {
                    NativeFieldDefn {
                        name: _string(gdal_sys::OGR_Fld_GetNameRef(c_field)),
                        type_code: gdal_sys::OGR_Fld_GetType(c_field),
                        subtype_code: gdal_sys::OGR_Fld_GetSubType(c_field),
                        width: gdal_sys::OGR_Fld_GetWidth(c_field),
                        precision: gdal_sys::OGR_Fld_GetPrecision(c_field),
                    }
                })
            })
            .collect()
    }

    fn feature_count(&mut self, force: bool) -> Option<u64> {
        let count = unsafe { gdal_sys::OGR_L_GetFeatureCount(self.c_layer, force as c_int) };
        u64::try_from(count).ok()
    }

    fn reset_reading(&mut self) {
        unsafe { gdal_sys::OGR_L_ResetReading(self.c_layer) };
    }

    fn seek_to_index(&mut self, index: u64) -> Result<bool> {
        let index = i64::try_from(index)
            .map_err(|_| VectorError::BadArgument(format!("cannot seek to record {index}")))?;
        let rv = unsafe { gdal_sys::OGR_L_SetNextByIndex(self.c_layer, index) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(_last_store_err("OGR_L_SetNextByIndex"));
        }
        Ok(true)
    }

    fn next_record(&mut self) -> Result<Option<Self::Feature>> {
        let c_feature = unsafe { gdal_sys::OGR_L_GetNextFeature(self.c_layer) };
        if c_feature.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { OgrFeature::from_c_feature(c_feature) }))
    }

    fn feature_by_id(&mut self, fid: u64) -> Result<Option<Self::Feature>> {
        let fid = i64::try_from(fid)
            .map_err(|_| VectorError::BadArgument(format!("invalid feature id {fid}")))?;
        let c_feature = unsafe { gdal_sys::OGR_L_GetFeature(self.c_layer, fid) };
        if c_feature.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { OgrFeature::from_c_feature(c_feature) }))
    }

    fn set_spatial_filter_rect(&mut self, bbox: Option<Bbox>) {
        match bbox {
            Some(b) => unsafe {
                gdal_sys::OGR_L_SetSpatialFilterRect(
                    self.c_layer,
                    b.min_x,
                    b.min_y,
                    b.max_x,
                    b.max_y,
                )
            },
            None => unsafe { gdal_sys::OGR_L_SetSpatialFilter(self.c_layer, ptr::null_mut()) },
        }
    }

    fn set_spatial_filter(&mut self, geometry: Option<&Self::Geometry>) {
        let c_geometry = geometry.map_or(ptr::null_mut(), OgrGeometry::c_geometry);
        unsafe { gdal_sys::OGR_L_SetSpatialFilter(self.c_layer, c_geometry) };
    }

    fn set_attribute_filter(&mut self, predicate: Option<&str>) -> Result<()> {
        let c_predicate = predicate.map(CString::new).transpose()?;
        let rv = unsafe {
            gdal_sys::OGR_L_SetAttributeFilter(
                self.c_layer,
                c_predicate.as_ref().map_or(ptr::null(), |p| p.as_ptr()),
            )
        };
        if rv != OGRErr::OGRERR_NONE {
            return Err(VectorError::AttributeFilterError {
                filter: predicate.unwrap_or_default().to_string(),
                msg: _string(unsafe { gdal_sys::CPLGetLastErrorMsg() }),
            });
        }
        Ok(())
    }

    fn create_feature_handle(&self) -> Result<Self::Feature> {
        let c_feature =
            unsafe { gdal_sys::OGR_F_Create(gdal_sys::OGR_L_GetLayerDefn(self.c_layer)) };
        if c_feature.is_null() {
            return Err(_last_null_pointer_err("OGR_F_Create"));
        }
        Ok(unsafe { OgrFeature::from_c_feature(c_feature) })
    }

    fn write_feature(&mut self, feature: &mut Self::Feature) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_CreateFeature(self.c_layer, feature.c_feature) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(_last_store_err("OGR_L_CreateFeature"));
        }
        Ok(())
    }

    fn start_transaction(&mut self) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_StartTransaction(self.c_layer) };
        OgrStore::transaction_result(rv, "OGR_L_StartTransaction")
    }

    fn commit_transaction(&mut self) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_CommitTransaction(self.c_layer) };
        OgrStore::transaction_result(rv, "OGR_L_CommitTransaction")
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_RollbackTransaction(self.c_layer) };
        OgrStore::transaction_result(rv, "OGR_L_RollbackTransaction")
    }
}
