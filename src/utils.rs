use std::ffi::{c_char, CStr};

use crate::errors::VectorError;

/// Copies a NUL terminated C string, byte for byte. Returns an empty vector for NULL.
pub fn _bytes(raw_ptr: *const c_char) -> Vec<u8> {
    if raw_ptr.is_null() {
        return Vec::new();
    }
    let c_str = unsafe { CStr::from_ptr(raw_ptr) };
    c_str.to_bytes().to_vec()
}

pub fn _string(raw_ptr: *const c_char) -> String {
    String::from_utf8_lossy(&_bytes(raw_ptr)).into_owned()
}

/// Copies a NULL terminated array of C strings.
pub fn _bytes_array(raw_ptr: *mut *mut c_char) -> Vec<Vec<u8>> {
    let mut ret_val: Vec<Vec<u8>> = vec![];
    if raw_ptr.is_null() {
        return ret_val;
    }
    let mut i = 0;
    unsafe {
        loop {
            let next = raw_ptr.add(i).read();
            if next.is_null() {
                break;
            }
            ret_val.push(_bytes(next));
            i += 1;
        }
    }
    ret_val
}

fn _last_err_msg() -> String {
    let last_err_msg = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    unsafe { gdal_sys::CPLErrorReset() };
    last_err_msg
}

pub fn _last_null_pointer_err(method_name: &'static str) -> VectorError {
    VectorError::NullPointer {
        method_name,
        msg: _last_err_msg(),
    }
}

pub fn _last_store_err(method_name: &'static str) -> VectorError {
    VectorError::StoreError {
        method_name,
        msg: _last_err_msg(),
    }
}
