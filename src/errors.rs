use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorError>;

#[derive(Clone, PartialEq, Debug, Error)]
pub enum VectorError {
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Attribute filter '{filter}' rejected by the store: {msg}")]
    AttributeFilterError { filter: String, msg: String },
    #[error("Transaction method '{method_name}' failed: {msg}")]
    TransactionError {
        method_name: &'static str,
        msg: String,
    },
    #[error("Native method '{method_name}' returned a NULL pointer. Error msg: '{msg}'")]
    NullPointer {
        method_name: &'static str,
        msg: String,
    },
    #[error("Native method '{method_name}' failed: {msg}")]
    StoreError {
        method_name: &'static str,
        msg: String,
    },
    #[error("Bad argument: {0}")]
    BadArgument(String),
    #[error("Invalid field name '{field_name}' used on method {method_name}")]
    InvalidFieldName {
        field_name: String,
        method_name: &'static str,
    },
    #[error("Invalid field index {index} used on method {method_name}")]
    InvalidFieldIndex {
        index: usize,
        method_name: &'static str,
    },
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Empty {0} geometry cannot be represented")]
    EmptyGeometry(&'static str),
    #[error("Invalid {kind} value '{value}'")]
    InvalidDateTime { kind: &'static str, value: String },
    #[error("JSON error: {0}")]
    JsonError(String),
    #[cfg(feature = "ogr")]
    #[error(transparent)]
    FfiNulError(#[from] std::ffi::NulError),
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::JsonError(err.to_string())
    }
}
