//! Features Module - Fraud Feature Preprocessing
//!
//! Schema, imputer and encoder artifacts plus the pipeline that chains them.

pub mod encoder;
pub mod imputer;
pub mod layout;
pub mod pipeline;
pub mod record;


// Re-export common types
pub use encoder::{OneHotEncoder, UnknownPolicy};
pub use imputer::{Cell, FillValue, SimpleImputer};
pub use layout::{validate_column_order, FeatureSchema, LayoutInfo, LayoutMismatchError, SchemaError};
pub use pipeline::{Preprocessor, PreprocessingError};
pub use record::{RawValue, TransactionRecord};
