mod config;
mod extract;
mod record;
mod report;
mod value;

pub use config::{Column, DEFAULT_BRANCH, DEFAULT_DELIVERY_HOST, FieldConfig, validate_config};
pub use extract::{KEY_SEPARATOR, PATH_SEPARATOR, extract, resolve_path, storage_key};
pub use record::RawRecord;
pub use value::{PopulatedReference, ReferenceValue, ValueLoad, load_value, validate_value};
