pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{ConverterError, ConverterResult, ValidationError};
pub use validation::{validate_options, validate_resize};
pub use formats::{
    ImageFormat,
    extension_for,
    content_type_from_file_name,
    is_accepted_content_type,
};
pub use fs::{
    FileHost,
    LocalFileHost,
    ensure_parent_dir,
    format_size,
};
