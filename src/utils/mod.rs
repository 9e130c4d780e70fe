pub mod constants;
pub mod mime;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{
    extension_of, file_name_of, is_fetchable_url, join_relative, parent_dir, relative_to,
    resolve_url, strip_suffix_part,
};
