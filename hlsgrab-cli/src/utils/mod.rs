mod files;
mod headers;
pub mod progress;

// Export utility functions
pub use self::files::expand_name_template;
pub use self::headers::parse_headers;
