pub mod files;
pub mod tryon;
