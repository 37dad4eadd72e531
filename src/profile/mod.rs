pub mod record;
pub mod source;

pub use record::{Profile, ProfileValue};
pub use source::{BlobProfileSource, FileProfileSource, ProfileSource};
