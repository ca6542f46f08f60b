pub mod directory;
pub mod source;
pub mod static_source;

pub use directory::DirectorySource;
pub use source::MessageSource;
pub use static_source::StaticSource;
