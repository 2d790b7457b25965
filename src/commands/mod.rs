mod dir;

pub use dir::DirectoryListing;
