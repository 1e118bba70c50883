pub mod file;
pub mod seed;
pub mod store;
pub mod tree;

pub use file::DomainFile;
pub use store::DomainStore;
pub use tree::DomainTree;
