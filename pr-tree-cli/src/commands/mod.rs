//! CLI command implementations

pub mod external;
pub mod tree;

pub use tree::TreeArgs;
