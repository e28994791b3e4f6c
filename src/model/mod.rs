pub mod document;
pub mod keypath;
pub mod performance;
pub mod shadow_tree;
