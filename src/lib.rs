//! JSON 键路径编辑库
//!
//! 提供按斜杠键路径读写 JSON 文档、查找/计数/去重/清理空值，
//! 以及 JSON 文件的加载、保存与编辑会话

pub mod config;
pub mod editor;
pub mod model;
pub mod store;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use config::{Config, ConfigError, EditorConfig, StoreConfig};
pub use editor::JsonEditor;
pub use model::document::{default_empty_values, DocError, KeyPathDocument};
pub use model::keypath::{AsKeyPath, KeyPath, Segment};
pub use model::shadow_tree::{build_path_index, NodeKind, PathEntry};
pub use store::{FileJsonStore, JsonStore, MemoryJsonStore, StoreError};
pub use vm::notifier::{MemoryNotifier, Notifier, NotifyLevel, SilentNotifier, TracingNotifier};
