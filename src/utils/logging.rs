//! 日志初始化（tracing-subscriber fmt 输出）

use tracing_subscriber::fmt::SubscriberBuilder;

/// 初始化全局日志输出；已初始化过时返回 false
pub fn init_logging(level: tracing::Level) -> bool {
    SubscriberBuilder::default()
        .with_max_level(level)
        .try_init()
        .is_ok()
}
