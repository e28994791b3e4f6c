//! Notifier：接收人类可读的进度/错误消息，可以是空实现

use std::cell::RefCell;

use crate::vm::bridge::STATUS_ERROR_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Error,
}

pub trait Notifier {
    fn notify(&self, message: &str, level: NotifyLevel);

    fn info(&self, message: &str) {
        self.notify(message, NotifyLevel::Info);
    }

    fn error(&self, message: &str) {
        self.notify(message, NotifyLevel::Error);
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, message: &str, level: NotifyLevel) {
        (**self).notify(message, level);
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, message: &str, level: NotifyLevel) {
        (**self).notify(message, level);
    }
}

/// 转发到 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Info => tracing::info!("{}", message),
            NotifyLevel::Error => tracing::error!("{}{}", STATUS_ERROR_PREFIX, message),
        }
    }
}

/// 丢弃所有消息
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _message: &str, _level: NotifyLevel) {}
}

/// 把消息记录在内存中，便于检查
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: RefCell<Vec<(NotifyLevel, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(NotifyLevel, String)> {
        self.messages.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.with_level(NotifyLevel::Error)
    }

    pub fn infos(&self) -> Vec<String> {
        self.with_level(NotifyLevel::Info)
    }

    fn with_level(&self, level: NotifyLevel) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// 是否存在以 prefix 开头的消息
    pub fn has_message(&self, prefix: &str) -> bool {
        self.messages.borrow().iter().any(|(_, m)| m.starts_with(prefix))
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}
