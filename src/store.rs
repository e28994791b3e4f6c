//! JSON Store：从资源加载 JSON 文档、持久化文档
//!
//! 所有 IO 错误都在这一层被吸收：转换为通知消息加默认值，不向调用方抛出。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::StoreConfig;
use crate::utils::fs::{read_text_file, remove_file, to_pretty_string, write_text_file};
use crate::vm::bridge::*;
use crate::vm::notifier::Notifier;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 文档持久化接口
pub trait JsonStore {
    /// 加载资源；缺失、损坏或不可读时返回空对象并发出错误通知
    fn load(&self, resource: &str) -> Value;

    /// 写入格式化 JSON。资源已有非空内容且 `overwrite` 为 false 时不写入，返回 false。
    fn save(&self, value: &Value, resource: &str, overwrite: bool) -> bool;

    /// 创建内容为 `{}` 的资源
    fn create(&self, resource: &str, overwrite: bool) -> bool;

    /// 以固定缩进重新格式化资源；资源无法解析时不做修改
    fn prettify(&self, resource: &str) -> bool;

    fn remove(&self, resource: &str) -> bool;

    fn exists(&self, resource: &str) -> bool;
}

impl<S: JsonStore + ?Sized> JsonStore for &S {
    fn load(&self, resource: &str) -> Value {
        (**self).load(resource)
    }

    fn save(&self, value: &Value, resource: &str, overwrite: bool) -> bool {
        (**self).save(value, resource, overwrite)
    }

    fn create(&self, resource: &str, overwrite: bool) -> bool {
        (**self).create(resource, overwrite)
    }

    fn prettify(&self, resource: &str) -> bool {
        (**self).prettify(resource)
    }

    fn remove(&self, resource: &str) -> bool {
        (**self).remove(resource)
    }

    fn exists(&self, resource: &str) -> bool {
        (**self).exists(resource)
    }
}

/// 文本读写后端：文件系统或内存
pub trait TextBackend {
    /// 资源不存在时返回 Ok(None)
    fn read_text(&self, resource: &str) -> Result<Option<String>, StoreError>;
    fn write_text(&self, resource: &str, text: &str, create_parents: bool) -> Result<(), StoreError>;
    /// 资源不存在时返回 Ok(false)
    fn remove_text(&self, resource: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FileBackend;

impl TextBackend for FileBackend {
    fn read_text(&self, resource: &str) -> Result<Option<String>, StoreError> {
        read_text_file(Path::new(resource))
    }

    fn write_text(&self, resource: &str, text: &str, create_parents: bool) -> Result<(), StoreError> {
        write_text_file(Path::new(resource), text, create_parents)
    }

    fn remove_text(&self, resource: &str) -> Result<bool, StoreError> {
        remove_file(Path::new(resource))
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RefCell<BTreeMap<String, String>>,
}

impl TextBackend for MemoryBackend {
    fn read_text(&self, resource: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(resource).cloned())
    }

    fn write_text(&self, resource: &str, text: &str, _create_parents: bool) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(resource.to_string(), text.to_string());
        Ok(())
    }

    fn remove_text(&self, resource: &str) -> Result<bool, StoreError> {
        Ok(self.entries.borrow_mut().remove(resource).is_some())
    }
}

/// 基于文本后端的 JSON Store
#[derive(Debug)]
pub struct TextJsonStore<B: TextBackend, N: Notifier> {
    backend: B,
    notifier: N,
    config: StoreConfig,
}

/// 本地磁盘上的 JSON 文件，资源标识即文件路径
pub type FileJsonStore<N> = TextJsonStore<FileBackend, N>;

/// 内存中的 JSON 资源，资源标识即映射键
pub type MemoryJsonStore<N> = TextJsonStore<MemoryBackend, N>;

impl<N: Notifier> TextJsonStore<FileBackend, N> {
    pub fn new(notifier: N) -> Self {
        Self::with_config(FileBackend, notifier, StoreConfig::default())
    }
}

impl<N: Notifier> TextJsonStore<MemoryBackend, N> {
    pub fn new(notifier: N) -> Self {
        Self::with_config(MemoryBackend::default(), notifier, StoreConfig::default())
    }

    /// 直接放入原始文本（不经过校验）
    pub fn insert_text(&self, resource: &str, text: &str) {
        self.backend
            .entries
            .borrow_mut()
            .insert(resource.to_string(), text.to_string());
    }

    pub fn text(&self, resource: &str) -> Option<String> {
        self.backend.entries.borrow().get(resource).cloned()
    }
}

/// 已有内容判定：空白文本与 null、{}、[] 视为空；无法解析的非空文本视为有内容
fn has_content(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) => false,
        Ok(Value::Object(m)) => !m.is_empty(),
        Ok(Value::Array(a)) => !a.is_empty(),
        Ok(_) => true,
        Err(_) => true,
    }
}

impl<B: TextBackend, N: Notifier> TextJsonStore<B, N> {
    pub fn with_config(backend: B, notifier: N, config: StoreConfig) -> Self {
        Self {
            backend,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn empty_json(&self) -> String {
        to_pretty_string(&Value::Object(Map::new()), self.config.indent).unwrap_or_else(|_| "{}".to_string())
    }

    /// 读取并解析资源，错误原样返回
    pub fn try_load(&self, resource: &str) -> Result<Option<Value>, StoreError> {
        match self.backend.read_text(resource)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn report_error(&self, prefix: &str, resource: &str, err: &StoreError) {
        let msg = format!("{}: {}", message(prefix, resource), err);
        tracing::error!("{}", msg);
        self.notifier.error(&msg);
    }

    fn report_info(&self, prefix: &str, resource: &str) {
        let msg = message(prefix, resource);
        tracing::info!("{}", msg);
        self.notifier.info(&msg);
    }
}

impl<B: TextBackend, N: Notifier> JsonStore for TextJsonStore<B, N> {
    fn load(&self, resource: &str) -> Value {
        match self.try_load(resource) {
            Ok(Some(value)) => value,
            Ok(None) => {
                let msg = message(MSG_FILE_NOT_FOUND, resource);
                tracing::warn!("{}", msg);
                self.notifier.error(&msg);
                if self.config.create_missing {
                    match self.backend.write_text(resource, &self.empty_json(), false) {
                        Ok(()) => self.report_info(MSG_FILE_CREATED, resource),
                        Err(e) => self.report_error(MSG_WRITE_FAILED, resource, &e),
                    }
                }
                Value::Object(Map::new())
            }
            Err(e @ StoreError::Parse(_)) => {
                self.report_error(MSG_NOT_JSON, resource, &e);
                Value::Object(Map::new())
            }
            Err(e) => {
                self.report_error(MSG_READ_FAILED, resource, &e);
                Value::Object(Map::new())
            }
        }
    }

    fn save(&self, value: &Value, resource: &str, overwrite: bool) -> bool {
        if !overwrite {
            match self.backend.read_text(resource) {
                Ok(Some(text)) if has_content(&text) => {
                    self.report_info(MSG_DATA_EXISTS, resource);
                    return false;
                }
                Ok(_) => {}
                Err(e) => {
                    self.report_error(MSG_READ_FAILED, resource, &e);
                    return false;
                }
            }
        }

        let written = to_pretty_string(value, self.config.indent)
            .and_then(|text| self.backend.write_text(resource, &text, overwrite));
        match written {
            Ok(()) => {
                self.report_info(MSG_WRITTEN, resource);
                true
            }
            Err(e) => {
                self.report_error(MSG_WRITE_FAILED, resource, &e);
                false
            }
        }
    }

    fn create(&self, resource: &str, overwrite: bool) -> bool {
        let existing = match self.backend.read_text(resource) {
            Ok(existing) => existing,
            Err(e) => {
                self.report_error(MSG_READ_FAILED, resource, &e);
                return false;
            }
        };
        if let Some(text) = existing {
            if !overwrite && !text.trim().is_empty() {
                self.report_info(MSG_TEXT_EXISTS, resource);
                return false;
            }
        }

        match self.backend.write_text(resource, &self.empty_json(), overwrite) {
            Ok(()) => {
                self.report_info(MSG_JSON_CREATED, resource);
                true
            }
            Err(e) => {
                self.report_error(MSG_WRITE_FAILED, resource, &e);
                false
            }
        }
    }

    fn prettify(&self, resource: &str) -> bool {
        match self.try_load(resource) {
            Ok(Some(value)) => self.save(&value, resource, true),
            Ok(None) => {
                let msg = message(MSG_FILE_NOT_FOUND, resource);
                tracing::warn!("{}", msg);
                self.notifier.error(&msg);
                false
            }
            Err(e) => {
                self.report_error(MSG_NOT_JSON, resource, &e);
                false
            }
        }
    }

    fn remove(&self, resource: &str) -> bool {
        match self.backend.remove_text(resource) {
            Ok(true) => {
                self.report_info(MSG_REMOVED, resource);
                true
            }
            Ok(false) => {
                let msg = message(MSG_FILE_NOT_FOUND, resource);
                tracing::warn!("{}", msg);
                self.notifier.error(&msg);
                false
            }
            Err(e) => {
                self.report_error(MSG_REMOVE_FAILED, resource, &e);
                false
            }
        }
    }

    fn exists(&self, resource: &str) -> bool {
        matches!(self.backend.read_text(resource), Ok(Some(_)))
    }
}
