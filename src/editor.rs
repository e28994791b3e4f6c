//! JsonEditor：编辑会话，把文档与 Store 绑定，结束时按配置写回

use std::ops::{Deref, DerefMut};

use crate::config::EditorConfig;
use crate::model::document::{DocError, KeyPathDocument, Result};
use crate::store::JsonStore;

pub struct JsonEditor<S: JsonStore> {
    doc: KeyPathDocument,
    store: S,
    config: EditorConfig,
    closed: bool,
}

impl<S: JsonStore> JsonEditor<S> {
    /// 打开资源；加载失败时文档为空对象（Store 已发出通知）
    pub fn open(store: S, resource: &str, config: EditorConfig) -> Self {
        let doc = KeyPathDocument::load(&store, resource);
        tracing::info!("编辑会话已打开: {}", resource);
        Self {
            doc,
            store,
            config,
            closed: false,
        }
    }

    pub fn document(&self) -> &KeyPathDocument {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut KeyPathDocument {
        &mut self.doc
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn source_id(&self) -> Result<String> {
        self.doc
            .source()
            .map(str::to_string)
            .ok_or_else(|| DocError::State("来源路径未设置".into()))
    }

    /// 从来源资源重新加载，丢弃未保存的修改
    pub fn reload(&mut self) -> Result<()> {
        let source = self.source_id()?;
        self.doc = KeyPathDocument::load(&self.store, &source);
        Ok(())
    }

    /// 切换到另一个资源（当前文档不会自动写回）
    pub fn open_other(&mut self, resource: &str) {
        self.doc = KeyPathDocument::load(&self.store, resource);
        tracing::info!("编辑会话切换到: {}", resource);
    }

    /// 按 `config.overwrite` 保存到来源资源
    pub fn save(&self) -> Result<bool> {
        self.doc.save(&self.store, self.config.overwrite)
    }

    /// 删除来源资源；之后关闭会话时若 `write_on_close` 仍会重新写出
    pub fn remove_source(&self) -> Result<bool> {
        let source = self.source_id()?;
        Ok(self.store.remove(&source))
    }

    fn persist_on_close(&self) -> Result<bool> {
        if !self.config.write_on_close {
            return Ok(false);
        }
        self.doc.save(&self.store, true)
    }

    /// 结束会话；`write_on_close` 时强制写回
    pub fn close(mut self) -> Result<bool> {
        self.closed = true;
        self.persist_on_close()
    }
}

impl<S: JsonStore> Deref for JsonEditor<S> {
    type Target = KeyPathDocument;

    fn deref(&self) -> &Self::Target {
        &self.doc
    }
}

impl<S: JsonStore> DerefMut for JsonEditor<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.doc
    }
}

impl<S: JsonStore> Drop for JsonEditor<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.persist_on_close() {
            tracing::error!("编辑会话写回失败: {}", e);
        }
    }
}
