//! IO helper: safe file read/write for JSON

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::store::StoreError;

/// 读取文本文件；文件不存在时返回 Ok(None)
pub fn read_text_file(p: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(p) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// 按固定缩进格式化 JSON（键顺序保持文档中的顺序）
pub fn to_pretty_string(value: &Value, indent: usize) -> Result<String, StoreError> {
    let indent = vec![b' '; indent];
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent));
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| StoreError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// 写入文本文件；`create_parents` 为 true 时先创建上级目录
pub fn write_text_file(p: &Path, text: &str, create_parents: bool) -> Result<(), StoreError> {
    if create_parents {
        if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }
    let mut w = BufWriter::new(File::create(p)?);
    w.write_all(text.as_bytes())?;
    w.flush()?;
    Ok(())
}

/// 删除文件；文件不存在时返回 Ok(false)
pub fn remove_file(p: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(p) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
