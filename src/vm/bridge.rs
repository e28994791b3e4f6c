//! VM桥接层：数据层向外部报告进度与错误时使用的消息文本
//!
//! Store 与编辑会话统一从这里取消息前缀，调用方（及测试）可据此匹配通知内容

// === 常量定义（消除魔法值） ===
pub const MSG_FILE_NOT_FOUND: &str = "文件不存在";
pub const MSG_FILE_CREATED: &str = "已创建文件";
pub const MSG_NOT_JSON: &str = "文件无法解析为JSON";
pub const MSG_READ_FAILED: &str = "读取失败";
pub const MSG_DATA_EXISTS: &str = "JSON文件中已有数据，未写入新数据";
pub const MSG_WRITTEN: &str = "已写入JSON文件";
pub const MSG_WRITE_FAILED: &str = "写入失败";
pub const MSG_JSON_CREATED: &str = "已创建新的JSON文件";
pub const MSG_TEXT_EXISTS: &str = "文件中已有文本，未创建JSON";
pub const MSG_REMOVED: &str = "已删除文件";
pub const MSG_REMOVE_FAILED: &str = "删除失败";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

/// 拼接 "前缀: 资源" 形式的消息
pub fn message(prefix: &str, resource: &str) -> String {
    format!("{}: {}", prefix, resource)
}
