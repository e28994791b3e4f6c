//! KeyPath：斜杠分隔的键路径，数组下标以 `[i]` 后缀附着在前一段上
//!
//! 字符串形式示例：`users/0/tags[2]`、`[0]/name`、`grid[1][2]`。
//! 空字符串表示根路径。

use std::fmt;
use std::str::FromStr;

use crate::model::document::DocError;

/// 路径中的单个段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// 对象字段名
    Key(String),
    /// 数组下标
    Index(usize),
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::Key(s.to_string())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment::Key(s)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// 由段组成的完整路径；段向量为空即根
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// 追加字段段，返回新路径
    pub fn key(&self, k: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Key(k.into()));
        next
    }

    /// 追加下标段，返回新路径
    pub fn index(&self, i: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Index(i));
        next
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// 父路径（根的父路径为 None）
    pub fn parent(&self) -> Option<KeyPath> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// 拆成父路径与最后一段
    pub fn split_last(&self) -> Option<(KeyPath, &Segment)> {
        let (last, rest) = self.segments.split_last()?;
        Some((Self::from_segments(rest.to_vec()), last))
    }

    /// 判断 self 是否以 prefix 开头（按段比较）
    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// 解析字符串形式的键路径
    pub fn parse(s: &str) -> Result<Self, DocError> {
        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self::root());
        }

        for (part_idx, part) in s.split('/').enumerate() {
            if part.is_empty() {
                return Err(DocError::InvalidKeyPath(format!("空路径段: {:?}", s)));
            }

            // 字段名部分：第一个 '[' 之前
            let (name, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if name.contains(']') {
                return Err(DocError::InvalidKeyPath(format!("多余的 ']': {:?}", s)));
            }
            if !name.is_empty() {
                segments.push(Segment::Key(name.to_string()));
            } else if part_idx > 0 {
                // 非首段必须以字段名开头：`a/[0]` 无法区分所属
                return Err(DocError::InvalidKeyPath(format!("下标缺少所属字段: {:?}", s)));
            }

            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(DocError::InvalidKeyPath(format!("下标后存在多余内容: {:?}", s)));
                };
                let close = inner
                    .find(']')
                    .ok_or_else(|| DocError::InvalidKeyPath(format!("下标未闭合: {:?}", s)))?;
                let digits = &inner[..close];
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| DocError::InvalidKeyPath(format!("非法下标 {:?}: {:?}", digits, s)))?;
                segments.push(Segment::Index(index));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Key(k) => {
                    if i > 0 {
                        f.write_str("/")?;
                    }
                    f.write_str(k)?;
                }
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for KeyPath {
    type Error = DocError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Vec<Segment>> for KeyPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self::from_segments(segments)
    }
}

/// 允许文档方法同时接收字符串与 KeyPath
pub trait AsKeyPath {
    fn to_keypath(&self) -> Result<KeyPath, DocError>;
}

impl AsKeyPath for KeyPath {
    fn to_keypath(&self) -> Result<KeyPath, DocError> {
        Ok(self.clone())
    }
}

impl AsKeyPath for &KeyPath {
    fn to_keypath(&self) -> Result<KeyPath, DocError> {
        Ok((*self).clone())
    }
}

impl AsKeyPath for &str {
    fn to_keypath(&self) -> Result<KeyPath, DocError> {
        KeyPath::parse(self)
    }
}

impl AsKeyPath for String {
    fn to_keypath(&self) -> Result<KeyPath, DocError> {
        KeyPath::parse(self)
    }
}

impl AsKeyPath for &String {
    fn to_keypath(&self) -> Result<KeyPath, DocError> {
        KeyPath::parse(self)
    }
}

/// 将 JSONPath 规范化路径（`$['a'][0]`）转换为 KeyPath
pub fn from_normalized_jsonpath(p: &str) -> Result<KeyPath, DocError> {
    let invalid = || DocError::JsonPath(format!("无法解析规范化路径: {}", p));
    let mut rest = p.strip_prefix('$').ok_or_else(invalid)?;
    let mut segments = Vec::new();

    while !rest.is_empty() {
        rest = rest.strip_prefix('[').ok_or_else(invalid)?;
        let quote = rest.chars().next().ok_or_else(invalid)?;
        if quote == '\'' || quote == '"' {
            // 带引号的字段名，支持反斜杠转义
            let mut key = String::new();
            let mut chars = rest[1..].char_indices();
            let mut end = None;
            while let Some((i, ch)) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            key.push(escaped);
                        }
                    }
                    c if c == quote => {
                        end = Some(i);
                        break;
                    }
                    c => key.push(c),
                }
            }
            let end = end.ok_or_else(invalid)?;
            // 1 (引号) + end + 1 (闭合引号)
            rest = rest[end + 2..].strip_prefix(']').ok_or_else(invalid)?;
            segments.push(Segment::Key(key));
        } else {
            let close = rest.find(']').ok_or_else(invalid)?;
            let index = rest[..close].trim().parse::<usize>().map_err(|_| invalid())?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
        }
    }

    Ok(KeyPath::from_segments(segments))
}
