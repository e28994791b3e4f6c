//! 影子树（Shadow Tree）：只存路径与结构信息，不复制值，用于按固定顺序枚举全部键路径

use serde_json::Value;

use crate::model::keypath::KeyPath;

/// JSON 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl NodeKind {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
            Value::String(_) => NodeKind::String,
            Value::Number(_) => NodeKind::Number,
            Value::Bool(_) => NodeKind::Bool,
            Value::Null => NodeKind::Null,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Bool => "bool",
            NodeKind::Null => "null",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathEntry {
    /// 从根到该节点的键路径
    pub path: KeyPath,
    /// 节点类型
    pub kind: NodeKind,
    /// 子元素数量（对象字段数 / 数组长度）
    pub children: u32,
    /// 节点深度（根的直接子节点为 1）
    pub depth: u32,
    /// 轻量预览（字符串截断、数字/布尔/空的简短描述）
    pub preview: String,
}

fn preview_of(v: &Value) -> String {
    match v {
        Value::String(s) => {
            let s = s.trim();
            if s.chars().count() > 32 {
                let truncated: String = s.chars().take(32).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(m) => format!("{{..}} ({} keys)", m.len()),
        Value::Array(a) => format!("[..] ({} items)", a.len()),
    }
}

/// 按先序（深度优先、对象按插入顺序、数组按下标）构建路径索引，不含根节点。
///
/// `include_indices` 为 false 时不进入数组内部，数组本身作为叶子出现。
pub fn build_path_index(root: &Value, include_indices: bool) -> Vec<PathEntry> {
    let mut out = Vec::new();

    fn push_entry(out: &mut Vec<PathEntry>, path: KeyPath, v: &Value, depth: u32) {
        let children = match v {
            Value::Object(m) => m.len() as u32,
            Value::Array(a) => a.len() as u32,
            _ => 0,
        };
        out.push(PathEntry {
            path,
            kind: NodeKind::of(v),
            children,
            depth,
            preview: preview_of(v),
        });
    }

    fn walk(out: &mut Vec<PathEntry>, v: &Value, path: &KeyPath, depth: u32, include_indices: bool) {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    let field_path = path.key(k.as_str());
                    push_entry(out, field_path.clone(), child, depth + 1);
                    walk(out, child, &field_path, depth + 1, include_indices);
                }
            }
            Value::Array(arr) if include_indices => {
                for (idx, child) in arr.iter().enumerate() {
                    let item_path = path.index(idx);
                    push_entry(out, item_path.clone(), child, depth + 1);
                    walk(out, child, &item_path, depth + 1, include_indices);
                }
            }
            _ => {}
        }
    }

    walk(&mut out, root, &KeyPath::root(), 0, include_indices);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(entries: &[PathEntry]) -> Vec<String> {
        entries.iter().map(|e| e.path.to_string()).collect()
    }

    #[test]
    fn test_simple_object_index() {
        let json = json!({
            "name": "测试",
            "age": 30
        });

        let index = build_path_index(&json, true);

        // 根节点不在索引中
        assert_eq!(index.len(), 2);
        assert_eq!(paths(&index), vec!["name", "age"], "对象字段应保持插入顺序");
        assert_eq!(index[0].kind, NodeKind::String);
        assert_eq!(index[1].kind, NodeKind::Number);
        assert_eq!(index[0].depth, 1);
    }

    #[test]
    fn test_nested_preorder() {
        let json = json!({
            "user": {
                "profile": {
                    "name": "张三"
                },
                "tags": ["a", "b"]
            },
            "z": 1
        });

        let index = build_path_index(&json, true);
        assert_eq!(
            paths(&index),
            vec!["user", "user/profile", "user/profile/name", "user/tags", "user/tags[0]", "user/tags[1]", "z"]
        );
        assert_eq!(index[2].depth, 3);
        assert_eq!(index[3].children, 2);
    }

    #[test]
    fn test_without_indices_arrays_are_leaves() {
        let json = json!({
            "items": [
                "第一项",
                {"id": 1},
                [1, 2, 3]
            ],
            "meta": {"count": 3}
        });

        let index = build_path_index(&json, false);
        assert_eq!(paths(&index), vec!["items", "meta", "meta/count"]);
        assert_eq!(index[0].kind, NodeKind::Array);
    }

    #[test]
    fn test_nested_arrays_and_root_array() {
        let json = json!([[1, 2], {"k": [true]}]);

        let index = build_path_index(&json, true);
        assert_eq!(
            paths(&index),
            vec!["[0]", "[0][0]", "[0][1]", "[1]", "[1]/k", "[1]/k[0]"]
        );
    }

    #[test]
    fn test_scalar_root_has_no_entries() {
        assert!(build_path_index(&json!(42), true).is_empty());
    }

    #[test]
    fn test_node_preview_generation() {
        let json = json!({
            "short_string": "短文本",
            "long_string": "这是一个非常长的字符串，应该被截断以便在预览中显示，不应该显示完整内容",
            "number": 42,
            "boolean": true,
            "null_value": null,
            "object": {"nested": "value"},
            "array": [1, 2, 3, 4, 5]
        });

        let index = build_path_index(&json, false);

        for entry in &index {
            match entry.path.to_string().as_str() {
                "short_string" => assert_eq!(entry.preview, "\"短文本\""),
                "long_string" => assert!(entry.preview.contains("...")),
                "number" => assert_eq!(entry.preview, "42"),
                "boolean" => assert_eq!(entry.preview, "true"),
                "null_value" => assert_eq!(entry.preview, "null"),
                "object" => assert_eq!(entry.preview, "{..} (1 keys)"),
                "array" => assert_eq!(entry.preview, "[..] (5 items)"),
                _ => {}
            }
        }
    }
}
