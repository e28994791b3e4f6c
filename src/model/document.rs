//! KeyPathDocument：内存中的 JSON 树，按键路径读写、查找、计数、去重与清理空值

use jsonpath_rust::JsonPath;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::keypath::{from_normalized_jsonpath, AsKeyPath, KeyPath, Segment};
use crate::model::shadow_tree::{build_path_index, NodeKind, PathEntry};
use crate::store::JsonStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocError {
    #[error("路径不存在: {0}")]
    NotFound(String),
    #[error("指定保留的路径不在匹配结果中: {0}")]
    KeypathNotFound(String),
    #[error("类型冲突: {path} 需要 {expected}，实际为 {found}")]
    TypeConflict {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("下标越界: {path} 下标 {index}，长度 {len}")]
    IndexOutOfRange { path: String, index: usize, len: usize },
    #[error("非法键路径: {0}")]
    InvalidKeyPath(String),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, DocError>;

/// 默认视为"空"的值：null、{}、[]。空字符串不算空。
pub fn default_empty_values() -> Vec<Value> {
    vec![Value::Null, Value::Object(Map::new()), Value::Array(Vec::new())]
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPathDocument {
    root: Value,
    source: Option<String>,
}

impl Default for KeyPathDocument {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

fn resolve<'a>(root: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, seg| match (node, seg) {
            (Value::Object(m), Segment::Key(k)) => m.get(k),
            (Value::Array(a), Segment::Index(i)) => a.get(*i),
            _ => None,
        })
}

fn resolve_mut<'a>(root: &'a mut Value, path: &KeyPath) -> Option<&'a mut Value> {
    let mut node = root;
    for seg in path.segments() {
        node = match (node, seg) {
            (Value::Object(m), Segment::Key(k)) => m.get_mut(k)?,
            (Value::Array(a), Segment::Index(i)) => a.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(node)
}

/// 赋值时为缺失节点创建的空容器，类型由下一段决定
fn empty_container_for(next: &Segment) -> Value {
    match next {
        Segment::Key(_) => Value::Object(Map::new()),
        Segment::Index(_) => Value::Array(Vec::new()),
    }
}

fn expected_for(seg: &Segment) -> &'static str {
    match seg {
        Segment::Key(_) => "object",
        Segment::Index(_) => "array",
    }
}

impl KeyPathDocument {
    pub fn new(root: Value) -> Self {
        Self { root, source: None }
    }

    pub fn with_source(root: Value, source: impl Into<String>) -> Self {
        Self {
            root,
            source: Some(source.into()),
        }
    }

    /// 通过 Store 加载文档；Store 负责处理缺失/损坏的资源（返回空对象并通知）
    pub fn load<S: JsonStore + ?Sized>(store: &S, resource: &str) -> Self {
        let root = store.load(resource);
        tracing::debug!("文档已加载: {}", resource);
        Self::with_source(root, resource)
    }

    /// 保存到来源资源
    pub fn save<S: JsonStore + ?Sized>(&self, store: &S, overwrite: bool) -> Result<bool> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| DocError::State("来源路径未设置".into()))?;
        Ok(store.save(&self.root, source, overwrite))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// 整体替换根节点
    pub fn replace_root(&mut self, root: Value) {
        self.root = root;
    }

    /// 按路径取值。None 表示路径不存在；存在的 null 返回 Some(Value::Null)。
    pub fn get<P: AsKeyPath>(&self, path: P) -> Option<&Value> {
        let kp = path.to_keypath().ok()?;
        resolve(&self.root, &kp)
    }

    pub fn get_mut<P: AsKeyPath>(&mut self, path: P) -> Option<&mut Value> {
        let kp = path.to_keypath().ok()?;
        resolve_mut(&mut self.root, &kp)
    }

    pub fn contains<P: AsKeyPath>(&self, path: P) -> bool {
        self.get(path).is_some()
    }

    /// 在写入前检查整条路径，保证出错时文档不被修改
    fn check_assignable(&self, kp: &KeyPath) -> Result<()> {
        let segments = kp.segments();
        let mut node = Some(&self.root);

        for (depth, seg) in segments.iter().enumerate() {
            let here = || KeyPath::from_segments(segments[..depth].to_vec()).to_string();
            node = match node {
                // 该层将被新建为空容器
                None => {
                    if let Segment::Index(i) = seg {
                        if *i != 0 {
                            return Err(DocError::IndexOutOfRange {
                                path: here(),
                                index: *i,
                                len: 0,
                            });
                        }
                    }
                    None
                }
                Some(Value::Object(m)) => match seg {
                    Segment::Key(k) => m.get(k),
                    Segment::Index(_) => {
                        return Err(DocError::TypeConflict {
                            path: here(),
                            expected: "array",
                            found: "object",
                        })
                    }
                },
                Some(Value::Array(a)) => match seg {
                    Segment::Index(i) if *i <= a.len() => a.get(*i),
                    Segment::Index(i) => {
                        return Err(DocError::IndexOutOfRange {
                            path: here(),
                            index: *i,
                            len: a.len(),
                        })
                    }
                    Segment::Key(_) => {
                        return Err(DocError::TypeConflict {
                            path: here(),
                            expected: "object",
                            found: "array",
                        })
                    }
                },
                Some(scalar) => {
                    return Err(DocError::TypeConflict {
                        path: here(),
                        expected: expected_for(seg),
                        found: NodeKind::of(scalar).name(),
                    })
                }
            };
        }
        Ok(())
    }

    /// 在路径处赋值，必要时创建中间对象/数组。
    ///
    /// 下标等于数组长度时追加；经过标量、对象用下标或数组用字段名都返回 TypeConflict。
    pub fn set<P: AsKeyPath>(&mut self, path: P, value: Value) -> Result<()> {
        let kp = path.to_keypath()?;
        self.check_assignable(&kp)?;

        let Some((last, init)) = kp.segments().split_last() else {
            self.root = value;
            return Ok(());
        };

        let conflict = || DocError::TypeConflict {
            path: kp.to_string(),
            expected: "container",
            found: "scalar",
        };

        let mut node = &mut self.root;
        for (i, seg) in init.iter().enumerate() {
            let next = init.get(i + 1).unwrap_or(last);
            node = match (node, seg) {
                (Value::Object(m), Segment::Key(k)) => m
                    .entry(k.clone())
                    .or_insert_with(|| empty_container_for(next)),
                (Value::Array(a), Segment::Index(idx)) => {
                    if *idx == a.len() {
                        a.push(empty_container_for(next));
                    }
                    a.get_mut(*idx).ok_or_else(conflict)?
                }
                _ => return Err(conflict()),
            };
        }

        match (node, last) {
            (Value::Object(m), Segment::Key(k)) => {
                m.insert(k.clone(), value);
            }
            (Value::Array(a), Segment::Index(idx)) => {
                if *idx == a.len() {
                    a.push(value);
                } else if let Some(slot) = a.get_mut(*idx) {
                    *slot = value;
                }
            }
            _ => return Err(conflict()),
        }
        Ok(())
    }

    /// 删除路径处的节点并返回它。
    ///
    /// 破坏性操作：删除容器会连同其下所有内容一起删除；删除数组元素会使后续下标前移。
    pub fn delete<P: AsKeyPath>(&mut self, path: P) -> Result<Value> {
        let kp = path.to_keypath()?;
        let Some((parent, last)) = kp.split_last() else {
            return Err(DocError::InvalidKeyPath("不能删除根节点".into()));
        };
        let not_found = || DocError::NotFound(kp.to_string());

        let parent_node = resolve_mut(&mut self.root, &parent).ok_or_else(not_found)?;
        let removed = match (parent_node, last) {
            (Value::Object(m), Segment::Key(k)) => m.shift_remove(k),
            (Value::Array(a), Segment::Index(i)) if *i < a.len() => Some(a.remove(*i)),
            _ => None,
        };
        let removed = removed.ok_or_else(not_found)?;
        tracing::debug!("已删除路径: {}", kp);
        Ok(removed)
    }

    /// 追加到路径处的数组；路径不存在时创建单元素数组。返回新元素的路径。
    pub fn append<P: AsKeyPath>(&mut self, path: P, value: Value) -> Result<KeyPath> {
        let kp = path.to_keypath()?;
        if !self.contains(&kp) {
            self.set(&kp, Value::Array(vec![value]))?;
            return Ok(kp.index(0));
        }

        match resolve_mut(&mut self.root, &kp) {
            Some(Value::Array(a)) => {
                a.push(value);
                Ok(kp.index(a.len() - 1))
            }
            Some(other) => Err(DocError::TypeConflict {
                path: kp.to_string(),
                expected: "array",
                found: NodeKind::of(other).name(),
            }),
            None => Err(DocError::NotFound(kp.to_string())),
        }
    }

    /// 顶层条目数量（对象字段数 / 数组长度），标量根为 0
    pub fn len(&self) -> usize {
        match &self.root {
            Value::Object(m) => m.len(),
            Value::Array(a) => a.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 顶层条目（字段名或下标，值）
    pub fn entries(&self) -> Vec<(Segment, &Value)> {
        match &self.root {
            Value::Object(m) => m.iter().map(|(k, v)| (Segment::Key(k.clone()), v)).collect(),
            Value::Array(a) => a.iter().enumerate().map(|(i, v)| (Segment::Index(i), v)).collect(),
            _ => Vec::new(),
        }
    }

    pub fn path_index(&self, include_indices: bool) -> Vec<PathEntry> {
        build_path_index(&self.root, include_indices)
    }

    /// 先序枚举所有路径（不含根）。该顺序稳定，去重与批量删除都依赖它。
    pub fn all_keypaths(&self, include_indices: bool) -> Vec<KeyPath> {
        build_path_index(&self.root, include_indices)
            .into_iter()
            .map(|entry| entry.path)
            .collect()
    }

    fn matching_paths<F>(&self, under_keypath: Option<&str>, matches: F) -> Vec<KeyPath>
    where
        F: Fn(&Value) -> bool,
    {
        self.all_keypaths(true)
            .into_iter()
            .filter(|kp| under_keypath.map_or(true, |under| kp.to_string().contains(under)))
            .filter(|kp| resolve(&self.root, kp).map_or(false, &matches))
            .collect()
    }

    /// 查找所有值等于 value 的路径（按枚举顺序）。
    ///
    /// `under_keypath` 限定路径字符串须包含该子串；`drop_last_segment` 返回所属容器路径。
    pub fn find_value_paths(&self, value: &Value, under_keypath: Option<&str>, drop_last_segment: bool) -> Vec<KeyPath> {
        let found = self.matching_paths(under_keypath, |v| v == value);
        if !drop_last_segment {
            return found;
        }
        found.into_iter().filter_map(|kp| kp.parent()).collect()
    }

    pub fn find_first_value_path(&self, value: &Value, under_keypath: Option<&str>, drop_last_segment: bool) -> Option<KeyPath> {
        self.find_value_paths(value, under_keypath, drop_last_segment)
            .into_iter()
            .next()
    }

    pub fn count_occurrences(&self, value: &Value, under_keypath: Option<&str>) -> usize {
        self.find_value_paths(value, under_keypath, false).len()
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        self.find_first_value_path(value, None, false).is_some()
    }

    /// 按逆序删除一批（按枚举顺序排列的）路径。
    ///
    /// 先删靠后的路径，数组下标前移只影响已删除的部分，前面的路径保持有效。
    fn delete_in_reverse(&mut self, paths: &[KeyPath]) -> usize {
        let mut deleted = 0;
        for kp in paths.iter().rev() {
            match self.delete(kp) {
                Ok(_) => deleted += 1,
                Err(e) => tracing::warn!("批量删除跳过 {}: {}", kp, e),
            }
        }
        deleted
    }

    pub fn remove_all_occurrences(&mut self, value: &Value, under_keypath: Option<&str>) -> usize {
        let paths = self.find_value_paths(value, under_keypath, false);
        let deleted = self.delete_in_reverse(&paths);
        tracing::info!("已删除 {} 处值 {}", deleted, value);
        deleted
    }

    /// 去重：只保留一处 value，其余按逆序删除。返回删除数量。
    ///
    /// 不指定 `keep_keypath` 时保留第一处。可能留下空容器，需要时再调用 `prune_empty`。
    pub fn deduplicate(&mut self, value: &Value, keep_keypath: Option<&str>, restrict_under_key: Option<&str>) -> Result<usize> {
        let keep = keep_keypath.map(KeyPath::parse).transpose()?;
        self.deduplicate_at(value, keep.as_ref(), restrict_under_key)
    }

    pub fn deduplicate_at(&mut self, value: &Value, keep: Option<&KeyPath>, restrict_under_key: Option<&str>) -> Result<usize> {
        let found = self.find_value_paths(value, restrict_under_key, false);
        if found.len() < 2 {
            tracing::info!("没有重复项: {}", value);
            return Ok(0);
        }
        tracing::info!("发现 {} 处重复: {}", found.len(), value);

        let to_delete: Vec<KeyPath> = match keep {
            None => found[1..].to_vec(),
            Some(keep) => {
                if !found.contains(keep) {
                    return Err(DocError::KeypathNotFound(keep.to_string()));
                }
                found.into_iter().filter(|kp| kp != keep).collect()
            }
        };
        Ok(self.delete_in_reverse(&to_delete))
    }

    /// 删除所有等于 `empty_values` 中某项的节点（默认 null、{}、[]）。
    ///
    /// 单次扫描：因删除而变空的父容器不会在本次调用中被删除。
    pub fn prune_empty(&mut self, restrict_under_keypath: Option<&str>, empty_values: Option<&[Value]>) -> usize {
        let defaults;
        let empty_values = match empty_values {
            Some(values) => values,
            None => {
                defaults = default_empty_values();
                &defaults[..]
            }
        };
        let paths = self.matching_paths(restrict_under_keypath, |v| empty_values.contains(v));
        let deleted = self.delete_in_reverse(&paths);
        tracing::info!("已清理 {} 个空值", deleted);
        deleted
    }

    /// 用 JSONPath 选择节点，返回对应的键路径
    pub fn query_keypaths(&self, json_path: &str) -> Result<Vec<KeyPath>> {
        let paths: Vec<String> = self
            .root
            .query_only_path(json_path)
            .map_err(|e| DocError::JsonPath(e.to_string()))?;
        paths.iter().map(|p| from_normalized_jsonpath(p)).collect()
    }

    pub fn to_pretty_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root).map_err(|e| DocError::State(e.to_string()))
    }
}

impl From<Value> for KeyPathDocument {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(paths: &[KeyPath]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_get_existing_and_missing() {
        let doc = KeyPathDocument::new(json!({"a": {"b": null, "c": [10, 20]}}));

        assert_eq!(doc.get("a/b"), Some(&Value::Null), "存在的 null 应返回 Some(Null)");
        assert_eq!(doc.get("a/c[1]"), Some(&json!(20)));
        assert_eq!(doc.get("a/missing"), None);
        assert_eq!(doc.get("a/c[5]"), None);
        assert_eq!(doc.get("a//"), None, "无法解析的路径视为不存在");
        assert_eq!(doc.get(""), Some(doc.root()), "空路径即根");
    }

    #[test]
    fn test_get_deep_missing_returns_sentinel() {
        let doc = KeyPathDocument::new(json!({"a": {}}));
        assert!(doc.get("a/b/c").is_none());
        assert!(!doc.contains("a/b/c"));
    }

    #[test]
    fn test_contains_agrees_with_get() {
        let doc = KeyPathDocument::new(json!({"x": [1, {"y": false}], "z": null}));
        for p in ["x", "x[0]", "x[1]/y", "z", "x[2]", "y", "x/y", "z/q"] {
            assert_eq!(doc.contains(p), doc.get(p).is_some(), "路径 {}", p);
        }
    }

    #[test]
    fn test_set_then_get() {
        let mut doc = KeyPathDocument::default();
        doc.set("user/name", json!("张三")).unwrap();
        assert_eq!(doc.get("user/name"), Some(&json!("张三")));

        doc.set("user/name", json!({"first": "三"})).unwrap();
        assert_eq!(doc.get("user/name/first"), Some(&json!("三")), "已有值可被覆盖为对象");
    }

    #[test]
    fn test_set_creates_intermediate_containers() {
        let mut doc = KeyPathDocument::default();
        doc.set("a/b/c", json!(1)).unwrap();
        assert_eq!(doc.root(), &json!({"a": {"b": {"c": 1}}}));

        doc.set("list[0]/id", json!(7)).unwrap();
        assert_eq!(doc.get("list"), Some(&json!([{"id": 7}])), "下标段前的缺失节点应创建为数组");

        doc.set("list[1]", json!("tail")).unwrap();
        assert_eq!(doc.get("list[1]"), Some(&json!("tail")), "下标等于长度时追加");
    }

    #[test]
    fn test_set_type_conflict_leaves_document_unchanged() {
        let mut doc = KeyPathDocument::new(json!({"a": 5, "arr": [1], "obj": {}}));
        let before = doc.clone();

        let err = doc.set("a/b", json!(1)).unwrap_err();
        assert!(matches!(err, DocError::TypeConflict { found: "number", .. }));

        assert!(matches!(doc.set("arr/k", json!(1)), Err(DocError::TypeConflict { .. })));
        assert!(matches!(doc.set("obj[0]", json!(1)), Err(DocError::TypeConflict { .. })));
        assert_eq!(doc, before, "失败的赋值不应修改文档");
    }

    #[test]
    fn test_set_index_out_of_range() {
        let mut doc = KeyPathDocument::new(json!({"arr": [1, 2]}));
        let err = doc.set("arr[3]", json!(0)).unwrap_err();
        assert_eq!(
            err,
            DocError::IndexOutOfRange {
                path: "arr".into(),
                index: 3,
                len: 2
            }
        );
        assert!(matches!(doc.set("fresh[2]", json!(0)), Err(DocError::IndexOutOfRange { .. })));
        assert!(!doc.contains("fresh"), "失败时不应创建中间节点");
    }

    #[test]
    fn test_set_root_replaces_document() {
        let mut doc = KeyPathDocument::new(json!({"a": 1}));
        doc.set("", json!([1, 2])).unwrap();
        assert_eq!(doc.root(), &json!([1, 2]));
    }

    #[test]
    fn test_delete_object_key_and_missing() {
        let mut doc = KeyPathDocument::new(json!({"a": 1, "b": {"c": 2}, "d": 3}));
        assert_eq!(doc.delete("b").unwrap(), json!({"c": 2}), "删除容器返回整个子树");
        assert_eq!(doc.root(), &json!({"a": 1, "d": 3}));
        assert_eq!(
            doc.all_keypaths(true).iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            vec!["a", "d"],
            "删除后其余字段保持原顺序"
        );

        assert_eq!(doc.delete("b"), Err(DocError::NotFound("b".into())));
        assert!(matches!(doc.delete(""), Err(DocError::InvalidKeyPath(_))));
    }

    #[test]
    fn test_delete_array_element_shifts_indices() {
        let mut doc = KeyPathDocument::new(json!({"a": ["x", "y", "z"]}));
        assert_eq!(doc.delete("a[0]").unwrap(), json!("x"));
        assert_eq!(doc.get("a[0]"), Some(&json!("y")), "后续元素下标前移");
        assert_eq!(doc.get("a[1]"), Some(&json!("z")));
        assert!(!doc.contains("a[2]"), "原最后一个下标删除后失效");
    }

    #[test]
    fn test_all_keypaths_stable_order() {
        let doc = KeyPathDocument::new(json!({"b": [1, {"c": 2}], "a": {"d": null}}));
        let first = doc.all_keypaths(true);
        assert_eq!(strings(&first), vec!["b", "b[0]", "b[1]", "b[1]/c", "a", "a/d"]);
        assert_eq!(first, doc.all_keypaths(true), "重复枚举顺序一致");

        assert_eq!(strings(&doc.all_keypaths(false)), vec!["b", "a", "a/d"]);
    }

    #[test]
    fn test_find_value_paths_scenario() {
        let doc = KeyPathDocument::new(json!({"a": [1, 2, 1, 3]}));
        let found = doc.find_value_paths(&json!(1), None, false);
        assert_eq!(strings(&found), vec!["a[0]", "a[2]"]);
        assert_eq!(doc.count_occurrences(&json!(1), None), 2);

        let owners = doc.find_value_paths(&json!(1), None, true);
        assert_eq!(strings(&owners), vec!["a", "a"], "去掉最后一段得到所属容器");
        assert_eq!(doc.find_first_value_path(&json!(1), None, false).unwrap().to_string(), "a[0]");
        assert!(doc.find_first_value_path(&json!(9), None, false).is_none());
    }

    #[test]
    fn test_find_value_paths_under_keypath_and_objects() {
        let doc = KeyPathDocument::new(json!({
            "users": [{"id": 1, "tag": "x"}, {"id": 2, "tag": "x"}],
            "admins": [{"id": 1, "tag": "x"}]
        }));
        assert_eq!(doc.count_occurrences(&json!("x"), None), 3);
        assert_eq!(
            strings(&doc.find_value_paths(&json!("x"), Some("users"), false)),
            vec!["users[0]/tag", "users[1]/tag"]
        );
        assert_eq!(
            strings(&doc.find_value_paths(&json!({"id": 1, "tag": "x"}), None, false)),
            vec!["users[0]", "admins[0]"],
            "容器值按结构相等匹配"
        );
        assert!(doc.contains_value(&json!(2)));
        assert!(!doc.contains_value(&json!("missing")));
    }

    #[test]
    fn test_remove_all_occurrences() {
        let mut doc = KeyPathDocument::new(json!({"a": [1, 2, 1, 3, 1], "b": {"c": 1, "d": 4}}));
        assert_eq!(doc.remove_all_occurrences(&json!(1), None), 4);
        assert_eq!(doc.count_occurrences(&json!(1), None), 0);
        assert_eq!(doc.root(), &json!({"a": [2, 3], "b": {"d": 4}}));
    }

    #[test]
    fn test_remove_all_occurrences_restricted() {
        let mut doc = KeyPathDocument::new(json!({"keep": [1, 1], "drop": [1, 1]}));
        assert_eq!(doc.remove_all_occurrences(&json!(1), Some("drop")), 2);
        assert_eq!(doc.root(), &json!({"keep": [1, 1], "drop": []}));
    }

    #[test]
    fn test_deduplicate_scenario() {
        let mut doc = KeyPathDocument::new(json!({"a": [1, 2, 1, 3]}));
        assert_eq!(doc.deduplicate(&json!(1), None, None).unwrap(), 1);
        assert_eq!(doc.root(), &json!({"a": [1, 2, 3]}));
        assert!(doc.count_occurrences(&json!(1), None) <= 1);
    }

    #[test]
    fn test_deduplicate_no_duplicates_is_noop() {
        let mut doc = KeyPathDocument::new(json!({"a": [1, 2]}));
        assert_eq!(doc.deduplicate(&json!(1), None, None).unwrap(), 0);
        assert_eq!(doc.deduplicate(&json!(1), Some("a[9]"), None).unwrap(), 0, "少于两处时直接返回");
        assert_eq!(doc.root(), &json!({"a": [1, 2]}));
    }

    #[test]
    fn test_deduplicate_keep_keypath() {
        let mut doc = KeyPathDocument::new(json!({"a": [1, 2, 1, 3, 1]}));
        assert_eq!(doc.deduplicate(&json!(1), Some("a[2]"), None).unwrap(), 2);
        assert_eq!(doc.root(), &json!({"a": [2, 1, 3]}), "只保留指定位置的值");
    }

    #[test]
    fn test_deduplicate_keep_keypath_not_found() {
        let mut doc = KeyPathDocument::new(json!({"a": [1, 2, 1, 3]}));
        let err = doc.deduplicate(&json!(1), Some("a[5]"), None).unwrap_err();
        assert_eq!(err, DocError::KeypathNotFound("a[5]".into()));
        assert_eq!(doc.root(), &json!({"a": [1, 2, 1, 3]}), "出错时不删除任何内容");
    }

    #[test]
    fn test_deduplicate_leaves_empty_containers() {
        let mut doc = KeyPathDocument::new(json!({"first": ["v"], "second": ["v"]}));
        assert_eq!(doc.deduplicate(&json!("v"), None, None).unwrap(), 1);
        assert_eq!(doc.root(), &json!({"first": ["v"], "second": []}));
        assert_eq!(doc.prune_empty(None, None), 1);
        assert_eq!(doc.root(), &json!({"first": ["v"]}));
    }

    #[test]
    fn test_cross_branch_duplicate_removal() {
        let mut doc = KeyPathDocument::new(json!({
            "left": [7, "a", 7, "b"],
            "mid": {"deep": [[7, "c"], [7, 7, "d"]]},
            "right": ["e", 7]
        }));

        assert_eq!(doc.count_occurrences(&json!(7), None), 6);
        assert_eq!(doc.deduplicate(&json!(7), None, None).unwrap(), 5);
        assert_eq!(
            doc.root(),
            &json!({
                "left": [7, "a", "b"],
                "mid": {"deep": [["c"], ["d"]]},
                "right": ["e"]
            }),
            "跨分支批量删除不应互相干扰下标"
        );
    }

    #[test]
    fn test_prune_empty_scenario() {
        let mut doc = KeyPathDocument::new(json!({"x": {"y": null, "z": 5}}));
        assert_eq!(doc.prune_empty(None, None), 1);
        assert_eq!(doc.root(), &json!({"x": {"z": 5}}));
    }

    #[test]
    fn test_prune_empty_keeps_empty_string_and_handles_arrays() {
        let mut doc = KeyPathDocument::new(json!({
            "s": "",
            "list": [null, 1, [], {}, 2, null],
            "o": {}
        }));
        assert_eq!(doc.prune_empty(None, None), 5);
        assert_eq!(doc.root(), &json!({"s": "", "list": [1, 2]}), "空字符串默认不算空值");
    }

    #[test]
    fn test_prune_empty_custom_values_and_restriction() {
        let mut doc = KeyPathDocument::new(json!({"a": {"s": "", "n": null}, "b": {"s": ""}}));
        let custom = [json!("")];
        assert_eq!(doc.prune_empty(Some("a"), Some(&custom)), 1);
        assert_eq!(doc.root(), &json!({"a": {"n": null}, "b": {"s": ""}}));
    }

    #[test]
    fn test_prune_empty_single_pass() {
        let mut doc = KeyPathDocument::new(json!({"outer": {"inner": null}}));
        assert_eq!(doc.prune_empty(None, None), 1);
        assert_eq!(doc.root(), &json!({"outer": {}}), "因删除而变空的父容器留到下一次");
        assert_eq!(doc.prune_empty(None, None), 1);
        assert_eq!(doc.root(), &json!({}));
    }

    #[test]
    fn test_append() {
        let mut doc = KeyPathDocument::default();
        assert_eq!(doc.append("log", json!("first")).unwrap().to_string(), "log[0]");
        assert_eq!(doc.append("log", json!("second")).unwrap().to_string(), "log[1]");
        assert_eq!(doc.get("log"), Some(&json!(["first", "second"])));

        doc.set("n", json!(1)).unwrap();
        assert!(matches!(doc.append("n", json!(2)), Err(DocError::TypeConflict { .. })));
    }

    #[test]
    fn test_len_and_entries() {
        let doc = KeyPathDocument::new(json!({"a": 1, "b": [2]}));
        assert_eq!(doc.len(), 2);
        let keys: Vec<Segment> = doc.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Segment::Key("a".into()), Segment::Key("b".into())]);

        let arr = KeyPathDocument::new(json!(["x"]));
        assert_eq!(arr.entries(), vec![(Segment::Index(0), &json!("x"))]);
        assert!(KeyPathDocument::new(json!(3)).is_empty());
    }

    #[test]
    fn test_keypath_with_special_key_via_segments() {
        let mut doc = KeyPathDocument::new(json!({"a/b": {"c": 1}}));
        let kp = KeyPath::root().key("a/b").key("c");
        assert_eq!(doc.get(&kp), Some(&json!(1)));
        assert_eq!(doc.find_value_paths(&json!(1), None, false), vec![kp.clone()]);
        assert_eq!(doc.remove_all_occurrences(&json!(1), None), 1, "按段构建的路径可删除特殊字段");
        assert_eq!(doc.root(), &json!({"a/b": {}}));
    }

    #[test]
    fn test_query_keypaths() {
        let doc = KeyPathDocument::new(json!({"store": {"book": [{"title": "A"}, {"title": "B"}]}}));
        let found = doc.query_keypaths("$.store.book[*].title").unwrap();
        assert_eq!(strings(&found), vec!["store/book[0]/title", "store/book[1]/title"]);
        assert!(doc.query_keypaths("$.[").is_err(), "非法 JSONPath 应返回错误");
    }

    #[test]
    fn test_save_without_source_is_state_error() {
        let store = crate::store::MemoryJsonStore::new(crate::vm::notifier::SilentNotifier);
        let doc = KeyPathDocument::new(json!({"a": 1}));
        assert!(matches!(doc.save(&store, true), Err(DocError::State(_))));
    }
}
