//! 操作计时模块
//!
//! 命名计时器、闭包计时，以及生成用于测量编辑操作的样例文档

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::model::document::KeyPathDocument;

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration: Duration,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration: Duration, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration,
            success,
            details: details.to_string(),
        }
    }

    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}

/// 耗时的展示形式：不足 0.0001 秒时显示为 `0.0000...`
pub fn format_seconds(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.0001 {
        "0.0000...".to_string()
    } else {
        format!("{:.4}", secs)
    }
}

/// 计时并返回闭包结果
pub fn time_operation<T, F>(operation: &str, f: F) -> (T, PerformanceResult)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let ret = f();
    let duration = start.elapsed();
    tracing::info!("操作 {} 耗时 {} 秒", operation, format_seconds(duration));
    (ret, PerformanceResult::new(operation, duration, true, ""))
}

/// 按名称管理的计时器
#[derive(Debug, Default)]
pub struct OperationTimer {
    running: HashMap<String, Instant>,
}

impl OperationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启动计时器；同名计时器已在运行时返回 false
    pub fn start(&mut self, name: &str) -> bool {
        if self.running.contains_key(name) {
            tracing::warn!("计时器已在运行: {}", name);
            return false;
        }
        self.running.insert(name.to_string(), Instant::now());
        tracing::debug!("计时器启动: {}", name);
        true
    }

    /// 结束计时器并返回耗时；不存在时返回 None
    pub fn end(&mut self, name: &str) -> Option<Duration> {
        let Some(start) = self.running.remove(name) else {
            tracing::warn!("未找到计时器: {}", name);
            return None;
        };
        let elapsed = start.elapsed();
        tracing::info!("计时器 {} 耗时 {} 秒", name, format_seconds(elapsed));
        Some(elapsed)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.running.contains_key(name)
    }
}

/// 生成嵌套样例文档（确定性，包含重复值与空值）
pub fn generate_sample_document(depth: usize, width: usize) -> Value {
    fn create_nested_object(current_depth: usize, max_depth: usize, width: usize) -> Value {
        if current_depth >= max_depth {
            return json!("叶子节点值");
        }

        let mut obj = serde_json::Map::new();

        // 添加各种类型的字段
        for i in 0..width {
            let key = format!("field_{}", i);
            let value = match i % 6 {
                0 => json!(format!("字符串值_{}", i % 3)),
                1 => json!(i as i64),
                2 => json!(i % 2 == 0),
                3 => json!([1, 2, 3, 1]),
                4 => create_nested_object(current_depth + 1, max_depth, width / 2),
                _ => json!(null),
            };
            obj.insert(key, value);
        }

        Value::Object(obj)
    }

    let mut root = serde_json::Map::new();
    root.insert(
        "metadata".to_string(),
        json!({
            "depth": depth,
            "width": width,
            "description": "样例文档"
        }),
    );

    root.insert("data".to_string(), create_nested_object(0, depth, width));

    let items: Vec<Value> = (0..width * 10)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("项目_{}", i % 5),
                "tags": if i % 4 == 0 { json!([]) } else { json!(["a", "b"]) },
                "active": i % 3 == 0
            })
        })
        .collect();
    root.insert("items".to_string(), Value::Array(items));

    Value::Object(root)
}

/// 在样例文档上依次测量主要编辑操作
pub fn run_editor_suite(depth: usize, width: usize) -> Vec<PerformanceResult> {
    let mut results = Vec::new();
    let (mut doc, r) = time_operation(&format!("样例生成({}x{})", depth, width), || {
        KeyPathDocument::new(generate_sample_document(depth, width))
    });
    results.push(r);

    let (paths, mut r) = time_operation("路径枚举", || doc.all_keypaths(true));
    r.details = format!("枚举了 {} 条路径", paths.len());
    results.push(r);

    let (count, mut r) = time_operation("计数", || doc.count_occurrences(&json!("a"), None));
    r.details = format!("找到 {} 处", count);
    results.push(r);

    let (dedup, mut r) = time_operation("去重", || doc.deduplicate(&json!("a"), None, Some("items")));
    r.success = dedup.is_ok();
    r.details = format!("删除 {} 处", dedup.unwrap_or(0));
    results.push(r);

    let (pruned, mut r) = time_operation("清理空值", || doc.prune_empty(None, None));
    r.details = format!("清理 {} 处", pruned);
    results.push(r);

    results
}
