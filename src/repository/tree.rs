// ==========================================
// 经销商车场运营系统 - 文档树路径工具
// ==========================================
// 职责: 路径规范化、对象拍平为叶子、叶子重组为子树
// 语义: 与实时数据库一致
//   - 对象拍平为叶子路径，get 内部节点时重组子树
//   - null / 空对象视为删除
//   - 在标量下方写入会替换该标量
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 规范化路径: 去除首尾 '/'，拒绝空路径与空段
pub fn normalize_path(path: &str) -> RepositoryResult<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(RepositoryError::InvalidPath(path.to_string()));
    }
    if trimmed.split('/').any(|seg| seg.trim().is_empty()) {
        return Err(RepositoryError::InvalidPath(path.to_string()));
    }
    Ok(trimmed.to_string())
}

/// path 是否等于 prefix 或位于其下
pub fn is_within(path: &str, prefix: &str) -> bool {
    path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'/')
}

/// 两条路径是否互相覆盖（祖先/相等/后代）
pub fn overlaps(a: &str, b: &str) -> bool {
    is_within(a, b) || is_within(b, a)
}

/// 真祖先路径列表（不含自身），由近及远
pub fn ancestors(path: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = path;
    while let Some(idx) = current.rfind('/') {
        current = &current[..idx];
        result.push(current.to_string());
    }
    result
}

/// 拍平为叶子 (path, value)
pub fn flatten(path: &str, value: &Value) -> RepositoryResult<Vec<(String, Value)>> {
    let mut leaves = Vec::new();
    flatten_into(path, value, &mut leaves)?;
    Ok(leaves)
}

fn flatten_into(path: &str, value: &Value, out: &mut Vec<(String, Value)>) -> RepositoryResult<()> {
    match value {
        Value::Null => Ok(()),
        Value::Object(map) => {
            for (key, child) in map {
                if key.is_empty() || key.contains('/') {
                    return Err(RepositoryError::InvalidPath(format!("{}/{}", path, key)));
                }
                flatten_into(&format!("{}/{}", path, key), child, out)?;
            }
            Ok(())
        }
        other => {
            out.push((path.to_string(), other.clone()));
            Ok(())
        }
    }
}

/// 由叶子重组 path 处的值
///
/// # 参数
/// - entries: 位于 path 之内的全部叶子
///
/// # 返回
/// - None: 无数据
pub fn assemble<I>(path: &str, entries: I) -> Option<Value>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut root = Map::new();
    for (leaf_path, value) in entries {
        if leaf_path == path {
            return Some(value);
        }
        if !is_within(&leaf_path, path) {
            continue;
        }
        let relative = &leaf_path[path.len() + 1..];
        insert_nested(&mut root, relative, value);
    }
    if root.is_empty() {
        None
    } else {
        Some(Value::Object(root))
    }
}

fn insert_nested(root: &mut Map<String, Value>, relative: &str, value: Value) {
    match relative.split_once('/') {
        None => {
            root.insert(relative.to_string(), value);
        }
        Some((head, rest)) => {
            let child = root
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_nested(map, rest, value);
            }
        }
    }
}

/// 在内存叶子表上执行 set（删除子树与祖先标量后写入叶子）
pub fn apply_set(
    leaves: &mut BTreeMap<String, Value>,
    path: &str,
    value: &Value,
) -> RepositoryResult<()> {
    let new_leaves = flatten(path, value)?;
    apply_remove(leaves, path);
    for ancestor in ancestors(path) {
        leaves.remove(&ancestor);
    }
    for (leaf_path, leaf_value) in new_leaves {
        leaves.insert(leaf_path, leaf_value);
    }
    Ok(())
}

/// 在内存叶子表上执行 remove（删除自身与全部后代）
pub fn apply_remove(leaves: &mut BTreeMap<String, Value>, path: &str) {
    leaves.remove(path);
    let prefix = format!("{}/", path);
    let doomed: Vec<String> = leaves
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .map(|(k, _)| k.clone())
        .collect();
    for key in doomed {
        leaves.remove(&key);
    }
}
