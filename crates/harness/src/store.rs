//! 内存存储
//!
//! 以实体 ID 为键、按插入顺序组织的内存存储。
//! 模拟服务的所有顶层集合（用户、订单、设备等）都由它承载。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 通用内存存储
///
/// 基于 IndexMap 实现，迭代顺序与插入顺序一致，
/// 因此分页遍历的结果是确定的。读取操作返回克隆，
/// 外部修改返回值不会影响存储内部状态。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore<T> {
    data: IndexMap<String, T>,
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MemoryStore<T> {
    /// 创建新的内存存储实例
    pub fn new() -> Self {
        Self {
            data: IndexMap::new(),
        }
    }

    /// 插入或更新数据
    ///
    /// 如果 key 已存在则覆盖原有数据，插入位置保持不变
    pub fn insert(&mut self, id: &str, value: T) {
        self.data.insert(id.to_string(), value);
    }

    /// 获取数据
    ///
    /// 返回数据的克隆
    pub fn get(&self, id: &str) -> Option<T> {
        self.data.get(id).cloned()
    }

    /// 原地修改指定数据
    ///
    /// 存在则执行闭包并返回 true，不存在返回 false 且不执行闭包
    pub fn update<F>(&mut self, id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.data.get_mut(id) {
            Some(value) => {
                mutate(value);
                true
            }
            None => false,
        }
    }

    /// 删除数据
    ///
    /// 保持其余条目的相对顺序，返回被删除的数据
    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.data.shift_remove(id)
    }

    /// 列出所有数据
    ///
    /// 按插入顺序返回所有值的克隆列表
    pub fn list(&self) -> Vec<T> {
        self.data.values().cloned().collect()
    }

    /// 按条件筛选数据
    ///
    /// 按插入顺序返回满足条件的所有数据
    pub fn list_by<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.data
            .values()
            .filter(|value| predicate(value))
            .cloned()
            .collect()
    }

    /// 列出所有 key
    pub fn ids(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    /// 获取数据总数
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// 存储是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 清空所有数据
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// 检查是否存在指定 key
    pub fn contains(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    /// 批量插入数据
    ///
    /// 接收一个迭代器，提取每个元素的 key 并插入
    pub fn insert_many<I, F>(&mut self, items: I, key_fn: F)
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> String,
    {
        for item in items {
            let key = key_fn(&item);
            self.data.insert(key, item);
        }
    }
}
