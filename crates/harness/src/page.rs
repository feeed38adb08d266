//! limit/offset 分页
//!
//! 所有 list 型处理器复用同一个分页入口，避免每个服务各写一份
//! skip/take。配合插入有序的存储，翻完所有页恰好得到完整集合。

use serde::{Deserialize, Serialize};

/// 未指定 limit 时的默认页大小
pub const DEFAULT_PAGE_LIMIT: usize = 50;
/// 单页上限
pub const MAX_PAGE_LIMIT: usize = 200;

/// 分页查询参数
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PageQuery {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// 只指定页大小，从头开始
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
        }
    }
}

/// 一页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 过滤后、分页前的总条数
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    /// 后面是否还有数据
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }
}

/// 对已过滤的集合应用分页
pub fn paginate<T>(items: Vec<T>, query: &PageQuery) -> Page<T> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let total = items.len();

    let items: Vec<T> = items.into_iter().skip(offset).take(limit).collect();

    Page {
        items,
        total,
        offset,
        limit,
    }
}
