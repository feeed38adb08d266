//! Mock Harness
//!
//! 模拟 SaaS 后端的通用骨架，用于开发和测试环境。
//! 每个被模拟的服务共享同一套模式：种子生成 → 状态容器 → 操作处理器。
//!
//! # 主要模块
//!
//! - `store`: 按插入顺序组织的内存存储
//! - `result`: 统一的错误分类和响应信封
//! - `seed`: 生成作用域内的随机数据上下文
//! - `page`: limit/offset 分页
//! - `snapshot`: 状态快照的加载与落盘
//! - `backend`: 所有模拟服务实现的统一生命周期接口
//!
//! # 使用示例
//!
//! ```rust
//! use mock_harness::seed::SeedContext;
//! use mock_harness::store::MemoryStore;
//!
//! // 固定种子可以完整复现一棵状态树
//! let mut ctx = SeedContext::with_seed(42);
//!
//! let mut users: MemoryStore<String> = MemoryStore::new();
//! let user_id = ctx.id("USR");
//! users.insert(&user_id, ctx.full_name());
//!
//! assert!(users.contains(&user_id));
//! ```

pub mod backend;
pub mod page;
pub mod result;
pub mod seed;
pub mod snapshot;
pub mod store;

pub use backend::MockBackend;
pub use page::{Page, PageQuery, paginate};
pub use result::{ApiError, ApiResult, ErrorKind, envelope};
pub use seed::SeedContext;
pub use store::MemoryStore;
