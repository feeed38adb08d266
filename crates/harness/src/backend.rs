//! 模拟服务的统一生命周期接口
//!
//! 每个服务的 Api 容器都实现这个 trait，CLI 和测试夹具据此
//! 统一地导出状态快照、执行重置，而不关心具体服务类型。

use serde_json::Value;

/// 模拟后端的统一接口
pub trait MockBackend {
    /// 服务名，也是快照文件名中的 `{service}` 片段（snake_case）
    fn service_name(&self) -> &'static str;

    /// 导出当前完整状态树
    fn export_state(&self) -> Value;

    /// 丢弃全部变更，重放种子生成
    ///
    /// 构造时带显式种子的实例会回到与初始完全相同的状态树；
    /// 未播种的实例回到结构相同、内容重新随机的状态树。
    fn reset_data(&mut self) -> bool;
}
