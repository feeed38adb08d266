//! 种子生成的规模配置
//!
//! 每个服务的种子树由固定的锚点记录加随机补充记录组成，
//! 本配置控制随机部分的规模分布。

use std::ops::Range;

/// 种子规模配置
///
/// 锚点记录（固定 ID 的已知实体）不受此配置影响，
/// 配置只决定随机补充的数量
#[derive(Debug, Clone)]
pub struct SeedProfile {
    /// 每个服务随机补充的用户数量
    pub extra_users: usize,
    /// 随机补充的内容条目数量范围（视频、歌曲、商品等）
    pub extra_catalog: Range<usize>,
    /// 每个用户的历史记录数量范围（消息、交易等）
    pub history_per_user: Range<usize>,
}

impl Default for SeedProfile {
    /// 默认规模：2 个补充用户，3-6 条补充内容，每用户 1-4 条历史
    fn default() -> Self {
        Self {
            extra_users: 2,
            extra_catalog: 3..6,
            history_per_user: 1..4,
        }
    }
}

impl SeedProfile {
    /// 不生成任何随机补充，只保留锚点记录
    pub fn anchors_only() -> Self {
        Self {
            extra_users: 0,
            extra_catalog: 0..1,
            history_per_user: 0..1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = SeedProfile::default();
        assert_eq!(profile.extra_users, 2);
        assert_eq!(profile.extra_catalog, 3..6);
    }

    #[test]
    fn test_anchors_only_profile() {
        let profile = SeedProfile::anchors_only();
        assert_eq!(profile.extra_users, 0);
    }
}
