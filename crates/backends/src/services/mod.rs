//! 各服务的状态容器与操作处理器
//!
//! 每个子模块导出一个 `<Svc>Api` 容器：构造时深拷贝种子树到实例状态，
//! 处理器同步地读写该状态并通过 `ApiResult` 返回，`reset_data`
//! 重放种子生成。容器假定单线程顺序调用，不做任何并发控制。

pub mod communilink;
pub mod netflix;
pub mod slack;
pub mod smartthings;
pub mod spotify;
pub mod venmo;
pub mod walmart;
pub mod youtube;

pub use communilink::CommuniLinkApi;
pub use netflix::NetflixApi;
pub use slack::SlackApi;
pub use smartthings::SmartThingsApi;
pub use spotify::SpotifyApi;
pub use venmo::VenmoApi;
pub use walmart::WalmartApi;
pub use youtube::YouTubeApi;
