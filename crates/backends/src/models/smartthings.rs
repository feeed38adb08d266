//! SmartThings 实体模型
//!
//! 设备、房间与场所的数据结构。每个用户拥有独立的一棵智能家居树，
//! 设备通过 `room`/`location` 字段引用所在房间与场所。

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 新建设备时某个能力的初始属性值
pub fn default_attribute(capability: &str) -> Value {
    match capability {
        "switch" => Value::String("off".to_string()),
        "level" | "power" => Value::from(0),
        "temperature" => Value::from(20),
        "thermostatMode" => Value::String("off".to_string()),
        "motion" => Value::String("inactive".to_string()),
        "battery" => Value::from(100),
        _ => Value::Null,
    }
}

/// 智能设备
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub label: String,
    pub manufacturer: String,
    pub model: String,
    /// 所在房间的 ID，未分配为 None
    pub room: Option<String>,
    /// 所在场所的 ID，未分配为 None
    pub location: Option<String>,
    /// 设备支持的能力（switch、temperature 等）
    pub capabilities: Vec<String>,
    /// 能力对应的当前属性值
    pub attributes: IndexMap<String, Value>,
    pub firmware_version: String,
    pub added_at: DateTime<Utc>,
}

impl Device {
    /// 生成随机设备，用于种子补充
    pub fn random(ctx: &mut SeedContext) -> Self {
        let manufacturers = ["SmartHome Inc", "Luminex", "Heatwell", "SecureCo"];
        let presets: [(&str, &[&str]); 4] = [
            ("Smart Bulb", &["switch", "level"]),
            ("Thermostat", &["temperature", "thermostatMode"]),
            ("Motion Sensor", &["motion", "battery"]),
            ("Smart Plug", &["switch", "power"]),
        ];
        let (label, capabilities) = *ctx.pick(&presets);

        let mut attributes = IndexMap::new();
        for capability in capabilities {
            let value = match *capability {
                "switch" => Value::String("off".to_string()),
                "level" => Value::from(ctx.int(0..101)),
                "temperature" => Value::from(ctx.int(16..28)),
                "thermostatMode" => Value::String("heat".to_string()),
                "motion" => Value::String("inactive".to_string()),
                "battery" => Value::from(ctx.int(20..101)),
                "power" => Value::from(ctx.int(0..1500)),
                _ => Value::Null,
            };
            attributes.insert((*capability).to_string(), value);
        }

        Self {
            id: ctx.uuid(),
            label: label.to_string(),
            manufacturer: ctx.pick(&manufacturers).to_string(),
            model: ctx.short_id("MDL-").to_uppercase(),
            room: None,
            location: None,
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            attributes,
            firmware_version: format!("{}.{}.{}", ctx.int(1..4), ctx.int(0..10), ctx.int(0..10)),
            added_at: ctx.past_datetime(365),
        }
    }
}

/// 房间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    /// 所属场所，可以不挂在任何场所下
    pub location_id: Option<String>,
}

/// 场所
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub timezone: String,
}

/// 单个用户的智能家居树
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub devices: MemoryStore<Device>,
    pub rooms: MemoryStore<Room>,
    pub locations: MemoryStore<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_device_attributes_match_capabilities() {
        let mut ctx = SeedContext::with_seed(41);
        for _ in 0..10 {
            let device = Device::random(&mut ctx);
            for capability in &device.capabilities {
                assert!(device.attributes.contains_key(capability));
            }
        }
    }
}
