//! SmartThings 模拟服务
//!
//! 按用户划分的设备、房间与场所管理。删除场所会级联删除其中的
//! 房间和设备，删除房间只清除设备上的房间引用。

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use mock_harness::result::{ApiError, ApiResult};
use mock_harness::seed::SeedContext;
use mock_harness::store::MemoryStore;
use mock_harness::MockBackend;

use crate::generators::SeedProfile;
use crate::models::smartthings::{Device, Location, Room, SmartUser, default_attribute};

/// SmartThings 状态树，按用户划分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartThingsState {
    pub users: MemoryStore<SmartUser>,
}

impl SmartThingsState {
    /// 生成默认种子树：锚点用户 ST001 的家 + 随机补充用户
    pub fn seed(ctx: &mut SeedContext, profile: &SeedProfile) -> Self {
        let mut locations = MemoryStore::new();
        locations.insert(
            "LOC001",
            Location {
                id: "LOC001".to_string(),
                name: "Home".to_string(),
                timezone: "America/New_York".to_string(),
            },
        );

        let mut rooms = MemoryStore::new();
        rooms.insert(
            "R001",
            Room {
                id: "R001".to_string(),
                name: "Living Room".to_string(),
                location_id: Some("LOC001".to_string()),
            },
        );
        rooms.insert(
            "R002",
            Room {
                id: "R002".to_string(),
                name: "Bedroom".to_string(),
                location_id: Some("LOC001".to_string()),
            },
        );

        let mut devices = MemoryStore::new();
        let mut bulb = Device::random(ctx);
        bulb.id = "D001".to_string();
        bulb.label = "Living Room Bulb".to_string();
        bulb.capabilities = vec!["switch".to_string(), "level".to_string()];
        bulb.attributes = IndexMap::from([
            ("switch".to_string(), Value::String("off".to_string())),
            ("level".to_string(), Value::from(80)),
        ]);
        bulb.room = Some("R001".to_string());
        bulb.location = Some("LOC001".to_string());
        devices.insert("D001", bulb);

        let mut thermostat = Device::random(ctx);
        thermostat.id = "D002".to_string();
        thermostat.label = "Bedroom Thermostat".to_string();
        thermostat.capabilities = vec!["temperature".to_string(), "thermostatMode".to_string()];
        thermostat.attributes = IndexMap::from([
            ("temperature".to_string(), Value::from(21)),
            ("thermostatMode".to_string(), Value::String("heat".to_string())),
        ]);
        thermostat.room = Some("R002".to_string());
        thermostat.location = Some("LOC001".to_string());
        devices.insert("D002", thermostat);

        let mut users = MemoryStore::new();
        users.insert(
            "ST001",
            SmartUser {
                id: "ST001".to_string(),
                email: "alice@smarthome.example".to_string(),
                name: "Alice Example".to_string(),
                devices,
                rooms,
                locations,
            },
        );

        for _ in 0..profile.extra_users {
            let user_id = ctx.uuid();
            let mut devices = MemoryStore::new();
            let device_count = ctx.int(
                profile.extra_catalog.start as i64..profile.extra_catalog.end as i64,
            );
            for _ in 0..device_count {
                let device = Device::random(ctx);
                devices.insert(&device.id.clone(), device);
            }
            let name = ctx.full_name();
            users.insert(
                &user_id.clone(),
                SmartUser {
                    id: user_id.clone(),
                    email: ctx.email(),
                    name,
                    devices,
                    rooms: MemoryStore::new(),
                    locations: MemoryStore::new(),
                },
            );
        }

        Self { users }
    }
}

// ============================================================================
// 请求 DTO
// ============================================================================

/// 新建设备请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    pub label: String,
    pub manufacturer: String,
    pub model: String,
    pub room_id: Option<String>,
    pub location_id: Option<String>,
    pub capabilities: Vec<String>,
}

/// 更新场所请求，只合并显式提供的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub timezone: Option<String>,
}

/// 更新房间请求，只合并显式提供的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub location_id: Option<String>,
}

// ============================================================================
// 状态容器
// ============================================================================

/// SmartThings API 容器
#[derive(Debug)]
pub struct SmartThingsApi {
    pub state: SmartThingsState,
    ctx: SeedContext,
    profile: SeedProfile,
}

impl Default for SmartThingsApi {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartThingsApi {
    pub fn new() -> Self {
        Self::build(SeedContext::new(), SeedProfile::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(SeedContext::with_seed(seed), SeedProfile::default())
    }

    pub fn with_profile(ctx: SeedContext, profile: SeedProfile) -> Self {
        Self::build(ctx, profile)
    }

    pub fn from_state(state: SmartThingsState) -> Self {
        Self {
            state,
            ctx: SeedContext::new(),
            profile: SeedProfile::default(),
        }
    }

    fn build(mut ctx: SeedContext, profile: SeedProfile) -> Self {
        let state = SmartThingsState::seed(&mut ctx, &profile);
        Self {
            state,
            ctx,
            profile,
        }
    }

    fn require_user(&self, user_id: &str) -> ApiResult<SmartUser> {
        self.state
            .users
            .get(user_id)
            .ok_or_else(|| ApiError::not_found("user", user_id))
    }

    // ------------------------------------------------------------------
    // 设备
    // ------------------------------------------------------------------

    pub fn list_devices(&self, user_id: &str) -> ApiResult<Vec<Device>> {
        Ok(self.require_user(user_id)?.devices.list())
    }

    pub fn get_device(&self, user_id: &str, device_id: &str) -> ApiResult<Device> {
        self.require_user(user_id)?
            .devices
            .get(device_id)
            .ok_or_else(|| ApiError::not_found("device", device_id))
    }

    /// 注册新设备，房间和场所引用都会先校验
    pub fn create_device(&mut self, user_id: &str, req: CreateDeviceRequest) -> ApiResult<Device> {
        let user = self.require_user(user_id)?;
        if req.label.is_empty() {
            return Err(ApiError::validation("device label is required"));
        }
        if let Some(room_id) = &req.room_id {
            if !user.rooms.contains(room_id) {
                return Err(ApiError::not_found("room", room_id));
            }
        }
        if let Some(location_id) = &req.location_id {
            if !user.locations.contains(location_id) {
                return Err(ApiError::not_found("location", location_id));
            }
        }

        let mut attributes = IndexMap::new();
        for capability in &req.capabilities {
            attributes.insert(capability.clone(), default_attribute(capability));
        }

        let device = Device {
            id: self.ctx.uuid(),
            label: req.label,
            manufacturer: req.manufacturer,
            model: req.model,
            room: req.room_id,
            location: req.location_id,
            capabilities: req.capabilities,
            attributes,
            firmware_version: "1.0.0".to_string(),
            added_at: Utc::now(),
        };

        info!(user_id, device_id = %device.id, label = %device.label, "注册设备");
        self.state.users.update(user_id, |u| {
            u.devices.insert(&device.id.clone(), device.clone());
        });
        Ok(device)
    }

    /// 写入某个能力的属性值，能力必须在设备声明的能力列表里
    pub fn update_device_status(
        &mut self,
        user_id: &str,
        device_id: &str,
        capability: &str,
        value: Value,
    ) -> ApiResult<Device> {
        let user = self.require_user(user_id)?;
        let device = user
            .devices
            .get(device_id)
            .ok_or_else(|| ApiError::not_found("device", device_id))?;
        if !device.capabilities.iter().any(|c| c == capability) {
            return Err(ApiError::validation(format!(
                "device does not support capability '{capability}'"
            )));
        }

        self.state.users.update(user_id, |u| {
            u.devices.update(device_id, |d| {
                d.attributes.insert(capability.to_string(), value.clone());
            });
        });
        self.get_device(user_id, device_id)
    }

    pub fn get_device_status(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> ApiResult<IndexMap<String, Value>> {
        Ok(self.get_device(user_id, device_id)?.attributes)
    }

    pub fn delete_device(&mut self, user_id: &str, device_id: &str) -> ApiResult<()> {
        self.require_user(user_id)?;
        let mut removed = false;
        self.state.users.update(user_id, |u| {
            removed = u.devices.remove(device_id).is_some();
        });
        if !removed {
            return Err(ApiError::not_found("device", device_id));
        }
        info!(user_id, device_id, "设备已删除");
        Ok(())
    }

    // ------------------------------------------------------------------
    // 场所
    // ------------------------------------------------------------------

    pub fn list_locations(&self, user_id: &str) -> ApiResult<Vec<Location>> {
        Ok(self.require_user(user_id)?.locations.list())
    }

    pub fn get_location(&self, user_id: &str, location_id: &str) -> ApiResult<Location> {
        self.require_user(user_id)?
            .locations
            .get(location_id)
            .ok_or_else(|| ApiError::not_found("location", location_id))
    }

    pub fn create_location(&mut self, user_id: &str, name: &str) -> ApiResult<Location> {
        self.require_user(user_id)?;
        if name.is_empty() {
            return Err(ApiError::validation("location name is required"));
        }

        let location = Location {
            id: self.ctx.uuid(),
            name: name.to_string(),
            timezone: "UTC".to_string(),
        };
        info!(user_id, location_id = %location.id, name, "创建场所");
        self.state.users.update(user_id, |u| {
            u.locations.insert(&location.id.clone(), location.clone());
        });
        Ok(location)
    }

    pub fn update_location(
        &mut self,
        user_id: &str,
        location_id: &str,
        req: UpdateLocationRequest,
    ) -> ApiResult<Location> {
        self.get_location(user_id, location_id)?;
        self.state.users.update(user_id, |u| {
            u.locations.update(location_id, |l| {
                if let Some(name) = req.name.clone() {
                    l.name = name;
                }
                if let Some(timezone) = req.timezone.clone() {
                    l.timezone = timezone;
                }
            });
        });
        self.get_location(user_id, location_id)
    }

    /// 删除场所，级联删除其中的房间和设备
    pub fn delete_location(&mut self, user_id: &str, location_id: &str) -> ApiResult<()> {
        self.get_location(user_id, location_id)?;

        self.state.users.update(user_id, |u| {
            let doomed_rooms: Vec<String> = u
                .rooms
                .list_by(|r| r.location_id.as_deref() == Some(location_id))
                .into_iter()
                .map(|r| r.id)
                .collect();
            for room_id in doomed_rooms {
                u.rooms.remove(&room_id);
            }

            let doomed_devices: Vec<String> = u
                .devices
                .list_by(|d| d.location.as_deref() == Some(location_id))
                .into_iter()
                .map(|d| d.id)
                .collect();
            for device_id in doomed_devices {
                u.devices.remove(&device_id);
            }

            u.locations.remove(location_id);
        });

        info!(user_id, location_id, "场所及其房间、设备已删除");
        Ok(())
    }

    // ------------------------------------------------------------------
    // 房间
    // ------------------------------------------------------------------

    /// 房间列表，可按场所过滤
    pub fn list_rooms(&self, user_id: &str, location_id: Option<&str>) -> ApiResult<Vec<Room>> {
        let user = self.require_user(user_id)?;
        Ok(user.rooms.list_by(|r| {
            location_id.is_none_or(|loc| r.location_id.as_deref() == Some(loc))
        }))
    }

    pub fn get_room(&self, user_id: &str, room_id: &str) -> ApiResult<Room> {
        self.require_user(user_id)?
            .rooms
            .get(room_id)
            .ok_or_else(|| ApiError::not_found("room", room_id))
    }

    /// 新建房间，同一场所内不允许重名
    pub fn create_room(
        &mut self,
        user_id: &str,
        name: &str,
        location_id: Option<&str>,
    ) -> ApiResult<Room> {
        let user = self.require_user(user_id)?;
        if name.is_empty() {
            return Err(ApiError::validation("room name is required"));
        }
        if let Some(loc) = location_id {
            if !user.locations.contains(loc) {
                return Err(ApiError::not_found("location", loc));
            }
        }
        let duplicate = user.rooms.list().iter().any(|r| {
            r.name == name && (location_id.is_none() || r.location_id.as_deref() == location_id)
        });
        if duplicate {
            return Err(ApiError::already_exists("room", name));
        }

        let room = Room {
            id: self.ctx.uuid(),
            name: name.to_string(),
            location_id: location_id.map(|l| l.to_string()),
        };
        info!(user_id, room_id = %room.id, name, "创建房间");
        self.state.users.update(user_id, |u| {
            u.rooms.insert(&room.id.clone(), room.clone());
        });
        Ok(room)
    }

    pub fn update_room(
        &mut self,
        user_id: &str,
        room_id: &str,
        req: UpdateRoomRequest,
    ) -> ApiResult<Room> {
        let user = self.require_user(user_id)?;
        if !user.rooms.contains(room_id) {
            return Err(ApiError::not_found("room", room_id));
        }
        if let Some(loc) = &req.location_id {
            if !user.locations.contains(loc) {
                return Err(ApiError::not_found("location", loc));
            }
        }

        self.state.users.update(user_id, |u| {
            u.rooms.update(room_id, |r| {
                if let Some(name) = req.name.clone() {
                    r.name = name;
                }
                if let Some(loc) = req.location_id.clone() {
                    r.location_id = Some(loc);
                }
            });
        });
        self.get_room(user_id, room_id)
    }

    /// 删除房间，设备保留但清除房间引用
    pub fn delete_room(&mut self, user_id: &str, room_id: &str) -> ApiResult<()> {
        self.get_room(user_id, room_id)?;

        self.state.users.update(user_id, |u| {
            let affected: Vec<String> = u
                .devices
                .list_by(|d| d.room.as_deref() == Some(room_id))
                .into_iter()
                .map(|d| d.id)
                .collect();
            for device_id in affected {
                u.devices.update(&device_id, |d| d.room = None);
            }
            u.rooms.remove(room_id);
        });

        info!(user_id, room_id, "房间已删除，设备引用已清除");
        Ok(())
    }
}

impl MockBackend for SmartThingsApi {
    fn service_name(&self) -> &'static str {
        "smartthings"
    }

    fn export_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn reset_data(&mut self) -> bool {
        let mut ctx = self.ctx.renew();
        self.state = SmartThingsState::seed(&mut ctx, &self.profile);
        self.ctx = ctx;
        info!("SmartThings 状态已重置");
        true
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mock_harness::ErrorKind;

    const USER: &str = "ST001";

    fn api() -> SmartThingsApi {
        SmartThingsApi::with_seed(42)
    }

    #[test]
    fn test_seed_anchor_tree() {
        let api = api();
        assert_eq!(api.list_locations(USER).unwrap().len(), 1);
        assert_eq!(api.list_rooms(USER, None).unwrap().len(), 2);
        assert!(api.get_device(USER, "D001").is_ok());
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let api = api();
        let err = api.list_devices("ghost").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_create_device_round_trip() {
        let mut api = api();
        let created = api
            .create_device(
                USER,
                CreateDeviceRequest {
                    label: "Hallway Plug".to_string(),
                    manufacturer: "SmartHome Inc".to_string(),
                    model: "PLUG-9".to_string(),
                    room_id: Some("R001".to_string()),
                    location_id: Some("LOC001".to_string()),
                    capabilities: vec!["switch".to_string(), "power".to_string()],
                },
            )
            .unwrap();

        let fetched = api.get_device(USER, &created.id).unwrap();
        assert_eq!(fetched.label, "Hallway Plug");
        assert_eq!(fetched.room.as_deref(), Some("R001"));
        assert_eq!(fetched.attributes["switch"], "off");
    }

    #[test]
    fn test_create_device_validates_room_ref() {
        let mut api = api();
        let err = api
            .create_device(
                USER,
                CreateDeviceRequest {
                    label: "Orphan".to_string(),
                    manufacturer: "X".to_string(),
                    model: "Y".to_string(),
                    room_id: Some("R999".to_string()),
                    location_id: None,
                    capabilities: vec![],
                },
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_update_device_status_checks_capability() {
        let mut api = api();
        let updated = api
            .update_device_status(USER, "D001", "switch", Value::String("on".to_string()))
            .unwrap();
        assert_eq!(updated.attributes["switch"], "on");

        let err = api
            .update_device_status(USER, "D001", "temperature", Value::from(25))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_delete_device_then_get_is_not_found() {
        let mut api = api();
        api.delete_device(USER, "D001").unwrap();

        let err = api.get_device(USER, "D001").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(!api.state.users.get(USER).unwrap().devices.contains("D001"));

        let err = api.delete_device(USER, "D001").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_location_cascades_rooms_and_devices() {
        let mut api = api();
        let location = api.create_location(USER, "X").unwrap();
        let room = api.create_room(USER, "Y", Some(&location.id)).unwrap();
        let device = api
            .create_device(
                USER,
                CreateDeviceRequest {
                    label: "Attic Sensor".to_string(),
                    manufacturer: "SecureCo".to_string(),
                    model: "MS-2".to_string(),
                    room_id: Some(room.id.clone()),
                    location_id: Some(location.id.clone()),
                    capabilities: vec!["motion".to_string()],
                },
            )
            .unwrap();

        api.delete_location(USER, &location.id).unwrap();

        assert!(
            !api.list_locations(USER)
                .unwrap()
                .iter()
                .any(|l| l.id == location.id)
        );
        assert!(
            !api.list_rooms(USER, None)
                .unwrap()
                .iter()
                .any(|r| r.id == room.id)
        );
        assert_eq!(
            api.get_device(USER, &device.id).unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_delete_room_clears_device_refs_but_keeps_devices() {
        let mut api = api();
        api.delete_room(USER, "R001").unwrap();

        let device = api.get_device(USER, "D001").unwrap();
        assert!(device.room.is_none());
        // 场所引用不受影响
        assert_eq!(device.location.as_deref(), Some("LOC001"));
    }

    #[test]
    fn test_create_room_duplicate_name_in_location() {
        let mut api = api();
        let err = api
            .create_room(USER, "Living Room", Some("LOC001"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);

        // 其他场所允许同名房间
        let other = api.create_location(USER, "Cabin").unwrap();
        assert!(api.create_room(USER, "Living Room", Some(&other.id)).is_ok());
    }

    #[test]
    fn test_list_rooms_filtered_by_location() {
        let mut api = api();
        let cabin = api.create_location(USER, "Cabin").unwrap();
        api.create_room(USER, "Bunk Room", Some(&cabin.id)).unwrap();

        let rooms = api.list_rooms(USER, Some(&cabin.id)).unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].name, "Bunk Room");
    }

    #[test]
    fn test_update_room_moves_location() {
        let mut api = api();
        let cabin = api.create_location(USER, "Cabin").unwrap();
        let room = api
            .update_room(
                USER,
                "R002",
                UpdateRoomRequest {
                    name: None,
                    location_id: Some(cabin.id.clone()),
                },
            )
            .unwrap();
        assert_eq!(room.location_id, Some(cabin.id));
    }

    #[test]
    fn test_reset_restores_anchor_devices() {
        let mut api = api();
        api.delete_device(USER, "D002").unwrap();
        api.reset_data();
        assert!(api.get_device(USER, "D002").is_ok());
    }
}
