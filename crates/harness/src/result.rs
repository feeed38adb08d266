//! 统一结果约定
//!
//! 所有操作处理器通过 `ApiResult` 向调用方报告预期内的业务失败，
//! 不为业务失败抛 panic。`envelope` 负责把结果渲染成统一的
//! `{"ok": ...}` JSON 信封，供 CLI 和 LLM 工具调用层消费。

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// 业务错误分类
///
/// 五类错误覆盖全部模拟服务的失败场景，wire 编码为 snake_case 字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// ID 在所属集合中不存在
    NotFound,
    /// 参数取值非法或状态机不允许该操作
    Validation,
    /// 余额不足以支付本次操作
    InsufficientBalance,
    /// 未登录，或操作他人名下的实体
    Unauthorized,
    /// 唯一性冲突（如重名频道）
    AlreadyExists,
}

impl ErrorKind {
    /// 错误分类的 wire 编码
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::InsufficientBalance => "insufficient_balance",
            Self::Unauthorized => "unauthorized",
            Self::AlreadyExists => "already_exists",
        }
    }
}

/// 业务错误
///
/// 分类 + 人类可读消息。处理器内部构造，调用方按 `kind` 分支处理。
/// 个别服务在 wire 上用自有的错误字符串（如 Netflix 的
/// `invalid_rating`），通过 `with_code` 覆盖分类码。
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{}: {}", .code.as_deref().unwrap_or(.kind.code()), .message)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// 服务自定义的 wire 错误码，None 时用分类码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    /// 覆盖渲染进信封的错误码
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// 信封里实际呈现的错误码：自定义码优先，否则用分类码
    pub fn wire_code(&self) -> &str {
        self.code.as_deref().unwrap_or(self.kind.code())
    }

    /// 实体不存在
    pub fn not_found(what: &str, id: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{what} '{id}' not found"))
    }

    /// 参数校验失败
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// 余额不足
    pub fn insufficient_balance(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientBalance, message)
    }

    /// 未认证或越权
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// 唯一性冲突
    pub fn already_exists(what: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::AlreadyExists,
            format!("{what} '{name}' already exists"),
        )
    }
}

/// 处理器的统一返回类型
pub type ApiResult<T> = Result<T, ApiError>;

/// 把处理器结果渲染成响应信封
///
/// 成功时负载字段平铺进 `{"ok": true, ...}`（非对象负载放入 `data`），
/// 失败时渲染 `{"ok": false, "error": <code>, "message": <text>}`
pub fn envelope<T: Serialize>(result: &ApiResult<T>) -> Value {
    match result {
        Ok(payload) => match serde_json::to_value(payload) {
            Ok(Value::Object(mut map)) => {
                map.insert("ok".to_string(), Value::Bool(true));
                Value::Object(map)
            }
            Ok(Value::Null) => json!({"ok": true}),
            Ok(other) => json!({"ok": true, "data": other}),
            Err(_) => json!({"ok": true}),
        },
        Err(err) => json!({
            "ok": false,
            "error": err.wire_code(),
            "message": err.message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        user_id: String,
        balance: f64,
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ErrorKind::NotFound.code(), "not_found");
        assert_eq!(ErrorKind::Validation.code(), "validation");
        assert_eq!(
            ErrorKind::InsufficientBalance.code(),
            "insufficient_balance"
        );
        assert_eq!(ErrorKind::Unauthorized.code(), "unauthorized");
        assert_eq!(ErrorKind::AlreadyExists.code(), "already_exists");
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found("profile", "P999");
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "profile 'P999' not found");
        assert_eq!(err.to_string(), "not_found: profile 'P999' not found");
    }

    #[test]
    fn test_envelope_success_flattens_object() {
        let result: ApiResult<Payload> = Ok(Payload {
            user_id: "USR-1".to_string(),
            balance: 12.5,
        });

        let value = envelope(&result);
        assert_eq!(value["ok"], true);
        assert_eq!(value["user_id"], "USR-1");
        assert_eq!(value["balance"], 12.5);
    }

    #[test]
    fn test_envelope_success_wraps_non_object() {
        let result: ApiResult<Vec<i32>> = Ok(vec![1, 2, 3]);

        let value = envelope(&result);
        assert_eq!(value["ok"], true);
        assert_eq!(value["data"], json!([1, 2, 3]));
    }

    #[test]
    fn test_service_specific_code_overrides_envelope() {
        let result: ApiResult<Payload> =
            Err(ApiError::validation("rating must be between 1 and 5").with_code("invalid_rating"));

        let value = envelope(&result);
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "invalid_rating");

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.wire_code(), "invalid_rating");
        assert_eq!(
            err.to_string(),
            "invalid_rating: rating must be between 1 and 5"
        );
    }

    #[test]
    fn test_envelope_failure_shape() {
        let result: ApiResult<Payload> =
            Err(ApiError::insufficient_balance("Insufficient balance to send SMS"));

        let value = envelope(&result);
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "insufficient_balance");
        assert_eq!(value["message"], "Insufficient balance to send SMS");
    }

    #[test]
    fn test_api_error_serde_round_trip() {
        let err = ApiError::validation("rating must be between 1 and 5");
        let json = serde_json::to_string(&err).unwrap();
        let restored: ApiError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, restored);
    }
}
