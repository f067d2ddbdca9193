//! 错误信息提取与分类：把各种形状的 API 错误响应归一化为可读字符串。

use serde_json::{Map, Value};
use std::backtrace::BacktraceStatus;
use std::fmt::Display;

/// API 错误响应的几种已知形状，按提取优先级排列
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorResponse {
    /// 响应本身就是字符串
    Plain(String),
    /// `{"error": "..."}`
    DirectError(String),
    /// `{"error": {"error": "...", "message": "..."}}`
    NestedError {
        error: Option<String>,
        message: Option<String>,
    },
    /// `{"errorMsg": "..."}`
    ErrorMsg(String),
    /// `{"message": "..."}`
    Message(String),
    Unknown,
}

impl ErrorResponse {
    /// 按优先级识别错误响应：error(字符串) > error(嵌套对象) > errorMsg > message。
    /// 嵌套对象里既没有 error 也没有 message 字符串时继续尝试后面的字段。
    pub fn from_value(response: &Value) -> Self {
        if is_falsy(response) {
            return ErrorResponse::Unknown;
        }

        let data = match response {
            Value::String(s) => return ErrorResponse::Plain(s.clone()),
            Value::Object(map) => map,
            _ => return ErrorResponse::Unknown,
        };

        match data.get("error") {
            Some(Value::String(s)) => return ErrorResponse::DirectError(s.clone()),
            Some(Value::Object(nested)) => {
                let error = string_field(nested, "error");
                let message = string_field(nested, "message");
                if error.is_some() || message.is_some() {
                    return ErrorResponse::NestedError { error, message };
                }
            }
            _ => {}
        }

        if let Some(s) = string_field(data, "errorMsg") {
            return ErrorResponse::ErrorMsg(s);
        }
        if let Some(s) = string_field(data, "message") {
            return ErrorResponse::Message(s);
        }

        ErrorResponse::Unknown
    }

    /// 取出错误文本；嵌套形状里 error 优先于 message
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorResponse::Plain(s)
            | ErrorResponse::DirectError(s)
            | ErrorResponse::ErrorMsg(s)
            | ErrorResponse::Message(s) => Some(s),
            ErrorResponse::NestedError { error, message } => {
                error.as_deref().or(message.as_deref())
            }
            ErrorResponse::Unknown => None,
        }
    }
}

/// null、false、0、空字符串都视为「没有错误」
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// 从错误响应中提取错误信息，无法识别的形状返回 None，不会报错。
///
/// ```
/// use poly_positions::utils::error_helpers::extract_error_message;
/// use serde_json::json;
///
/// let msg = extract_error_message(&json!({"error": {"message": "nested msg"}}));
/// assert_eq!(msg.as_deref(), Some("nested msg"));
/// ```
pub fn extract_error_message(response: &Value) -> Option<String> {
    ErrorResponse::from_value(response).message().map(str::to_owned)
}

/// 错误信息是否表示余额不足或授权（allowance）不足，大小写不敏感
pub fn is_insufficient_balance_or_allowance_error(message: Option<&str>) -> bool {
    let Some(message) = message.filter(|m| !m.is_empty()) else {
        return false;
    };
    let lower = message.to_lowercase();
    lower.contains("not enough balance") || lower.contains("allowance")
}

/// 格式化错误用于日志：只取最外层的错误信息
pub fn format_error<E: Display + ?Sized>(error: &E) -> String {
    error.to_string()
}

/// 获取错误的调用栈。只有开启 RUST_BACKTRACE / RUST_LIB_BACKTRACE 时才会捕获
pub fn get_error_stack(error: &anyhow::Error) -> Option<String> {
    let backtrace = error.backtrace();
    if backtrace.status() != BacktraceStatus::Captured {
        return None;
    }
    let stack = backtrace.to_string();
    if stack.trim().is_empty() {
        None
    } else {
        Some(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_falsy_inputs_yield_none() {
        assert_eq!(extract_error_message(&Value::Null), None);
        assert_eq!(extract_error_message(&json!("")), None);
        assert_eq!(extract_error_message(&json!(0)), None);
        assert_eq!(extract_error_message(&json!(0.0)), None);
        assert_eq!(extract_error_message(&json!(false)), None);
    }

    #[test]
    fn test_plain_string_passes_through() {
        assert_eq!(
            extract_error_message(&json!("plain string")).as_deref(),
            Some("plain string")
        );
    }

    #[test]
    fn test_direct_error_field() {
        let resp = json!({"error": "not enough balance", "message": "ignored"});
        assert_eq!(
            ErrorResponse::from_value(&resp),
            ErrorResponse::DirectError("not enough balance".to_string())
        );
        assert_eq!(
            extract_error_message(&resp).as_deref(),
            Some("not enough balance")
        );
    }

    #[test]
    fn test_nested_error_precedence() {
        assert_eq!(
            extract_error_message(&json!({"error": {"message": "nested msg"}})).as_deref(),
            Some("nested msg")
        );
        assert_eq!(
            extract_error_message(&json!({"error": {"error": "inner", "message": "outer"}}))
                .as_deref(),
            Some("inner")
        );
    }

    #[test]
    fn test_empty_nested_error_falls_through_to_other_fields() {
        let resp = json!({"error": {"code": 400}, "errorMsg": "x"});
        assert_eq!(extract_error_message(&resp).as_deref(), Some("x"));

        let resp = json!({"error": {"code": 400}});
        assert_eq!(ErrorResponse::from_value(&resp), ErrorResponse::Unknown);
    }

    #[test]
    fn test_alternative_fields() {
        assert_eq!(extract_error_message(&json!({"errorMsg": "x"})).as_deref(), Some("x"));
        assert_eq!(extract_error_message(&json!({"message": "y"})).as_deref(), Some("y"));
        assert_eq!(
            extract_error_message(&json!({"errorMsg": "x", "message": "y"})).as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_unrecognized_shapes_yield_none() {
        assert_eq!(extract_error_message(&json!({})), None);
        assert_eq!(extract_error_message(&json!({"error": 42, "message": 7})), None);
        assert_eq!(extract_error_message(&json!(["error"])), None);
        assert_eq!(extract_error_message(&json!(500)), None);
        assert_eq!(extract_error_message(&json!(true)), None);
    }

    #[test]
    fn test_insufficient_balance_classification() {
        assert!(is_insufficient_balance_or_allowance_error(Some(
            "Not Enough Balance for trade"
        )));
        assert!(is_insufficient_balance_or_allowance_error(Some(
            "insufficient allowance"
        )));
        assert!(is_insufficient_balance_or_allowance_error(Some("ALLOWANCE too low")));
        assert!(!is_insufficient_balance_or_allowance_error(Some("unrelated error")));
        assert!(!is_insufficient_balance_or_allowance_error(Some("")));
        assert!(!is_insufficient_balance_or_allowance_error(None));
    }

    #[test]
    fn test_format_error() {
        let err = anyhow::anyhow!("request failed");
        assert_eq!(format_error(&err), "request failed");

        let wrapped = anyhow::anyhow!("root cause").context("获取持仓失败");
        assert_eq!(format_error(&wrapped), "获取持仓失败");

        assert_eq!(format_error("already a string"), "already a string");
        assert_eq!(format_error(&42), "42");
    }

    #[test]
    fn test_error_stack_only_when_captured() {
        let err = anyhow::anyhow!("boom");
        match get_error_stack(&err) {
            Some(stack) => {
                assert_eq!(err.backtrace().status(), BacktraceStatus::Captured);
                assert!(!stack.trim().is_empty());
            }
            None => assert_ne!(err.backtrace().status(), BacktraceStatus::Captured),
        }
    }
}
