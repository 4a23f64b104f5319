//! 统一 API 错误码定义

/// API 错误码枚举
///
/// 序列化时按 `as i32` 写入响应体，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 查询错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    ServiceUnavailable = 1030,

    // 查询错误 3000-3099
    InvalidKey = 3000,
    LookupFailed = 3001,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorCode::Success.as_i32(), 0);
        assert_eq!(ErrorCode::ServiceUnavailable.as_i32(), 1030);
        assert_eq!(ErrorCode::InvalidKey.as_i32(), 3000);
        assert_eq!(ErrorCode::LookupFailed.as_i32(), 3001);
    }
}
