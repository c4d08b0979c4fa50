use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap())
}

/// 用户名/社区句柄的字符集校验，供请求 DTO 的 `validator` custom
/// 校验使用；长度边界由 derive 的 length 规则负责。
pub fn username_charset(username: &str) -> Result<(), ValidationError> {
    if username_regex().is_match(username) {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_charset");
        error.message =
            Some("Username may only contain letters, numbers, underscores and hyphens".into());
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_charset() {
        // 有效用户名
        assert!(username_charset("user123").is_ok());
        assert!(username_charset("test_user").is_ok());
        assert!(username_charset("user-name").is_ok());

        // 无效用户名
        assert!(username_charset("user name").is_err());
        assert!(username_charset("user@name").is_err());
        assert!(username_charset("ユーザー").is_err());
    }
}
