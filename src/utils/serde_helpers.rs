/// 用于处理 SurrealDB Thing ID 的序列化/反序列化辅助模块

use serde::{Deserialize, Deserializer, Serializer};

/// 将 SurrealDB 的记录 ID 归一化为裸 ID 字符串。
///
/// 根据协议不同，记录 ID 可能以三种形态出现：
/// 纯字符串（"prompt:⟨uuid⟩" 或已经是裸 "uuid"）、
/// Thing 结构（{ tb, id }，其中 id 是字符串或数字）、
/// 或 Thing 结构且 id 为枚举形式（{ "String": "uuid" }）。
pub mod thing_id {
    use super::*;

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(id)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IdValue {
            String(String),
            Thing {
                #[allow(dead_code)]
                tb: String,
                id: serde_json::Value,
            },
        }

        match IdValue::deserialize(deserializer)? {
            IdValue::String(s) => Ok(strip_record_prefix(&s)),
            IdValue::Thing { id, .. } => Ok(flatten_inner_id(&id)),
        }
    }

    /// 去掉 "table:" 前缀以及 SurrealDB 对复杂 ID 的 ⟨⟩ 包裹
    pub(crate) fn strip_record_prefix(raw: &str) -> String {
        let bare = match raw.split_once(':') {
            Some((_, rest)) => rest,
            None => raw,
        };
        bare.trim_start_matches('⟨').trim_end_matches('⟩').to_string()
    }

    pub(crate) fn flatten_inner_id(id: &serde_json::Value) -> String {
        match id {
            serde_json::Value::String(s) => strip_record_prefix(s),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Object(map) => {
                // sql::Id 的枚举序列化形式，例如 {"String": "uuid"}
                if let Some(serde_json::Value::String(s)) = map.get("String") {
                    return strip_record_prefix(s);
                }
                if let Some(serde_json::Value::Number(n)) = map.get("Number") {
                    return n.to_string();
                }
                id.to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::thing_id;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Record {
        #[serde(with = "thing_id")]
        id: String,
    }

    #[test]
    fn test_plain_string_id() {
        let record: Record = serde_json::from_value(serde_json::json!({ "id": "abc-123" })).unwrap();
        assert_eq!(record.id, "abc-123");
    }

    #[test]
    fn test_prefixed_string_id() {
        let record: Record =
            serde_json::from_value(serde_json::json!({ "id": "prompt:⟨abc-123⟩" })).unwrap();
        assert_eq!(record.id, "abc-123");

        let record: Record =
            serde_json::from_value(serde_json::json!({ "id": "prompt:abc" })).unwrap();
        assert_eq!(record.id, "abc");
    }

    #[test]
    fn test_thing_id_with_string_inner() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "id": { "tb": "prompt", "id": "abc-123" }
        }))
        .unwrap();
        assert_eq!(record.id, "abc-123");
    }

    #[test]
    fn test_thing_id_with_enum_inner() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "id": { "tb": "prompt", "id": { "String": "abc-123" } }
        }))
        .unwrap();
        assert_eq!(record.id, "abc-123");
    }
}
