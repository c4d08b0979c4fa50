use crate::config::Config;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::{Response, Surreal};
use tracing::{debug, error, info};

/// 数据库服务
///
/// 持有一个显式传递、随应用生命周期管理的连接句柄。通过 `Any`
/// 引擎，同一个句柄既可以连接远程服务 (http:// / ws://)，也可以
/// 运行内嵌的内存引擎 (mem://)，后者用于本地开发和集成测试。
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
}

impl Database {
    /// 根据应用配置建立数据库连接
    pub async fn connect(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let credentials = if needs_signin(&config.database_url) {
            Some((config.database_username.as_str(), config.database_password.as_str()))
        } else {
            None
        };

        Self::connect_endpoint(
            &config.database_url,
            &config.database_namespace,
            &config.database_name,
            credentials,
        )
        .await
    }

    /// 连接到指定端点。`credentials` 仅对远程端点有意义。
    pub async fn connect_endpoint(
        url: &str,
        namespace: &str,
        database: &str,
        credentials: Option<(&str, &str)>,
    ) -> Result<Self> {
        let client = any::connect(url).await?;

        if let Some((username, password)) = credentials {
            client.signin(Root { username, password }).await?;
        }

        client.use_ns(namespace).use_db(database).await?;

        Ok(Self { client })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// 执行原始SQL查询
    pub async fn query(&self, sql: &str) -> Result<Response> {
        Ok(self.client.query(sql).await?)
    }

    /// 执行带参数的查询
    pub async fn query_with_params<P>(&self, sql: &str, params: P) -> Result<Response>
    where
        P: Serialize,
    {
        Ok(self.client.query(sql).bind(params).await?)
    }

    /// 执行不关心结果集的语句，并检查每条语句是否成功
    pub async fn execute<P>(&self, sql: &str, params: P) -> Result<()>
    where
        P: Serialize,
    {
        let response = self.client.query(sql).bind(params).await?;
        response.check()?;
        Ok(())
    }

    /// 创建记录。记录 ID 由调用方提供；`data` 中的 `id` 字段会被
    /// 剥离，避免与记录 ID 冲突。
    pub async fn create<T>(&self, table: &str, id: &str, data: T) -> Result<T>
    where
        T: Serialize,
    {
        let content = strip_id_field(serde_json::to_value(&data)?);

        let response = self
            .client
            .query("CREATE type::thing($tb, $id) CONTENT $content RETURN NONE")
            .bind(json!({ "tb": table, "id": id, "content": content }))
            .await?;
        response.check()?;

        Ok(data)
    }

    /// 创建或整体替换记录
    pub async fn upsert<T>(&self, table: &str, id: &str, data: T) -> Result<T>
    where
        T: Serialize,
    {
        let content = strip_id_field(serde_json::to_value(&data)?);

        let response = self
            .client
            .query("UPDATE type::thing($tb, $id) CONTENT $content RETURN NONE")
            .bind(json!({ "tb": table, "id": id, "content": content }))
            .await?;
        response.check()?;

        Ok(data)
    }

    /// 通过ID获取单个记录
    pub async fn get_by_id<T>(&self, table: &str, id: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        // 获取纯 ID（不带 table 前缀）
        let prefix = format!("{}:", table);
        let pure_id = id.strip_prefix(&prefix).unwrap_or(id);

        debug!("Fetching {}:{}", table, pure_id);

        let mut response = self
            .client
            .query("SELECT *, meta::id(id) AS id FROM type::thing($tb, $id)")
            .bind(json!({ "tb": table, "id": pure_id }))
            .await?;
        let mut rows: Vec<T> = response.take(0)?;
        Ok(rows.pop())
    }

    /// 按字段查找单个记录。`table` 和 `field` 必须来自受信的调用方。
    pub async fn find_one<T>(&self, table: &str, field: &str, value: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let sql = format!(
            "SELECT *, meta::id(id) AS id FROM {} WHERE {} = $value LIMIT 1",
            table, field
        );

        let mut response = self
            .client
            .query(sql)
            .bind(json!({ "value": value }))
            .await?;
        let mut rows: Vec<T> = response.take(0)?;
        Ok(rows.pop())
    }

    /// 通过ID删除记录
    pub async fn delete_by_id(&self, table: &str, id: &str) -> Result<()> {
        let response = self
            .client
            .query("DELETE type::thing($tb, $id) RETURN NONE")
            .bind(json!({ "tb": table, "id": id }))
            .await?;
        response.check()?;
        Ok(())
    }
}

fn needs_signin(url: &str) -> bool {
    url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("ws://")
        || url.starts_with("wss://")
}

fn strip_id_field(mut content: serde_json::Value) -> serde_json::Value {
    if let Some(object) = content.as_object_mut() {
        object.remove("id");
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        #[serde(with = "crate::utils::serde_helpers::thing_id")]
        id: String,
        label: String,
        created_at: DateTime<Utc>,
    }

    async fn memory_db() -> Database {
        Database::connect_endpoint("mem://", "test", "test", None)
            .await
            .expect("failed to start in-memory database")
    }

    #[tokio::test]
    async fn test_verify_connection() {
        let db = memory_db().await;
        assert!(db.verify_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_get_delete_roundtrip() {
        let db = memory_db().await;

        let item = Item {
            id: "item-1".to_string(),
            label: "first".to_string(),
            created_at: Utc::now(),
        };

        db.create("item", "item-1", item.clone()).await.unwrap();

        let fetched: Option<Item> = db.get_by_id("item", "item-1").await.unwrap();
        assert_eq!(fetched, Some(item.clone()));

        // Prefixed ids are accepted too
        let fetched: Option<Item> = db.get_by_id("item", "item:item-1").await.unwrap();
        assert_eq!(fetched, Some(item));

        db.delete_by_id("item", "item-1").await.unwrap();
        let fetched: Option<Item> = db.get_by_id("item", "item-1").await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn test_find_one() {
        let db = memory_db().await;

        let item = Item {
            id: "item-2".to_string(),
            label: "unique-label".to_string(),
            created_at: Utc::now(),
        };
        db.create("item", "item-2", item).await.unwrap();

        let found: Option<Item> = db.find_one("item", "label", "unique-label").await.unwrap();
        assert_eq!(found.map(|i| i.id), Some("item-2".to_string()));

        let missing: Option<Item> = db.find_one("item", "label", "absent").await.unwrap();
        assert!(missing.is_none());
    }
}
