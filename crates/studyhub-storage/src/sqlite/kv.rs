//! 키-값 로그 (KvStore 포트 구현).

use async_trait::async_trait;
use studyhub_core::error::CoreError;
use studyhub_core::ports::kv_store::KvStore;
use tracing::{debug, warn};

use super::SqliteStorage;

impl SqliteStorage {
    /// 접두사로 시작하는 키 개수
    #[cfg(test)]
    fn count_by_prefix(&self, prefix: &str) -> Result<usize, CoreError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM kv_store WHERE substr(key, 1, length(?1)) = ?1",
                rusqlite::params![prefix],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Storage(format!("키 개수 조회 실패: {e}")))?;
        Ok(count as usize)
    }

    /// 단일 키 조회
    pub fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT value FROM kv_store WHERE key = ?1")
            .map_err(|e| CoreError::Storage(format!("쿼리 준비 실패: {e}")))?;

        let mut rows = stmt
            .query(rusqlite::params![key])
            .map_err(|e| CoreError::Storage(format!("쿼리 실행 실패: {e}")))?;

        match rows
            .next()
            .map_err(|e| CoreError::Storage(format!("행 읽기 실패: {e}")))?
        {
            Some(row) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| CoreError::Storage(format!("값 읽기 실패: {e}")))?;
                Ok(Some(decode_value(key, raw)))
            }
            None => Ok(None),
        }
    }
}

/// 저장된 텍스트를 JSON으로 해석. 깨진 값은 문자열 그대로 돌려주고
/// 상위 계층(집계기 등)이 건너뛰도록 한다.
fn decode_value(key: &str, raw: String) -> serde_json::Value {
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, "저장된 값이 JSON이 아님: {e}");
            serde_json::Value::String(raw)
        }
    }
}

#[async_trait]
impl KvStore for SqliteStorage {
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), CoreError> {
        let data = serde_json::to_string(value)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            rusqlite::params![key, data],
        )
        .map_err(|e| CoreError::Storage(format!("값 저장 실패: {e}")))?;

        debug!("키 저장: {key}");
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<serde_json::Value>, CoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare_cached(
                "SELECT key, value FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key ASC",
            )
            .map_err(|e| CoreError::Storage(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![prefix], |row| {
                let key: String = row.get(0)?;
                let value: String = row.get(1)?;
                Ok((key, value))
            })
            .map_err(|e| CoreError::Storage(format!("쿼리 실행 실패: {e}")))?;

        let mut values = Vec::new();
        for row in rows {
            let (key, raw) = row.map_err(|e| CoreError::Storage(format!("행 읽기 실패: {e}")))?;
            values.push(decode_value(&key, raw));
        }

        debug!(prefix, count = values.len(), "접두사 조회");
        Ok(values)
    }
}
