//! # studyhub-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 키-값 로그와 스키마 마이그레이션을 관리한다.
//!
//! ## 모듈
//! - `sqlite`: 키-값 로그 (KvStore 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;

pub use sqlite::SqliteStorage;
