//! StudyHub 도메인 모델.
//!
//! 업스트림 AI API 요청/응답, 호출 지표, 학습 기록 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod completion;
pub mod metric;
pub mod study;
