//! 리소스 ID 정규화 및 파싱 유틸리티.
//!
//! Azure 리소스 ID는 대소문자를 구분하지 않으므로 비교 전에 항상 소문자로 정규화합니다.
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}
//! ```

/// 비교용 정규화 ID (소문자).
pub fn canonical_id(id: &str) -> String {
    id.to_lowercase()
}

/// 리소스 ID에서 구독 ID 추출.
///
/// `/subscriptions/` 세그먼트가 없거나 값이 비어 있으면 `None`.
pub fn subscription_of(id: &str) -> Option<&str> {
    segment_after(id, "subscriptions")
}

/// 리소스 ID에서 리소스 그룹 이름 추출.
pub fn resource_group_of(id: &str) -> Option<&str> {
    segment_after(id, "resourcegroups")
}

fn segment_after<'a>(id: &'a str, marker: &str) -> Option<&'a str> {
    let mut parts = id.split('/');
    while let Some(part) = parts.next() {
        if part.eq_ignore_ascii_case(marker) {
            return parts.next().filter(|value| !value.is_empty());
        }
    }
    None
}
