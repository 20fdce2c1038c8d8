use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;

/// 标签，与文章多对多
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTag {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
}

/// 规范化标签名：去除首尾空白、丢弃空名、按首次出现去重
pub fn normalize_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref().trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::normalize_names;

    #[test]
    fn normalize_trims_and_dedupes_in_order() {
        let names = normalize_names(&[" rust ", "", "go", "rust", "  "]);
        assert_eq!(names, vec!["rust".to_string(), "go".to_string()]);
    }
}
