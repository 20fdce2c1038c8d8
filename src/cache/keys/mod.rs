/// 缓存键模块
/// 提供实体键、列表键以及查询条件指纹的生成函数
use std::fmt::Display;

use sha2::{Digest, Sha256};

use crate::models::{Id, Scalar};

/// 键长度上限，超过后改用哈希摘要
pub const MAX_KEY_LEN: usize = 100;

/// 各段之间的分隔符
const SEPARATOR: &str = "_";

/// 生成查询条件指纹
///
/// 条件渲染为 `name:value` 后按字典序排序，与插入顺序无关；
/// 附加参数（页码、每页条数等）保持调用方给出的顺序。
pub fn fingerprint<'a, I>(conditions: I, args: &[&dyn Display]) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Scalar)>,
{
    let mut parts: Vec<String> = conditions
        .into_iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect();
    parts.sort();
    let cond_str = parts.join(SEPARATOR);

    let arg_str = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(SEPARATOR);

    let full = format!("{cond_str}{SEPARATOR}{arg_str}");
    if full.len() > MAX_KEY_LEN {
        digest(&full)
    } else {
        full
    }
}

/// 生成详情缓存键 `prefix + "id:" + id [+ "_" + arg ...]`
pub fn detail_key(prefix: &str, id: Id, args: &[&dyn Display]) -> String {
    let mut key = format!("{prefix}id:{id}");
    for arg in args {
        key.push_str(SEPARATOR);
        key.push_str(&arg.to_string());
    }
    key
}

/// 生成单个实体缓存键
pub fn entity_key(prefix: &str, id: Id) -> String {
    format!("{prefix}{id}")
}

/// 实体聚合列表的哨兵键（id = 0）
pub fn sentinel_key(prefix: &str) -> String {
    entity_key(prefix, 0)
}

/// 生成列表缓存键
pub fn list_key(prefix: &str, fingerprint: &str) -> String {
    format!("{prefix}list:{fingerprint}")
}

/// 128位摘要（SHA-256 截断）的十六进制表示
fn digest(input: &str) -> String {
    let hash = Sha256::digest(input.as_bytes());
    hash[..16].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Conditions;

    fn conditions(pairs: &[(&str, Scalar)]) -> Conditions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn fingerprint_ignores_condition_order() {
        let mut a = Conditions::new();
        a.insert("status".into(), Scalar::from("published"));
        a.insert("category_id".into(), Scalar::from(3u64));
        a.insert("user_id".into(), Scalar::from(7u64));

        let mut b = Conditions::new();
        b.insert("user_id".into(), Scalar::from(7u64));
        b.insert("category_id".into(), Scalar::from(3u64));
        b.insert("status".into(), Scalar::from("published"));

        assert_eq!(fingerprint(&a, &[&1, &10]), fingerprint(&b, &[&1, &10]));
        assert_eq!(
            fingerprint(&a, &[&1, &10]),
            "category_id:3_status:published_user_id:7_1_10"
        );
    }

    #[test]
    fn fingerprint_respects_argument_order() {
        let c = conditions(&[("user_id", Scalar::from(1u64))]);
        assert_ne!(fingerprint(&c, &[&1, &10]), fingerprint(&c, &[&10, &1]));
    }

    #[test]
    fn different_conditions_give_different_keys() {
        let a = conditions(&[("category_id", Scalar::from(1u64))]);
        let b = conditions(&[("category_id", Scalar::from(2u64))]);
        assert_ne!(fingerprint(&a, &[&1, &10]), fingerprint(&b, &[&1, &10]));
    }

    #[test]
    fn long_fingerprint_is_hashed() {
        let long = "x".repeat(150);
        let c = conditions(&[("title", Scalar::from(long.as_str()))]);
        let key = fingerprint(&c, &[&1, &10]);
        assert!(key.len() <= MAX_KEY_LEN);
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(key, fingerprint(&c, &[&1, &10]));
    }

    #[test]
    fn empty_conditions_still_carry_args() {
        let c = Conditions::new();
        assert_eq!(fingerprint(&c, &[&2, &20]), "_2_20");
    }

    #[test]
    fn detail_key_appends_args() {
        assert_eq!(detail_key("comment:post:", 5, &[]), "comment:post:id:5");
        assert_eq!(detail_key("comment:post:", 5, &[&1, &10]), "comment:post:id:5_1_10");
    }

    #[test]
    fn sentinel_is_id_zero() {
        assert_eq!(sentinel_key("category:"), "category:0");
        assert_eq!(entity_key("category:", 12), "category:12");
    }
}
