use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
}

/// 各实体缓存的过期时间
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub user_ttl: Duration,
    pub post_ttl: Duration,
    pub category_ttl: Duration,
    pub tag_ttl: Duration,
    pub comment_ttl: Duration,
    pub token_ttl: Duration,
    /// 进程内缓存清理过期条目的间隔
    pub cleanup_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            user_ttl: Duration::from_secs(24 * 3600),
            post_ttl: Duration::from_secs(3600),
            category_ttl: Duration::from_secs(12 * 3600),
            tag_ttl: Duration::from_secs(12 * 3600),
            comment_ttl: Duration::from_secs(6 * 3600),
            token_ttl: Duration::from_secs(7 * 24 * 3600),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// 服务层参数
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// 浏览量每累计多少次同步一次数据库
    pub view_count_batch: u64,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub bcrypt_cost: u32,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            view_count_batch: 10,
            default_page_size: 10,
            max_page_size: 100,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            jwt_secret: "change-me".to_string(),
            jwt_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub cache: CacheSettings,
    pub service: ServiceSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 从任意变量来源构建配置，缺少必填项时报错，可选数值格式错误时使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let number = |name: &str, default: u64| {
            lookup(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let secs = |name: &str, default: Duration| {
            Duration::from_secs(number(name, default.as_secs()))
        };

        let cache_defaults = CacheSettings::default();
        let service_defaults = ServiceSettings::default();

        let jwt_hours = lookup("JWT_EXPIRATION")
            .and_then(|v| v.trim().trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(24);

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: lookup("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            cache: CacheSettings {
                user_ttl: secs("USER_CACHE_TTL", cache_defaults.user_ttl),
                post_ttl: secs("POST_CACHE_TTL", cache_defaults.post_ttl),
                category_ttl: secs("CATEGORY_CACHE_TTL", cache_defaults.category_ttl),
                tag_ttl: secs("TAG_CACHE_TTL", cache_defaults.tag_ttl),
                comment_ttl: secs("COMMENT_CACHE_TTL", cache_defaults.comment_ttl),
                token_ttl: secs("TOKEN_CACHE_TTL", cache_defaults.token_ttl),
                cleanup_interval: secs("CACHE_CLEANUP_INTERVAL", cache_defaults.cleanup_interval),
            },
            service: ServiceSettings {
                view_count_batch: number("VIEW_COUNT_BATCH", service_defaults.view_count_batch)
                    .max(1),
                default_page_size: number(
                    "DEFAULT_PAGE_SIZE",
                    u64::from(service_defaults.default_page_size),
                ) as u32,
                max_page_size: number("MAX_PAGE_SIZE", u64::from(service_defaults.max_page_size))
                    as u32,
                bcrypt_cost: number("BCRYPT_COST", u64::from(service_defaults.bcrypt_cost)) as u32,
                jwt_secret: required("JWT_SECRET")?,
                jwt_ttl: Duration::from_secs(jwt_hours * 3600),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/blog"),
        ("REDIS_URL", "redis://127.0.0.1/"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache.post_ttl, Duration::from_secs(3600));
        assert_eq!(config.cache.token_ttl, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.cache.cleanup_interval, Duration::from_secs(60));
        assert_eq!(config.service.view_count_batch, 10);
        assert_eq!(config.service.jwt_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn overrides_and_malformed_numbers() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("POST_CACHE_TTL", "120"));
        vars.push(("JWT_EXPIRATION", "48h"));
        vars.push(("MAX_PAGE_SIZE", "lots"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.cache.post_ttl, Duration::from_secs(120));
        assert_eq!(config.service.jwt_ttl, Duration::from_secs(48 * 3600));
        assert_eq!(config.service.max_page_size, 100);
    }

    #[test]
    fn missing_required_variable_is_an_error() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }
}
