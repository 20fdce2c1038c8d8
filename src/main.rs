use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use blog_backend::{
    AppState,
    cache::{CacheBackend, MemoryCache, RedisCache},
    config::Config,
    database::MemoryStore,
    routes,
    services::{Services, Stores},
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `DATABASE_URL` 或 `REDIS_URL` 取该值时使用进程内实现
const MEMORY_URL: &str = "memory://";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env()?;

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置存储
    let stores = if config.database_url == MEMORY_URL {
        tracing::warn!("Using in-process store; data is lost on restart");
        Stores::memory(Arc::new(MemoryStore::new()))
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET application_name = 'blog_backend';").await?;
                    Ok(())
                })
            })
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
        Stores::postgres(Arc::new(pool))
    };

    // 设置缓存后端
    let cache: Arc<dyn CacheBackend> = if config.redis_url == MEMORY_URL {
        tracing::warn!("Using in-process cache; entries are not shared between instances");
        let memory = Arc::new(MemoryCache::new());
        memory.spawn_cleanup(config.cache.cleanup_interval.max(Duration::from_secs(1)));
        memory
    } else {
        Arc::new(RedisCache::open(&config.redis_url)?)
    };

    // 设置应用状态
    let services = Services::new(
        stores,
        cache,
        &config.cache,
        config.service.clone(),
    );
    let state = AppState {
        services: Arc::new(services),
        config: config.clone(),
    };

    let app = routes::router(state);

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
