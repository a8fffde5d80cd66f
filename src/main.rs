mod api;
mod config;
mod db;
mod logger;
mod mailer;
mod otp;
mod role;

use actix_cors::Cors;
use actix_web::{http::Method, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use config::AppConfig;
use log::{error, info};
use mailer::SmtpMailer;
use otp::{OtpManager, SqliteBackend, SystemClock};
use role::{LoggingRoleGranter, RoleGranter};

// 应用状态
pub struct AppState {
    pub config: AppConfig,
    pub otp_manager: OtpManager<SqliteBackend>,
    pub role_granter: Arc<dyn RoleGranter>,
}

fn io_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env().map_err(|e| io_error("配置错误", e))?;

    // 初始化日志系统
    logger::Logger::init_or_fallback(&config.log_dir.join("app.log"), config.log_level);
    info!("应用程序启动");
    info!("配置已加载 - 网络: {}, 数据库: {}", config.network.name(), config.database_url);

    // 连接数据库
    let pool = db::connect(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| io_error("数据库连接错误", e))?;

    // 初始化数据库
    db::initialize_db(&pool)
        .await
        .map_err(|e| io_error("数据库初始化错误", e))?;

    let mailer = SmtpMailer::new(&config.smtp).map_err(|e| io_error("邮件发送器初始化错误", e))?;
    let otp_manager = OtpManager::new(
        SqliteBackend::new(pool.clone()),
        Arc::new(mailer),
        Arc::new(SystemClock),
        config.otp_ttl_secs,
    );
    let role_granter = LoggingRoleGranter::new(config.hat_id.clone(), config.network);

    let bind_addr = (config.host.clone(), config.port);
    let app_state = web::Data::new(AppState {
        config,
        otp_manager,
        role_granter: Arc::new(role_granter),
    });

    info!("服务器启动在 http://{}:{}", bind_addr.0, bind_addr.1);

    let result = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec![Method::POST])
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(api::configure)
    })
    .bind(bind_addr)?
    .run()
    .await;

    if let Err(e) = &result {
        error!("服务器异常退出: {}", e);
    }
    pool.close().await;
    info!("数据库连接池已关闭");
    result
}
