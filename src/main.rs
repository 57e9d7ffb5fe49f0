use tower::ServiceBuilder;
use tower_http::trace::{self, TraceLayer};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use anyhow::Result;

use crate::config::Config;
use crate::frontend::FrontendState;
use crate::runtime_env::ProcessEnv;
use crate::static_content::{AssetBundle, DEFAULT_DOCUMENT};

mod config;
mod frontend;
mod runtime_env;
mod static_content;

const CONFIG_FILE: &str = "config.yml";

#[tokio::main]
async fn main() -> Result<()> {
    // 先读配置，日志级别来自配置文件
    let (config, created) = Config::load_or_create(CONFIG_FILE)
        .inspect_err(|e| eprintln!("配置文件加载失败 {}: {:?}", CONFIG_FILE, e))?;

    // 初始化 tracing 日志
    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .with_target(false)
        .with_level(true)
        .init();

    if created {
        warn!("配置文件不存在，已创建默认配置文件: {}", CONFIG_FILE);
    } else {
        info!("配置文件加载成功: {}", CONFIG_FILE);
    }

    // 前端资源只在启动时加载一次
    let bundle = AssetBundle::embedded();
    if bundle.is_empty() {
        warn!("没有嵌入任何前端资源!");
    } else {
        info!("已加载 {} 个前端资源文件", bundle.len());
    }
    if bundle.default_document().is_none() {
        warn!("前端资源中缺少 {}，页面将返回空内容", DEFAULT_DOCUMENT);
    }

    info!(
        "注入 window.{} 的环境变量: {}",
        config.frontend.global_name,
        config.frontend.env_keys.join(", ")
    );

    let state = Arc::new(FrontendState::new(bundle, &config.frontend, Arc::new(ProcessEnv)));

    let app = frontend::router(state).layer(
        ServiceBuilder::new().layer(
            // 请求跟踪
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_request(trace::DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        ),
    );

    // 绑定地址
    let addr = SocketAddr::from((
        config.server.host.parse::<IpAddr>()
            .unwrap_or_else(|_| {
                warn!("无效的监听地址 {}，改用 127.0.0.1", config.server.host);
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            }),
        config.server.port,
    ));

    info!("服务器启动地址: http://{}", addr);

    // 启动服务器
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("绑定地址失败 {}: {:?}", addr, e);
            std::process::exit(1);
        }
    };

    info!("服务器正在运行...");

    axum::serve(listener, app).await
        .inspect_err(|e| error!("Error: {e:?}"))?;

    Ok(())
}
