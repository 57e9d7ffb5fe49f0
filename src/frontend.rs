use axum::{Router, middleware};
use std::sync::Arc;

use crate::config::FrontendConfig;
use crate::runtime_env::{self, EnvSource};
use crate::static_content::{self, AssetBundle};

/// 前端处理器的共享状态，启动后只读
pub struct FrontendState {
    pub bundle: AssetBundle,
    /// 暴露给页面的环境变量名 (有序)
    pub env_keys: Vec<String>,
    pub global_name: String,
    pub env: Arc<dyn EnvSource>,
}

impl FrontendState {
    pub fn new(bundle: AssetBundle, config: &FrontendConfig, env: Arc<dyn EnvSource>) -> Self {
        Self {
            bundle,
            env_keys: config.env_keys.clone(),
            global_name: config.global_name.clone(),
            env,
        }
    }
}

/// 前端路由：静态资源 + SPA 回退，外层包一层环境变量注入
pub fn router(state: Arc<FrontendState>) -> Router {
    Router::new()
        .fallback(static_content::serve_static)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            runtime_env::inject_env,
        ))
        .with_state(state)
}
