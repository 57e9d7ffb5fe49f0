pub mod inject;

use axum::{
    body::Bytes,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

use crate::frontend::FrontendState;
use crate::static_content::{self, DEFAULT_DOCUMENT};

// ============= 环境变量来源 =============

/// 环境变量读取接口
///
/// 每次渲染默认文档时都会重新读取，不做缓存
pub trait EnvSource: Send + Sync {
    /// 读取变量值，未设置时返回 `None`
    fn var(&self, name: &str) -> Option<String>;
}

/// 当前进程的环境变量
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

// ============= 注入脚本 =============

/// 转成 JS 字符串字面量；`<` 也转义，避免值里出现 `</script>`
fn js_string(value: &str) -> String {
    serde_json::Value::from(value)
        .to_string()
        .replace('<', "\\u003c")
}

/// 构造 `{KEY:"value",…}`，按 `keys` 的顺序，未设置的变量为空字符串
pub fn env_object_literal(keys: &[String], env: &dyn EnvSource) -> String {
    let fields: Vec<String> = keys
        .iter()
        .map(|key| format!("{}:{}", key, js_string(&env.var(key).unwrap_or_default())))
        .collect();
    format!("{{{}}}", fields.join(","))
}

/// 构造 `window.ENV={…};`
pub fn env_script(global_name: &str, keys: &[String], env: &dyn EnvSource) -> String {
    format!("window.{}={};", global_name, env_object_literal(keys, env))
}

/// 只有根路径和默认文档路径需要注入
///
/// 先按资源查找的规则规范化，`/index%2Ehtml`、`/./` 这类写法同样会注入
pub fn is_default_document_path(path: &str) -> bool {
    let key = static_content::normalize_path(path);
    key.is_empty() || key == DEFAULT_DOCUMENT
}

/// 读取默认文档并注入运行时配置
///
/// 默认文档缺失时返回空内容，找不到 `</head>` 时原样返回
pub fn render_default_document(state: &FrontendState) -> Bytes {
    let Some(document) = state.bundle.default_document() else {
        warn!("前端资源中缺少 {}，返回空页面", DEFAULT_DOCUMENT);
        return Bytes::new();
    };

    let script = env_script(&state.global_name, &state.env_keys, &*state.env);
    match inject::inject_before_head_close(document, &script) {
        Some(html) => Bytes::from(html),
        None => {
            debug!("{} 中没有 </head>，跳过注入", DEFAULT_DOCUMENT);
            document.clone()
        }
    }
}

/// 环境变量注入中间件
///
/// 拦截 `/` 和 `/index.html`，返回注入了 `window.ENV` 的默认文档；
/// 其他路径交给静态资源处理
pub async fn inject_env(
    State(state): State<Arc<FrontendState>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_default_document_path(request.uri().path()) {
        return next.run(request).await;
    }

    static_content::html_response(render_default_document(&state))
}
