use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    http::{StatusCode, Uri, header},
};
use rust_embed::RustEmbed;
use std::{borrow::Cow, collections::HashMap, sync::Arc};
use tracing::{debug, warn};

use crate::frontend::FrontendState;

/// SPA 的默认文档
pub const DEFAULT_DOCUMENT: &str = "index.html";

#[derive(RustEmbed)]
#[folder = "frontend/dist"]
struct Assets;

/// 只读的前端资源集合，启动时构建一次
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    files: HashMap<String, Bytes>,
}

/// 一次查找的结果
#[derive(Debug, PartialEq)]
pub enum Resolution<'a> {
    /// 命中的静态资源
    Asset { path: String, data: &'a Bytes },
    /// 未命中，回退到默认文档 (默认文档本身也可能缺失)
    DefaultDocument(Option<&'a Bytes>),
}

impl AssetBundle {
    /// 从编译期嵌入的 frontend/dist 构建
    pub fn embedded() -> Self {
        Self::from_embed::<Assets>()
    }

    pub fn from_embed<E: RustEmbed>() -> Self {
        E::iter()
            .filter_map(|path| {
                let file = E::get(&path)?;
                Some((path.into_owned(), into_bytes(file.data)))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Bytes> {
        self.files.get(path)
    }

    pub fn default_document(&self) -> Option<&Bytes> {
        self.get(DEFAULT_DOCUMENT)
    }

    /// 精确查找请求路径对应的资源
    ///
    /// 以 `/` 结尾的目录路径查找其中的 index.html
    pub fn lookup(&self, request_path: &str) -> Option<(String, &Bytes)> {
        let mut key = normalize_path(request_path);
        if key.is_empty() || key.ends_with('/') {
            key.push_str(DEFAULT_DOCUMENT);
        }
        let data = self.get(&key)?;
        Some((key, data))
    }

    /// 先查找，查不到就回退到默认文档 (用于 SPA 前端路由)
    pub fn resolve(&self, request_path: &str) -> Resolution<'_> {
        match self.lookup(request_path) {
            Some((path, data)) => Resolution::Asset { path, data },
            None => Resolution::DefaultDocument(self.default_document()),
        }
    }
}

impl<K: Into<String>, V: Into<Bytes>> FromIterator<(K, V)> for AssetBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn into_bytes(data: Cow<'static, [u8]>) -> Bytes {
    match data {
        Cow::Borrowed(slice) => Bytes::from_static(slice),
        Cow::Owned(vec) => Bytes::from(vec),
    }
}

/// 请求路径 -> 资源键
///
/// URL 解码后按 `/` 切分，去掉空段和 `.`，`..` 回退一级 (不会越过根)，
/// 结果不带开头的 `/`；原路径以 `/` 结尾时保留结尾的 `/`。
/// 注入中间件和资源查找都用它，两边看到的路径一致
pub fn normalize_path(request_path: &str) -> String {
    let decoded = urlencoding::decode(request_path)
        .unwrap_or(Cow::Borrowed(request_path));

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut key = segments.join("/");
    if !key.is_empty() && decoded.ends_with('/') {
        key.push('/');
    }
    key
}

/// 把默认文档作为 text/html 返回
///
/// 默认文档在构建时就会被打包，缺失时返回空页面而不是报错
pub fn html_response(body: impl Into<Bytes>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        body.into(),
    ).into_response()
}

pub async fn serve_static(State(state): State<Arc<FrontendState>>, uri: Uri) -> Response {
    match state.bundle.resolve(uri.path()) {
        Resolution::Asset { path, data } => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                data.clone(),
            ).into_response()
        }
        Resolution::DefaultDocument(Some(index)) => {
            debug!("{} 未命中静态资源，返回 {}", uri.path(), DEFAULT_DOCUMENT);
            html_response(index.clone())
        }
        Resolution::DefaultDocument(None) => {
            warn!("前端资源中缺少 {}", DEFAULT_DOCUMENT);
            html_response(Bytes::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> AssetBundle {
        [
            ("index.html", "<html><head></head><body>root</body></html>"),
            ("assets/app.js", "console.log(1);"),
            ("docs/index.html", "<html>docs</html>"),
            ("my file.txt", "spaced"),
        ]
        .into_iter()
        .map(|(k, v)| (k, Bytes::from_static(v.as_bytes())))
        .collect()
    }

    #[test]
    fn test_lookup_exact_asset() {
        let bundle = bundle();
        let (path, data) = bundle.lookup("/assets/app.js").unwrap();
        assert_eq!(path, "assets/app.js");
        assert_eq!(&data[..], b"console.log(1);");
    }

    #[test]
    fn test_lookup_root_and_directory_index() {
        let bundle = bundle();
        let (path, _) = bundle.lookup("/").unwrap();
        assert_eq!(path, "index.html");

        let (path, data) = bundle.lookup("/docs/").unwrap();
        assert_eq!(path, "docs/index.html");
        assert_eq!(&data[..], b"<html>docs</html>");

        assert!(bundle.lookup("/assets/").is_none());
    }

    #[test]
    fn test_lookup_decodes_path() {
        let bundle = bundle();
        let (path, data) = bundle.lookup("/my%20file.txt").unwrap();
        assert_eq!(path, "my file.txt");
        assert_eq!(&data[..], b"spaced");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path("//"), "");
        assert_eq!(normalize_path("/index.html"), "index.html");
        assert_eq!(normalize_path("/index%2Ehtml"), "index.html");
        assert_eq!(normalize_path("/%69ndex.html"), "index.html");
        assert_eq!(normalize_path("/./favicon.svg"), "favicon.svg");
        assert_eq!(normalize_path("/assets/../favicon.svg"), "favicon.svg");
        assert_eq!(normalize_path("/../../etc/passwd"), "etc/passwd");
        assert_eq!(normalize_path("/docs/./"), "docs/");
        assert_eq!(normalize_path("/docs/.."), "");
        assert_eq!(normalize_path("/a//b"), "a/b");
    }

    #[test]
    fn test_lookup_resolves_dot_segments() {
        let bundle = bundle();
        let (path, data) = bundle.lookup("/docs/../assets/./app.js").unwrap();
        assert_eq!(path, "assets/app.js");
        assert_eq!(&data[..], b"console.log(1);");

        let (path, _) = bundle.lookup("/assets/..").unwrap();
        assert_eq!(path, "index.html");
    }

    #[test]
    fn test_resolve_falls_back_to_default_document() {
        let bundle = bundle();
        match bundle.resolve("/settings/profile") {
            Resolution::DefaultDocument(Some(data)) => {
                assert_eq!(data, bundle.default_document().unwrap());
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_without_default_document() {
        let bundle: AssetBundle = [("app.js", Bytes::from_static(b"x"))].into_iter().collect();
        assert_eq!(bundle.resolve("/missing"), Resolution::DefaultDocument(None));
    }

    #[test]
    fn test_embedded_bundle_has_default_document() {
        let bundle = AssetBundle::embedded();
        let index = bundle.default_document().expect("index.html should be embedded");
        let html = std::str::from_utf8(index).unwrap();
        assert!(html.contains("</head>"));
        assert!(bundle.get("assets/index.js").is_some());
    }
}
