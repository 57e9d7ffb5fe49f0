/// 注入位置的标记，脚本插在第一个 `</head>` 之前
pub const HEAD_CLOSE: &[u8] = b"</head>";

/// 在文档第一个 `</head>` 之前插入 `<script>…</script>`
///
/// 文档里没有 `</head>` 时返回 `None`，由调用方原样返回文档
pub fn inject_before_head_close(document: &[u8], script: &str) -> Option<Vec<u8>> {
    let at = document
        .windows(HEAD_CLOSE.len())
        .position(|window| window == HEAD_CLOSE)?;

    let tag = format!("<script>{script}</script>");
    let mut html = Vec::with_capacity(document.len() + tag.len());
    html.extend_from_slice(&document[..at]);
    html.extend_from_slice(tag.as_bytes());
    html.extend_from_slice(&document[at..]);
    Some(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inserts_before_head_close() {
        let html = inject_before_head_close(b"<html><head><title>x</title></head><body></body></html>", "a=1;")
            .unwrap();
        assert_eq!(
            String::from_utf8(html).unwrap(),
            "<html><head><title>x</title><script>a=1;</script></head><body></body></html>"
        );
    }

    #[test]
    fn test_only_first_marker_is_used() {
        let html = inject_before_head_close(b"<head></head><template></head></template>", "a=1;").unwrap();
        assert_eq!(
            String::from_utf8(html).unwrap(),
            "<head><script>a=1;</script></head><template></head></template>"
        );
    }

    #[test]
    fn test_missing_marker() {
        assert!(inject_before_head_close(b"<html><body></body></html>", "a=1;").is_none());
        assert!(inject_before_head_close(b"", "a=1;").is_none());
        // 大小写敏感
        assert!(inject_before_head_close(b"<HEAD></HEAD>", "a=1;").is_none());
    }

    #[test]
    fn test_non_utf8_bytes_are_preserved() {
        let html = inject_before_head_close(b"\xff\xfe</head>\x80", "a=1;").unwrap();
        assert_eq!(html, b"\xff\xfe<script>a=1;</script></head>\x80".to_vec());
    }
}
