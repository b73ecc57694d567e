//! 不可信路径片段的文本过滤。

/// 删除字符串中所有的 `/`、`\` 与 `..`，单次遍历。
///
/// 这是纯文本过滤，不做大小写、空白或长度上的处理，也不拒绝空结果。
/// 先去除分隔符再去除 `..`，保证结果中不会重新拼出 `..`。
pub fn sanitize(name: &str) -> String {
    name.replace(['/', '\\'], "").replace("..", "")
}

/// 将多级相对路径按分隔符拆开，逐段过滤后丢弃空段。
pub fn sanitize_segments(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .map(sanitize)
        .filter(|segment| !segment.is_empty())
        .collect()
}
