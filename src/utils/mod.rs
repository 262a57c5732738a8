/// 短码最短长度
pub const MIN_SHORTCODE_LEN: usize = 4;

/// 短码最长长度
pub const MAX_SHORTCODE_LEN: usize = 16;

/// 从给定字符表中均匀随机抽取 `length` 个字符
pub fn generate_random_code(alphabet: &[u8], length: usize) -> String {
    use std::iter;

    if alphabet.is_empty() {
        return String::new();
    }

    iter::repeat_with(|| alphabet[rand::random_range(0..alphabet.len())] as char)
        .take(length)
        .collect()
}

/// 短码格式校验：4-16 个 ASCII 字母或数字
///
/// 非 ASCII 字符（例如 `é`）即使属于 Unicode 字母也会被拒绝。
pub fn is_valid_shortcode(code: &str) -> bool {
    (MIN_SHORTCODE_LEN..=MAX_SHORTCODE_LEN).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
