use std::str;

pub const MAX_INPUT_SIZE: usize = 64 * 1024;

/// UTF-8 view of `data` capped at `MAX_INPUT_SIZE`, trimming at most 3 bytes to avoid splitting
/// a multibyte codepoint.
#[inline]
pub fn truncate_utf8(data: &[u8]) -> Option<&str> {
    let cap = data.len().min(MAX_INPUT_SIZE);
    (0..=cap.min(3)).find_map(|trim| str::from_utf8(&data[..cap - trim]).ok())
}
