/// Offset of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Offset of the last occurrence of `needle` in `haystack`.
pub(crate) fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|window| window == needle)
}

/// Copy `N` bytes starting at `at`, or `None` if the buffer is too short.
pub(crate) fn read_stack<const N: usize>(buffer: &[u8], at: usize) -> Option<[u8; N]> {
    let end = at.checked_add(N)?;
    buffer.get(at..end)?.try_into().ok()
}

pub(crate) fn read_u32_be(buffer: &[u8], at: usize) -> Option<u32> {
    read_stack::<4>(buffer, at).map(u32::from_be_bytes)
}

#[cfg(test)]
macro_rules! media {
    ($file:literal) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/media/", $file))
    };
}
