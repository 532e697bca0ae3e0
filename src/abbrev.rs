/// Byte index of the `n`th char of `s`, or `s.len()` when there are fewer.
#[inline]
fn char_boundary(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

const ADDRESS_HEAD: usize = 6;
const ADDRESS_TAIL: usize = 4;
const MIN_TRUNCATED_LEN: usize = 10;

/// `0x1234567890abcdef` -> `0x1234...cdef`
pub fn truncate_address(address: &str) -> String {
    let len = address.chars().count();
    if len < MIN_TRUNCATED_LEN {
        return address.to_owned();
    }

    let head = char_boundary(address, ADDRESS_HEAD);
    let tail = char_boundary(address, len - ADDRESS_TAIL);
    format!("{}...{}", &address[..head], &address[tail..])
}

/// The first `len` chars of `text`
pub fn abbreviate(text: &str, len: usize) -> &str {
    &text[..char_boundary(text, len)]
}
