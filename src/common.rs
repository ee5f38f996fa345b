// Helpers for rendering a filter's bit array and sizes in human-readable form
const BYTES_PER_LINE: usize = 16;

pub const ASCII_PREVIEW_LEN: usize = 64;

pub fn bytes2hr(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

pub fn bits2hr(bits: usize) -> String {
    bytes2hr(bits.div_ceil(8))
}

fn printable(byte: u8) -> char {
    if (32..=126).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

/// Classic offset / hex / ASCII dump, 16 bytes per line.
pub fn hex_dump(data: &[u8]) -> Vec<String> {
    data.chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(line, chunk)| {
            let hex = chunk
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = chunk.iter().copied().map(printable).collect();
            format!(
                "{:08x}  {hex:<width$} {ascii}",
                line * BYTES_PER_LINE,
                width = BYTES_PER_LINE * 3
            )
        })
        .collect()
}

/// First `len` bytes as ASCII, non-printable bytes shown as `.`.
pub fn ascii_preview(data: &[u8], len: usize) -> String {
    data.iter().take(len).copied().map(printable).collect()
}

pub fn raw_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}
