//! Classification of VCF lines into meta, header, and data lines.

/// Leading tokens of a header line after the `#` prefix.
const HEADER_PREFIX: [&str; 3] = ["CHROM", "POS", "ID"];

/// Return whether `line` is a meta line (starts with `##`).
pub fn is_meta(line: &str) -> bool {
    line.starts_with("##")
}

/// Return whether `line` is a header line.
///
/// A header line starts with exactly one `#` and its first three whitespace-separated
/// tokens are `CHROM`, `POS`, and `ID`.
pub fn is_header(line: &str) -> bool {
    match line.strip_prefix('#') {
        Some(rest) if !rest.starts_with('#') => {
            let mut tokens = rest.split_whitespace();
            HEADER_PREFIX
                .iter()
                .all(|expected| tokens.next() == Some(*expected))
        }
        _ => false,
    }
}
