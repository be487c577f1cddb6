// Line reading for generated build files that may carry non-UTF-8 bytes

use std::io::BufRead;

/// Lines of `reader` with invalid UTF-8 sequences replaced by U+FFFD
///
/// Strips `\n` and `\r\n` endings the way [`BufRead::lines`] does. Only read
/// failures are errors.
pub(crate) fn lossy_lines<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = std::io::Result<String>> {
    reader.split(b'\n').map(|line| {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(match String::from_utf8(line) {
            Ok(line) => line,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    })
}
