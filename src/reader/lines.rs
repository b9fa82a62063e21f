use crate::formats::{Layout, at_line, trim_newline};
use crate::types::Feature;
use crate::{Error, Result};
use std::io::BufRead;

/// Decodes data lines from a `BufRead`, skipping header and blank lines.
///
/// The iterator is fused after the first error.
pub(crate) struct Lines<R> {
    reader: R,
    layout: Layout,
    source_name: String,
    pending: Option<String>,
    skip: u32,
    line_number: usize,
    buf: String,
    done: bool,
}

impl<R: BufRead> Lines<R> {
    pub(crate) fn new(reader: R, layout: Layout, source_name: &str) -> Self {
        Self {
            reader,
            layout,
            source_name: source_name.to_string(),
            pending: None,
            skip: 0,
            line_number: 0,
            buf: String::new(),
            done: false,
        }
    }

    /// Starts from the top of a file, so the layout's fixed skip count applies.
    pub(crate) fn from_top(mut self) -> Self {
        self.skip = self.layout.skip_lines;
        self
    }

    /// A line already consumed from `reader` that must be yielded first.
    pub(crate) fn with_pending(mut self, line: Option<String>, line_number: usize) -> Self {
        self.pending = line;
        self.line_number = line_number;
        self
    }

    fn fail(&mut self, source: std::io::Error) -> Option<Result<Feature>> {
        self.done = true;
        Some(Err(Error::read_failure(
            "iterate",
            self.source_name.clone(),
            source,
        )))
    }

    fn decode(&mut self, line: &str) -> Option<Result<Feature>> {
        match self.layout.decode(line) {
            Ok(feature) => Some(Ok(feature)),
            Err(e) => {
                let err = at_line(e, self.line_number);
                self.fail(err)
            }
        }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(line) = self.pending.take() {
            return self.decode(&line);
        }

        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => return self.fail(e),
            }
            self.line_number += 1;

            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }

            let line = trim_newline(&self.buf);
            if line.is_empty() || self.layout.is_header_line(line) {
                continue;
            }

            let line = line.to_string();
            return self.decode(&line);
        }
    }
}

/// Reads header lines from the top of `reader`.
///
/// Returns the header lines, the first data line (already consumed) and the
/// number of lines read.
pub(crate) fn scan_header<R: BufRead>(
    reader: &mut R,
    layout: &Layout,
) -> std::io::Result<(Vec<String>, Option<String>, usize)> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    let mut line_number = 0;

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            return Ok((lines, None, line_number));
        }
        line_number += 1;

        let line = trim_newline(&buf);
        if (line_number as u64) <= u64::from(layout.skip_lines) || layout.is_header_line(line) {
            lines.push(line.to_string());
        } else if !line.is_empty() {
            return Ok((lines, Some(line.to_string()), line_number));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::FeatureFormat;
    use std::io::Cursor;

    const BED: &str = "track name=peaks\nchr1\t99\t110\n\nchr1\t199\t210\n# note\nchr1\t204\t215\n";

    #[test]
    fn test_lines_skip_header_and_blank_lines() {
        let lines = Lines::new(Cursor::new(BED), FeatureFormat::Bed.layout(), "peaks.bed");
        let starts: Vec<u32> = lines.map(|f| f.unwrap().start()).collect();
        assert_eq!(starts, vec![100, 200, 205]);
    }

    #[test]
    fn test_lines_fuse_after_error() {
        let text = "chr1\t1\t5\nchr1\tx\t9\nchr1\t10\t20\n";
        let mut lines = Lines::new(Cursor::new(text), FeatureFormat::Bed.layout(), "bad.bed");
        assert!(lines.next().unwrap().is_ok());

        let err = lines.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_scan_header_returns_first_data_line() {
        let mut cursor = Cursor::new(BED);
        let (header, first, consumed) =
            scan_header(&mut cursor, &FeatureFormat::Bed.layout()).unwrap();
        assert_eq!(header, vec!["track name=peaks".to_string()]);
        assert_eq!(first.as_deref(), Some("chr1\t99\t110"));
        assert_eq!(consumed, 2);

        let rest = Lines::new(cursor, FeatureFormat::Bed.layout(), "peaks.bed")
            .with_pending(first, consumed);
        assert_eq!(rest.count(), 3);
    }
}
