//! Byte offset to line/column mapping.

/// Line starts of one source file.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(memchr::memchr_iter(b'\n', src.as_bytes()).map(|i| i as u32 + 1));
        Self {
            starts,
            len: src.len() as u32,
        }
    }

    /// 1-based line of `offset`.
    pub fn line(&self, offset: u32) -> u32 {
        self.starts.partition_point(|&s| s <= offset) as u32
    }

    /// 1-based `(line, column)` of `offset`; the column counts bytes.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = self.line(offset);
        let start = self.starts[(line - 1) as usize];
        (line, offset - start + 1)
    }

    /// Offset of the first byte of the line containing `offset`.
    pub fn line_start(&self, offset: u32) -> u32 {
        self.starts[(self.line(offset) - 1) as usize]
    }

    /// Offset just past the last byte of the line containing `offset`,
    /// excluding the newline.
    pub fn line_end(&self, offset: u32) -> u32 {
        let line = self.line(offset) as usize;
        self.starts.get(line).map_or(self.len, |&next| next - 1)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn indentation<'s>(&self, src: &'s str, offset: u32) -> &'s str {
        let start = self.line_start(offset) as usize;
        let rest = &src[start..];
        let n = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        &rest[..n]
    }

    pub fn same_line(&self, a: u32, b: u32) -> bool {
        self.line(a) == self.line(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_lines() {
        let src = "package p\n\n\tx := 1\n";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line(10), 2);
        assert_eq!(idx.line_col(12), (3, 2));
        assert_eq!(idx.line_start(14), 11);
        assert_eq!(idx.line_end(11), 18);
        assert_eq!(idx.indentation(src, 14), "\t");
        assert!(!idx.same_line(0, 12));
    }
}
