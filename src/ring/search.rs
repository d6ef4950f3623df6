//! 流式子串匹配
//!
//! 基于前缀函数（KMP）。逐字节输入，不需要回看已输入的数据，
//! 因此跨行、跨回绕点的匹配不需要任何特殊处理。

use alloc::vec;
use alloc::vec::Vec;

/// 流式匹配器
#[derive(Debug, Clone)]
pub struct StreamMatcher<'p> {
    pattern: &'p [u8],
    /// `prefix[i]`: `pattern[..=i]` 的最长真前缀兼后缀长度
    prefix: Vec<usize>,
    matched: usize,
}

impl<'p> StreamMatcher<'p> {
    /// 为非空模式创建匹配器
    pub fn new(pattern: &'p [u8]) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }

        let mut prefix = vec![0usize; pattern.len()];
        let mut k = 0;
        for i in 1..pattern.len() {
            while k > 0 && pattern[i] != pattern[k] {
                k = prefix[k - 1];
            }
            if pattern[i] == pattern[k] {
                k += 1;
            }
            prefix[i] = k;
        }

        Some(Self {
            pattern,
            prefix,
            matched: 0,
        })
    }

    /// 输入一个字节，若刚好完成一次匹配返回 true
    pub fn feed(&mut self, byte: u8) -> bool {
        while self.matched > 0 && self.pattern[self.matched] != byte {
            self.matched = self.prefix[self.matched - 1];
        }
        if self.pattern[self.matched] == byte {
            self.matched += 1;
        }
        if self.matched == self.pattern.len() {
            self.matched = self.prefix[self.matched - 1];
            return true;
        }
        false
    }

    /// 当前已匹配的模式前缀长度
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// 在一段连续数据中查找，返回匹配结束位置之后的偏移
    ///
    /// 匹配状态在多次调用之间保留。
    pub fn scan(&mut self, data: &[u8]) -> Option<usize> {
        data.iter().position(|&b| self.feed(b)).map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(haystack: &[u8], pattern: &[u8]) -> Option<usize> {
        StreamMatcher::new(pattern)?.scan(haystack)
    }

    #[test]
    fn test_empty_pattern() {
        assert!(StreamMatcher::new(b"").is_none());
    }

    #[test]
    fn test_basic_find() {
        assert_eq!(find(b"foo\r\nbar", b"\r\n"), Some(5));
        assert_eq!(find(b"foo\r\nbar", b"foo"), Some(3));
        assert_eq!(find(b"foo\r\nbar", b"bar"), Some(8));
        assert_eq!(find(b"foo\r\nbar", b"baz"), None);
        assert_eq!(find(b"", b"a"), None);
    }

    #[test]
    fn test_partial_match_restart() {
        assert_eq!(find(b"aaab", b"aab"), Some(4));
        assert_eq!(find(b"abababc", b"ababc"), Some(7));
        assert_eq!(find(b"abcabcabd", b"abcabd"), Some(9));
    }

    #[test]
    fn test_state_carries_across_chunks() {
        let mut matcher = StreamMatcher::new(b"OKAY").unwrap();
        assert_eq!(matcher.scan(b"xxOK"), None);
        assert_eq!(matcher.matched(), 2);
        assert_eq!(matcher.scan(b"AYzz"), Some(2));
    }

    #[test]
    fn test_overlapping_matches() {
        let mut matcher = StreamMatcher::new(b"aa").unwrap();
        assert!(!matcher.feed(b'a'));
        assert!(matcher.feed(b'a'));
        assert!(matcher.feed(b'a'));
    }
}
