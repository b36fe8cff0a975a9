//! Code fence detection.
//!
//! Fences use backticks or tildes, three or more. The closing fence must use
//! the same character and be at least as long as the opening fence.

/// An opening fence line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fence {
    /// Character used for the fence (backtick or tilde).
    fence_char: char,
    /// Length of the opening fence (minimum length for closing).
    fence_len: usize,
    /// Info string after the opening fence, if any.
    pub(crate) info: Option<String>,
}

impl Fence {
    /// Detect if a line opens a code fence.
    pub(crate) fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let first = trimmed.chars().next()?;
        if first != '`' && first != '~' {
            return None;
        }

        let fence_len = trimmed.chars().take_while(|&c| c == first).count();
        if fence_len < 3 {
            return None;
        }

        // fence chars are ASCII, so the count is also a byte offset
        let info = trimmed[fence_len..].trim();
        // ```a``` on one line is inline code
        if first == '`' && info.contains('`') {
            return None;
        }

        Some(Self {
            fence_char: first,
            fence_len,
            info: (!info.is_empty()).then(|| info.to_string()),
        })
    }

    /// Check if a line closes this fence.
    pub(crate) fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let count = trimmed
            .chars()
            .take_while(|&c| c == self.fence_char)
            .count();
        count >= self.fence_len && count == trimmed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtick_fence() {
        let fence = Fence::open("```rust\n").unwrap();
        assert_eq!(fence.info.as_deref(), Some("rust"));
        assert!(fence.is_closed_by("```"));
        assert!(fence.is_closed_by("  ````  \n"));
        assert!(!fence.is_closed_by("``"));
        assert!(!fence.is_closed_by("~~~"));
        assert!(!fence.is_closed_by("``` rust"));
    }

    #[test]
    fn tilde_fence() {
        let fence = Fence::open("~~~~").unwrap();
        assert_eq!(fence.info, None);
        assert!(!fence.is_closed_by("~~~"));
        assert!(fence.is_closed_by("~~~~~"));
    }

    #[test]
    fn indented_fence_opens() {
        assert!(Fence::open("    ```").is_some());
    }

    #[test]
    fn not_a_fence() {
        assert_eq!(Fence::open("``"), None);
        assert_eq!(Fence::open("text ```"), None);
        assert_eq!(Fence::open("```inline``` code"), None);
        assert_eq!(Fence::open(""), None);
    }
}
