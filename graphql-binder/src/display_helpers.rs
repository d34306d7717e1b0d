use std::fmt;
use std::fmt::Display;

pub(crate) struct DisplaySlice<'a, T>(pub(crate) &'a [T]);

impl<T: Display> Display for DisplaySlice<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut iter = self.0.iter();
        if let Some(item) = iter.next() {
            write!(f, "{item}")?;
        }
        iter.try_for_each(|item| write!(f, ", {item}"))?;
        write!(f, "]")
    }
}

/// Writes `a`, `a or b`, `a, b or c`.
pub(crate) struct DisplayAlternatives<'a, T>(pub(crate) &'a [T]);

impl<T: Display> Display for DisplayAlternatives<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((last, init)) = self.0.split_last() else {
            return Ok(());
        };
        for (i, item) in init.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        if !init.is_empty() {
            write!(f, " or ")?;
        }
        write!(f, "{last}")
    }
}
