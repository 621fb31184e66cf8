use std::fmt;

/// Wraps a caller-supplied token so log output only shows a short prefix.
/// Use it in `tracing` fields wherever a holder id is logged.
pub struct Masked<T>(pub T);

const VISIBLE_PREFIX: usize = 2;

impl<T: AsRef<str>> Masked<T> {
    fn masked(&self) -> String {
        let prefix: String = self.0.as_ref().chars().take(VISIBLE_PREFIX).collect();
        format!("{}***", prefix)
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
