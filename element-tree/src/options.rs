//! Parse configuration.

/// What the builder does with a close event whose name differs from the
/// element currently receiving events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Fail with [`Error::StructuralMismatch`](crate::Error::StructuralMismatch).
    #[default]
    Strict,
    /// Ignore the event; the open element keeps receiving events.
    Lenient,
}

/// Options for building a tree from XML.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Handling of mismatched close events.
    pub mismatch_policy: MismatchPolicy,
    /// Drop character fragments that consist only of whitespace.
    pub ignore_whitespace: bool,
    /// Deliver CDATA sections as character data.
    pub cdata_as_text: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            mismatch_policy: MismatchPolicy::Strict,
            ignore_whitespace: false,
            cdata_as_text: true,
        }
    }
}

impl ParseOptions {
    /// Sets the mismatched-close policy.
    pub fn with_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    /// Sets whether whitespace-only character data is dropped.
    pub fn with_ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }

    /// Sets whether CDATA sections are delivered as character data.
    pub fn with_cdata_as_text(mut self, cdata_as_text: bool) -> Self {
        self.cdata_as_text = cdata_as_text;
        self
    }
}
