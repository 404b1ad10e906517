use serde::{Deserialize, Serialize};

use sigil_core::{DispatchResult, UserError, identifiers};

/// How an array combines its children's results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunCondition {
    /// Every child must pass; the first denial decides.
    #[default]
    And,
    /// One child must pass; the first pass decides.
    Or,
}

impl RunCondition {
    /// The condition nested arrays default to.
    pub fn flip(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }

    /// Whether `result` settles the array without looking at later children.
    ///
    /// Errors other than user errors always do: a broken check cannot be
    /// outvoted by its siblings.
    pub fn decides(self, result: &DispatchResult<()>) -> bool {
        match (self, result) {
            (_, Err(err)) if !err.is_user() => true,
            (Self::And, result) => result.is_err(),
            (Self::Or, result) => result.is_ok(),
        }
    }

    /// Outcome of an array whose children all ran without a deciding result.
    ///
    /// `last` is the result of the final child, if there was one.
    pub fn undecided(self, last: Option<DispatchResult<()>>) -> DispatchResult<()> {
        match self {
            Self::And => Ok(()),
            Self::Or => last.unwrap_or_else(|| {
                Err(UserError::new(
                    identifiers::PRECONDITION_NONE_PASSED,
                    "No precondition was satisfied.",
                )
                .into())
            }),
        }
    }

    /// Folds already completed results, in order.
    pub fn combine<I>(self, results: I) -> DispatchResult<()>
    where
        I: IntoIterator<Item = DispatchResult<()>>,
    {
        let mut last = None;
        for result in results {
            if self.decides(&result) {
                return result;
            }
            last = Some(result);
        }
        self.undecided(last)
    }
}

/// How an array schedules its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One at a time, stopping as soon as the result is decided.
    #[default]
    Sequential,
    /// All at once; every child runs to completion before deciding.
    Parallel,
}
