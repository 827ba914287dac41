use crate::{logging::Logger, Result};

/// What happens to a collaborator's error once it reaches the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log it here and carry on as if the call produced nothing.
    Swallow,
    /// Hand it to the caller, which logs it and answers the user.
    Propagate,
}

/// Outcome of a port call after its failure policy was applied.
#[derive(Debug, PartialEq, Eq)]
pub enum Settled<T> {
    Value(T),
    /// The call failed and the error has already been logged.
    Swallowed,
}

/// Apply `policy` to a port result. Swallowed errors are logged exactly once.
pub fn settle<T>(
    result: Result<T>,
    policy: FailurePolicy,
    logger: &dyn Logger,
) -> Result<Settled<T>> {
    match result {
        Ok(v) => Ok(Settled::Value(v)),
        Err(e) => match policy {
            FailurePolicy::Swallow => {
                logger.error(&e);
                Ok(Settled::Swallowed)
            }
            FailurePolicy::Propagate => Err(e),
        },
    }
}
