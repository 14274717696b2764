use thiserror::Error;

/// Why a function cannot be inlined at all. Reported at the directive as
/// `invalid inlining candidate: <reason>`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("cannot read source file")]
    Source,
    #[error("function has no body")]
    NoBody,
    #[error("method on generic type")]
    GenericMethod,
    #[error("function body declares a local type")]
    LocalType,
}

/// A malformed directive on a constant or a type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("const value is iota")]
    Iota,
    #[error("const value is not the name of another constant")]
    NotAConstName,
    #[error("not a type alias")]
    NotAlias,
    #[error("array types not supported")]
    ArrayType,
}

/// A call site, constant use or alias use that is left alone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InlineError {
    #[error("can't yet inline spread call to method")]
    SpreadMethodCall,
    #[error("cannot inline call to generic function {0}")]
    Generic(String),
    #[error("cannot inline call to {0}: body calls recover")]
    Recover(String),
    #[error("cannot inline call to {callee} from another package: body refers to unexported {name}")]
    Unexported { callee: String, name: String },
    #[error("{name} is shadowed by {by}")]
    Shadowed { name: String, by: String },
    #[error("package {0} cannot be imported here")]
    NotImportable(String),
    #[error("{0}")]
    Unsupported(&'static str),
}

impl InlineError {
    /// Failures the author should hear about; the rest are skipped quietly.
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            InlineError::SpreadMethodCall
                | InlineError::Generic(_)
                | InlineError::Recover(_)
                | InlineError::Unexported { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum FactError {
    #[error("encoding fact for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: bincode::Error,
    },
    #[error("decoding fact for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: bincode::Error,
    },
    #[error("fact for {0} exported twice")]
    Duplicate(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("edits overlap at {first:?} and {second:?}")]
    Overlap {
        first: std::ops::Range<usize>,
        second: std::ops::Range<usize>,
    },
    #[error("edit {0:?} is outside the source")]
    OutOfBounds(std::ops::Range<usize>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeleteError {
    #[error("statement not found in file")]
    NotFound,
    #[error("cannot delete the else branch of an if statement")]
    ElseBranch,
    #[error("parameters, results and receivers cannot be deleted")]
    Parameter,
    #[error("not a variable declaration")]
    NotAVariable,
}
