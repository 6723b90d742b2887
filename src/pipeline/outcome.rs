use serde::Serialize;

/// Shape of the value a business callback hands back to the pipeline.
///
/// The callback picks the variant, so an empty sequence (`Sequence(vec![])`)
/// and an absent value (`Empty`) never get confused.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult<T> {
    Empty,
    Scalar(T),
    Sequence(Vec<T>),
}

impl<T> OperationResult<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, OperationResult::Empty)
    }
}

impl<T: Serialize> Serialize for OperationResult<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OperationResult::Empty => serializer.serialize_none(),
            OperationResult::Scalar(value) => value.serialize(serializer),
            OperationResult::Sequence(values) => values.serialize(serializer),
        }
    }
}

impl<T> From<Option<T>> for OperationResult<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => OperationResult::Scalar(v),
            None => OperationResult::Empty,
        }
    }
}

impl<T> From<Vec<T>> for OperationResult<T> {
    fn from(values: Vec<T>) -> Self {
        OperationResult::Sequence(values)
    }
}

/// Result of a domain validation, independent of HTTP.
///
/// `message` is only meaningful when `pass` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub pass: bool,
    pub message: String,
}

impl ValidationOutcome {
    pub fn pass() -> Self {
        Self {
            pass: true,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            pass: false,
            message: message.into(),
        }
    }
}

/// Optional validation callback run against create/update results.
///
/// Sequences are validated item by item; the first failure wins.
pub type ValidateFn<T> = Box<dyn Fn(&T) -> ValidationOutcome + Send + Sync>;

impl<T> OperationResult<T> {
    pub(crate) fn validate_with(&self, validate: &ValidateFn<T>) -> ValidationOutcome {
        let items: &[T] = match self {
            OperationResult::Empty => &[],
            OperationResult::Scalar(value) => std::slice::from_ref(value),
            OperationResult::Sequence(values) => values,
        };

        items
            .iter()
            .map(|item| validate(item))
            .find(|outcome| !outcome.pass)
            .unwrap_or_else(ValidationOutcome::pass)
    }
}
