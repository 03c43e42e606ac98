//! Payload-or-cause carried by signals.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// A shared underlying error.
///
/// Causes travel by reference: cloning a signal or moving it across the
/// driver boundary never copies the error itself.
pub type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// What a signal carries besides its kind.
///
/// A signal holds either a payload value, an underlying cause, or nothing.
/// Holding both at once is not representable.
///
/// # Examples
///
/// ```
/// use manifail_core::Detail;
///
/// let detail = Detail::Value("stop");
/// assert_eq!(detail.value(), Some(&"stop"));
/// assert!(detail.as_cause().is_none());
///
/// let empty: Detail<&str> = Detail::default();
/// assert!(empty.is_empty());
/// ```
pub enum Detail<V> {
    /// Nothing attached.
    Empty,
    /// A payload value.
    Value(V),
    /// An underlying cause.
    Cause(Cause),
}

impl<V> Detail<V> {
    /// Wraps an error as a cause.
    pub fn from_error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Detail::Cause(Arc::new(error))
    }

    /// Returns `true` if nothing is attached.
    pub fn is_empty(&self) -> bool {
        matches!(self, Detail::Empty)
    }

    /// Returns the payload value, if any.
    pub fn value(&self) -> Option<&V> {
        match self {
            Detail::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the underlying cause, if any.
    pub fn as_cause(&self) -> Option<&Cause> {
        match self {
            Detail::Cause(c) => Some(c),
            _ => None,
        }
    }

    /// Consumes the detail, returning the payload value if any.
    pub fn into_value(self) -> Option<V> {
        match self {
            Detail::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Maps the payload value, leaving a cause untouched.
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Detail<U> {
        match self {
            Detail::Empty => Detail::Empty,
            Detail::Value(v) => Detail::Value(f(v)),
            Detail::Cause(c) => Detail::Cause(c),
        }
    }

    pub(crate) fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Detail::Cause(c) => Some(c.as_ref() as &(dyn Error + 'static)),
            _ => None,
        }
    }
}

impl<V> Default for Detail<V> {
    fn default() -> Self {
        Detail::Empty
    }
}

impl<V: Clone> Clone for Detail<V> {
    fn clone(&self) -> Self {
        match self {
            Detail::Empty => Detail::Empty,
            Detail::Value(v) => Detail::Value(v.clone()),
            Detail::Cause(c) => Detail::Cause(Arc::clone(c)),
        }
    }
}

impl<V: PartialEq> PartialEq for Detail<V> {
    /// Values compare by value; causes compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Detail::Empty, Detail::Empty) => true,
            (Detail::Value(a), Detail::Value(b)) => a == b,
            (Detail::Cause(a), Detail::Cause(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Detail<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::Empty => write!(f, "Empty"),
            Detail::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Detail::Cause(c) => f.debug_tuple("Cause").field(&c.to_string()).finish(),
        }
    }
}

impl<V: fmt::Debug> fmt::Display for Detail<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::Empty => Ok(()),
            Detail::Value(v) => write!(f, "{:?}", v),
            Detail::Cause(c) => write!(f, "{}", c),
        }
    }
}
