//! Command parameters and their batched snapshots.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Direction of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterDirection {
    /// Input parameter (default).
    #[default]
    Input,
    /// Output parameter.
    Output,
    /// Input/output parameter.
    InputOutput,
    /// Receives the procedure's return value.
    ReturnValue,
}

/// A value that knows how to copy itself.
///
/// Implemented for every `Clone` type, so any owned value can be stored as
/// [`ParameterValue::Cloneable`] and gets an independent copy when batched.
pub trait CloneValue: Any + Send + Sync + fmt::Debug {
    /// Produce an independent copy.
    fn clone_value(&self) -> Box<dyn CloneValue>;

    /// Borrow as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T> CloneValue for T
where
    T: Any + Clone + Send + Sync + fmt::Debug,
{
    fn clone_value(&self) -> Box<dyn CloneValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The value carried by a parameter.
pub enum ParameterValue {
    /// SQL NULL.
    Null,
    /// Bit.
    Bool(bool),
    /// Any integer width.
    Int(i64),
    /// Any float width.
    Float(f64),
    /// Character data.
    Text(String),
    /// Binary data, honoring the parameter's offset and size.
    Bytes(Vec<u8>),
    /// Character array, honoring the parameter's offset and size.
    Chars(Vec<char>),
    /// A value copied through its own clone contract.
    Cloneable(Box<dyn CloneValue>),
    /// A value shared by reference and never copied.
    Shared(Arc<dyn Any + Send + Sync>),
}

impl ParameterValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow binary data.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Borrow a character array.
    pub fn as_chars(&self) -> Option<&[char]> {
        match self {
            Self::Chars(chars) => Some(chars),
            _ => None,
        }
    }

    /// Borrow character data.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Downcast a cloneable value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Cloneable(value) => (**value).as_any().downcast_ref(),
            Self::Shared(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// Length of an array value.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Self::Bytes(bytes) => Some(bytes.len()),
            Self::Chars(chars) => Some(chars.len()),
            _ => None,
        }
    }
}

impl Clone for ParameterValue {
    fn clone(&self) -> Self {
        match self {
            Self::Null => Self::Null,
            Self::Bool(v) => Self::Bool(*v),
            Self::Int(v) => Self::Int(*v),
            Self::Float(v) => Self::Float(*v),
            Self::Text(v) => Self::Text(v.clone()),
            Self::Bytes(v) => Self::Bytes(v.clone()),
            Self::Chars(v) => Self::Chars(v.clone()),
            Self::Cloneable(v) => Self::Cloneable((**v).clone_value()),
            Self::Shared(v) => Self::Shared(Arc::clone(v)),
        }
    }
}

impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::Bytes(v) => f.debug_tuple("Bytes").field(&v.len()).finish(),
            Self::Chars(v) => f.debug_tuple("Chars").field(&v.len()).finish(),
            Self::Cloneable(v) => f.debug_tuple("Cloneable").field(v).finish(),
            Self::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for ParameterValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for ParameterValue {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Vec<char>> for ParameterValue {
    fn from(v: Vec<char>) -> Self {
        Self::Chars(v)
    }
}

impl<T: Into<ParameterValue>> From<Option<T>> for ParameterValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A caller-owned parameter.
#[derive(Debug, Clone)]
pub struct SqlParameter {
    /// Parameter name including the `@` sigil.
    pub name: String,
    /// Parameter direction.
    pub direction: ParameterDirection,
    /// Parameter value.
    pub value: ParameterValue,
    /// First element of an array value to send.
    pub offset: usize,
    /// Maximum number of array elements to send. Zero sends the rest.
    pub size: usize,
}

impl SqlParameter {
    /// Create an input parameter.
    pub fn new(name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        Self {
            name: name.into(),
            direction: ParameterDirection::Input,
            value: value.into(),
            offset: 0,
            size: 0,
        }
    }

    /// Create an output parameter.
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, ParameterValue::Null).with_direction(ParameterDirection::Output)
    }

    /// Create a return value parameter.
    pub fn return_value(name: impl Into<String>) -> Self {
        Self::new(name, ParameterValue::Null).with_direction(ParameterDirection::ReturnValue)
    }

    /// Create a parameter holding any cloneable value.
    pub fn cloneable<T>(name: impl Into<String>, value: T) -> Self
    where
        T: Clone + Send + Sync + fmt::Debug + 'static,
    {
        Self::new(name, ParameterValue::Cloneable(Box::new(value)))
    }

    /// Create a parameter sharing a value by reference.
    pub fn shared(name: impl Into<String>, value: Arc<dyn Any + Send + Sync>) -> Self {
        Self::new(name, ParameterValue::Shared(value))
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the array offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set the array size.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }
}

/// A batched copy of a parameter.
///
/// Holds no storage in common with the parameter it was taken from, except
/// for [`ParameterValue::Shared`] values.
#[derive(Debug, Clone)]
pub struct ParameterSnapshot {
    pub(crate) name: String,
    pub(crate) direction: ParameterDirection,
    pub(crate) value: ParameterValue,
    pub(crate) offset: usize,
    pub(crate) size: usize,
}

impl ParameterSnapshot {
    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter direction.
    pub fn direction(&self) -> ParameterDirection {
        self.direction
    }

    /// Copied value.
    pub fn value(&self) -> &ParameterValue {
        &self.value
    }

    /// Array offset. Zero for copied arrays.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Size as given by the caller.
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_parameter_builders() {
        let p = SqlParameter::new("@id", 42).with_offset(1).with_size(2);
        assert_eq!(p.name, "@id");
        assert_eq!(p.direction, ParameterDirection::Input);
        assert_eq!(p.offset, 1);
        assert_eq!(p.size, 2);
        assert!(matches!(p.value, ParameterValue::Int(42)));

        assert_eq!(SqlParameter::output("@o").direction, ParameterDirection::Output);
        assert_eq!(SqlParameter::return_value("@r").direction, ParameterDirection::ReturnValue);
        assert!(SqlParameter::new("@n", None::<i64>).value.is_null());
    }

    #[test]
    fn test_cloneable_value_is_independent() {
        let original = ParameterValue::Cloneable(Box::new(Point { x: 1, y: 2 }));
        let copy = original.clone();
        assert_eq!(copy.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
        let a = original.downcast_ref::<Point>().map(|p| p as *const Point);
        let b = copy.downcast_ref::<Point>().map(|p| p as *const Point);
        assert_ne!(a, b);
    }

    #[test]
    fn test_shared_value_is_not_copied() {
        let value: Arc<dyn Any + Send + Sync> = Arc::new(String::from("blob"));
        let original = ParameterValue::Shared(Arc::clone(&value));
        let copy = original.clone();
        match (&original, &copy) {
            (ParameterValue::Shared(a), ParameterValue::Shared(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected shared values"),
        }
        assert_eq!(copy.downcast_ref::<String>().map(String::as_str), Some("blob"));
    }

    #[test]
    fn test_debug_omits_array_contents() {
        let value = ParameterValue::from(vec![1u8, 2, 3]);
        assert_eq!(format!("{value:?}"), "Bytes(3)");
        assert_eq!(value.array_len(), Some(3));
    }
}
