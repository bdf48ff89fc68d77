//! Constructor argument staging (spec §4.F): a derive-generated `read`
//! holds one `ArgState<FieldType>` per property while walking the wire
//! value, then resolves each into the constructor call once every property
//! has been seen (or the input is exhausted). This is what lets
//! `ConstructorShape::ByName` tolerate properties arriving out of order or
//! not at all, the same way `ConstructorShape::Positional` relies on the
//! array layout's declaration order instead.

use crate::error::{Error, Result};

pub struct ArgState<T> {
    value: Option<T>,
}

impl<T> ArgState<T> {
    pub fn new() -> Self {
        ArgState { value: None }
    }

    /// Stage a value, failing if this argument was already staged once
    /// (the same property appeared twice in one object).
    pub fn set(&mut self, name: &'static str, value: T) -> Result<()> {
        if self.value.is_some() {
            return Err(Error::double_property_assignment(name));
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn require(self, name: &'static str) -> Result<T> {
        self.value.ok_or_else(|| Error::missing_required_property(name))
    }
}

impl<T: Default> ArgState<T> {
    pub fn or_default(self) -> T {
        self.value.unwrap_or_default()
    }

    /// Like [`require`](ArgState::require), but when the property was never
    /// staged and `replace_missing_with_default` is set (spec §4.M's
    /// `deserialize_default_values` option), falls back to `T::default()`
    /// instead of erroring.
    pub fn require_or_default(self, name: &'static str, replace_missing_with_default: bool) -> Result<T> {
        match self.value {
            Some(value) => Ok(value),
            None if replace_missing_with_default => Ok(T::default()),
            None => Err(Error::missing_required_property(name)),
        }
    }
}

impl<T> Default for ArgState<T> {
    fn default() -> Self {
        ArgState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_set_errors() {
        let mut state = ArgState::new();
        state.set("field", 1).unwrap();
        assert!(state.set("field", 2).is_err());
    }

    #[test]
    fn missing_required_errors_by_name() {
        let state: ArgState<i32> = ArgState::new();
        let err = state.require("field").unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::MissingRequiredProperty);
    }

    #[test]
    fn unset_optional_falls_back_to_default() {
        let state: ArgState<i32> = ArgState::new();
        assert_eq!(state.or_default(), 0);
    }
}
