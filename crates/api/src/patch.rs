use serde::{Deserialize, Deserializer};

/// Tri-state field for sparse update bodies. A JSON field that is absent
/// leaves the column unchanged, an explicit `null` clears it, and a value
/// replaces it. Request structs mark these fields `#[serde(default)]` so
/// absence deserializes to [`Patch::Missing`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Missing,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    /// Applies the patch against the current column value.
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Missing => current,
            Patch::Clear => None,
            Patch::Set(value) => Some(value),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        note: Patch<String>,
    }

    #[test]
    fn absent_field_is_missing() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.note, Patch::Missing);
    }

    #[test]
    fn null_field_clears() {
        let body: Body = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(body.note, Patch::Clear);
    }

    #[test]
    fn value_field_sets() {
        let body: Body = serde_json::from_str(r#"{"note": "hi"}"#).unwrap();
        assert_eq!(body.note, Patch::Set("hi".to_string()));
    }

    #[test]
    fn resolve_applies_each_state() {
        let current = Some("old".to_string());
        assert_eq!(
            Patch::Missing.resolve(current.clone()),
            Some("old".to_string())
        );
        assert_eq!(Patch::<String>::Clear.resolve(current.clone()), None);
        assert_eq!(
            Patch::Set("new".to_string()).resolve(current),
            Some("new".to_string())
        );
    }
}
