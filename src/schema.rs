use crate::Value;

/// Structural descriptor of a record: ordered field names with declared kinds.
///
/// Kinds are [`Value`] prototypes (payload-free variants), the same convention
/// the writer and the wire codec use.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, Value)>,
}

impl Schema {
    pub fn new(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, kind)| (name, kind.prototype()))
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn kind(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kind(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Structural compatibility: equal field-name sets and, for every field,
    /// kinds assignable in one direction or the other. Reflexive and
    /// symmetric, insensitive to field order.
    pub fn compatible(&self, other: &Schema) -> bool {
        if self.fields.len() != other.fields.len() {
            return false;
        }
        self.fields.iter().all(|(name, kind)| {
            other
                .kind(name)
                .is_some_and(|k| kind.assignable_from(k) || k.assignable_from(kind))
        })
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, kind)| other.kind(name).is_some_and(|k| k.same_type(kind)))
    }
}

impl FromIterator<(String, Value)> for Schema {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(fields: &[(&str, Value)]) -> Schema {
        Schema::new(
            fields
                .iter()
                .map(|(name, kind)| (name.to_string(), kind.clone())),
        )
    }

    #[test]
    fn compatible_is_reflexive_and_symmetric() {
        let a = schema(&[("Id", Value::Int64(None)), ("Name", Value::Varchar(None))]);
        let b = schema(&[("Name", Value::Varchar(None)), ("Id", Value::Float64(None))]);
        let c = schema(&[("Id", Value::Int64(None)), ("Age", Value::Int64(None))]);
        assert!(a.compatible(&a));
        assert!(b.compatible(&b));
        assert_eq!(a.compatible(&b), b.compatible(&a));
        assert!(a.compatible(&b));
        assert!(!a.compatible(&c));
        assert_eq!(a.compatible(&c), c.compatible(&a));
    }

    #[test]
    fn name_sets_must_match() {
        let a = schema(&[("Id", Value::Int64(None))]);
        let b = schema(&[("Id", Value::Int64(None)), ("Name", Value::Varchar(None))]);
        assert!(!a.compatible(&b));
        assert!(!b.compatible(&a));
    }
}
