use itertools::Itertools;

use crate::{
    change::ChangeError,
    query::{check_field, QueryError, QuerySet},
    value::FieldValue,
};

/// A read-only mapping from a fixed set of field names to the values of that
/// field across a queryset.
///
/// Values are not stored: every lookup makes a fresh pass over the queryset.
pub struct JuicedDict<'a, Q: QuerySet> {
    qs: &'a Q,
    fields: Vec<String>,
}

impl<'a, Q: QuerySet> JuicedDict<'a, Q> {
    pub fn new(qs: &'a Q, fields: &[&str]) -> Result<Self, QueryError> {
        fields
            .iter()
            .try_for_each(|field| check_field::<Q::Item>(field))?;
        Ok(Self {
            qs,
            fields: fields.iter().map(|field| String::from(*field)).collect_vec(),
        })
    }

    pub fn get(&self, key: &str) -> Result<Vec<FieldValue>, QueryError> {
        if !self.contains_key(key) {
            return Err(QueryError::UnknownKey(String::from(key)));
        }
        Ok(self.qs.values_list(key)?.collect_vec())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|field| field == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.iter().collect_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = Result<Vec<FieldValue>, QueryError>> + '_ {
        self.iter().map(|field| self.get(field))
    }

    pub fn items(
        &self,
    ) -> impl Iterator<Item = (&str, Result<Vec<FieldValue>, QueryError>)> + '_ {
        self.iter().map(|field| (field, self.get(field)))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn insert(&mut self, _key: &str, _values: Vec<FieldValue>) -> Result<(), ChangeError> {
        Err(ChangeError::Unsupported("insert"))
    }

    pub fn remove(&mut self, _key: &str) -> Result<(), ChangeError> {
        Err(ChangeError::Unsupported("remove"))
    }
}

impl<'a, 'd, Q: QuerySet> IntoIterator for &'d JuicedDict<'a, Q> {
    type Item = &'d str;
    type IntoIter = std::iter::Map<std::slice::Iter<'d, String>, fn(&String) -> &str>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter().map(String::as_str as fn(&String) -> &str)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::lib_impls::people;

    use super::*;

    #[test]
    fn lookups_return_values_in_collection_order() {
        let qs = people();
        let dict = JuicedDict::new(&qs, &["name", "age"]).unwrap();
        assert_eq!(
            dict.get("name").unwrap(),
            ["anna", "bert", "carl", "dora", "emil"]
                .map(FieldValue::from)
                .to_vec()
        );
        assert_eq!(dict.get("age").unwrap().len(), 5);
    }

    #[test]
    fn keys_keep_construction_order() {
        let qs = people();
        let dict = JuicedDict::new(&qs, &["team", "name"]).unwrap();
        assert_eq!(dict.keys(), vec!["team", "name"]);
        assert_eq!((&dict).into_iter().collect_vec(), vec!["team", "name"]);
        assert_eq!(
            dict.items().map(|(key, values)| (key, values.unwrap().len())).collect_vec(),
            vec![("team", 5), ("name", 5)]
        );
        assert_eq!(dict.values().count(), 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let qs = people();
        let dict = JuicedDict::new(&qs, &["name"]).unwrap();
        assert_eq!(
            dict.get("team").unwrap_err(),
            QueryError::UnknownKey(String::from("team"))
        );
        assert_eq!(
            JuicedDict::new(&qs, &["colour"]).err().map(|err| err.to_string()),
            Some(String::from("unknown field [colour]"))
        );
    }

    #[test]
    fn writes_are_unsupported() {
        let qs = people();
        let mut dict = JuicedDict::new(&qs, &["name"]).unwrap();
        assert_eq!(
            dict.insert("name", vec![]).unwrap_err(),
            ChangeError::Unsupported("insert")
        );
        assert_eq!(
            dict.remove("name").unwrap_err(),
            ChangeError::Unsupported("remove")
        );
        assert_eq!(dict.get("name").unwrap().len(), 5);
    }
}
