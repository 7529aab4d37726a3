use serde::{Serialize, Serializer};

/// Ordered form-encoded request payload
///
/// The portal's endpoints take large fixed field sets where only a handful of
/// values vary per call. Field order is preserved as built; setting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Form {
    fields: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any existing value for the key
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.fields.push((key.to_string(), value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl Serialize for Form {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // A sequence of pairs form-encodes as repeated key=value fields.
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut form = Form::new();
        form.set("from_date", "2008-01-01");
        assert_eq!(form.get("from_date"), Some("2008-01-01"));
        assert_eq!(form.get("to_date"), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut form = Form::new();
        form.set("sEcho", "1").set("app_token", "a").set("sEcho", "2");

        assert_eq!(form.get("sEcho"), Some("2"));
        assert_eq!(form.fields().len(), 2);
        // Position of the replaced key is stable
        assert_eq!(form.fields()[0].0, "sEcho");
    }

    #[test]
    fn test_form_encodes_as_pairs() {
        let mut form = Form::new();
        form.set("a", "1").set("b", "x y");
        let encoded = serde_urlencoded::to_string(&form).unwrap();
        assert_eq!(encoded, "a=1&b=x+y");
    }
}
