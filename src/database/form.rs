use std::collections::HashMap;

use potion::Error;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{error::TypeError, schema::Uuid};

pub type FormData = HashMap<String, Value>;

/// Request payload as sent by the front-end's `FormData` based actions.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    /// Deserializes a nested JSON value, such as a list of objects.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T, Error> {
        match self.inner.get(key) {
            Some(value) => serde_json::from_value(value.to_owned())
                .map_err(|e| TypeError::new(&format!("Invalid {key}: {e}")).into()),
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new("Invalid key")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }

    /// Missing keys and `null` read as an empty string.
    pub fn get_str_or_empty(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(_) => self.get_str(key),
        }
    }

    pub fn get_uuid(&self, key: &str) -> Result<Uuid, Error> {
        let value = self.get_str(key).map_err(Error::from)?;

        Uuid::parse_str(value.trim())
            .map_err(|_e| TypeError::new(&format!("Invalid id for {key}")).into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::NewPantryItem;

    fn form(value: Value) -> Form {
        Form::from_data(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn reads_strings_and_ids() {
        let id = Uuid::new_v4();
        let form = form(json!({ "itemId": id.to_string(), "name": "Rice", "quantity": null }));

        assert_eq!(form.get_str("name").unwrap(), "Rice");
        assert_eq!(form.get_str_or_empty("quantity").unwrap(), "");
        assert_eq!(form.get_str_or_empty("missing").unwrap(), "");
        assert!(form.get_uuid("itemId").is_ok_and(|v| v == id));
    }

    #[test]
    fn rejects_bad_ids_and_types() {
        let form = form(json!({ "recipeId": "not-an-id", "count": 3 }));

        assert!(form.get_uuid("recipeId").is_err());
        assert!(form.get_str("count").is_err());
        assert!(form.get_uuid("absent").is_err());
    }

    #[test]
    fn reads_nested_lists() {
        let form = form(json!({
            "items": [{ "name": "Rice", "quantity": "1 kg" }, { "name": "Salt" }]
        }));

        let items: Vec<NewPantryItem> = form.get_json("items").ok().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].quantity, "");
        assert!(form.get_json::<Vec<NewPantryItem>>("missing").is_err());
    }
}
