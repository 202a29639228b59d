//! Deserializes a nested table of string values into typed options.
//!
//! Every leaf is kept as the string the provider stored; it is parsed only
//! when the target field asks for a number, bool or char. A `String` field
//! therefore binds `"007"` verbatim while a `u16` field binds `"8080"`.

use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, Error as _, IntoDeserializer, Unexpected, Visitor};
use serde::forward_to_deserialize_any;
use toml::{Table, Value};

type Error = toml::de::Error;

/// Deserializer over a value produced by [`to_table`](super::tree::to_table).
#[derive(Debug, Clone, Copy)]
pub struct ValueDeserializer<'de> {
    value: &'de Value,
}

impl<'de> ValueDeserializer<'de> {
    pub fn new(value: &'de Value) -> Self {
        Self { value }
    }

    fn as_str(&self) -> Result<&'de str, Error> {
        match self.value {
            Value::String(s) => Ok(s.as_str()),
            Value::Table(_) => Err(Error::invalid_type(Unexpected::Map, &"a scalar value")),
            other => Err(Error::custom(format!("unexpected value {other}"))),
        }
    }
}

macro_rules! parse_scalar {
    ($($method:ident => $visit:ident: $ty:ty,)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
                let s = self.as_str()?;
                let parsed = s
                    .trim()
                    .parse::<$ty>()
                    .map_err(|_| Error::invalid_value(Unexpected::Str(s), &visitor))?;
                visitor.$visit(parsed)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Table(table) => visit_table(table, visitor),
            Value::String(s) => visitor.visit_borrowed_str(s),
            other => Err(Error::custom(format!("unexpected value {other}"))),
        }
    }

    parse_scalar! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
        deserialize_char => visit_char: char,
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let s = self.as_str()?;
        match s.trim() {
            t if t.eq_ignore_ascii_case("true") => visitor.visit_bool(true),
            t if t.eq_ignore_ascii_case("false") => visitor.visit_bool(false),
            _ => Err(Error::invalid_value(Unexpected::Str(s), &visitor)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    /// Sequences are stored as tables keyed `0`, `1`, ... in index order.
    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let Value::Table(table) = self.value else {
            return Err(Error::invalid_type(Unexpected::Str(self.as_str()?), &visitor));
        };
        let mut items = Vec::with_capacity(table.len());
        for (key, value) in table {
            let index = key.parse::<usize>().map_err(|_| {
                Error::custom(format!("expected an array index, found key '{key}'"))
            })?;
            items.push((index, ValueDeserializer::new(value)));
        }
        items.sort_by_key(|(index, _)| *index);

        let mut seq = SeqDeserializer::<_, Error>::new(items.into_iter().map(|(_, item)| item));
        let result = visitor.visit_seq(&mut seq)?;
        seq.end()?;
        Ok(result)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        let s = self.as_str()?;
        visitor.visit_enum(<&str as IntoDeserializer<'de, Error>>::into_deserializer(s))
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        str string bytes byte_buf map struct identifier ignored_any i128 u128
    }
}

impl<'de> IntoDeserializer<'de, Error> for ValueDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn visit_table<'de, V: Visitor<'de>>(table: &'de Table, visitor: V) -> Result<V::Value, Error> {
    let mut map = MapDeserializer::<_, Error>::new(
        table
            .iter()
            .map(|(key, value)| (key.as_str(), ValueDeserializer::new(value))),
    );
    let result = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    fn table(pairs: &[(&str, &str)]) -> Value {
        let data = pairs.iter().copied().collect();
        Value::Table(crate::config::tree::to_table(&data))
    }

    fn bind<T: de::DeserializeOwned>(value: &Value) -> Result<T, Error> {
        T::deserialize(ValueDeserializer::new(value))
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Section {
        pin: String,
        port: u16,
        enabled: bool,
        ratio: f64,
        missing: Option<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Mode {
        Fast,
        Safe,
    }

    #[test]
    fn test_strings_parse_only_for_typed_fields() {
        let value = table(&[
            ("Pin", "007"),
            ("Port", "8080"),
            ("Enabled", "True"),
            ("Ratio", "1.5"),
        ]);

        let section: Section = bind(&value).unwrap();

        assert_eq!(
            section,
            Section {
                pin: "007".into(),
                port: 8080,
                enabled: true,
                ratio: 1.5,
                missing: None,
            }
        );
    }

    #[test]
    fn test_numeric_looking_text_binds_to_string() {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct Flags {
            answer: String,
            truthy: String,
        }

        let flags: Flags = bind(&table(&[("Answer", "42"), ("Truthy", "true")])).unwrap();

        assert_eq!(flags.answer, "42");
        assert_eq!(flags.truthy, "true");
    }

    #[test]
    fn test_unparsable_number_is_an_error() {
        let value = table(&[
            ("Pin", "1"),
            ("Port", "99999"),
            ("Enabled", "true"),
            ("Ratio", "1"),
        ]);

        assert!(bind::<Section>(&value).is_err());
    }

    #[test]
    fn test_indexed_keys_bind_to_sequences_in_order() {
        #[derive(Debug, Deserialize)]
        struct Ports {
            ports: Vec<u16>,
        }

        let value = table(&[("ports:10", "3"), ("ports:2", "2"), ("ports:0", "1")]);
        let ports: Ports = bind(&value).unwrap();

        assert_eq!(ports.ports, vec![1, 2, 3]);
    }

    #[test]
    fn test_enums_and_maps() {
        #[derive(Debug, Deserialize)]
        struct Options {
            mode: Mode,
            labels: HashMap<String, String>,
        }

        let value = table(&[("mode", "Safe"), ("labels:a", "1"), ("labels:b", "x")]);
        let options: Options = bind(&value).unwrap();

        assert_eq!(options.mode, Mode::Safe);
        assert_eq!(options.labels["a"], "1");
        assert_eq!(options.labels.len(), 2);
        assert!(bind::<Mode>(&Value::String("Fast".into())).is_ok());
    }
}
