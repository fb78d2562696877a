//! Serde adapter for `u128` amounts.
//!
//! Neither JSON nor TOML carries 128-bit integers, so amounts serialize as
//! decimal strings. Deserialization accepts a string or a (non-negative)
//! integer, so hand-written config files can use either form.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&val.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
    struct U128Visitor;

    impl<'de> Visitor<'de> for U128Visitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a u128 as a string or integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.replace('_', "").parse().map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(v as u128)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            if v >= 0 {
                Ok(v as u128)
            } else {
                Err(E::custom("negative value for u128"))
            }
        }
    }

    d.deserialize_any(U128Visitor)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Wrapper {
        #[serde(with = "super")]
        amount: u128,
    }

    #[test]
    fn test_json_string_form() {
        let w = Wrapper {
            amount: u128::MAX,
        };
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, format!(r#"{{"amount":"{}"}}"#, u128::MAX));
        assert_eq!(serde_json::from_str::<Wrapper>(&json).unwrap(), w);
    }

    #[test]
    fn test_json_integer_form() {
        let w: Wrapper = serde_json::from_str(r#"{"amount":42}"#).unwrap();
        assert_eq!(w.amount, 42);
    }

    #[test]
    fn test_toml_forms() {
        let a: Wrapper = toml::from_str("amount = 1000").unwrap();
        assert_eq!(a.amount, 1000);
        let b: Wrapper = toml::from_str("amount = \"1_000_000\"").unwrap();
        assert_eq!(b.amount, 1_000_000);
        assert!(toml::from_str::<Wrapper>("amount = -5").is_err());
    }
}
