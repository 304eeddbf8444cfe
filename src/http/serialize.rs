// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request payload serialization

use serde_json::Value;

/// Turn a request payload into the string handed to a connection.
///
/// Objects and arrays become compact JSON, a missing payload becomes the
/// empty string, strings pass through and every other value renders as its
/// literal text (`null`, `false`, `42`).
pub fn serialize(data: Option<&Value>) -> String {
    match data {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_objects() {
        assert_eq!(serialize(Some(&json!({"name": "Jeff"}))), r#"{"name":"Jeff"}"#);
        assert_eq!(serialize(Some(&json!({"a": 1}))), r#"{"a":1}"#);
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            serialize(Some(&json!({"names": ["Jeff", "Brian", "Igor"]}))),
            r#"{"names":["Jeff","Brian","Igor"]}"#
        );
    }

    #[test]
    fn test_strings_pass_through() {
        assert_eq!(serialize(Some(&json!(r#"{"name":"Jeff"}"#))), r#"{"name":"Jeff"}"#);
    }

    #[test]
    fn test_primitives() {
        assert_eq!(serialize(None), "");
        assert_eq!(serialize(Some(&Value::Null)), "null");
        assert_eq!(serialize(Some(&json!(false))), "false");
        assert_eq!(serialize(Some(&json!(0))), "0");
        assert_eq!(serialize(Some(&json!(1))), "1");
    }
}
