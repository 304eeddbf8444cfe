// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Query string encoding

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use super::headers::Params;
use crate::error::{Error, Result};

/// Characters escaped in query keys and values.
///
/// Same as `encodeURIComponent`, except `@`, `:` and `$` stay literal.
/// Spaces are escaped here and rewritten to `+` afterwards.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'@')
    .remove(b':')
    .remove(b'$');

/// Percent-encode a single key or value
pub fn encode_component(input: &str) -> String {
    // '+' itself is escaped as %2B, so rewriting %20 cannot be ambiguous
    utf8_percent_encode(input, QUERY_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

/// Encode one parameter value.
///
/// Arrays expand into repeated pairs: the first element is returned bare (the
/// caller already wrote `key=`), each following element is emitted as
/// `&<encoded_key>=<element>`. Encoding an array without `encoded_key` is a
/// usage error.
pub fn encode_value(value: &Value, encoded_key: Option<&str>) -> Result<String> {
    match value {
        Value::Array(items) => {
            let key = encoded_key.ok_or_else(|| {
                Error::usage("encoding an array value requires an encoded key")
            })?;
            let mut out = String::new();
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push('&');
                    out.push_str(key);
                    out.push('=');
                }
                out.push_str(&encode_scalar(item));
            }
            Ok(out)
        }
        other => Ok(encode_scalar(other)),
    }
}

fn encode_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => encode_component(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        // Nested arrays inside an array element are serialized like objects
        Value::Array(_) | Value::Object(_) => encode_component(&value.to_string()),
    }
}

/// Build `k=v&k2=v2` from params in insertion order.
pub fn to_query_string(params: &Params) -> Result<String> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params.iter() {
        let encoded_key = encode_component(key);
        let encoded_value = encode_value(value, Some(&encoded_key))?;
        pairs.push(format!("{}={}", encoded_key, encoded_value));
    }
    Ok(pairs.join("&"))
}

/// Append encoded params to `url`, dropping any `#fragment` first.
///
/// Uses `&` as the separator when the url already carries a query string.
pub fn full_url(url: &str, params: &Params) -> Result<String> {
    let base = match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    };

    let query = to_query_string(params)?;
    if query.is_empty() {
        return Ok(base.to_string());
    }

    let separator = if base.contains('?') { '&' } else { '?' };
    Ok(format!("{}{}{}", base, separator, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: Vec<(&str, Value)>) -> Params {
        pairs.into_iter().collect()
    }

    #[test]
    fn test_basic_encoding() {
        let p = params(vec![("a=", json!("?&")), ("b", json!(2))]);
        assert_eq!(to_query_string(&p).unwrap(), "a%3D=%3F%26&b=2");
    }

    #[test]
    fn test_objects_are_jsonified() {
        let p = params(vec![("a", json!(1)), ("b", json!({"c": 3}))]);
        assert_eq!(to_query_string(&p).unwrap(), "a=1&b=%7B%22c%22:3%7D");
    }

    #[test]
    fn test_arrays_expand() {
        let p = params(vec![("a", json!([1, 2, 3]))]);
        assert_eq!(to_query_string(&p).unwrap(), "a=1&a=2&a=3");
    }

    #[test]
    fn test_literal_characters() {
        let p = params(vec![(":bar", json!("$baz@1")), ("!do&h", json!("g=a h"))]);
        assert_eq!(to_query_string(&p).unwrap(), ":bar=$baz@1&!do%26h=g%3Da+h");
    }

    #[test]
    fn test_plus_is_escaped() {
        assert_eq!(encode_component("a+b c"), "a%2Bb+c");
    }

    #[test]
    fn test_encode_value_url() {
        assert_eq!(
            encode_value(&json!("http://%.com"), None).unwrap(),
            "http:%2F%2F%25.com"
        );
    }

    #[test]
    fn test_encode_value_array_with_key() {
        assert_eq!(
            encode_value(&json!(["jeff", "igor", "tobias"]), Some("person")).unwrap(),
            "jeff&person=igor&person=tobias"
        );
    }

    #[test]
    fn test_encode_value_array_without_key() {
        let err = encode_value(&json!(["jeff", "igor"]), None).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn test_empty_params() {
        assert_eq!(to_query_string(&Params::new()).unwrap(), "");
        assert_eq!(full_url("/users", &Params::new()).unwrap(), "/users");
        assert_eq!(full_url("/users#top", &Params::new()).unwrap(), "/users");
    }

    #[test]
    fn test_full_url() {
        let p = params(vec![("name", json!("Jeff"))]);
        assert_eq!(full_url("/users", &p).unwrap(), "/users?name=Jeff");
        assert_eq!(
            full_url("/users?hair=brown", &p).unwrap(),
            "/users?hair=brown&name=Jeff"
        );
    }

    #[test]
    fn test_full_url_strips_fragment() {
        let p = params(vec![("title", json!("Dr."))]);
        assert_eq!(
            full_url("/users?hair=brown#some-label", &p).unwrap(),
            "/users?hair=brown&title=Dr."
        );
    }

    fn decode(query: &str) -> Vec<(String, String)> {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn test_scalar_pairs_decode_back() {
        let cases = [
            ("q", "rust & go"),
            ("lang", "en=us"),
            ("user@host:port", "$price!"),
            ("sum", "1+1=2"),
            ("rate", "100% sure"),
            ("name", "Jürgen Müller ✓"),
            ("ключ", "значение"),
            ("empty", ""),
        ];

        for (key, value) in cases {
            let query = to_query_string(&params(vec![(key, json!(value))])).unwrap();
            assert_eq!(
                decode(&query),
                vec![(key.to_string(), value.to_string())],
                "query: {}",
                query
            );
        }

        let all = params(cases.iter().map(|(k, v)| (*k, json!(v))).collect());
        let expected: Vec<(String, String)> = cases
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(decode(&to_query_string(&all).unwrap()), expected);
    }

    #[test]
    fn test_array_pairs_decode_back() {
        let items = ["a b", "c+d", "é@x", "50%"];
        let p = params(vec![("tags[]", json!(items)), ("page", json!(2))]);

        let mut expected: Vec<(String, String)> = items
            .iter()
            .map(|item| ("tags[]".to_string(), item.to_string()))
            .collect();
        expected.push(("page".to_string(), "2".to_string()));

        assert_eq!(decode(&to_query_string(&p).unwrap()), expected);
    }
}
