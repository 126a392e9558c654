//! Query string parsing and writing.

use std::collections::BTreeMap;

use bridge_traits::http::encode_form;

pub type QueryMap = BTreeMap<String, String>;

/// Parse `?key=value&...` into a map.
///
/// Values are percent-decoded (a `+` stays a `+`); a value that does not
/// decode is kept raw. A key without `=` maps to the empty string and a
/// repeated key keeps its last value.
pub fn parse_query(raw: &str) -> QueryMap {
    raw.strip_prefix('?')
        .unwrap_or(raw)
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key.is_empty() {
                return None;
            }
            let value = urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string());
            Some((key.to_string(), value))
        })
        .collect()
}

/// Write a query map without the leading `?`. Keys come out in sorted order.
pub fn write_query(query: &QueryMap) -> String {
    let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    encode_form(&pairs)
}
