//! Protocol header codec.
//!
//! Turns the raw metadata mapping received with a peer response into a typed
//! [`ProtocolHeader`]. Decoding never fails: numeric fields that do not parse
//! become `None` and are left for the schema to reject.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw response metadata, keyed by lower-cased header name.
pub type RawHeaders = Map<String, Value>;

/// Summary of the latest block a peer claims to have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_public_key: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_transactions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_block: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_fee: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_length: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_hash: Option<Value>,
}

impl BlockHeader {
    /// Copy the known block fields out of a mapping, ignoring everything else.
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        let field = |name: &str| raw.get(name).cloned();
        Self {
            id: field("id"),
            timestamp: field("timestamp"),
            signature: field("signature"),
            generator_public_key: field("generatorPublicKey"),
            version: field("version"),
            height: field("height"),
            number_of_transactions: field("numberOfTransactions"),
            previous_block: field("previousBlock"),
            total_amount: field("totalAmount"),
            total_fee: field("totalFee"),
            reward: field("reward"),
            payload_length: field("payloadLength"),
            payload_hash: field("payloadHash"),
        }
    }
}

/// Typed protocol header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProtocolHeader {
    /// Chain height, `None` when the raw value is not a number.
    pub height: Option<i64>,
    /// Advertised port, `None` when the raw value is not a number.
    pub port: Option<i64>,
    pub os: Option<String>,
    pub version: Option<String>,
    pub nethash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockheader: Option<BlockHeader>,
}

impl ProtocolHeader {
    /// Decode a raw header mapping.
    pub fn normalize(raw: &RawHeaders) -> Self {
        Self {
            height: raw.get("height").and_then(parse_int),
            port: raw.get("port").and_then(parse_int),
            os: raw.get("os").map(verbatim),
            version: raw.get("version").map(verbatim),
            nethash: raw.get("nethash").map(verbatim),
            blockheader: raw
                .get("blockheader")
                .and_then(Value::as_object)
                .map(BlockHeader::from_map),
        }
    }
}

fn verbatim(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Integer-prefix parsing: leading whitespace, an optional sign, an optional
/// `0x` prefix selecting hexadecimal, then as many digits as are present. No
/// digits means not a number. Values beyond `i64` saturate.
fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim_start();
            let (negative, rest) = match s.as_bytes().first() {
                Some(b'-') => (true, &s[1..]),
                Some(b'+') => (false, &s[1..]),
                _ => (false, s),
            };
            let (radix, rest) = match rest.get(..2) {
                Some("0x") | Some("0X") => (16, &rest[2..]),
                _ => (10, rest),
            };
            let end = rest
                .find(|c: char| !c.is_digit(radix))
                .unwrap_or(rest.len());
            let digits = &rest[..end];
            if digits.is_empty() {
                return None;
            }
            let magnitude = i64::from_str_radix(digits, radix).unwrap_or(i64::MAX);
            Some(if negative { -magnitude } else { magnitude })
        }
        _ => None,
    }
}
