use error_stack::report;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, ModelResult};

/// Field order mandated for the EIP-712 domain separator. Some signing
/// backends hash domain fields in the order they receive them instead of
/// sorting, so the quote's domain must be re-emitted in exactly this order.
pub const DOMAIN_FIELD_ORDER: [&str; 5] =
    ["name", "version", "chainId", "verifyingContract", "salt"];

/// An EIP-712 object exactly as returned by the quote endpoint.
///
/// `domain` and `types` keep their wire key order (`serde_json` is built with
/// `preserve_order`), and `message` is carried as an opaque value so it can be
/// round-tripped byte-for-byte into the submit payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Eip712TypedData {
    pub types: Map<String, Value>,
    pub domain: Map<String, Value>,
    pub message: Value,
    #[serde(rename = "primaryType")]
    pub primary_type: String,
}

impl Eip712TypedData {
    /// Returns a copy suitable for signing: the domain is rebuilt in
    /// [`DOMAIN_FIELD_ORDER`] with absent fields dropped, and the type graph
    /// is validated. `message` is left untouched; per EIP-712 only the
    /// domain's field set and order affect the separator hash.
    pub fn canonicalize(&self) -> ModelResult<Eip712TypedData> {
        self.validate()?;

        let mut domain = Map::new();
        for field in DOMAIN_FIELD_ORDER {
            if let Some(value) = self.domain.get(field) {
                domain.insert(field.to_string(), value.clone());
            }
        }

        Ok(Eip712TypedData {
            types: self.types.clone(),
            domain,
            message: self.message.clone(),
            primary_type: self.primary_type.clone(),
        })
    }

    /// Checks the shape invariants of the quote response: the primary type
    /// must be declared, every struct type reachable from it must be declared,
    /// and the domain must not carry unknown fields.
    pub fn validate(&self) -> ModelResult<()> {
        if !self.types.contains_key(&self.primary_type) {
            return Err(report!(Error::MalformedTypedData(format!(
                "primaryType '{}' is not declared in types",
                self.primary_type
            ))));
        }

        for key in self.domain.keys() {
            if !DOMAIN_FIELD_ORDER.contains(&key.as_str()) {
                return Err(report!(Error::MalformedTypedData(format!(
                    "unknown domain field '{key}'"
                ))));
            }
        }

        let mut pending = vec![self.primary_type.as_str()];
        let mut visited = vec![];

        while let Some(type_name) = pending.pop() {
            if visited.contains(&type_name) {
                continue;
            }
            visited.push(type_name);

            for field_type in declared_field_types(&self.types, type_name)? {
                let base = strip_array_suffix(field_type);
                if is_atomic_type(base) {
                    continue;
                }
                if !self.types.contains_key(base) {
                    return Err(report!(Error::MalformedTypedData(format!(
                        "type '{type_name}' references undeclared type '{base}'"
                    ))));
                }
                pending.push(base);
            }
        }

        Ok(())
    }
}

/// Extracts the `type` strings of a declared struct type's fields.
fn declared_field_types<'a>(
    types: &'a Map<String, Value>,
    type_name: &str,
) -> ModelResult<Vec<&'a str>> {
    let fields = types
        .get(type_name)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            report!(Error::MalformedTypedData(format!(
                "type '{type_name}' is not a field list"
            )))
        })?;

    fields
        .iter()
        .map(|field| {
            let name_ok = field.get("name").and_then(Value::as_str).is_some();
            let field_type = field.get("type").and_then(Value::as_str);
            match field_type {
                Some(t) if name_ok => Ok(t),
                _ => Err(report!(Error::MalformedTypedData(format!(
                    "field of type '{type_name}' is missing name/type"
                )))),
            }
        })
        .collect()
}

/// `Token[]` and `Token[3]` both reference `Token`.
fn strip_array_suffix(field_type: &str) -> &str {
    match field_type.find('[') {
        Some(idx) => &field_type[..idx],
        None => field_type,
    }
}

fn is_atomic_type(name: &str) -> bool {
    match name {
        "address" | "bool" | "string" | "bytes" => true,
        _ => {
            if let Some(size) = name.strip_prefix("bytes") {
                size.parse::<u16>()
                    .is_ok_and(|n| (1..=32).contains(&n))
            } else if let Some(bits) = name
                .strip_prefix("uint")
                .or_else(|| name.strip_prefix("int"))
            {
                bits.parse::<u16>()
                    .is_ok_and(|n| n >= 8 && n <= 256 && n % 8 == 0)
            } else {
                false
            }
        }
    }
}
