//! Decomposition of the INFO column.

use indexmap::IndexMap;

use super::{error::Error, record::VariantRecord};

/// Key/value entries and flags of an INFO column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoFields {
    /// The `key=value` entries in column order, `None` if there were none at all.
    pub values: Option<IndexMap<String, String>>,
    /// The entries without `=`, in column order.
    pub flags: Vec<String>,
}

impl InfoFields {
    /// Value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .as_ref()
            .and_then(|values| values.get(key))
            .map(String::as_str)
    }

    /// Value for `key`, failing with [`Error::MissingInfoField`] if absent.
    pub fn require(&self, key: &str) -> Result<&str, Error> {
        self.get(key)
            .ok_or_else(|| Error::MissingInfoField(key.to_string()))
    }

    /// Whether `flag` is present as a standalone flag.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Split an INFO string on `;` into `key=value` entries and flags.
///
/// Entries are split on the first `=` only.  The missing value `.` and empty entries
/// (e.g. from a trailing `;`) yield nothing.
pub fn parse_info_str(info: &str) -> InfoFields {
    let mut result = InfoFields::default();
    if info == "." {
        return result;
    }

    for token in info.split(';').filter(|token| !token.is_empty()) {
        match token.split_once('=') {
            Some((key, value)) => {
                result
                    .values
                    .get_or_insert_with(IndexMap::new)
                    .insert(key.to_string(), value.to_string());
            }
            None => result.flags.push(token.to_string()),
        }
    }

    result
}

/// Decompose the INFO column of `record`.
pub fn parse_info(record: &VariantRecord) -> InfoFields {
    parse_info_str(&record.info)
}
