//! The fixed case-record schema and its label → column table.
//!
//! [`Field`] declares the ordered field list once. [`Schema`] is built at
//! startup from those labels and rejects any two labels that normalize to the
//! same column, so collisions are caught before a single record is touched.

use std::collections::HashMap;

use crate::error::NormalizationError;
use crate::normalizer::normalize_key;

macro_rules! fields {
    ($($variant:ident => $label:literal),+ $(,)?) => {
        /// One attribute of a [`CaseRecord`](crate::CaseRecord), in schema order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Field {
            $($variant),+
        }

        impl Field {
            /// Every field, in column order.
            pub const ALL: &'static [Field] = &[$(Field::$variant),+];

            /// Human-readable source label (as it appears in the input and
            /// on detail pages).
            pub fn label(self) -> &'static str {
                match self {
                    $(Field::$variant => $label),+
                }
            }
        }
    };
}

fields! {
    CbNo => "CB_NO",
    CaseNumber => "CASE NUMBER",
    Name => "NAME",
    Age => "AGE",
    ArrestLocation => "ARREST LOCATION",
    ArrestDate => "ARREST DATE",
    Race => "RACE",
    Charge1Statute => "CHARGE 1 STATUTE",
    Charge1Description => "CHARGE 1 DESCRIPTION",
    Charge1Type => "CHARGE 1 TYPE",
    Charge1Class => "CHARGE 1 CLASS",
    Charge2Statute => "CHARGE 2 STATUTE",
    Charge2Description => "CHARGE 2 DESCRIPTION",
    Charge2Type => "CHARGE 2 TYPE",
    Charge2Class => "CHARGE 2 CLASS",
    Charge3Statute => "CHARGE 3 STATUTE",
    Charge3Description => "CHARGE 3 DESCRIPTION",
    Charge3Type => "CHARGE 3 TYPE",
    Charge3Class => "CHARGE 3 CLASS",
    Charge4Statute => "CHARGE 4 STATUTE",
    Charge4Description => "CHARGE 4 DESCRIPTION",
    Charge4Type => "CHARGE 4 TYPE",
    Charge4Class => "CHARGE 4 CLASS",
    ChargesStatute => "CHARGES STATUTE",
    ChargesDescription => "CHARGES DESCRIPTION",
    ChargesType => "CHARGES TYPE",
    ChargesClass => "CHARGES CLASS",
}

impl Field {
    /// Number of fixed-schema fields.
    pub const COUNT: usize = Field::ALL.len();

    /// Position of this field in [`Field::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata columns appended after the fixed fields.
pub const META_COLUMNS: [&str; 3] = ["status", "error", "updated_at"];

/// Static label → column mapping for the fixed schema.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<String>,
    by_key: HashMap<String, Field>,
}

impl Schema {
    /// Build the table for the standard field list.
    pub fn new() -> Result<Self, NormalizationError> {
        Self::from_labels(Field::ALL.iter().map(|f| (*f, f.label())))
    }

    /// Build a table from explicit `(field, label)` pairs. Fails on the first
    /// label whose normalized key is empty or already taken, or that labels a
    /// field a second time.
    pub fn from_labels<'a>(
        labels: impl IntoIterator<Item = (Field, &'a str)>,
    ) -> Result<Self, NormalizationError> {
        let mut columns = vec![String::new(); Field::COUNT];
        let mut by_key: HashMap<String, Field> = HashMap::with_capacity(Field::COUNT);
        let mut labels_by_key: HashMap<String, &'a str> = HashMap::with_capacity(Field::COUNT);
        let mut labels_by_field: [Option<&'a str>; Field::COUNT] = [None; Field::COUNT];

        for (field, label) in labels {
            if let Some(first) = labels_by_field[field.index()] {
                return Err(NormalizationError::RepeatedField {
                    field: field.label().to_string(),
                    first: first.to_string(),
                    second: label.to_string(),
                });
            }
            labels_by_field[field.index()] = Some(label);

            let key = normalize_key(label);
            if key.is_empty() {
                return Err(NormalizationError::EmptyKey {
                    label: label.to_string(),
                });
            }
            if let Some(first) = labels_by_key.get(&key) {
                return Err(NormalizationError::Collision {
                    first: (*first).to_string(),
                    second: label.to_string(),
                    key,
                });
            }
            labels_by_key.insert(key.clone(), label);
            by_key.insert(key.clone(), field);
            columns[field.index()] = key;
        }

        if let Some(missing) = Field::ALL.iter().find(|f| columns[f.index()].is_empty()) {
            return Err(NormalizationError::MissingField {
                label: missing.label().to_string(),
            });
        }

        Ok(Self { columns, by_key })
    }

    /// Storage column for a field.
    pub fn column(&self, field: Field) -> &str {
        &self.columns[field.index()]
    }

    /// Field columns in schema order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Column holding the identifier (the primary key).
    pub fn key_column(&self) -> &str {
        self.column(Field::CbNo)
    }

    /// Resolve a free-form label to its field, if it names one.
    pub fn resolve(&self, label: &str) -> Option<Field> {
        self.by_key.get(&normalize_key(label)).copied()
    }

    /// Resolve a list of configured labels, failing on the first unknown one.
    pub fn resolve_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<Field>, NormalizationError> {
        labels
            .iter()
            .map(|l| {
                self.resolve(l.as_ref())
                    .ok_or_else(|| NormalizationError::UnknownLabel {
                        label: l.as_ref().to_string(),
                    })
            })
            .collect()
    }
}
