//! The fixed intermediate representation every reader produces and every
//! writer consumes.

use polars::prelude::{Column, DataFrame, DataType, IntoColumn, PolarsResult, Series};
use serde::Serialize;

use crate::error::SchemaError;

/// Logical IR column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IrType {
    Date,
    String,
    Decimal,
}

impl IrType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::String => "String",
            Self::Decimal => "Decimal",
        }
    }

    /// Whether a physical column type satisfies this logical type.
    ///
    /// `Decimal` also accepts `Float64`, which is what the text readers emit.
    pub fn accepts(self, dtype: &DataType) -> bool {
        match self {
            Self::Date => matches!(dtype, DataType::Date),
            Self::String => matches!(dtype, DataType::String),
            Self::Decimal => matches!(dtype, DataType::Decimal(..) | DataType::Float64),
        }
    }

    fn empty_dtype(self) -> DataType {
        match self {
            Self::Date => DataType::Date,
            Self::String => DataType::String,
            Self::Decimal => DataType::Float64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IrField {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: IrType,
    pub required: bool,
}

const IR_FIELDS: [IrField; 6] = [
    IrField {
        name: "date",
        ty: IrType::Date,
        required: true,
    },
    IrField {
        name: "account",
        ty: IrType::String,
        required: true,
    },
    IrField {
        name: "amount",
        ty: IrType::Decimal,
        required: true,
    },
    IrField {
        name: "currency",
        ty: IrType::String,
        required: true,
    },
    IrField {
        name: "description",
        ty: IrType::String,
        required: false,
    },
    IrField {
        name: "reference",
        ty: IrType::String,
        required: false,
    },
];

pub fn ir_schema() -> Vec<IrField> {
    IR_FIELDS.to_vec()
}

fn field(name: &str) -> Option<&'static IrField> {
    IR_FIELDS.iter().find(|f| f.name == name)
}

/// An IR frame with every column and zero rows.
pub fn empty_ir() -> PolarsResult<DataFrame> {
    let columns = IR_FIELDS
        .iter()
        .map(|f| {
            Series::new_empty(f.name.into(), &f.ty.empty_dtype()).into_column()
        })
        .collect::<Vec<Column>>();
    DataFrame::new(columns)
}

/// Checks a frame against the IR contract without touching it.
///
/// Missing required fields are reported first, then unexpected fields, then
/// the first column (in frame order) with the wrong type. Optional fields may
/// be all-null.
pub fn validate_ir(df: &DataFrame) -> Result<(), SchemaError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    let mut missing: Vec<String> = IR_FIELDS
        .iter()
        .filter(|f| f.required && !names.iter().any(|n| n == f.name))
        .map(|f| f.name.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(SchemaError::MissingFields { fields: missing });
    }

    let mut unexpected: Vec<String> = names
        .iter()
        .filter(|n| field(n).is_none())
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        unexpected.sort();
        return Err(SchemaError::UnexpectedFields { fields: unexpected });
    }

    for column in df.get_columns() {
        let Some(spec) = field(column.name()) else {
            continue;
        };
        let dtype = column.dtype();
        if !spec.required && dtype == &DataType::Null {
            continue;
        }
        if !spec.ty.accepts(dtype) {
            return Err(SchemaError::WrongType {
                field: spec.name.to_string(),
                expected: spec.ty.as_str().to_string(),
                actual: dtype.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::NamedFrom;

    fn date_column(days: &[i32]) -> Column {
        Series::new("date".into(), days)
            .cast(&DataType::Date)
            .unwrap()
            .into_column()
    }

    fn valid_frame() -> DataFrame {
        DataFrame::new(vec![
            date_column(&[19_723]),
            Series::new("account".into(), &["4001"]).into_column(),
            Series::new("amount".into(), &[100.0f64]).into_column(),
            Series::new("currency".into(), &["USD"]).into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn accepts_required_fields_only() {
        assert_eq!(validate_ir(&valid_frame()), Ok(()));
    }

    #[test]
    fn empty_ir_is_valid() {
        let df = empty_ir().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 6);
        assert_eq!(validate_ir(&df), Ok(()));
    }

    #[test]
    fn reports_missing_fields_sorted() {
        let df = DataFrame::new(vec![
            Series::new("account".into(), &["4001"]).into_column(),
        ])
        .unwrap();
        assert_eq!(
            validate_ir(&df),
            Err(SchemaError::MissingFields {
                fields: vec!["amount".into(), "currency".into(), "date".into()]
            })
        );
    }

    #[test]
    fn reports_unexpected_fields() {
        let mut df = valid_frame();
        df.with_column(Series::new("memo".into(), &["x"])).unwrap();
        assert_eq!(
            validate_ir(&df),
            Err(SchemaError::UnexpectedFields {
                fields: vec!["memo".into()]
            })
        );
    }

    #[test]
    fn rejects_string_dates() {
        let mut df = valid_frame();
        df.with_column(Series::new("date".into(), &["2024-01-01"])).unwrap();
        let err = validate_ir(&df).unwrap_err();
        assert!(matches!(err, SchemaError::WrongType { ref field, .. } if field == "date"));
    }

    #[test]
    fn allows_null_optional_fields() {
        let mut df = valid_frame();
        df.with_column(Series::full_null("reference".into(), 1, &DataType::Null))
            .unwrap();
        assert_eq!(validate_ir(&df), Ok(()));
    }
}
