//! Row Transforms - Pure functions turning a renamed raw batch into the
//! canonical layout of its table
//!
//! Raw cells are text. Transforms only normalize what the declared schema
//! types need: decimal commas become floats and `YYYYMMDD` strings become
//! dates. Values that cannot be parsed become null rather than failing the
//! whole file. Columns are replaced in place, so the order never changes.

use chrono::NaiveDate;
use polars::prelude::*;

/// Table-specific transform applied to every file of that table
pub type Transform = fn(DataFrame) -> PolarsResult<DataFrame>;

/// Date layout of the extracts
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Leave the batch untouched
pub fn identity(df: DataFrame) -> PolarsResult<DataFrame> {
    Ok(df)
}

/// `"1234,56"` → `1234.56`
pub fn parse_decimal_comma(value: &str) -> Option<f64> {
    value.trim().replace(',', ".").parse().ok()
}

/// `"20200131"` → `2020-01-31`; `"0"` and `"00000000"` have no date
pub fn parse_yyyymmdd(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn days_since_epoch(date: NaiveDate) -> Option<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from(date.signed_duration_since(epoch).num_days()).ok()
}

/// Replace a text column by its `Float64` reading
pub fn decimal_comma_to_float(df: &mut DataFrame, column: &str) -> PolarsResult<()> {
    let values: Vec<Option<f64>> = df
        .column(column)?
        .str()?
        .into_iter()
        .map(|value| value.and_then(parse_decimal_comma))
        .collect();
    df.with_column(Series::new(column, values))?;
    Ok(())
}

/// Replace a text column by its `Date` reading
pub fn yyyymmdd_to_date(df: &mut DataFrame, column: &str) -> PolarsResult<()> {
    let days: Vec<Option<i32>> = df
        .column(column)?
        .str()?
        .into_iter()
        .map(|value| value.and_then(parse_yyyymmdd).and_then(days_since_epoch))
        .collect();
    let dates = Series::new(column, days).cast(&DataType::Date)?;
    df.with_column(dates)?;
    Ok(())
}

fn dates(mut df: DataFrame, columns: &[&str]) -> PolarsResult<DataFrame> {
    for column in columns {
        yyyymmdd_to_date(&mut df, column)?;
    }
    Ok(df)
}

pub fn empresa(mut df: DataFrame) -> PolarsResult<DataFrame> {
    decimal_comma_to_float(&mut df, "capital_social")?;
    Ok(df)
}

pub fn estabelecimento(df: DataFrame) -> PolarsResult<DataFrame> {
    dates(
        df,
        &[
            "data_situacao_cadastral",
            "data_inicio_atividade",
            "data_situacao_especial",
        ],
    )
}

pub fn socios(df: DataFrame) -> PolarsResult<DataFrame> {
    dates(df, &["data_entrada_sociedade"])
}

pub fn simples(df: DataFrame) -> PolarsResult<DataFrame> {
    dates(
        df,
        &[
            "data_opcao_simples",
            "data_exclusao_simples",
            "data_opcao_mei",
            "data_exclusao_mei",
        ],
    )
}
