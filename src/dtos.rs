use std::str::FromStr;

pub mod chatdtos;
pub mod messagedtos;
pub mod userdtos;

/// Parses an optional enum value from a request, keeping the parse error.
pub fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr<Err = String>,
{
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(T::from_str)
        .transpose()
}
