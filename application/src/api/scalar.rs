//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute of domain
/// newtypes.
///
/// Output is rendered with the [`Display`] impl of `As` type, and input is
/// validated with its [`FromStr`] impl, so a GraphQL scalar never bypasses
/// the domain checks.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Renders the target type as a string scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Parses the target type from a string scalar [`InputValue`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the input value is not a string;
    /// - the input value is rejected by the [`FromStr`] impl of `As` type;
    /// - the parsed value cannot be converted into the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = type_name::<T, S>();

        let s = input.as_string_value().ok_or_else(|| {
            format!(
                "Cannot parse input scalar `{name}`: expected string input \
                 value, found: {input}",
            )
        })?;
        s.parse::<As>()
            .map_err(|e| {
                format!("Cannot parse input scalar `{name}` from \"{s}\": {e}")
            })?
            .try_into()
            .map_err(|e| format!("Cannot parse input scalar `{name}`: {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be parsed as [`String`].
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Returns the GraphQL name of the `T`ype.
fn type_name<T, S>() -> String
where
    T: GraphQLType<S, TypeInfo = ()>,
    S: ScalarValue,
{
    T::name(&()).unwrap_or("<unnamed>").to_owned()
}
