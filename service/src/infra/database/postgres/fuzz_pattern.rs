//! [`FuzzPattern`] definition.

use postgres_types::ToSql;

use crate::read::Search;

/// `ILIKE ANY` patterns of a [`Search`], one per its word.
///
/// Matches a text containing any of the [`Search`] words case-insensitively.
#[derive(Clone, Debug, Eq, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(Vec<String>);

impl FuzzPattern {
    /// Creates a new [`FuzzPattern`] out of the provided [`Search`].
    #[must_use]
    pub fn new(search: &Search) -> Self {
        Self(
            search
                .words()
                .map(|word| {
                    format!(
                        "%{}%",
                        word.replace('\\', r"\\")
                            .replace('%', r"\%")
                            .replace('_', r"\_"),
                    )
                })
                .collect(),
        )
    }
}
