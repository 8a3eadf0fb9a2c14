//! [`Price`] read definitions.

#[cfg(doc)]
use crate::domain::Price;

pub mod list {
    //! [`Price`]s list definitions.

    use crate::read::Search;
    #[cfg(doc)]
    use crate::domain::{Device, Price};

    /// Filter of a [`Price`]s list.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Only [`Price`]s with the provided `is_active` flag are listed.
        pub is_active: Option<bool>,

        /// [`Search`] among [`Device`] names and models.
        pub search: Option<Search>,
    }
}
