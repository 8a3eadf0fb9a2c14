//! [`Device`] definitions.

use std::sync::LazyLock;

use derive_more::{AsRef, Display, FromStr};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;

/// Device being traded in, identified by its [`Name`] and [`Model`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Device {
    /// [`Name`] of this [`Device`].
    pub name: Name,

    /// [`Model`] of this [`Device`].
    pub model: Model,
}

/// Name of a [`Device`], like `iPhone 12`.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` is not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `device::Name`")
    }
}

/// Model of a [`Device`], like `A2403`.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Model(String);

impl Model {
    /// Creates a new [`Model`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `model` is not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(model: impl Into<String>) -> Self {
        Self(model.into())
    }

    /// Creates a new [`Model`] if the given `model` is valid.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Option<Self> {
        let model = model.into();
        Self::check(&model).then_some(Self(model))
    }

    /// Checks whether the given `model` is a valid [`Model`].
    fn check(model: impl AsRef<str>) -> bool {
        let model = model.as_ref();
        model.trim() == model && !model.is_empty() && model.len() <= 256
    }
}

impl FromStr for Model {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `device::Model`")
    }
}

/// [IMEI] of a [`Device`].
///
/// [IMEI]: https://en.wikipedia.org/wiki/International_Mobile_Equipment_Identity
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Imei(String);

impl Imei {
    /// Creates a new [`Imei`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `imei` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(imei: impl Into<String>) -> Self {
        Self(imei.into())
    }

    /// Creates a new [`Imei`] if the given `imei` is valid.
    #[must_use]
    pub fn new(imei: impl Into<String>) -> Option<Self> {
        let imei = imei.into();
        Self::check(&imei).then_some(Self(imei))
    }

    /// Checks whether the given `imei` is a valid [`Imei`].
    fn check(imei: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Imei`] format: 15 digits, or 16
        /// digits for an IMEISV.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[0-9]{15,16}$").expect("valid regex")
        });

        REGEX.is_match(imei.as_ref())
    }
}

impl FromStr for Imei {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Imei`")
    }
}

/// Serial number of a [`Device`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Creates a new [`SerialNumber`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `serial` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    /// Creates a new [`SerialNumber`] if the given `serial` is valid.
    #[must_use]
    pub fn new(serial: impl Into<String>) -> Option<Self> {
        let serial = serial.into();
        Self::check(&serial).then_some(Self(serial))
    }

    /// Checks whether the given `serial` is a valid [`SerialNumber`].
    fn check(serial: impl AsRef<str>) -> bool {
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[0-9A-Za-z][0-9A-Za-z\-]{0,63}$")
                .expect("valid regex")
        });

        REGEX.is_match(serial.as_ref())
    }
}

impl FromStr for SerialNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `SerialNumber`")
    }
}

#[cfg(test)]
mod spec {
    use super::{Imei, Name, SerialNumber};

    #[test]
    fn imei_is_15_or_16_digits() {
        assert!(Imei::new("356938035643809").is_some());
        assert!(Imei::new("3569380356438091").is_some());

        assert!(Imei::new("35693803564380").is_none());
        assert!(Imei::new("35693803564380a").is_none());
        assert!(Imei::new(" 356938035643809").is_none());
    }

    #[test]
    fn name_is_trimmed_and_non_empty() {
        assert!(Name::new("iPhone 12").is_some());

        assert!(Name::new("").is_none());
        assert!(Name::new(" iPhone").is_none());
    }

    #[test]
    fn serial_number_is_alphanumeric() {
        assert!(SerialNumber::new("F2LXK0A1HG7F").is_some());
        assert!(SerialNumber::new("R58-N21").is_some());

        assert!(SerialNumber::new("-R58").is_none());
        assert!(SerialNumber::new("R5 8").is_none());
    }
}
