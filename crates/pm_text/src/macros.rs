/// Declares types for the parse tier of every auto registered registry.
///
/// The types must implement `FromStr` and `Display`. The declaration takes
/// effect through [`ConversionRegistry::auto_register`], which
/// [`ConversionRegistry::global`] calls on first use.
///
/// Expands to nothing when the `auto_register` feature is disabled.
///
/// [`ConversionRegistry::auto_register`]: crate::ConversionRegistry::auto_register
/// [`ConversionRegistry::global`]: crate::ConversionRegistry::global
///
/// ```
/// use std::fmt;
/// use std::str::FromStr;
/// use pm_text::{ConversionRegistry, impl_parse_text};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Ttl(u8);
///
/// impl FromStr for Ttl {
///     type Err = std::num::ParseIntError;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         s.parse().map(Ttl)
///     }
/// }
///
/// impl fmt::Display for Ttl {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         self.0.fmt(f)
///     }
/// }
///
/// impl_parse_text!(Ttl);
///
/// let registry = ConversionRegistry::empty();
/// if registry.auto_register() {
///     assert_eq!(registry.from_text::<Ttl>("64").unwrap(), Ttl(64));
/// }
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! impl_parse_text {
    ($($ty:ty),+ $(,)?) => {
        $(
            const _: () = {
                $crate::__macro_exports::auto_register::inventory::submit! {
                    $crate::__macro_exports::auto_register::__TextRegistration(|registry| {
                        registry.register_parse::<$ty>();
                    })
                }
            };
        )+
    };
}

/// Declares types for the parse tier of every auto registered registry.
///
/// Expands to nothing when the `auto_register` feature is disabled.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! impl_parse_text {
    ($($ty:ty),+ $(,)?) => {};
}

/// Declares path-like types for the path tier of every auto registered
/// registry.
///
/// The types must implement `From<PathBuf>` and `AsRef<Path>`.
///
/// Expands to nothing when the `auto_register` feature is disabled.
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! impl_path_text {
    ($($ty:ty),+ $(,)?) => {
        $(
            const _: () = {
                $crate::__macro_exports::auto_register::inventory::submit! {
                    $crate::__macro_exports::auto_register::__TextRegistration(|registry| {
                        registry.register_path::<$ty>();
                    })
                }
            };
        )+
    };
}

/// Declares path-like types for the path tier of every auto registered
/// registry.
///
/// Expands to nothing when the `auto_register` feature is disabled.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! impl_path_text {
    ($($ty:ty),+ $(,)?) => {};
}

/// Declares a [`TextConverter`](crate::TextConverter) for every auto
/// registered registry.
///
/// `$converter` is evaluated once per registry.
///
/// ```
/// use pm_text::{ConversionError, TextConverter, impl_text_converter};
///
/// #[derive(Clone)]
/// struct Flag(bool);
///
/// struct OnOff;
///
/// impl TextConverter<Flag> for OnOff {
///     fn parse(&self, text: &str) -> Result<Flag, ConversionError> {
///         match text {
///             "on" => Ok(Flag(true)),
///             "off" => Ok(Flag(false)),
///             _ => Err(ConversionError::parse::<Flag>(text, "expected `on` or `off`")),
///         }
///     }
///
///     fn render(&self, value: &Flag) -> Result<String, ConversionError> {
///         Ok(if value.0 { "on" } else { "off" }.to_string())
///     }
/// }
///
/// impl_text_converter!(Flag => OnOff);
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! impl_text_converter {
    ($ty:ty => $converter:expr) => {
        const _: () = {
            $crate::__macro_exports::auto_register::inventory::submit! {
                $crate::__macro_exports::auto_register::__TextRegistration(|registry| {
                    registry.register_converter::<$ty, _>($converter);
                })
            }
        };
    };
}

/// Declares a [`TextConverter`](crate::TextConverter) for every auto
/// registered registry.
///
/// Expands to nothing when the `auto_register` feature is disabled.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! impl_text_converter {
    ($ty:ty => $converter:expr) => {};
}
