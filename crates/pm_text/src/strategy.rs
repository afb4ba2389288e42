//! Provide conversion strategies.
//!
//! A strategy is an immutable pair of parse and render functions for one
//! type. The registry stores [`ErasedStrategy`]s; typed callers get a
//! [`TextStrategy`] handle back.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use pm_expr::{AnyValue, Type};

use crate::ConversionError;

// -----------------------------------------------------------------------------
// StrategySource

/// The resolution tier a strategy comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategySource {
    /// A registered [`TextConverter`].
    Converter,
    /// A `FromStr` + `Display` pair.
    Parse,
    /// A path-like type, with environment expansion on parse.
    Path,
}

impl fmt::Display for StrategySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrategySource::Converter => "converter",
            StrategySource::Parse => "parse",
            StrategySource::Path => "path",
        })
    }
}

// -----------------------------------------------------------------------------
// TextConverter

/// An external converter between `V` and text.
///
/// Converters take precedence over the built-in tiers, but only when they
/// support both directions.
///
/// ```
/// use pm_text::{ConversionError, ConversionRegistry, TextConverter};
///
/// struct Millis;
///
/// impl TextConverter<u64> for Millis {
///     fn parse(&self, text: &str) -> Result<u64, ConversionError> {
///         let digits = text.strip_suffix("ms").unwrap_or(text);
///         digits.parse().map_err(|e| ConversionError::parse::<u64>(text, e))
///     }
///
///     fn render(&self, value: &u64) -> Result<String, ConversionError> {
///         Ok(format!("{value}ms"))
///     }
/// }
///
/// let registry = ConversionRegistry::new();
/// assert!(registry.register_converter::<u64, _>(Millis));
/// assert_eq!(registry.from_text::<u64>("250ms").unwrap(), 250);
/// assert_eq!(registry.to_text(&250_u64).unwrap(), "250ms");
/// ```
pub trait TextConverter<V>: Send + Sync + 'static {
    /// Returns `true` if [`parse`](Self::parse) is supported.
    fn can_parse(&self) -> bool {
        true
    }

    /// Returns `true` if [`render`](Self::render) is supported.
    fn can_render(&self) -> bool {
        true
    }

    /// Converts text to a value.
    fn parse(&self, text: &str) -> Result<V, ConversionError>;

    /// Converts a value to text.
    fn render(&self, value: &V) -> Result<String, ConversionError>;
}

// -----------------------------------------------------------------------------
// TextStrategy

type ParseFn<V> = dyn Fn(&str) -> Result<V, ConversionError> + Send + Sync;
type RenderFn<V> = dyn Fn(&V) -> Result<String, ConversionError> + Send + Sync;

struct Codec<V> {
    parse: Box<ParseFn<V>>,
    render: Box<RenderFn<V>>,
}

/// A typed handle on a resolved strategy.
pub struct TextStrategy<V> {
    source: StrategySource,
    codec: Arc<Codec<V>>,
}

impl<V> TextStrategy<V> {
    /// Returns the tier the strategy was resolved from.
    #[inline]
    pub fn source(&self) -> StrategySource {
        self.source
    }

    /// Converts text to a value.
    #[inline]
    pub fn parse(&self, text: &str) -> Result<V, ConversionError> {
        (self.codec.parse)(text)
    }

    /// Converts a value to text.
    #[inline]
    pub fn render(&self, value: &V) -> Result<String, ConversionError> {
        (self.codec.render)(value)
    }
}

impl<V> Clone for TextStrategy<V> {
    fn clone(&self) -> Self {
        Self {
            source: self.source,
            codec: self.codec.clone(),
        }
    }
}

impl<V: 'static> fmt::Debug for TextStrategy<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStrategy")
            .field("ty", &Type::of::<V>())
            .field("source", &self.source)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ErasedStrategy

/// A strategy with its value type erased.
pub struct ErasedStrategy {
    ty: Type,
    source: StrategySource,
    codec: Arc<dyn Any + Send + Sync>,
    parse_any: Box<ParseFn<AnyValue>>,
    render_any: Box<dyn Fn(&dyn Any) -> Result<String, ConversionError> + Send + Sync>,
}

impl ErasedStrategy {
    /// Creates a strategy for `V` from a parse and a render function.
    pub fn new<V, P, R>(source: StrategySource, parse: P, render: R) -> Self
    where
        V: Any + Clone + Send + Sync,
        P: Fn(&str) -> Result<V, ConversionError> + Send + Sync + 'static,
        R: Fn(&V) -> Result<String, ConversionError> + Send + Sync + 'static,
    {
        let codec = Arc::new(Codec::<V> {
            parse: Box::new(parse),
            render: Box::new(render),
        });
        let parser = codec.clone();
        let renderer = codec.clone();
        Self {
            ty: Type::of::<V>(),
            source,
            codec,
            parse_any: Box::new(move |text: &str| (parser.parse)(text).map(AnyValue::new)),
            render_any: Box::new(move |value: &dyn Any| match value.downcast_ref::<V>() {
                Some(value) => (renderer.render)(value),
                None => Err(ConversionError::ValueType {
                    expected: Type::of::<V>(),
                }),
            }),
        }
    }

    /// Wraps a [`TextConverter`].
    pub fn from_converter<V, C>(converter: C) -> Self
    where
        V: Any + Clone + Send + Sync,
        C: TextConverter<V>,
    {
        let converter = Arc::new(converter);
        let renderer = converter.clone();
        Self::new::<V, _, _>(
            StrategySource::Converter,
            move |text| converter.parse(text),
            move |value| renderer.render(value),
        )
    }

    /// Returns the value type.
    #[inline]
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// Returns the tier the strategy comes from.
    #[inline]
    pub fn source(&self) -> StrategySource {
        self.source
    }

    /// Converts text to a boxed value.
    #[inline]
    pub fn parse_any(&self, text: &str) -> Result<AnyValue, ConversionError> {
        (self.parse_any)(text)
    }

    /// Converts a value to text, failing if it is not of the strategy type.
    #[inline]
    pub fn render_any(&self, value: &dyn Any) -> Result<String, ConversionError> {
        (self.render_any)(value)
    }

    /// Returns a typed handle, or `None` if `V` is not the strategy type.
    pub fn typed<V: Any>(&self) -> Option<TextStrategy<V>> {
        let codec = self.codec.clone().downcast::<Codec<V>>().ok()?;
        Some(TextStrategy {
            source: self.source,
            codec,
        })
    }
}

impl fmt::Debug for ErasedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedStrategy")
            .field("ty", &self.ty)
            .field("source", &self.source)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use super::{ErasedStrategy, StrategySource};
    use crate::ConversionError;

    fn upper() -> ErasedStrategy {
        ErasedStrategy::new::<String, _, _>(
            StrategySource::Converter,
            |text| Ok(text.to_uppercase()),
            |value| Ok(value.to_lowercase()),
        )
    }

    #[test]
    fn erased_and_typed_views_agree() {
        let strategy = upper();
        let boxed = strategy.parse_any("eth0").unwrap();
        assert_eq!(boxed.downcast_ref::<String>().map(String::as_str), Some("ETH0"));
        assert_eq!(strategy.render_any(&"LO".to_string()).unwrap(), "lo");

        let typed = strategy.typed::<String>().unwrap();
        assert_eq!(typed.parse("wlan").unwrap(), "WLAN");
        assert_eq!(typed.source(), StrategySource::Converter);
        assert!(strategy.typed::<u8>().is_none());
    }

    #[test]
    fn render_any_checks_the_value_type() {
        assert!(matches!(
            upper().render_any(&7_u8),
            Err(ConversionError::ValueType { .. })
        ));
    }
}
