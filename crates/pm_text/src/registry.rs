//! Provide [`ConversionRegistry`], the per-type strategy resolver.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt::{self, Display};
use core::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use core::str::FromStr;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, OnceLock, PoisonError, RwLock};

use pm_expr::Type;
use pm_utils::TypeIdMap;

use crate::{ConversionError, ErasedStrategy, StrategySource, TextConverter, TextError};
use crate::{TextStrategy, UnsupportedType, expand_env};

type Outcome = Result<Arc<ErasedStrategy>, UnsupportedType>;
type Slot = Arc<OnceLock<Outcome>>;

/// Candidate strategies, one table per tier.
#[derive(Default)]
struct Tiers {
    converters: TypeIdMap<Arc<ErasedStrategy>>,
    parsers: TypeIdMap<Arc<ErasedStrategy>>,
    paths: TypeIdMap<Arc<ErasedStrategy>>,
}

impl Tiers {
    fn table(&mut self, source: StrategySource) -> &mut TypeIdMap<Arc<ErasedStrategy>> {
        match source {
            StrategySource::Converter => &mut self.converters,
            StrategySource::Parse => &mut self.parsers,
            StrategySource::Path => &mut self.paths,
        }
    }

    fn find(&self, ty: Type) -> Option<&Arc<ErasedStrategy>> {
        let id = ty.id();
        self.converters
            .get(&id)
            .or_else(|| self.parsers.get(&id))
            .or_else(|| self.paths.get(&id))
    }
}

// -----------------------------------------------------------------------------
// ConversionRegistry

/// Converts values to and from text through a chain of strategy tiers.
///
/// For a type `V`, the first tier holding a candidate wins:
///
/// 1. a [`TextConverter`] supporting both directions;
/// 2. a `FromStr` + `Display` pair, assumed to be inverses;
/// 3. a path-like type. Parsing expands environment references
///    (see [`expand_env`]), rendering yields the absolute path, so the two
///    are not inverses;
/// 4. otherwise the type is [unsupported](UnsupportedType).
///
/// Resolution runs at most once per type and registry. Its outcome, the
/// failure included, is cached for the lifetime of the registry and shared
/// by every thread. Registering a candidate for an already resolved type
/// has no effect.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use pm_text::{ConversionRegistry, StrategySource};
///
/// let registry = ConversionRegistry::new();
///
/// let addr: Ipv4Addr = registry.from_text("10.0.0.1").unwrap();
/// assert_eq!(registry.to_text(&addr).unwrap(), "10.0.0.1");
/// assert_eq!(registry.source_of::<Ipv4Addr>(), Some(StrategySource::Parse));
///
/// struct Opaque;
/// assert!(registry.strategy::<Opaque>().is_err());
/// ```
pub struct ConversionRegistry {
    tiers: RwLock<Tiers>,
    resolved: RwLock<TypeIdMap<Slot>>,
    #[cfg(feature = "auto_register")]
    auto_registered: core::sync::atomic::AtomicBool,
}

impl Default for ConversionRegistry {
    /// See [`ConversionRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRegistry {
    /// Creates a registry without any candidate.
    pub fn empty() -> Self {
        Self {
            tiers: RwLock::new(Tiers::default()),
            resolved: RwLock::new(TypeIdMap::new()),
            #[cfg(feature = "auto_register")]
            auto_registered: core::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Creates a registry with the built-in candidates.
    ///
    /// - parse tier: `bool` `char`, `i8 - i128` `isize`, `u8 - u128` `usize`,
    ///   `f32` `f64`, `String`, IP and socket addresses;
    /// - path tier: `PathBuf`.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register_parse::<bool>();
        registry.register_parse::<char>();
        registry.register_parse::<i8>();
        registry.register_parse::<i16>();
        registry.register_parse::<i32>();
        registry.register_parse::<i64>();
        registry.register_parse::<i128>();
        registry.register_parse::<isize>();
        registry.register_parse::<u8>();
        registry.register_parse::<u16>();
        registry.register_parse::<u32>();
        registry.register_parse::<u64>();
        registry.register_parse::<u128>();
        registry.register_parse::<usize>();
        registry.register_parse::<f32>();
        registry.register_parse::<f64>();
        registry.register_parse::<String>();
        registry.register_parse::<IpAddr>();
        registry.register_parse::<Ipv4Addr>();
        registry.register_parse::<Ipv6Addr>();
        registry.register_parse::<SocketAddr>();
        registry.register_parse::<SocketAddrV4>();
        registry.register_parse::<SocketAddrV6>();
        registry.register_path::<PathBuf>();
        registry
    }

    /// Returns the process-wide registry.
    ///
    /// Built from [`new`](Self::new) plus [`auto_register`](Self::auto_register)
    /// on first use.
    pub fn global() -> &'static ConversionRegistry {
        static GLOBAL: LazyLock<ConversionRegistry> = LazyLock::new(|| {
            let registry = ConversionRegistry::new();
            registry.auto_register();
            registry
        });
        &GLOBAL
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Registers a candidate for its type.
    ///
    /// Returns `false`, and logs a warning, if the type is already resolved.
    /// A candidate replaces a previous one of the same tier.
    pub fn register(&self, strategy: ErasedStrategy) -> bool {
        let ty = strategy.ty();
        let source = strategy.source();
        let mut tiers = self.tiers.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_resolved(ty) {
            log::warn!(
                "`{ty}` is already resolved, the late {source} registration has no effect"
            );
            return false;
        }
        if tiers.table(source).insert(ty.id(), Arc::new(strategy)).is_some() {
            log::debug!("replaced the {source} candidate of `{ty}`");
        }
        true
    }

    /// Registers an external converter for `V`.
    ///
    /// A converter that does not support both directions is ignored and
    /// `false` is returned.
    pub fn register_converter<V, C>(&self, converter: C) -> bool
    where
        V: Any + Clone + Send + Sync,
        C: TextConverter<V>,
    {
        if !(converter.can_parse() && converter.can_render()) {
            log::debug!("ignored a one-way converter for `{}`", Type::of::<V>());
            return false;
        }
        self.register(ErasedStrategy::from_converter::<V, C>(converter))
    }

    /// Registers `V` in the parse tier, through its `FromStr` and `Display`
    /// implementations.
    pub fn register_parse<V>(&self) -> bool
    where
        V: FromStr + Display + Any + Clone + Send + Sync,
        V::Err: Display,
    {
        self.register(ErasedStrategy::new::<V, _, _>(
            StrategySource::Parse,
            |text| {
                text.parse::<V>()
                    .map_err(|err| ConversionError::parse::<V>(text, err))
            },
            |value| Ok(format!("{value}")),
        ))
    }

    /// Registers `V` in the path tier.
    pub fn register_path<V>(&self) -> bool
    where
        V: From<PathBuf> + AsRef<Path> + Any + Clone + Send + Sync,
    {
        self.register(ErasedStrategy::new::<V, _, _>(
            StrategySource::Path,
            |text| Ok(V::from(PathBuf::from(expand_env(text)))),
            |value| render_path::<V>(value.as_ref()),
        ))
    }

    /// Runs every registration declared with [`impl_parse_text!`],
    /// [`impl_path_text!`] and [`impl_text_converter!`].
    ///
    /// Repeated calls are cheap and register nothing new.
    ///
    /// Returns `false` when the `auto_register` feature is disabled.
    ///
    /// [`impl_parse_text!`]: crate::impl_parse_text
    /// [`impl_path_text!`]: crate::impl_path_text
    /// [`impl_text_converter!`]: crate::impl_text_converter
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            use core::sync::atomic::Ordering;

            if !self.auto_registered.swap(true, Ordering::AcqRel) {
                let count = crate::__macro_exports::auto_register::__register_all(self);
                log::debug!("auto registered {count} text strategies");
            }
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    // -------------------------------------------------------------------------
    // Resolution

    /// Returns `true` if the outcome for `ty` is already fixed.
    pub fn is_resolved(&self, ty: Type) -> bool {
        self.resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ty.id())
            .is_some_and(|slot| slot.get().is_some())
    }

    fn slot(&self, ty: Type) -> Slot {
        let id = ty.id();
        if let Some(slot) = self
            .resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return slot.clone();
        }
        self.resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(id, Slot::default)
            .clone()
    }

    fn resolve(&self, ty: Type) -> Outcome {
        let tiers = self.tiers.read().unwrap_or_else(PoisonError::into_inner);
        match tiers.find(ty) {
            Some(strategy) => {
                log::debug!("resolved `{ty}` to its {} strategy", strategy.source());
                Ok(strategy.clone())
            }
            None => {
                log::debug!("no text strategy for `{ty}`");
                Err(UnsupportedType::new(ty))
            }
        }
    }

    /// Returns the strategy for `ty`, resolving it on first use.
    pub fn strategy_of(&self, ty: Type) -> Result<Arc<ErasedStrategy>, UnsupportedType> {
        let slot = self.slot(ty);
        slot.get_or_init(|| self.resolve(ty)).clone()
    }

    /// Returns the typed strategy for `V`, resolving it on first use.
    pub fn strategy<V: Any>(&self) -> Result<TextStrategy<V>, UnsupportedType> {
        let ty = Type::of::<V>();
        self.strategy_of(ty)?
            .typed::<V>()
            .ok_or(UnsupportedType::new(ty))
    }

    /// Returns the tier `V` resolves to, or `None` if it is unsupported.
    #[inline]
    pub fn source_of<V: Any>(&self) -> Option<StrategySource> {
        self.strategy_of(Type::of::<V>())
            .ok()
            .map(|strategy| strategy.source())
    }

    // -------------------------------------------------------------------------
    // Conversion

    /// Renders `value` as text.
    pub fn to_text<V: Any>(&self, value: &V) -> Result<String, TextError> {
        Ok(self.strategy::<V>()?.render(value)?)
    }

    /// Parses `text` into a `V`.
    pub fn from_text<V: Any>(&self, text: &str) -> Result<V, TextError> {
        Ok(self.strategy::<V>()?.parse(text)?)
    }

    /// Parses `text` and renders the result again, reporting whether the
    /// original text came back.
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use pm_text::{ConversionRegistry, RoundTrip};
    ///
    /// let registry = ConversionRegistry::new();
    ///
    /// assert_eq!(registry.round_trip::<u16>("8080").unwrap(), RoundTrip::Exact);
    /// assert_eq!(
    ///     registry.round_trip::<u16>("08080").unwrap(),
    ///     RoundTrip::Differs { rendered: "8080".into() },
    /// );
    /// assert!(!registry.round_trip::<PathBuf>("logs").unwrap().is_exact());
    /// ```
    pub fn round_trip<V: Any>(&self, text: &str) -> Result<RoundTrip, TextError> {
        let strategy = self.strategy::<V>()?;
        let rendered = strategy.render(&strategy.parse(text)?)?;
        Ok(if rendered == text {
            RoundTrip::Exact
        } else {
            RoundTrip::Differs { rendered }
        })
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tiers = self.tiers.read().unwrap_or_else(PoisonError::into_inner);
        let resolved = self.resolved.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ConversionRegistry")
            .field("converters", &tiers.converters.len())
            .field("parsers", &tiers.parsers.len())
            .field("paths", &tiers.paths.len())
            .field("resolved", &resolved.len())
            .finish()
    }
}

fn render_path<V: 'static>(path: &Path) -> Result<String, ConversionError> {
    let absolute = std::path::absolute(path).map_err(ConversionError::render::<V>)?;
    match absolute.into_os_string().into_string() {
        Ok(text) => Ok(text),
        Err(raw) => Err(ConversionError::render::<V>(format!(
            "{} is not valid UTF-8",
            Path::new(&raw).display()
        ))),
    }
}

// -----------------------------------------------------------------------------
// RoundTrip

/// The outcome of [`ConversionRegistry::round_trip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundTrip {
    /// Rendering the parsed value gave the input back.
    Exact,
    /// Rendering the parsed value gave another text.
    Differs { rendered: String },
}

impl RoundTrip {
    /// Returns `true` for [`RoundTrip::Exact`].
    #[inline]
    pub fn is_exact(&self) -> bool {
        matches!(self, RoundTrip::Exact)
    }
}

// -----------------------------------------------------------------------------
// Tests
