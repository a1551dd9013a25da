//! Plugin declarations exported by plugin libraries.
//!
//! A plugin library exports one `static` [`PluginDeclaration`] per plugin,
//! under the symbol name that archives list as the candidate name. The
//! [`declare_plugin!`](crate::declare_plugin) macro emits such a static.
//!
//! Declarations are only ever read through a boundary, which copies them
//! into an owned [`PluginType`] so nothing borrowed from library memory
//! outlives the lookup.
//!
//! The layout is `#[repr(C)]` and opens with [`DECLARATION_MAGIC`] followed
//! by the ABI version. Both are checked before any other field is read.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::LookupError;
use crate::scope::CodeScope;

/// ABI version written into every declaration built by this crate.
pub const ABI_VERSION: u32 = 1;

/// Marker opening every declaration (`PLUGLOAD` in ASCII).
pub const DECLARATION_MAGIC: u64 = 0x504C_5547_4C4F_4144;

/// Boxed value produced by a plugin constructor.
pub type Constructed = Result<Box<dyn Any + Send>, String>;

/// Zero-argument plugin constructor.
pub type Constructor = fn() -> Constructed;

/// Plugin constructor receiving host-supplied arguments.
pub type ArgumentConstructor = fn(&dyn Any) -> Constructed;

/// A capability interface plugins can implement.
///
/// `NAME` is the string archives use to advertise the capability (the
/// service descriptor file name, or the entry in a declaration's
/// `implements` list). `Instance` is the value type a constructor must
/// return, usually a boxed trait object.
pub trait Capability: 'static {
    /// Name under which plugins advertise this capability.
    const NAME: &'static str;

    /// Type every instance of this capability has.
    type Instance: Any + Send;
}

/// Leading fields shared by every declaration layout.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeclarationHeader {
    magic: u64,
    abi_version: u32,
}

impl DeclarationHeader {
    /// Accepts the header only when it carries the magic and current ABI.
    pub(crate) fn check(self, symbol: &str) -> Result<(), LookupError> {
        if self.magic != DECLARATION_MAGIC {
            return Err(LookupError::not_found(
                symbol,
                "symbol is not a plugin declaration",
            ));
        }
        if self.abi_version != ABI_VERSION {
            return Err(LookupError::AbiMismatch {
                name: symbol.to_owned(),
                found: self.abi_version,
                expected: ABI_VERSION,
            });
        }
        Ok(())
    }
}

/// Static description of one plugin, exported by a plugin library.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PluginDeclaration {
    magic: u64,
    abi_version: u32,
    name: &'static str,
    implements: &'static [&'static str],
    constructor: Option<Constructor>,
    argument_constructor: Option<ArgumentConstructor>,
}

impl PluginDeclaration {
    /// Declares a plugin named `name` implementing the listed capabilities.
    #[must_use]
    pub const fn new(name: &'static str, implements: &'static [&'static str]) -> Self {
        Self {
            magic: DECLARATION_MAGIC,
            abi_version: ABI_VERSION,
            name,
            implements,
            constructor: None,
            argument_constructor: None,
        }
    }

    /// Attaches the zero-argument constructor.
    #[must_use]
    pub const fn with_constructor(self, constructor: Constructor) -> Self {
        Self {
            constructor: Some(constructor),
            ..self
        }
    }

    /// Attaches the argument-taking constructor.
    #[must_use]
    pub const fn with_argument_constructor(self, constructor: ArgumentConstructor) -> Self {
        Self {
            argument_constructor: Some(constructor),
            ..self
        }
    }

    /// Overrides the recorded ABI version.
    #[must_use]
    pub const fn with_abi_version(self, abi_version: u32) -> Self {
        Self {
            abi_version,
            ..self
        }
    }

    /// ABI version the declaration was built against.
    #[must_use]
    pub const fn abi_version(&self) -> u32 {
        self.abi_version
    }

    pub(crate) const fn header(&self) -> DeclarationHeader {
        DeclarationHeader {
            magic: self.magic,
            abi_version: self.abi_version,
        }
    }

    /// Declared plugin name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Capabilities the plugin implements.
    #[must_use]
    pub const fn implements(&self) -> &'static [&'static str] {
        self.implements
    }
}

/// Owned view of a declaration resolved through a boundary.
#[derive(Clone)]
pub struct PluginType {
    name: String,
    implements: Vec<String>,
    constructor: Option<Constructor>,
    argument_constructor: Option<ArgumentConstructor>,
    keepalive: Option<Arc<dyn CodeScope>>,
}

impl PluginType {
    /// Copies `declaration`, found under `symbol`, after checking its ABI.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] when the magic is missing and
    /// [`LookupError::AbiMismatch`] when the declaration was built against a
    /// different [`ABI_VERSION`].
    pub fn from_declaration(
        symbol: &str,
        declaration: &PluginDeclaration,
    ) -> Result<Self, LookupError> {
        declaration.header().check(symbol)?;
        Ok(Self {
            name: symbol.to_owned(),
            implements: declaration
                .implements
                .iter()
                .map(|capability| (*capability).to_owned())
                .collect(),
            constructor: declaration.constructor,
            argument_constructor: declaration.argument_constructor,
            keepalive: None,
        })
    }

    /// Keeps `scope` alive for as long as this type or its instances exist.
    #[must_use]
    pub fn with_keepalive(self, scope: Arc<dyn CodeScope>) -> Self {
        Self {
            keepalive: Some(scope),
            ..self
        }
    }

    /// Name the type was resolved under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capabilities the type implements.
    #[must_use]
    pub fn implements(&self) -> &[String] {
        &self.implements
    }

    /// Returns `true` when the type advertises `capability`.
    #[must_use]
    pub fn implements_capability(&self, capability: &str) -> bool {
        self.implements.iter().any(|name| name == capability)
    }

    /// Zero-argument constructor, if declared.
    #[must_use]
    pub const fn constructor(&self) -> Option<Constructor> {
        self.constructor
    }

    /// Argument-taking constructor, if declared.
    #[must_use]
    pub const fn argument_constructor(&self) -> Option<ArgumentConstructor> {
        self.argument_constructor
    }

    pub(crate) fn keepalive(&self) -> Option<Arc<dyn CodeScope>> {
        self.keepalive.clone()
    }
}

impl fmt::Debug for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginType")
            .field("name", &self.name)
            .field("implements", &self.implements)
            .field("constructor", &self.constructor.is_some())
            .field("argument_constructor", &self.argument_constructor.is_some())
            .finish_non_exhaustive()
    }
}

/// Exports a [`PluginDeclaration`] under an unmangled symbol.
///
/// The symbol name doubles as the candidate name listed in the archive
/// manifest or service descriptor. Outer attributes, such as doc comments,
/// are applied to the generated static.
///
/// ```ignore
/// plugload::declare_plugin!(
///     /// Greets in English.
///     ENGLISH_GREETER,
///     implements = ["greeter"],
///     constructor = build_english,
/// );
/// ```
#[macro_export]
macro_rules! declare_plugin {
    (
        $(#[$meta:meta])*
        $symbol:ident,
        implements = [$($capability:expr),* $(,)?],
        constructor = $constructor:expr,
        arguments = $arguments:expr $(,)?
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub static $symbol: $crate::PluginDeclaration =
            $crate::PluginDeclaration::new(stringify!($symbol), &[$($capability),*])
                .with_constructor($constructor)
                .with_argument_constructor($arguments);
    };
    (
        $(#[$meta:meta])*
        $symbol:ident,
        implements = [$($capability:expr),* $(,)?],
        arguments = $arguments:expr $(,)?
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub static $symbol: $crate::PluginDeclaration =
            $crate::PluginDeclaration::new(stringify!($symbol), &[$($capability),*])
                .with_argument_constructor($arguments);
    };
    (
        $(#[$meta:meta])*
        $symbol:ident,
        implements = [$($capability:expr),* $(,)?],
        constructor = $constructor:expr $(,)?
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub static $symbol: $crate::PluginDeclaration =
            $crate::PluginDeclaration::new(stringify!($symbol), &[$($capability),*])
                .with_constructor($constructor);
    };
    (
        $(#[$meta:meta])*
        $symbol:ident,
        implements = [$($capability:expr),* $(,)?] $(,)?
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub static $symbol: $crate::PluginDeclaration =
            $crate::PluginDeclaration::new(stringify!($symbol), &[$($capability),*]);
    };
}
