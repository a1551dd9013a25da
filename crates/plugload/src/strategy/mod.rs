//! Instantiation strategies.
//!
//! A strategy turns a resolved [`PluginType`] into a value. The loader then
//! downcasts that value to the capability's instance type.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::declaration::{Constructed, PluginType};
use crate::error::InstantiationError;

/// Builds a value from a resolved plugin type.
#[cfg_attr(test, mockall::automock)]
pub trait InstantiationStrategy {
    /// Instantiates `plugin`.
    ///
    /// # Errors
    ///
    /// Returns an [`InstantiationError`] describing why no value was built.
    fn instantiate(&self, plugin: &PluginType) -> Result<Box<dyn Any + Send>, InstantiationError>;
}

impl<F> InstantiationStrategy for F
where
    F: Fn(&PluginType) -> Result<Box<dyn Any + Send>, InstantiationError>,
{
    fn instantiate(&self, plugin: &PluginType) -> Result<Box<dyn Any + Send>, InstantiationError> {
        self(plugin)
    }
}

/// Calls the declaration's zero-argument constructor.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstructor;

impl InstantiationStrategy for DefaultConstructor {
    fn instantiate(&self, plugin: &PluginType) -> Result<Box<dyn Any + Send>, InstantiationError> {
        let constructor =
            plugin
                .constructor()
                .ok_or_else(|| InstantiationError::MissingConstructor {
                    name: plugin.name().to_owned(),
                })?;
        guarded(plugin.name(), constructor)
    }
}

/// Calls the declaration's argument-taking constructor with fixed arguments.
#[derive(Debug, Clone, Default)]
pub struct WithArguments<A> {
    arguments: A,
}

impl<A: Any + Send + Sync> WithArguments<A> {
    /// Creates a strategy passing `arguments` to every constructor.
    #[must_use]
    pub const fn new(arguments: A) -> Self {
        Self { arguments }
    }

    /// Arguments handed to constructors.
    #[must_use]
    pub const fn arguments(&self) -> &A {
        &self.arguments
    }
}

impl<A: Any + Send + Sync> InstantiationStrategy for WithArguments<A> {
    fn instantiate(&self, plugin: &PluginType) -> Result<Box<dyn Any + Send>, InstantiationError> {
        let constructor = plugin.argument_constructor().ok_or_else(|| {
            InstantiationError::MissingArgumentConstructor {
                name: plugin.name().to_owned(),
            }
        })?;
        guarded(plugin.name(), || constructor(&self.arguments))
    }
}

/// Runs `constructor`, mapping its error and any panic to an
/// [`InstantiationError`].
fn guarded<F>(name: &str, constructor: F) -> Result<Box<dyn Any + Send>, InstantiationError>
where
    F: FnOnce() -> Constructed,
{
    match panic::catch_unwind(AssertUnwindSafe(constructor)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(InstantiationError::ConstructorFailed {
            name: name.to_owned(),
            message,
        }),
        Err(payload) => Err(InstantiationError::ConstructorPanicked {
            name: name.to_owned(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
