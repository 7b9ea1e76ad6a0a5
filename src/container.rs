//! Dependency container: named service bindings plus a typed constructor
//! registry.
//!
//! Named bindings cover the `register`/`set`/`get` surface: a binding is
//! either a factory closure or a ready-made instance, and a shared binding
//! caches the first-built instance for the container's lifetime. The typed
//! registry replaces constructor reflection: each resolvable type registers
//! one constructor closure up front (`provide`), or is mapped onto a named
//! binding (`provide_via`). Constructors receive the container itself, so
//! recursive construction, container self-injection, and default values are
//! all expressed directly in the closure.
//!
//! The container is request-scoped: it is built once at bootstrap and the
//! only mutation after that is the shared-instance cache, which sits behind
//! an `RwLock` so `get` works through a shared reference.

use crate::error::ContainerError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

type AnyService = Arc<dyn Any + Send + Sync>;
type ServiceFactory = Arc<dyn Fn(&Container) -> AnyService + Send + Sync>;
type AnyConstructor =
    Arc<dyn Fn(&Container) -> Result<AnyService, ContainerError> + Send + Sync>;

enum Definition {
    Factory(ServiceFactory),
    Instance(AnyService),
}

struct Binding {
    definition: Definition,
    shared: bool,
}

/// Lazily-instantiating service container.
#[derive(Default)]
pub struct Container {
    services: HashMap<String, Binding>,
    instances: RwLock<HashMap<String, AnyService>>,
    constructors: HashMap<TypeId, AnyConstructor>,
    provider_names: HashMap<TypeId, String>,
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a provider: a lazily-constructed, non-shared factory binding.
    pub fn register<T, F>(&mut self, name: &str, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.set_factory(name, false, factory);
    }

    /// Bind `name` to a factory. `shared` caches the first-built instance
    /// for all subsequent `get` calls.
    pub fn set_factory<T, F>(&mut self, name: &str, shared: bool, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        let definition: ServiceFactory =
            Arc::new(move |container| Arc::new(factory(container)) as AnyService);
        self.insert_binding(name, Definition::Factory(definition), shared);
    }

    /// Bind `name` to an already-built instance. Every `get` returns the
    /// same instance.
    pub fn set_instance<T: Send + Sync + 'static>(&mut self, name: &str, value: T) {
        self.insert_binding(name, Definition::Instance(Arc::new(value)), true);
    }

    fn insert_binding(&mut self, name: &str, definition: Definition, shared: bool) {
        debug!(service = name, shared, "service bound");
        self.services
            .insert(name.to_string(), Binding { definition, shared });
        // Rebinding invalidates any instance cached under the old binding.
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Produce the service bound under `name`, downcast to `T`.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        self.get_any(name)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Untyped `get`, for callers that hold the type knowledge elsewhere.
    pub fn get_any(&self, name: &str) -> Result<Arc<dyn Any + Send + Sync>, ContainerError> {
        let cached = self
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(Arc::clone);
        if let Some(instance) = cached {
            return Ok(instance);
        }

        let binding = self
            .services
            .get(name)
            .ok_or_else(|| ContainerError::ServiceNotFound(name.to_string()))?;

        let instance = match &binding.definition {
            Definition::Factory(factory) => factory(self),
            Definition::Instance(instance) => Arc::clone(instance),
        };

        if binding.shared {
            self.instances
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(name.to_string(), Arc::clone(&instance));
        }

        Ok(instance)
    }

    /// Register the constructor used by `resolve::<T>()`. One constructor
    /// per type; a later registration replaces the earlier one.
    pub fn provide<T, F>(&mut self, constructor: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        let constructor: AnyConstructor =
            Arc::new(move |container| Ok(Arc::new(constructor(container)?) as AnyService));
        self.constructors.insert(TypeId::of::<T>(), constructor);
    }

    /// Map `T` onto the named binding `name`: `resolve::<T>()` then goes
    /// through `get`, honoring the binding's shared flag.
    pub fn provide_via<T: Send + Sync + 'static>(&mut self, name: &str) {
        self.provider_names
            .insert(TypeId::of::<T>(), name.to_string());
    }

    /// Build an instance of `T`.
    ///
    /// A provider mapping wins over a registered constructor; a constructor
    /// builds a fresh instance on every call. With neither, resolution
    /// fails with [`ContainerError::Unresolvable`].
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        let type_id = TypeId::of::<T>();

        if let Some(name) = self.provider_names.get(&type_id) {
            return self.get::<T>(name);
        }

        if let Some(constructor) = self.constructors.get(&type_id) {
            return constructor(self)?
                .downcast::<T>()
                .map_err(|_| ContainerError::TypeMismatch {
                    name: std::any::type_name::<T>().to_string(),
                    expected: std::any::type_name::<T>(),
                });
        }

        Err(ContainerError::Unresolvable(std::any::type_name::<T>()))
    }
}
