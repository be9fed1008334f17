//! Wire method names → parameter types → invocation thunks.
//!
//! Registration is single-threaded setup. Once every method is registered
//! the registry is only read, and can be shared across concurrent requests
//! behind an `Arc` without locking.

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::de::from_value;
use crate::error::{Error, Result};
use crate::schema::{TypeDescriptor, XmlRpcType};
use crate::ser::to_value;
use crate::value::Value;

/// The outcome of calling a method thunk. `None` is a null result.
pub enum Invocation {
    Ready(Result<Option<Value>>),
    Deferred(BoxFuture<'static, Result<Option<Value>>>),
}

impl Invocation {
    /// Wait for the result. A deferred invocation is awaited exactly once.
    pub async fn resolve(self) -> Result<Option<Value>> {
        match self {
            Invocation::Ready(result) => result,
            Invocation::Deferred(future) => future.await,
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Invocation::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

pub type Thunk = Arc<dyn Fn(Vec<Value>) -> Invocation + Send + Sync>;

pub struct MethodDescriptor {
    name: String,
    params: Vec<TypeDescriptor>,
    returns: TypeDescriptor,
    thunk: Thunk,
}

impl MethodDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[TypeDescriptor] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns(&self) -> &TypeDescriptor {
        &self.returns
    }

    pub fn invoke(&self, params: Vec<Value>) -> Invocation {
        (self.thunk)(params)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

#[derive(Default, Debug)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<MethodDescriptor>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        MethodRegistry::default()
    }

    /// Register a method from raw parts.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        params: Vec<TypeDescriptor>,
        returns: TypeDescriptor,
        invoke: F,
    ) -> Result<&mut Self>
    where
        F: Fn(Vec<Value>) -> Invocation + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Registration("method name is empty".into()));
        }
        if self.methods.contains_key(&name) {
            return Err(Error::Registration(format!(
                "method '{}' is already registered",
                name
            )));
        }
        for ty in params.iter().chain(std::iter::once(&returns)) {
            ty.validate()?;
        }

        debug!(method = %name, arity = params.len(), "registered XML-RPC method");
        let descriptor = MethodDescriptor {
            name: name.clone(),
            params,
            returns,
            thunk: Arc::new(invoke),
        };
        self.methods.insert(name, Arc::new(descriptor));
        Ok(self)
    }

    /// Register a synchronous handler taking a tuple of typed parameters.
    ///
    /// ```rust
    /// use xmlrpc_serde::MethodRegistry;
    ///
    /// let mut registry = MethodRegistry::new();
    /// registry.register_fn("sample.add", |(a, b): (i32, i32)| Ok(a + b)).unwrap();
    /// assert_eq!(registry.lookup("sample.add").unwrap().arity(), 2);
    /// ```
    pub fn register_fn<A, R, F>(&mut self, name: impl Into<String>, f: F) -> Result<&mut Self>
    where
        A: Params,
        R: Serialize + XmlRpcType,
        F: Fn(A) -> Result<R> + Send + Sync + 'static,
    {
        self.register(name, A::descriptors(), R::descriptor(), move |values| {
            let result = A::from_values(values)
                .and_then(&f)
                .and_then(|r| to_value(&r));
            Invocation::Ready(result)
        })
    }

    /// Register a handler whose result is produced by a future.
    pub fn register_async<A, R, F, Fut>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> Result<&mut Self>
    where
        A: Params,
        R: Serialize + XmlRpcType,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        self.register(name, A::descriptors(), R::descriptor(), move |values| {
            match A::from_values(values) {
                Ok(args) => {
                    let pending = f(args);
                    Invocation::Deferred(Box::pin(async move { to_value(&pending.await?) }))
                }
                Err(e) => Invocation::Ready(Err(e)),
            }
        })
    }

    /// Bind another wire name to an already registered method.
    pub fn alias(&mut self, existing: &str, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        let descriptor = self.lookup(existing).ok_or_else(|| {
            Error::Registration(format!("cannot alias unknown method '{}'", existing))
        })?;
        if self.methods.contains_key(&name) {
            return Err(Error::Registration(format!(
                "method '{}' is already registered",
                name
            )));
        }
        debug!(method = %name, target = existing, "registered XML-RPC alias");
        self.methods.insert(name, descriptor);
        Ok(self)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

// ── Typed parameter lists ─────────────────────────────────────────────────

/// A tuple of typed method parameters.
pub trait Params: Sized {
    fn descriptors() -> Vec<TypeDescriptor>;

    fn from_values(values: Vec<Value>) -> Result<Self>;
}

impl Params for () {
    fn descriptors() -> Vec<TypeDescriptor> {
        Vec::new()
    }

    fn from_values(values: Vec<Value>) -> Result<Self> {
        check_arity(&values, 0)
    }
}

fn check_arity(values: &[Value], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(Error::InvalidParams(format!(
            "received {} parameters, expected {}",
            values.len(),
            expected
        )));
    }
    Ok(())
}

fn next_param<T, I>(values: &mut I) -> Result<T>
where
    T: DeserializeOwned,
    I: Iterator<Item = (usize, Value)>,
{
    let (index, value) = values
        .next()
        .ok_or_else(|| Error::InvalidParams("too few parameters".into()))?;
    from_value(value).map_err(|e| Error::InvalidParams(format!("parameter {}: {}", index, e)))
}

macro_rules! tuple_params {
    ($len:expr => $($name:ident),+) => {
        impl<$($name),+> Params for ($($name,)+)
        where
            $($name: XmlRpcType + DeserializeOwned),+
        {
            fn descriptors() -> Vec<TypeDescriptor> {
                vec![$($name::descriptor()),+]
            }

            fn from_values(values: Vec<Value>) -> Result<Self> {
                check_arity(&values, $len)?;
                let mut values = values.into_iter().enumerate();
                Ok(($(next_param::<$name, _>(&mut values)?,)+))
            }
        }
    };
}

tuple_params!(1 => A);
tuple_params!(2 => A, B);
tuple_params!(3 => A, B, C);
tuple_params!(4 => A, B, C, D);
tuple_params!(5 => A, B, C, D, E);
tuple_params!(6 => A, B, C, D, E, F);
tuple_params!(7 => A, B, C, D, E, F, G);
tuple_params!(8 => A, B, C, D, E, F, G, H);
