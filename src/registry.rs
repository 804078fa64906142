//! Memoized resource clients sharing one token.

use crate::client::{ClientContext, SubClient};
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Object-safe view of a [SubClient] stored in the [Registry].
trait Entry {
    fn context_mut(&mut self) -> &mut ClientContext;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: SubClient> Entry for C {
    fn context_mut(&mut self) -> &mut ClientContext {
        SubClient::context_mut(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One instance per [SubClient] type, created on first access and kept for
/// the life of the registry.
#[derive(Default)]
pub struct Registry {
    clients: HashMap<TypeId, Box<dyn Entry>>,
}

impl Registry {
    /// Get the instance of `C`, creating it from `context` if this is the
    /// first access. `context` is not called otherwise.
    pub fn get<C: SubClient>(&mut self, context: impl FnOnce() -> ClientContext) -> &mut C {
        let entry = self
            .clients
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(C::new(context())));
        match entry.as_any_mut().downcast_mut::<C>() {
            Some(client) => client,
            None => unreachable!("registry entries are keyed by their own TypeId"),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Give every existing instance the new token.
    pub fn set_token(&mut self, token: Option<&str>) {
        for client in self.clients.values_mut() {
            client.context_mut().set_token(token.map(String::from));
        }
    }

    pub fn set_throw_on_error(&mut self, throw_on_error: bool) {
        for client in self.clients.values_mut() {
            client.context_mut().set_throw_on_error(throw_on_error);
        }
    }
}
