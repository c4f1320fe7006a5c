//! Shared fixtures for unit tests.

use std::sync::{Arc, Mutex};

use torchfn_core::{Instance, Kwargs, NativeError, NativeFn, TypeHash, Value};
use torchfn_registry::{DispatchConfig, PrecedenceRegistry, TypeEntry, TypeRegistry};

pub(crate) const PROTOCOL: &str = "__torch_function__";

/// What a recorded handler does when called.
#[derive(Clone)]
pub(crate) enum Outcome {
    Decline,
    Return(Value),
    Raise(&'static str),
}

/// Records handler invocations by type name, in call order.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub(crate) fn record(&self, name: &str) {
        let mut calls = self.0.lock().expect("call log poisoned");
        calls.push(name.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.0.lock().expect("call log poisoned").clone()
    }
}

pub(crate) fn handler(name: &'static str, log: &CallLog, outcome: Outcome) -> NativeFn {
    let log = log.clone();
    let qualified = format!("{name}.{PROTOCOL}");
    NativeFn::new(qualified, move |_: &[Value], _: &Kwargs| {
        log.record(name);
        match &outcome {
            Outcome::Decline => Ok(Value::NotImplemented),
            Outcome::Return(value) => Ok(value.clone()),
            Outcome::Raise(message) => Err(NativeError::value_error(*message)),
        }
    })
}

/// A registry with `Tensor` plus whatever classes a test adds.
pub(crate) struct World {
    pub(crate) types: TypeRegistry,
    pub(crate) config: DispatchConfig,
    pub(crate) log: CallLog,
    pub(crate) tensor: TypeHash,
}

impl World {
    pub(crate) fn new() -> Self {
        let mut types = TypeRegistry::with_builtins();
        let tensor = types
            .register_type(TypeEntry::class("Tensor"))
            .expect("register Tensor");
        Self {
            types,
            config: DispatchConfig::default(),
            log: CallLog::default(),
            tensor,
        }
    }

    /// Register `name` deriving from `bases` with a handler producing `outcome`.
    pub(crate) fn class(
        &mut self,
        name: &'static str,
        bases: &[TypeHash],
        outcome: Outcome,
    ) -> TypeHash {
        let entry = Self::derive(name, bases);
        let entry = entry.with_method(PROTOCOL, handler(name, &self.log, outcome));
        self.types.register_type(entry).expect("register class")
    }

    /// Register `name` deriving from `bases` without defining a handler.
    pub(crate) fn plain_class(&mut self, name: &'static str, bases: &[TypeHash]) -> TypeHash {
        let entry = Self::derive(name, bases);
        self.types.register_type(entry).expect("register class")
    }

    fn derive(name: &'static str, bases: &[TypeHash]) -> TypeEntry {
        let mut entry = TypeEntry::class(name);
        for base in bases {
            entry = entry.with_base(*base);
        }
        entry
    }

    pub(crate) fn lookup(&self) -> PrecedenceRegistry<'_> {
        PrecedenceRegistry::new(&self.types, &self.config)
    }
}

pub(crate) fn instance(ty: TypeHash) -> Value {
    Instance::new(ty).into_value()
}
