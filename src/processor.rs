use std::collections::HashMap;
use std::fmt;

use log::trace;

use crate::ast::{Entry, TokenId};
use crate::error::EvalError;
use crate::store::{ParseTree, TokenStore};
use crate::value::Value;

/// How a capability wants its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Arguments are evaluated, in order, before the call
    #[default]
    Eager,
    /// No arguments are evaluated up front; the capability evaluates them
    /// through the [`Context`]
    Lazy,
}

/// Implementation of one named function
pub trait Capability {
    /// Called once by [`FunctionRegistry::register`], before the capability
    /// is stored.
    fn init(&self, _registry: &FunctionRegistry) {}

    fn strategy(&self) -> Strategy {
        Strategy::Eager
    }

    /// `args` is empty for [`Strategy::Lazy`] capabilities.
    fn execute(&self, args: Vec<Value>, cx: &Context<'_>) -> Result<Value, EvalError>;
}

struct FnCapability<F>(F);

impl<F> Capability for FnCapability<F>
where
    F: Fn(Vec<Value>, &Context<'_>) -> Result<Value, EvalError>,
{
    fn execute(&self, args: Vec<Value>, cx: &Context<'_>) -> Result<Value, EvalError> {
        (self.0)(args, cx)
    }
}

/// Registry of capabilities by function name
#[derive(Default)]
pub struct FunctionRegistry(HashMap<String, Box<dyn Capability>>);

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::functions::register_builtins(&mut registry);
        registry
    }

    /// Register a capability, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, capability: impl Capability + 'static) {
        let name = name.into();
        trace!("register {name}");
        capability.init(self);
        self.0.insert(name, Box::new(capability));
    }

    /// Register an eager capability from a closure
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>, &Context<'_>) -> Result<Value, EvalError> + 'static,
    {
        self.register(name, FnCapability(f));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Capability> {
        self.0.get(name).map(|c| c.as_ref())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.0.keys().collect();
        names.sort();
        f.debug_tuple("FunctionRegistry").field(&names).finish()
    }
}

/// Source of values for variables
pub trait Variables {
    fn resolve(&self, name: &str) -> Option<Value>;
}

impl<F> Variables for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn resolve(&self, name: &str) -> Option<Value> {
        self(name)
    }
}

/// Named values, with bare numbers resolving to themselves unless disabled
#[derive(Debug, Clone)]
pub struct Bindings {
    values: HashMap<String, Value>,
    numbers: bool,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            numbers: true,
        }
    }
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_numbers(mut self) -> Self {
        self.numbers = false;
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl Variables for Bindings {
    fn resolve(&self, name: &str) -> Option<Value> {
        match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None if self.numbers => Value::parse_number(name),
            None => None,
        }
    }
}

/// Walks a parse tree post-order, dispatching calls to capabilities
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    variables: &'a dyn Variables,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a FunctionRegistry, variables: &'a dyn Variables) -> Self {
        Self {
            registry,
            variables,
        }
    }

    /// Evaluate a tree that holds exactly one top-level expression.
    pub fn evaluate(&self, tree: &ParseTree) -> Result<Value, EvalError> {
        match tree.roots() {
            [root] => self.evaluate_token(tree.store(), *root),
            roots => Err(EvalError::ExpectedSingleValue { found: roots.len() }),
        }
    }

    /// Evaluate every top-level expression, in order.
    pub fn evaluate_tree(&self, tree: &ParseTree) -> Result<Vec<Value>, EvalError> {
        tree.roots()
            .iter()
            .map(|root| self.evaluate_token(tree.store(), *root))
            .collect()
    }

    pub fn evaluate_token(&self, store: &TokenStore, id: TokenId) -> Result<Value, EvalError> {
        match store.get(id).ok_or(EvalError::UnresolvedToken(id))? {
            Entry::Literal(text) => Ok(Value::Text(text.clone())),
            Entry::Variable(name) => self
                .variables
                .resolve(name)
                .ok_or_else(|| EvalError::UnresolvedVariable(name.clone())),
            Entry::Call(call) => {
                let capability = self
                    .registry
                    .get(&call.name)
                    .ok_or_else(|| EvalError::UnknownFunction(call.name.clone()))?;

                let args = match capability.strategy() {
                    Strategy::Eager => call
                        .args
                        .iter()
                        .map(|arg| self.evaluate_token(store, *arg))
                        .collect::<Result<Vec<_>, _>>()?,
                    Strategy::Lazy => Vec::new(),
                };

                trace!("dispatch {} with {} value(s)", call.name, args.len());
                let cx = Context {
                    evaluator: self,
                    store,
                    name: &call.name,
                    arguments: &call.args,
                };
                capability.execute(args, &cx)
            }
        }
    }
}

/// What a capability sees of the call being evaluated
pub struct Context<'e> {
    evaluator: &'e Evaluator<'e>,
    store: &'e TokenStore,
    name: &'e str,
    arguments: &'e [TokenId],
}

impl Context<'_> {
    /// Name the capability was invoked under
    pub fn name(&self) -> &str {
        self.name
    }

    /// Unevaluated argument tokens of the call
    pub fn arguments(&self) -> &[TokenId] {
        self.arguments
    }

    pub fn entry(&self, id: TokenId) -> Option<&Entry> {
        self.store.get(id)
    }

    pub fn evaluate(&self, id: TokenId) -> Result<Value, EvalError> {
        self.evaluator.evaluate_token(self.store, id)
    }

    /// Evaluate the `index`th argument of the call.
    pub fn argument(&self, index: usize) -> Option<Result<Value, EvalError>> {
        self.arguments.get(index).map(|id| self.evaluate(*id))
    }
}
