// Conversion state threaded through expression generation.
use crate::analysis::CaptureAnalysis;
use crate::generator::is_java_keyword;
use myna_ast::DeclId;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Registries shared by every context derived from one unit's root context.
/// Single-threaded by design; plain `RefCell` interior mutability.
#[derive(Debug, Default)]
pub struct SharedState {
    pub setters: RefCell<SetterRegistry>,
    pub captures: CaptureAnalysis,
    pub converted: HashSet<DeclId>,
}

impl SharedState {
    pub fn new(captures: CaptureAnalysis, converted: HashSet<DeclId>) -> Self {
        Self {
            setters: RefCell::new(SetterRegistry::default()),
            captures,
            converted,
        }
    }
}

/// One synthesized static setter helper, emitted into the enclosing
/// converted class.
#[derive(Debug, Clone, PartialEq)]
pub struct SetterHelper {
    pub setter: DeclId,
    pub name: String,
}

/// Unit-wide table of synthesized setter-helper names. A given setter maps
/// to the same name on every call; distinct setters never collide.
#[derive(Debug, Default)]
pub struct SetterRegistry {
    names: HashMap<DeclId, String>,
    used: HashSet<String>,
    pub entries: Vec<SetterHelper>,
}

impl SetterRegistry {
    fn name_for(&mut self, setter: DeclId, hint: &str) -> String {
        if let Some(existing) = self.names.get(&setter) {
            return existing.clone();
        }
        let mut candidate = format!("$set{}", capitalize(hint));
        let mut counter = 1;
        while self.used.contains(&candidate) {
            candidate = format!("$set{}{}", capitalize(hint), counter);
            counter += 1;
        }
        self.used.insert(candidate.clone());
        self.names.insert(setter, candidate.clone());
        self.entries.push(SetterHelper {
            setter,
            name: candidate.clone(),
        });
        candidate
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Mutable, copy-on-branch conversion state. `extend()` opens a new
/// statement scope (closure or synthesized method body) over the same shared
/// registries; `copy()` keeps the current statement scope but clones the
/// used-name set so sibling branches never observe each other's fresh-name
/// allocations.
#[derive(Debug)]
pub struct ExpressionContext {
    pending: Rc<RefCell<Vec<String>>>,
    used_names: HashSet<String>,
    containing_class: Option<DeclId>,
    synthetic_scope: bool,
    static_context: bool,
    shared: Rc<SharedState>,
}

impl ExpressionContext {
    pub fn new(shared: Rc<SharedState>) -> Self {
        Self {
            pending: Rc::new(RefCell::new(Vec::new())),
            used_names: HashSet::new(),
            containing_class: None,
            synthetic_scope: false,
            static_context: false,
            shared,
        }
    }

    pub fn with_class(mut self, class: Option<DeclId>) -> Self {
        self.containing_class = class;
        self
    }

    pub fn with_static(mut self, static_context: bool) -> Self {
        self.static_context = static_context;
        self
    }

    /// Branch context: same pending-helper list, independent name set.
    pub fn copy(&self) -> Self {
        Self {
            pending: Rc::clone(&self.pending),
            used_names: self.used_names.clone(),
            containing_class: self.containing_class,
            synthetic_scope: self.synthetic_scope,
            static_context: self.static_context,
            shared: Rc::clone(&self.shared),
        }
    }

    /// New lexical scope: fresh helper list, name set seeded from the
    /// enclosing scope, shared registries carried over.
    pub fn extend(&self) -> Self {
        Self {
            pending: Rc::new(RefCell::new(Vec::new())),
            used_names: self.used_names.clone(),
            containing_class: self.containing_class,
            synthetic_scope: self.synthetic_scope,
            static_context: self.static_context,
            shared: Rc::clone(&self.shared),
        }
    }

    /// New scope inside a synthesized closure/anonymous-class body, where
    /// `this` must be disambiguated against the enclosing converted class.
    pub fn extend_synthetic(&self) -> Self {
        let mut extended = self.extend();
        extended.synthetic_scope = true;
        extended
    }

    pub fn containing_class(&self) -> Option<DeclId> {
        self.containing_class
    }

    pub fn in_synthetic_scope(&self) -> bool {
        self.synthetic_scope
    }

    pub fn is_static(&self) -> bool {
        self.static_context
    }

    pub fn shared(&self) -> &Rc<SharedState> {
        &self.shared
    }

    /// Mark an identifier as taken in this scope.
    pub fn reserve(&mut self, name: &str) {
        self.used_names.insert(name.to_string());
    }

    /// Collision-free identifier derived from `base`.
    pub fn fresh_name(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 1;
        while self.used_names.contains(&candidate) || is_java_keyword(&candidate) {
            candidate = format!("{}{}", base, counter);
            counter += 1;
        }
        self.used_names.insert(candidate.clone());
        candidate
    }

    pub fn push_helper(&mut self, statement: String) {
        self.pending.borrow_mut().push(statement);
    }

    pub fn take_helpers(&mut self) -> Vec<String> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn has_helpers(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Stable synthesized helper-method name for a resolved setter.
    pub fn setter_name(&self, setter: DeclId, hint: &str) -> String {
        self.shared.setters.borrow_mut().name_for(setter, hint)
    }

    pub fn cell_name(&self, variable: DeclId) -> Option<String> {
        self.shared
            .captures
            .cell_name(variable)
            .map(str::to_string)
    }

    pub fn is_converted(&self, class: DeclId) -> bool {
        self.shared.converted.contains(&class)
    }
}
