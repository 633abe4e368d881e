//! Scoped symbol table: variable bindings, overloaded function sets, and the
//! parallel table of mangled C function names.

use std::collections::HashMap;

use tabc_parser::ast::{Id, Type};

use crate::error::CompileError;

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub param_names: Vec<Id>,
    pub param_types: Vec<Type>,
    pub return_type: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CFunction {
    pub mangled_name: String,
    pub param_types: Vec<Type>,
    pub return_type: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overload {
    Source(Function),
    C(CFunction),
}

impl Overload {
    pub fn param_types(&self) -> &[Type] {
        match self {
            Overload::Source(f) => &f.param_types,
            Overload::C(f) => &f.param_types,
        }
    }

    pub fn return_type(&self) -> Option<&Type> {
        match self {
            Overload::Source(f) => f.return_type.as_ref(),
            Overload::C(f) => f.return_type.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Variable(Type),
    FunctionSet(Vec<Overload>),
}

type Scope = HashMap<String, Binding>;

/// Builds the pre-populated global scope: `print` (one overload per
/// primitive type) and `input_int/float/bool/str` (each with a zero-arg and
/// a single `str`-prompt-arg overload).
fn globals() -> Scope {
    let mut scope = Scope::new();
    let primitives = [Type::int(), Type::float(), Type::bool(), Type::str()];

    let mut print_overloads = Vec::new();
    for ty in &primitives {
        print_overloads.push(Overload::Source(Function {
            param_names: vec![Id("value".to_string())],
            param_types: vec![ty.clone()],
            return_type: None,
        }));
    }
    scope.insert(
        "print".to_string(),
        Binding::FunctionSet(print_overloads),
    );

    for (name, ret) in [
        ("input_int", Type::int()),
        ("input_float", Type::float()),
        ("input_bool", Type::bool()),
        ("input_str", Type::str()),
    ] {
        let overloads = vec![
            Overload::Source(Function {
                param_names: vec![],
                param_types: vec![],
                return_type: Some(ret.clone()),
            }),
            Overload::Source(Function {
                param_names: vec![Id("prompt".to_string())],
                param_types: vec![Type::str()],
                return_type: Some(ret),
            }),
        ];
        scope.insert(name.to_string(), Binding::FunctionSet(overloads));
    }

    scope
}

/// Scoped name -> binding map, plus the mangled-name allocator for C
/// function emission. Bottom of `scope_stack` is global; top is innermost.
#[derive(Debug)]
pub struct SymbolTable {
    scope_stack: Vec<Scope>,
    func_call_stack: Vec<Option<Type>>,
    next_mangle: u32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scope_stack: vec![globals()],
            func_call_stack: Vec::new(),
            next_mangle: 1000,
        }
    }

    pub fn push_scope(&mut self) {
        self.scope_stack.push(Scope::new());
    }

    /// Pop the innermost scope. Popping the global scope is an invariant
    /// error: it should never happen if callers balance push/pop correctly.
    pub fn pop_scope(&mut self) {
        assert!(
            self.scope_stack.len() > 1,
            "cannot pop the global scope"
        );
        self.scope_stack.pop();
    }

    pub fn push_return_type(&mut self, ty: Option<Type>) {
        self.func_call_stack.push(ty);
    }

    pub fn pop_return_type(&mut self) {
        self.func_call_stack.pop();
    }

    pub fn current_return_type(&self) -> Option<&Type> {
        self.func_call_stack.last().and_then(|t| t.as_ref())
    }

    fn top(&mut self) -> &mut Scope {
        self.scope_stack.last_mut().expect("scope stack is never empty")
    }

    pub fn declare_variable(&mut self, name: &Id, ty: Type) -> Result<(), CompileError> {
        if self.top().contains_key(&name.0) {
            return Err(CompileError::type_check(format!(
                "Redeclaring variable '{}'",
                name.0
            )));
        }
        self.top().insert(name.0.clone(), Binding::Variable(ty));
        Ok(())
    }

    pub fn lookup_variable(&self, name: &Id) -> Result<Type, CompileError> {
        for scope in self.scope_stack.iter().rev() {
            match scope.get(&name.0) {
                Some(Binding::Variable(ty)) => return Ok(ty.clone()),
                Some(Binding::FunctionSet(_)) => {
                    return Err(CompileError::type_check(format!(
                        "'{}' is a function, not a variable",
                        name.0
                    )))
                }
                None => continue,
            }
        }
        Err(CompileError::type_check(format!(
            "Referencing undefined variable '{}'",
            name.0
        )))
    }

    /// Mutate the type of the innermost binding found, or declare it fresh in
    /// the top scope if absent. Used to backfill the element type of an
    /// empty list/tuple literal once its first assignment reveals it.
    pub fn update_variable(&mut self, name: &Id, ty: Type) {
        for scope in self.scope_stack.iter_mut().rev() {
            if let Some(binding @ Binding::Variable(_)) = scope.get_mut(&name.0) {
                *binding = Binding::Variable(ty);
                return;
            }
        }
        self.top().insert(name.0.clone(), Binding::Variable(ty));
    }

    pub fn declare_function(
        &mut self,
        name: &Id,
        param_names: Vec<Id>,
        param_types: Vec<Type>,
        return_type: Option<Type>,
    ) -> Result<(), CompileError> {
        match self.top().get_mut(&name.0) {
            Some(Binding::Variable(_)) => Err(CompileError::type_check(format!(
                "'{}' is already bound to a variable",
                name.0
            ))),
            Some(Binding::FunctionSet(overloads)) => {
                for existing in overloads.iter() {
                    if existing.param_types() == param_types.as_slice() {
                        return Err(CompileError::type_check(format!(
                            "Redeclaring overload of '{}' with the same parameter types",
                            name.0
                        )));
                    }
                    if let Overload::Source(f) = existing {
                        if f.param_names == param_names {
                            return Err(CompileError::type_check(format!(
                                "Redeclaring overload of '{}' with the same parameter names",
                                name.0
                            )));
                        }
                    }
                }
                overloads.push(Overload::Source(Function {
                    param_names,
                    param_types,
                    return_type,
                }));
                Ok(())
            }
            None => {
                self.top().insert(
                    name.0.clone(),
                    Binding::FunctionSet(vec![Overload::Source(Function {
                        param_names,
                        param_types,
                        return_type,
                    })]),
                );
                Ok(())
            }
        }
    }

    /// Find the overload whose parameter-type tuple matches `arg_types`
    /// structurally, searching scopes top-down.
    pub fn lookup_function(
        &self,
        name: &Id,
        arg_types: &[Type],
    ) -> Result<Option<Type>, CompileError> {
        for scope in self.scope_stack.iter().rev() {
            if let Some(Binding::FunctionSet(overloads)) = scope.get(&name.0) {
                for overload in overloads {
                    if overload.param_types() == arg_types {
                        return Ok(overload.return_type().cloned());
                    }
                }
                return Err(CompileError::type_check(format!(
                    "Referencing undefined function '{}' with the given argument types",
                    name.0
                )));
            }
        }
        Err(CompileError::type_check(format!(
            "Referencing undefined function '{}'",
            name.0
        )))
    }

    /// Same search as `lookup_function` but matched by parameter *names*,
    /// used by the C-AST builder to recover a source function's true
    /// declared signature from the flattened IR.
    pub fn get_func_by_name(
        &self,
        name: &Id,
        param_names: &[Id],
    ) -> Result<Function, CompileError> {
        for scope in self.scope_stack.iter().rev() {
            if let Some(Binding::FunctionSet(overloads)) = scope.get(&name.0) {
                for overload in overloads {
                    if let Overload::Source(f) = overload {
                        if f.param_names == param_names {
                            return Ok(f.clone());
                        }
                    }
                }
            }
        }
        Err(CompileError::ir_cast(format!(
            "Referencing undefined function '{}'",
            name.0
        )))
    }

    /// Allocate a mangled C name for a new overload and record it. Mangling
    /// is a monotonically increasing counter rather than the seeded-random
    /// draw some source compilers use for this: both satisfy "two
    /// compilations of the same input yield identical mangled names", and a
    /// counter has no fixed capacity.
    pub fn declare_c_function(
        &mut self,
        name: &Id,
        param_types: Vec<Type>,
        return_type: Option<Type>,
    ) -> String {
        let mangled = format!("{}{}", name.0, self.next_mangle);
        self.next_mangle += 1;
        let entry = CFunction {
            mangled_name: mangled.clone(),
            param_types,
            return_type,
        };
        match self.top().get_mut(&name.0) {
            Some(Binding::FunctionSet(overloads)) => overloads.push(Overload::C(entry)),
            _ => {
                self.top()
                    .insert(name.0.clone(), Binding::FunctionSet(vec![Overload::C(entry)]));
            }
        }
        mangled
    }

    pub fn get_c_function(
        &self,
        name: &Id,
        param_types: &[Type],
    ) -> Result<(String, Option<Type>), CompileError> {
        for scope in self.scope_stack.iter().rev() {
            if let Some(Binding::FunctionSet(overloads)) = scope.get(&name.0) {
                for overload in overloads {
                    if let Overload::C(f) = overload {
                        if f.param_types == param_types {
                            return Ok((f.mangled_name.clone(), f.return_type.clone()));
                        }
                    }
                }
            }
        }
        Err(CompileError::emission(format!(
            "No mangled C function found for '{}'",
            name.0
        )))
    }

    pub fn scope_depth(&self) -> usize {
        self.scope_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Id {
        Id(s.to_string())
    }

    #[test]
    fn redeclaration_in_same_scope_fails() {
        let mut st = SymbolTable::new();
        st.declare_variable(&id("x"), Type::int()).unwrap();
        let err = st.declare_variable(&id("x"), Type::int()).unwrap_err();
        assert!(err.message.contains("Redeclaring variable"));
    }

    #[test]
    fn lookup_searches_outer_scopes() {
        let mut st = SymbolTable::new();
        st.declare_variable(&id("x"), Type::int()).unwrap();
        st.push_scope();
        assert_eq!(st.lookup_variable(&id("x")).unwrap(), Type::int());
        st.pop_scope();
    }

    #[test]
    fn undefined_variable_fails() {
        let st = SymbolTable::new();
        let err = st.lookup_variable(&id("missing")).unwrap_err();
        assert!(err.message.contains("undefined variable"));
    }

    #[test]
    fn overload_by_distinct_param_types() {
        let mut st = SymbolTable::new();
        st.declare_function(&id("f"), vec![id("x")], vec![Type::int()], Some(Type::int()))
            .unwrap();
        st.declare_function(&id("f"), vec![id("x")], vec![Type::float()], Some(Type::float()))
            .unwrap();
        assert_eq!(
            st.lookup_function(&id("f"), &[Type::int()]).unwrap(),
            Some(Type::int())
        );
        assert_eq!(
            st.lookup_function(&id("f"), &[Type::float()]).unwrap(),
            Some(Type::float())
        );
    }

    #[test]
    fn duplicate_param_type_overload_rejected() {
        let mut st = SymbolTable::new();
        st.declare_function(&id("f"), vec![id("x")], vec![Type::int()], Some(Type::int()))
            .unwrap();
        let err = st
            .declare_function(&id("f"), vec![id("y")], vec![Type::int()], Some(Type::int()))
            .unwrap_err();
        assert!(err.message.contains("same parameter types"));
    }

    #[test]
    fn mangled_names_are_unique_and_stable_within_a_compilation() {
        let mut st = SymbolTable::new();
        let a = st.declare_c_function(&id("f"), vec![Type::int()], Some(Type::int()));
        let b = st.declare_c_function(&id("f"), vec![Type::float()], Some(Type::float()));
        assert_ne!(a, b);
        let (looked_up, ret) = st.get_c_function(&id("f"), &[Type::int()]).unwrap();
        assert_eq!(looked_up, a);
        assert_eq!(ret, Some(Type::int()));
    }

    #[test]
    fn update_variable_backfills_empty_list_element_type() {
        let mut st = SymbolTable::new();
        st.declare_variable(
            &id("xs"),
            Type::NonPrimitive(tabc_parser::ast::CollectionKind::List, None),
        )
        .unwrap();
        st.update_variable(
            &id("xs"),
            Type::NonPrimitive(
                tabc_parser::ast::CollectionKind::List,
                Some(Box::new(Type::int())),
            ),
        );
        assert_eq!(
            st.lookup_variable(&id("xs")).unwrap(),
            Type::NonPrimitive(
                tabc_parser::ast::CollectionKind::List,
                Some(Box::new(Type::int()))
            )
        );
    }
}
