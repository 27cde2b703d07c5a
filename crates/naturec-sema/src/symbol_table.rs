//! Lexically scoped symbol table.
//!
//! The table is a stack of scopes. Each scope owns its symbols and records
//! whether it is a function scope, a loop scope, or a secure zone. Loop and
//! secure-zone context is inherited by child scopes; the function flag is
//! not, so entering a function resets the loop context.

use std::collections::HashMap;

use naturec_syntax::{DataType, Loc};

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Parameter,
}

/// Signature information carried by function symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncInfo {
    pub params: Vec<(String, DataType)>,
    pub return_type: DataType,
}

/// A declared name.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: DataType,
    /// Depth of the scope this symbol was declared in.
    pub scope_level: usize,
    pub decl_loc: Loc,
    pub is_initialized: bool,
    pub func: Option<FuncInfo>,
}

#[derive(Debug)]
struct Scope {
    level: usize,
    symbols: HashMap<String, Symbol>,
    is_function_scope: bool,
    is_loop_scope: bool,
    is_secure_zone: bool,
    expected_return: DataType,
}

impl Scope {
    fn new(level: usize) -> Self {
        Self {
            level,
            symbols: HashMap::new(),
            is_function_scope: false,
            is_loop_scope: false,
            is_secure_zone: false,
            expected_return: DataType::Nothing,
        }
    }
}

/// Stack of scopes with declaration and lookup operations.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(0)],
        }
    }

    /// Current scope depth (0 = global).
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    fn current(&self) -> &Scope {
        self.scopes.last().expect("global scope always present")
    }

    fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("global scope always present")
    }

    /// Open a plain child scope, inheriting loop/secure-zone context.
    pub fn enter_scope(&mut self) {
        let level = self.scopes.len();
        let mut scope = Scope::new(level);
        let parent = self.current();
        scope.is_loop_scope = parent.is_loop_scope;
        scope.is_secure_zone = parent.is_secure_zone;
        if parent.is_function_scope || parent.expected_return != DataType::Nothing {
            scope.expected_return = parent.expected_return;
        }
        self.scopes.push(scope);
    }

    /// Open a function body scope: resets loop context, records the
    /// expected return type.
    pub fn enter_function_scope(&mut self, return_type: DataType) {
        self.enter_scope();
        let scope = self.current_mut();
        scope.is_function_scope = true;
        scope.expected_return = return_type;
        scope.is_loop_scope = false;
    }

    pub fn enter_loop_scope(&mut self) {
        self.enter_scope();
        self.current_mut().is_loop_scope = true;
    }

    pub fn enter_secure_scope(&mut self) {
        self.enter_scope();
        self.current_mut().is_secure_zone = true;
    }

    /// Close the current scope, dropping its symbols. The global scope is
    /// never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn in_loop(&self) -> bool {
        self.current().is_loop_scope
    }

    pub fn in_secure_zone(&self) -> bool {
        self.current().is_secure_zone
    }

    /// True when any enclosing scope is a function body.
    pub fn in_function(&self) -> bool {
        self.scopes.iter().rev().any(|s| s.is_function_scope)
    }

    /// Expected return type of the nearest enclosing function scope, or
    /// `Nothing` outside any function.
    pub fn return_type(&self) -> DataType {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.is_function_scope)
            .map(|s| s.expected_return)
            .unwrap_or(DataType::Nothing)
    }

    fn declare(&mut self, sym: Symbol) -> Result<(), String> {
        let scope = self.current_mut();
        if let Some(existing) = scope.symbols.get(&sym.name) {
            return Err(format!(
                "Redeclaration of '{}' (previously declared at line {})",
                sym.name, existing.decl_loc.line
            ));
        }
        scope.symbols.insert(sym.name.clone(), sym);
        Ok(())
    }

    /// Declare a variable (or constant) in the current scope.
    pub fn declare_variable(
        &mut self,
        name: &str,
        ty: DataType,
        is_const: bool,
        loc: Loc,
    ) -> Result<(), String> {
        let level = self.depth();
        self.declare(Symbol {
            name: name.to_string(),
            kind: if is_const {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            },
            ty,
            scope_level: level,
            decl_loc: loc,
            is_initialized: false,
            func: None,
        })
    }

    /// Declare a function in the current scope.
    pub fn declare_function(
        &mut self,
        name: &str,
        params: Vec<(String, DataType)>,
        return_type: DataType,
        loc: Loc,
    ) -> Result<(), String> {
        let level = self.depth();
        self.declare(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Function,
            ty: DataType::Function,
            scope_level: level,
            decl_loc: loc,
            is_initialized: true,
            func: Some(FuncInfo {
                params,
                return_type,
            }),
        })
    }

    /// Declare a function parameter; parameters are initialized by the
    /// caller.
    pub fn declare_parameter(&mut self, name: &str, ty: DataType, loc: Loc) -> Result<(), String> {
        let level = self.depth();
        self.declare(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Parameter,
            ty,
            scope_level: level,
            decl_loc: loc,
            is_initialized: true,
            func: None,
        })
        .map_err(|_| format!("Duplicate parameter name '{}'", name))
    }

    /// Walk from the innermost scope outward; the first hit wins.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|s| s.symbols.get(name))
    }

    pub fn lookup_current_scope(&self, name: &str) -> Option<&Symbol> {
        self.current().symbols.get(name)
    }

    /// Lookup restricted to function symbols.
    pub fn lookup_function(&self, name: &str) -> Option<&Symbol> {
        self.lookup(name)
            .filter(|s| s.kind == SymbolKind::Function)
    }

    /// Mark the innermost symbol with this name as initialized.
    pub fn mark_initialized(&mut self, name: &str) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(sym) = scope.symbols.get_mut(name) {
                sym.is_initialized = true;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Loc {
        Loc::new(1, 1)
    }

    #[test]
    fn lookup_walks_scopes_inner_first() {
        let mut t = SymbolTable::new();
        t.declare_variable("x", DataType::Number, false, loc()).unwrap();
        t.enter_scope();
        t.declare_variable("x", DataType::Text, false, loc()).unwrap();
        assert_eq!(t.lookup("x").unwrap().ty, DataType::Text);
        t.exit_scope();
        assert_eq!(t.lookup("x").unwrap().ty, DataType::Number);
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        let mut t = SymbolTable::new();
        t.declare_variable("x", DataType::Number, false, loc()).unwrap();
        let err = t
            .declare_variable("x", DataType::Number, false, loc())
            .unwrap_err();
        assert!(err.contains("Redeclaration"));
    }

    #[test]
    fn loop_context_is_inherited_but_function_resets_it() {
        let mut t = SymbolTable::new();
        t.enter_loop_scope();
        assert!(t.in_loop());
        t.enter_scope();
        assert!(t.in_loop(), "child scope sees the enclosing loop");
        t.enter_function_scope(DataType::Number);
        assert!(!t.in_loop(), "function bodies start outside any loop");
        assert!(t.in_function());
        assert_eq!(t.return_type(), DataType::Number);
    }

    #[test]
    fn return_type_comes_from_nearest_function_scope() {
        let mut t = SymbolTable::new();
        assert_eq!(t.return_type(), DataType::Nothing);
        t.enter_function_scope(DataType::Text);
        t.enter_scope();
        t.enter_loop_scope();
        assert_eq!(t.return_type(), DataType::Text);
    }

    #[test]
    fn secure_zone_flag_propagates_to_children() {
        let mut t = SymbolTable::new();
        t.enter_secure_scope();
        t.enter_scope();
        assert!(t.in_secure_zone());
    }

    #[test]
    fn symbol_depth_never_exceeds_lookup_depth() {
        let mut t = SymbolTable::new();
        t.declare_variable("g", DataType::Number, false, loc()).unwrap();
        t.enter_scope();
        t.enter_scope();
        let sym = t.lookup("g").unwrap();
        assert!(sym.scope_level <= t.depth());
    }

    #[test]
    fn scope_symbols_die_with_the_scope() {
        let mut t = SymbolTable::new();
        t.enter_scope();
        t.declare_variable("tmp", DataType::Flag, false, loc()).unwrap();
        assert!(t.lookup("tmp").is_some());
        t.exit_scope();
        assert!(t.lookup("tmp").is_none());
    }
}
