//! Static type checker.
//!
//! Walks the source AST, validates every node, and populates the symbol
//! table as it goes. Does not otherwise transform the AST: later stages
//! either re-derive a node's type from the (now fully populated) symbol
//! table, or don't need it at all.

use tabc_parser::ast::{
    BinOp, Block, CollectionKind, Expr, Id, Literal, PrimitiveKind, RangeValues, Stmt, Type, UnOp,
};

use crate::error::{CompileError, CompileResult};
use crate::symbol_table::SymbolTable;

pub struct TypeChecker {
    pub st: SymbolTable,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            st: SymbolTable::new(),
        }
    }

    pub fn check_program(&mut self, block: &Block) -> CompileResult<()> {
        self.check_block(block)?;
        debug_assert_eq!(self.st.scope_depth(), 1, "scope stack must unwind to global");
        Ok(())
    }

    fn check_block(&mut self, block: &Block) -> CompileResult<()> {
        for stmt in block {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Assignment {
                target,
                declared_type,
                value,
            } => self.check_assignment(target, declared_type, value),
            Stmt::If { cond, body } | Stmt::Elif { cond, body } | Stmt::While { cond, body } => {
                self.check_expr(cond)?;
                self.st.push_scope();
                let result = self.check_block(body);
                self.st.pop_scope();
                result
            }
            Stmt::Else { body } => {
                self.st.push_scope();
                let result = self.check_block(body);
                self.st.pop_scope();
                result
            }
            Stmt::ForLoopRange { var, range, body } => self.check_for_range(var, range, body),
            Stmt::ForLoopList { var, list, body } => self.check_for_list(var, list, body),
            Stmt::FunctionDef {
                name,
                params,
                return_type,
                body,
            } => self.check_function_def(name, params, return_type, body),
            Stmt::Return(expr) => self.check_return(expr),
            Stmt::LstAppend { obj, val } => self.check_lst_append(obj, val),
            Stmt::Expr(expr) => self.check_expr(expr).map(|_| ()),
        }
    }

    fn check_assignment(
        &mut self,
        target: &Id,
        declared_type: &Option<Type>,
        value: &Expr,
    ) -> CompileResult<()> {
        match self.st.lookup_variable(target) {
            Ok(existing) => {
                let value_ty = self.check_expr(value)?;
                assert_same_type(&existing, &value_ty)?;
                Ok(())
            }
            Err(_) => {
                let Some(declared) = declared_type else {
                    return Err(CompileError::type_check(format!(
                        "Assignment to undeclared variable '{}' requires a type annotation",
                        target.0
                    )));
                };
                let value_ty = self.check_expr(value)?;
                assert_assignable(declared, &value_ty)?;
                self.st.declare_variable(target, declared.clone())?;
                Ok(())
            }
        }
    }

    fn check_for_range(&mut self, var: &Id, range: &RangeValues, body: &Block) -> CompileResult<()> {
        self.check_range_values(range)?;
        self.st.push_scope();
        let result = (|| {
            match self.st.lookup_variable(var) {
                Ok(ty) => assert_same_type(&ty, &Type::int())?,
                Err(_) => self.st.declare_variable(var, Type::int())?,
            }
            self.check_block(body)
        })();
        self.st.pop_scope();
        result
    }

    fn check_range_values(&mut self, range: &RangeValues) -> CompileResult<()> {
        if let Some(start) = &range.start {
            let ty = self.check_expr(start)?;
            assert_same_type(&Type::int(), &ty)?;
        }
        let stop_ty = self.check_expr(&range.stop)?;
        assert_same_type(&Type::int(), &stop_ty)?;
        if let Some(step) = &range.step {
            let ty = self.check_expr(step)?;
            assert_same_type(&Type::int(), &ty)?;
        }
        Ok(())
    }

    fn check_for_list(&mut self, var: &Id, list: &Expr, body: &Block) -> CompileResult<()> {
        let list_ty = self.check_expr(list)?;
        let Type::NonPrimitive(CollectionKind::List, elem) = &list_ty else {
            return Err(CompileError::type_check(
                "for-list loop requires a list expression",
            ));
        };
        let elem_ty = elem
            .clone()
            .map(|b| *b)
            .unwrap_or(Type::Primitive(PrimitiveKind::None));
        self.st.push_scope();
        let result = (|| {
            match self.st.lookup_variable(var) {
                Ok(existing) => assert_same_type(&existing, &elem_ty)?,
                Err(_) => self.st.declare_variable(var, elem_ty)?,
            }
            self.check_block(body)
        })();
        self.st.pop_scope();
        result
    }

    fn check_function_def(
        &mut self,
        name: &Id,
        params: &[tabc_parser::ast::Param],
        return_type: &Option<Type>,
        body: &Block,
    ) -> CompileResult<()> {
        let param_names: Vec<Id> = params.iter().map(|p| p.name.clone()).collect();
        let param_types: Vec<Type> = params.iter().map(|p| p.ty.clone()).collect();
        self.st
            .declare_function(name, param_names, param_types, return_type.clone())?;

        self.st.push_scope();
        self.st.push_return_type(return_type.clone());
        let result = (|| {
            for param in params {
                self.st.declare_variable(&param.name, param.ty.clone())?;
            }
            self.check_block(body)
        })();
        self.st.pop_return_type();
        self.st.pop_scope();
        result
    }

    fn check_return(&mut self, expr: &Option<Expr>) -> CompileResult<()> {
        let expected = self.st.current_return_type().cloned();
        match (expr, expected) {
            (None, None) => Ok(()),
            (None, Some(expected)) => Err(CompileError::type_check(format!(
                "Return with no value does not match expected type {expected}"
            ))),
            (Some(expr), expected) => {
                let actual = self.check_expr(expr)?;
                match expected {
                    Some(expected) => assert_same_type(&expected, &actual),
                    None => Err(CompileError::type_check(
                        "Returning a value from a function declared with no return type",
                    )),
                }
            }
        }
    }

    fn check_lst_append(&mut self, obj: &Expr, val: &Expr) -> CompileResult<()> {
        let obj_ty = self.check_expr(obj)?;
        let Type::NonPrimitive(CollectionKind::List, elem) = &obj_ty else {
            return Err(CompileError::type_check(
                "append target must be a list, not a tuple",
            ));
        };
        let val_ty = self.check_expr(val)?;
        match elem {
            Some(elem_ty) => assert_same_type(elem_ty, &val_ty)?,
            None => {
                if let Expr::Id(name) = obj {
                    self.st.update_variable(
                        name,
                        Type::NonPrimitive(CollectionKind::List, Some(Box::new(val_ty))),
                    );
                }
            }
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr) -> CompileResult<Type> {
        match expr {
            Expr::PrimitiveLiteral(lit) => Ok(literal_type(lit)),
            Expr::NonPrimitiveLiteral(kind, children) => self.check_collection_literal(*kind, children),
            Expr::Id(name) => self.st.lookup_variable(name),
            Expr::BinaryOp(op, left, right) => self.check_binary(*op, left, right),
            Expr::UnaryOp(op, operand) => self.check_unary(*op, operand),
            Expr::FunctionCall(name, args) => self.check_call(name, args),
            Expr::NonPrimitiveIndex(obj, idx) => self.check_index(obj, idx),
            Expr::NonPrimitiveSlicing(obj, start, end) => self.check_slicing(obj, start, end),
        }
    }

    fn check_collection_literal(
        &mut self,
        kind: CollectionKind,
        children: &[Expr],
    ) -> CompileResult<Type> {
        if children.is_empty() {
            return Ok(Type::NonPrimitive(kind, None));
        }
        let first_ty = self.check_expr(&children[0])?;
        for child in &children[1..] {
            let ty = self.check_expr(child)?;
            if ty != first_ty {
                return Err(CompileError::type_check(
                    "Mismatched types in list literal",
                ));
            }
        }
        Ok(Type::NonPrimitive(kind, Some(Box::new(first_ty))))
    }

    fn check_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> CompileResult<Type> {
        let left_ty = self.check_expr(left)?;
        let right_ty = self.check_expr(right)?;

        if op.numbers_only() {
            let promoted = assert_both_numbers(&left_ty, &right_ty)?;
            return Ok(if op.is_comparison() {
                promoted
            } else {
                promoted
            });
        }

        if let Ok(promoted) = assert_both_numbers(&left_ty, &right_ty) {
            return Ok(if op.is_comparison() { promoted } else { promoted });
        }

        if left_ty == right_ty {
            return Ok(left_ty);
        }

        Err(CompileError::type_check(format!(
            "Type mismatch on Binary Operator left={left_ty} right={right_ty}"
        )))
    }

    fn check_unary(&mut self, op: UnOp, operand: &Expr) -> CompileResult<Type> {
        let ty = self.check_expr(operand)?;
        match op {
            UnOp::Neg => {
                if ty.is_numeric() {
                    Ok(ty)
                } else {
                    Err(CompileError::type_check(format!(
                        "Invalid type on Unary Operator operand={ty}"
                    )))
                }
            }
            UnOp::Not => {
                if ty == Type::bool() {
                    Ok(ty)
                } else {
                    Err(CompileError::type_check(format!(
                        "Invalid type on Unary Operator operand={ty}"
                    )))
                }
            }
        }
    }

    fn check_call(&mut self, name: &Id, args: &[Expr]) -> CompileResult<Type> {
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            arg_types.push(self.check_expr(arg)?);
        }
        match self.st.lookup_function(name, &arg_types)? {
            Some(ty) => Ok(ty),
            None => Ok(Type::none()),
        }
    }

    fn check_index(&mut self, obj: &Expr, idx: &Expr) -> CompileResult<Type> {
        let obj_ty = self.check_expr(obj)?;
        let idx_ty = self.check_expr(idx)?;
        if idx_ty != Type::int() {
            return Err(CompileError::type_check("Non-int index"));
        }
        match obj_ty {
            Type::NonPrimitive(_, Some(elem)) => Ok(*elem),
            Type::NonPrimitive(_, None) => Ok(Type::none()),
            other => Err(CompileError::type_check(format!(
                "Cannot index a non-collection value of type {other}"
            ))),
        }
    }

    fn check_slicing(
        &mut self,
        obj: &Expr,
        start: &Option<Box<Expr>>,
        end: &Option<Box<Expr>>,
    ) -> CompileResult<Type> {
        let obj_ty = self.check_expr(obj)?;
        if !matches!(obj_ty, Type::NonPrimitive(..)) {
            return Err(CompileError::type_check(
                "Cannot slice a non-collection value",
            ));
        }
        if let Some(start) = start {
            let ty = self.check_expr(start)?;
            if ty != Type::int() {
                return Err(CompileError::type_check("Non-int slice bound"));
            }
        }
        if let Some(end) = end {
            let ty = self.check_expr(end)?;
            if ty != Type::int() {
                return Err(CompileError::type_check("Non-int slice bound"));
            }
        }
        Ok(obj_ty)
    }
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::int(),
        Literal::Float(_) => Type::float(),
        Literal::Bool(_) => Type::bool(),
        Literal::Str(_) => Type::str(),
        Literal::None => Type::none(),
    }
}

/// Both sides numeric (int/float), promoting to float if either is float.
fn assert_both_numbers(left: &Type, right: &Type) -> CompileResult<Type> {
    if !left.is_numeric() || !right.is_numeric() {
        return Err(CompileError::type_check(format!(
            "Invalid type on Binary Operator left={left} right={right}"
        )));
    }
    if *left == Type::float() || *right == Type::float() {
        Ok(Type::float())
    } else {
        Ok(Type::int())
    }
}

fn assert_same_type(expected: &Type, actual: &Type) -> CompileResult<()> {
    if expected == actual {
        return Ok(());
    }
    // A collection with an unresolved element type unifies with the same
    // kind of collection regardless of element type (empty literal case).
    if let (
        Type::NonPrimitive(k1, e1),
        Type::NonPrimitive(k2, e2),
    ) = (expected, actual)
    {
        if k1 == k2 && (e1.is_none() || e2.is_none()) {
            return Ok(());
        }
    }
    Err(CompileError::type_check(format!(
        "Type mismatch: expected {expected}, found {actual}"
    )))
}

fn assert_assignable(declared: &Type, value: &Type) -> CompileResult<()> {
    assert_same_type(declared, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(src: &str) -> CompileResult<()> {
        let block = tabc_parser::parse(src).map_err(CompileError::from)?;
        TypeChecker::new().check_program(&block)
    }

    #[test]
    fn arithmetic_and_print_typechecks() {
        check("x: int = 1 + 2\nprint(x)\n").unwrap();
    }

    #[test]
    fn redeclare_fails() {
        let err = check("x: int = 1\nx: int = 2\n").unwrap_err();
        assert!(err.message.contains("Redeclaring variable"));
    }

    #[test]
    fn overloaded_function_dispatches_by_argument_type() {
        check(
            "def f(x: int) -> int:\n\treturn x\ndef f(x: float) -> float:\n\treturn x\ny: int = f(1)\nz: float = f(1.5)\n",
        )
        .unwrap();
    }

    #[test]
    fn wrong_overload_argument_type_fails() {
        let err = check(
            "def f(x: int) -> int:\n\treturn x\ny: bool = f(\"nope\")\n",
        )
        .unwrap_err();
        assert!(err.message.to_lowercase().contains("undefined function")
            || err.message.to_lowercase().contains("mismatch"));
    }

    #[test]
    fn list_append_and_index() {
        check("xs: [int] = []\nxs.append(1)\nxs.append(2)\nprint(xs[0] + xs[1])\n").unwrap();
    }

    #[test]
    fn scope_unwinds_to_global_after_typecheck() {
        let block = tabc_parser::parse(
            "if True:\n\tx: int = 1\nelse:\n\tx: int = 2\n",
        )
        .unwrap();
        let mut tc = TypeChecker::new();
        tc.check_program(&block).unwrap();
        assert_eq!(tc.st.scope_depth(), 1);
    }
}
