//! C-AST builder: reassembles the linear, label-and-goto IR back into the
//! structured [`CProgram`] the emitter formats to C text.
//!
//! Walks the IR with a single forward cursor, dispatching on whatever
//! instruction is at the front. A handful of instructions only ever appear
//! as the *head* of a larger bracket -- `LoopStart` opens a for-range loop,
//! `GetLength` opens a for-list loop, `Label(L_WHILE_*)` opens a while loop,
//! `Goto` immediately followed by `Label(L_FUNC_*)` opens a function body --
//! and each bracket's own handler consumes exactly its own instructions,
//! recursing into the generic statement dispatcher for its body. Well-nested
//! brackets mean a body never over-consumes into its enclosing construct's
//! own closing `Goto`/`Label`.
//!
//! Each intermediate register is declared the first time it is computed and
//! referenced by name afterward; nothing is inlined here; the emitter
//! decides whether and how to fold a single-use temporary into its use site.

use std::collections::HashMap;

use tabc_parser::ast::{BinOp, Id, Literal, PrimitiveKind, Type, UnOp};

use crate::cast::{CExpr, CFunctionDef, CProgram, CStmt, CType, CValue};
use crate::error::{CompileError, CompileResult};
use crate::ir::{IndexTarget, Ir};
use crate::symbol_table::SymbolTable;

fn to_ctype(ty: &Type) -> CType {
    match ty {
        Type::Primitive(PrimitiveKind::Int) => CType::Int,
        Type::Primitive(PrimitiveKind::Float) => CType::Float,
        Type::Primitive(PrimitiveKind::Bool) => CType::Bool,
        Type::Primitive(PrimitiveKind::Str) => CType::Str,
        Type::Primitive(PrimitiveKind::None) => CType::None,
        Type::NonPrimitive(..) => CType::ListPtr,
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

fn literal_value(lit: &Literal) -> CValue {
    match lit {
        Literal::Int(v) => CValue::Int(*v),
        Literal::Float(v) => CValue::Float(*v),
        Literal::Bool(v) => CValue::Bool(*v),
        Literal::Str(v) => CValue::Str(v.clone()),
        Literal::None => CValue::None,
    }
}

/// Mirrors `TypeChecker::check_binary`'s promotion rules over already-typed
/// operands, since the IR carries no type annotations of its own.
fn infer_binop_type(op: BinOp, left: &Type, right: &Type) -> Type {
    if op.is_comparison() {
        return Type::bool();
    }
    if left.is_numeric() && right.is_numeric() {
        return if *left == Type::float() || *right == Type::float() {
            Type::float()
        } else {
            Type::int()
        };
    }
    left.clone()
}

fn parse_func_label(label: &str) -> Option<String> {
    let rest = label.strip_prefix("L_FUNC_")?;
    let (name, _n) = rest.rsplit_once('_')?;
    Some(name.to_string())
}

/// `print`/`input_*` never get a `FunctionDef` lowering -- they are the
/// symbol table's pre-populated globals -- so calls to them resolve directly
/// to the runtime's naming convention instead of a mangled user function.
fn resolve_builtin_call(name: &str, arg_types: &[Type]) -> Option<(String, Option<CType>)> {
    if name == "print" && arg_types.len() == 1 {
        let suffix = match &arg_types[0] {
            Type::Primitive(PrimitiveKind::Int) => "int",
            Type::Primitive(PrimitiveKind::Float) => "float",
            Type::Primitive(PrimitiveKind::Bool) => "bool",
            Type::Primitive(PrimitiveKind::Str) => "str",
            _ => return None,
        };
        return Some((format!("print_{suffix}"), None));
    }
    for (base, ret) in [
        ("input_int", CType::Int),
        ("input_float", CType::Float),
        ("input_bool", CType::Bool),
        ("input_str", CType::Str),
    ] {
        if name != base {
            continue;
        }
        return match arg_types.len() {
            0 => Some((base.to_string(), Some(ret))),
            1 => Some((format!("{base}_s"), Some(ret))),
            _ => None,
        };
    }
    None
}

pub struct CastBuilder<'a> {
    ir: &'a [Ir],
    pos: usize,
    source_st: &'a SymbolTable,
    mangle_st: SymbolTable,
    scopes: Vec<HashMap<String, Type>>,
    /// Statically known list lengths, keyed by the register/variable that
    /// currently holds the list. Only literal-length lists (list literals,
    /// `.append()` chains, literal-bounded slices) are tracked: a list that
    /// arrives as a function parameter, or is sliced with a variable bound,
    /// has no entry, and a for-list loop over it is a compile error -- this
    /// IR has no runtime list-length query to fall back on.
    list_len: HashMap<String, usize>,
    const_int: HashMap<String, i64>,
    functions: Vec<CFunctionDef>,
}

pub fn build(ir: &[Ir], source_st: &SymbolTable) -> CompileResult<CProgram> {
    let mut b = CastBuilder {
        ir,
        pos: 0,
        source_st,
        mangle_st: SymbolTable::new(),
        scopes: vec![HashMap::new()],
        list_len: HashMap::new(),
        const_int: HashMap::new(),
        functions: Vec::new(),
    };
    let main_body = b.build_block_until(|_| false)?;
    Ok(CProgram {
        functions: b.functions,
        main_body,
    })
}

impl<'a> CastBuilder<'a> {
    fn peek(&self) -> Option<&Ir> {
        self.ir.get(self.pos)
    }

    fn next(&mut self) -> CompileResult<Ir> {
        let instr = self
            .ir
            .get(self.pos)
            .cloned()
            .ok_or_else(|| CompileError::ir_cast("unexpected end of IR stream"))?;
        self.pos += 1;
        Ok(instr)
    }

    fn expect_label(&mut self, expected: &str) -> CompileResult<()> {
        match self.next()? {
            Ir::Label(l) if l == expected => Ok(()),
            other => Err(CompileError::ir_cast(format!(
                "expected label {expected}, found {other:?}"
            ))),
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "cannot pop the global scope");
    }

    fn lookup(&self, name: &str) -> CompileResult<Type> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.get(name) {
                return Ok(ty.clone());
            }
        }
        Err(CompileError::ir_cast(format!(
            "register or variable '{name}' used before it was defined"
        )))
    }

    /// Declare `name` in the current scope if it is new anywhere visible;
    /// returns whether this is a fresh declaration (vs. a plain reassignment
    /// of something already in scope).
    fn declare(&mut self, name: &str, ty: Type) -> bool {
        if self.lookup(name).is_ok() {
            return false;
        }
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), ty);
        true
    }

    fn list_length(&self, reg: &str) -> CompileResult<usize> {
        self.list_len.get(reg).copied().ok_or_else(|| {
            CompileError::ir_cast(format!(
                "length of '{reg}' is not known at compile time (it was not built from a literal, an append chain, or a literally-bounded slice)"
            ))
        })
    }

    fn build_block_until(&mut self, stop: impl Fn(&Ir) -> bool) -> CompileResult<Vec<CStmt>> {
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => break,
                Some(instr) if stop(instr) => break,
                Some(_) => self.dispatch_one(&mut out)?,
            }
        }
        Ok(out)
    }

    fn dispatch_one(&mut self, out: &mut Vec<CStmt>) -> CompileResult<()> {
        match self.peek().expect("checked by caller").clone() {
            Ir::Goto(_) => self.build_function(),
            Ir::LoopStart(..) => {
                let stmt = self.build_for_range()?;
                out.push(stmt);
                Ok(())
            }
            Ir::GetLength(..) => {
                let stmt = self.build_for_list()?;
                out.push(stmt);
                Ok(())
            }
            Ir::Label(l) if l.starts_with("L_WHILE_") => {
                let stmt = self.build_while()?;
                out.push(stmt);
                Ok(())
            }
            Ir::IfStmt(..) => {
                let stmt = self.build_if()?;
                out.push(stmt);
                Ok(())
            }
            other => self.build_straight_line(other, out),
        }
    }

    /// `Goto(skip) ; Label(L_FUNC_name_N) ; Parameter ; ParameterVal* ;
    /// <body> ; Label(skip)`. Floats the finished definition into
    /// `self.functions` rather than the enclosing block.
    fn build_function(&mut self) -> CompileResult<()> {
        let Ir::Goto(skip_label) = self.next()? else {
            return Err(CompileError::ir_cast("expected function hoist goto"));
        };
        let Ir::Label(func_label) = self.next()? else {
            return Err(CompileError::ir_cast("expected function label"));
        };
        let fn_name = parse_func_label(&func_label)
            .ok_or_else(|| CompileError::ir_cast(format!("malformed function label {func_label}")))?;
        let Ir::Parameter(_, n) = self.next()? else {
            return Err(CompileError::ir_cast("expected parameter count"));
        };
        let mut param_names = Vec::with_capacity(n);
        for _ in 0..n {
            let Ir::ParameterVal(_, pname) = self.next()? else {
                return Err(CompileError::ir_cast("expected parameter value"));
            };
            param_names.push(Id(pname));
        }

        let sig = self
            .source_st
            .get_func_by_name(&Id(fn_name.clone()), &param_names)?;

        self.push_scope();
        for (pname, pty) in param_names.iter().zip(sig.param_types.iter()) {
            self.scopes
                .last_mut()
                .unwrap()
                .insert(pname.0.clone(), pty.clone());
        }
        let body = self.build_block_until(|ir| matches!(ir, Ir::Label(l) if *l == skip_label))?;
        self.expect_label(&skip_label)?;
        self.pop_scope();

        let mangled =
            self.mangle_st
                .declare_c_function(&Id(fn_name), sig.param_types.clone(), sig.return_type.clone());
        self.functions.push(CFunctionDef {
            mangled_name: mangled,
            params: param_names
                .iter()
                .zip(sig.param_types.iter())
                .map(|(n, t)| (n.0.clone(), to_ctype(t)))
                .collect(),
            return_type: sig.return_type.as_ref().map(to_ctype).unwrap_or(CType::None),
            body,
        });
        Ok(())
    }

    /// `LoopStart ; LoopStop ; LoopStep ; Label ; Assignment(var,start) ;
    /// BinaryOperation(cond,var,stop,Lt) ; IfStmt(cond,end) ; <body> ;
    /// Goto(loop) ; Label(end)`.
    fn build_for_range(&mut self) -> CompileResult<CStmt> {
        let Ir::LoopStart(start_reg, start_val) = self.next()? else {
            unreachable!()
        };
        self.declare(&start_reg, self.lookup(&start_val)?);
        let Ir::LoopStop(stop_reg, stop_val) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop stop"));
        };
        self.declare(&stop_reg, self.lookup(&stop_val)?);
        let Ir::LoopStep(step_reg, step_val) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop step"));
        };
        self.declare(&step_reg, self.lookup(&step_val)?);

        let Ir::Label(loop_label) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop label"));
        };
        let Ir::Assignment(var, start_src) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop var init"));
        };
        self.declare(&var, self.lookup(&start_src)?);

        let Ir::BinaryOperation(cond_reg, lhs, rhs, op) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop condition"));
        };
        self.declare(&cond_reg, infer_binop_type(op, &self.lookup(&lhs)?, &self.lookup(&rhs)?));
        let Ir::IfStmt(_, end_label) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop if"));
        };

        let body = self.build_block_until(|ir| matches!(ir, Ir::Goto(l) if *l == loop_label))?;
        self.expect_goto(&loop_label)?;
        self.expect_label(&end_label)?;

        Ok(CStmt::ForRange {
            var,
            start: CExpr::id(start_reg),
            stop: CExpr::id(stop_reg),
            step: CExpr::id(step_reg),
            body,
        })
    }

    /// `GetLength ; PrimitiveLiteral(idx,0) ; PrimitiveLiteral(step,1) ;
    /// Label ; BinaryOperation(cond,idx,len,Lt) ; IfStmt(cond,end) ;
    /// ForLoopVar(var) ; NonPrimitiveIndex(var,list,idx) ; <body> ;
    /// Goto(loop) ; Label(end)`.
    fn build_for_list(&mut self) -> CompileResult<CStmt> {
        let Ir::GetLength(len_reg, list_reg) = self.next()? else {
            unreachable!()
        };
        let length = self.list_length(&list_reg)?;
        self.const_int.insert(len_reg.clone(), length as i64);
        self.declare(&len_reg, Type::int());

        let Ir::PrimitiveLiteral(idx_reg, Literal::Int(start)) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop index init"));
        };
        self.const_int.insert(idx_reg.clone(), start);
        self.declare(&idx_reg, Type::int());

        let Ir::PrimitiveLiteral(step_reg, Literal::Int(step)) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop step literal"));
        };
        self.const_int.insert(step_reg.clone(), step);
        self.declare(&step_reg, Type::int());

        let Ir::Label(loop_label) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop label"));
        };
        let Ir::BinaryOperation(cond_reg, lhs, rhs, op) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop condition"));
        };
        self.declare(&cond_reg, infer_binop_type(op, &self.lookup(&lhs)?, &self.lookup(&rhs)?));
        let Ir::IfStmt(_, end_label) = self.next()? else {
            return Err(CompileError::ir_cast("expected loop if"));
        };
        let Ir::ForLoopVar(var) = self.next()? else {
            return Err(CompileError::ir_cast("expected for-loop var marker"));
        };
        let Ir::NonPrimitiveIndex(elem_dst, list_src, _idx) = self.next()? else {
            return Err(CompileError::ir_cast("expected element index"));
        };
        let elem_ty = match self.lookup(&list_src)? {
            Type::NonPrimitive(_, Some(elem)) => *elem,
            _ => Type::int(),
        };
        self.declare(&var, elem_ty);
        debug_assert_eq!(elem_dst, var);

        let body = self.build_block_until(|ir| matches!(ir, Ir::Goto(l) if *l == loop_label))?;
        self.expect_goto(&loop_label)?;
        self.expect_label(&end_label)?;

        Ok(CStmt::ForList {
            var,
            elem_ty: to_ctype(&self.lookup(&list_reg).unwrap_or(Type::NonPrimitive(
                tabc_parser::ast::CollectionKind::List,
                Some(Box::new(Type::int())),
            ))),
            index_var: idx_reg,
            length: CExpr::id(len_reg),
            list: CExpr::id(list_reg),
            body,
        })
    }

    /// `Label ; <cond prelude> ; IfStmt(cond,end) ; <body> ; Goto(loop) ;
    /// Label(end)`. The prelude is whatever straight-line instructions the
    /// condition expression lowered to; it re-runs every iteration.
    fn build_while(&mut self) -> CompileResult<CStmt> {
        let Ir::Label(loop_label) = self.next()? else {
            unreachable!()
        };
        let mut prelude = Vec::new();
        loop {
            match self.peek() {
                Some(Ir::IfStmt(..)) => break,
                Some(_) => self.dispatch_one(&mut prelude)?,
                None => return Err(CompileError::ir_cast("unterminated while condition")),
            }
        }
        let Ir::IfStmt(cond_reg, end_label) = self.next()? else {
            unreachable!()
        };
        let body = self.build_block_until(|ir| matches!(ir, Ir::Goto(l) if *l == loop_label))?;
        self.expect_goto(&loop_label)?;
        self.expect_label(&end_label)?;

        Ok(CStmt::While {
            prelude,
            cond: CExpr::id(cond_reg),
            body,
        })
    }

    /// `IfStmt(cond,fl0) ; <body0> ; Goto(end) ; Label(fl0) ;
    /// (ElifStmt(cond,fli) ; <bodyi> ; Goto(end) ; Label(fli))* ;
    /// (<else body>)? ; Label(end)`. Mirrors the generator's splice
    /// algorithm in reverse: each false-label either opens an elif, opens a
    /// bare else (anything that isn't `ElifStmt` or `Label(end)`), or is
    /// immediately followed by `Label(end)` when there is no further arm.
    fn build_if(&mut self) -> CompileResult<CStmt> {
        let Ir::IfStmt(cond_reg, false_label) = self.next()? else {
            unreachable!()
        };
        let true_body = self.build_block_until(|ir| matches!(ir, Ir::Goto(_)))?;
        let Ir::Goto(end_label) = self.next()? else {
            return Err(CompileError::ir_cast("expected if-branch goto"));
        };
        self.expect_label(&false_label)?;

        let mut branches = vec![(Vec::new(), CExpr::id(cond_reg), true_body)];
        // Between a false-label and the next marker sits either an elif's
        // condition prelude (if an `ElifStmt` follows) or a bare else body
        // (if `Label(end_label)` follows directly) -- undecidable without
        // looking past it, so gather generically and branch on what stopped
        // the gather. Nested constructs consume their own full bracket, so
        // this never stops early on a label/goto belonging to a nested if,
        // while, or for inside that segment.
        let else_body = loop {
            let segment = self.build_block_until(|ir| {
                matches!(ir, Ir::ElifStmt(..)) || matches!(ir, Ir::Label(l) if *l == end_label)
            })?;
            match self.peek() {
                Some(Ir::ElifStmt(..)) => {
                    let Ir::ElifStmt(elif_cond, elif_false) = self.next()? else {
                        unreachable!()
                    };
                    let body = self.build_block_until(|ir| matches!(ir, Ir::Goto(_)))?;
                    let Ir::Goto(goto_target) = self.next()? else {
                        return Err(CompileError::ir_cast("expected elif-branch goto"));
                    };
                    if goto_target != end_label {
                        return Err(CompileError::ir_cast(
                            "elif branch does not rejoin the if-chain's end label",
                        ));
                    }
                    self.expect_label(&elif_false)?;
                    branches.push((segment, CExpr::id(elif_cond), body));
                }
                Some(Ir::Label(l)) if *l == end_label => {
                    self.expect_label(&end_label)?;
                    break if segment.is_empty() { None } else { Some(segment) };
                }
                _ => return Err(CompileError::ir_cast("unterminated if-chain")),
            }
        };

        Ok(CStmt::If {
            branches,
            else_body,
        })
    }

    fn expect_goto(&mut self, expected: &str) -> CompileResult<()> {
        match self.next()? {
            Ir::Goto(l) if l == expected => Ok(()),
            other => Err(CompileError::ir_cast(format!(
                "expected goto {expected}, found {other:?}"
            ))),
        }
    }

    /// Everything else: one ordinary instruction, lowered to zero or one
    /// `CStmt` (a handful of multi-instruction groups -- strings, list
    /// literals, call argument lists -- are consumed as a single unit here).
    fn build_straight_line(&mut self, instr: Ir, out: &mut Vec<CStmt>) -> CompileResult<()> {
        match instr {
            Ir::PrimitiveLiteral(reg, lit) => {
                self.pos += 1;
                if let Literal::Int(v) = &lit {
                    self.const_int.insert(reg.clone(), *v);
                }
                let ty = literal_type(&lit);
                let is_fresh = self.declare(&reg, ty.clone());
                if is_fresh {
                    out.push(CStmt::DeclAssign {
                        name: reg,
                        ty: to_ctype(&ty),
                        value: CExpr::Literal(literal_value(&lit)),
                    });
                }
                Ok(())
            }
            Ir::StringLit(reg, len) => {
                self.pos += 1;
                let mut s = String::with_capacity(len);
                for _ in 0..len {
                    match self.next()? {
                        Ir::StringChar(r, c) if r == reg => s.push(c),
                        other => return Err(CompileError::ir_cast(format!(
                            "expected string char for {reg}, found {other:?}"
                        ))),
                    }
                }
                self.declare(&reg, Type::str());
                out.push(CStmt::DeclAssign {
                    name: reg,
                    ty: CType::Str,
                    value: CExpr::Literal(CValue::Str(s)),
                });
                Ok(())
            }
            Ir::BinaryOperation(reg, l, r, op) => {
                self.pos += 1;
                let lty = self.lookup(&l)?;
                let rty = self.lookup(&r)?;
                let ty = infer_binop_type(op, &lty, &rty);
                self.declare(&reg, ty.clone());
                let cty = to_ctype(&ty);
                out.push(CStmt::DeclAssign {
                    name: reg,
                    ty: cty,
                    value: CExpr::Binary(op, Box::new(CExpr::id(l)), Box::new(CExpr::id(r)), cty),
                });
                Ok(())
            }
            Ir::UnaryOperation(reg, op, operand) => {
                self.pos += 1;
                let ty = match op {
                    UnOp::Neg => self.lookup(&operand)?,
                    UnOp::Not => Type::bool(),
                };
                self.declare(&reg, ty.clone());
                let cty = to_ctype(&ty);
                out.push(CStmt::DeclAssign {
                    name: reg,
                    ty: cty,
                    value: CExpr::Unary(op, Box::new(CExpr::id(operand)), cty),
                });
                Ok(())
            }
            Ir::Assignment(name, value_reg) => {
                self.pos += 1;
                let ty = self.lookup(&value_reg)?;
                if let Some(&n) = self.const_int.get(&value_reg) {
                    self.const_int.insert(name.clone(), n);
                }
                if let Some(&len) = self.list_len.get(&value_reg) {
                    self.list_len.insert(name.clone(), len);
                }
                let fresh = self.declare(&name, ty.clone());
                let value = CExpr::id(value_reg);
                out.push(if fresh {
                    CStmt::DeclAssign {
                        name,
                        ty: to_ctype(&ty),
                        value,
                    }
                } else {
                    CStmt::Assign { name, value }
                });
                Ok(())
            }
            Ir::List(reg, _kind, n) => {
                // Tuples share this same list_t* construction path as lists, so
                // assigning one tuple variable to another copies the pointer,
                // not the backing storage: tuple assignment aliases.
                self.pos += 1;
                let mut elements = Vec::with_capacity(n);
                let mut elem_ty = None;
                for _ in 0..n {
                    let Ir::ListVal(child) = self.next()? else {
                        return Err(CompileError::ir_cast("expected list element"));
                    };
                    if elem_ty.is_none() {
                        elem_ty = Some(self.lookup(&child)?);
                    }
                    elements.push(CExpr::id(child));
                }
                let elem_ty = elem_ty.unwrap_or(Type::int());
                self.list_len.insert(reg.clone(), n);
                self.declare(
                    &reg,
                    Type::NonPrimitive(
                        tabc_parser::ast::CollectionKind::List,
                        Some(Box::new(elem_ty.clone())),
                    ),
                );
                out.push(CStmt::DeclAssign {
                    name: reg,
                    ty: CType::ListPtr,
                    value: CExpr::ListLiteral {
                        elements,
                        elem_ty: to_ctype(&elem_ty),
                    },
                });
                Ok(())
            }
            Ir::LstAdd(obj, val, idx) => {
                self.pos += 1;
                let elem_ty = self.lookup(&val)?;
                if let IndexTarget::End = idx {
                    *self.list_len.entry(obj.clone()).or_insert(0) += 1;
                }
                out.push(CStmt::LstAdd {
                    obj,
                    value: CExpr::id(val),
                    elem_ty: to_ctype(&elem_ty),
                });
                Ok(())
            }
            Ir::NonPrimitiveIndex(reg, obj, idx) => {
                self.pos += 1;
                let elem_ty = match self.lookup(&obj)? {
                    Type::NonPrimitive(_, Some(elem)) => *elem,
                    _ => Type::int(),
                };
                self.declare(&reg, elem_ty.clone());
                let cty = to_ctype(&elem_ty);
                out.push(CStmt::DeclAssign {
                    name: reg,
                    ty: cty,
                    value: CExpr::Index {
                        obj: Box::new(CExpr::id(obj)),
                        idx: Box::new(CExpr::id(idx)),
                        elem_ty: cty,
                    },
                });
                Ok(())
            }
            Ir::NonPrimitiveSlicing(reg, obj, start, end) => {
                self.pos += 1;
                let obj_ty = self.lookup(&obj)?;

                // The runtime's `list_slice` takes no open-ended sentinel, so
                // an absent bound is resolved here to a concrete literal: `0`
                // for a missing start, the object's statically known length
                // for a missing end. A present bound is used as-is (by name,
                // so later constant folding can still simplify it).
                let start_expr = match &start {
                    Some(s) => CExpr::id(s.clone()),
                    None => CExpr::Literal(CValue::Int(0)),
                };
                let end_expr = match &end {
                    Some(e) => CExpr::id(e.clone()),
                    None => CExpr::Literal(CValue::Int(self.list_length(&obj)? as i64)),
                };

                if let (Some(s), Some(e)) = (&start, &end) {
                    if let (Some(&sv), Some(&ev)) = (self.const_int.get(s), self.const_int.get(e)) {
                        if ev >= sv {
                            self.list_len.insert(reg.clone(), (ev - sv) as usize);
                        }
                    }
                } else if start.is_none() {
                    let len = self.list_length(&obj)?;
                    match &end {
                        Some(e) => {
                            if let Some(&ev) = self.const_int.get(e) {
                                self.list_len.insert(reg.clone(), ev.min(len as i64).max(0) as usize);
                            }
                        }
                        None => {
                            self.list_len.insert(reg.clone(), len);
                        }
                    }
                } else if let Some(s) = &start {
                    if let Some(&sv) = self.const_int.get(s) {
                        let len = self.list_length(&obj)?;
                        self.list_len
                            .insert(reg.clone(), (len as i64 - sv).max(0) as usize);
                    }
                }

                self.declare(&reg, obj_ty);
                out.push(CStmt::DeclAssign {
                    name: reg,
                    ty: CType::ListPtr,
                    value: CExpr::Slice {
                        obj: Box::new(CExpr::id(obj)),
                        start: Box::new(start_expr),
                        end: Box::new(end_expr),
                    },
                });
                Ok(())
            }
            Ir::GetLength(reg, list_reg) => {
                self.pos += 1;
                let len = self.list_length(&list_reg)?;
                self.const_int.insert(reg.clone(), len as i64);
                self.declare(&reg, Type::int());
                out.push(CStmt::DeclAssign {
                    name: reg,
                    ty: CType::Int,
                    value: CExpr::Literal(CValue::Int(len as i64)),
                });
                Ok(())
            }
            Ir::Argument(_, call_reg, n) => {
                self.pos += 1;
                let mut arg_regs = Vec::with_capacity(n);
                for _ in 0..n {
                    let Ir::ArgumentVal(r) = self.next()? else {
                        return Err(CompileError::ir_cast("expected argument value"));
                    };
                    arg_regs.push(r);
                }
                let Ir::FunctionCall(name, call_reg_check) = self.next()? else {
                    return Err(CompileError::ir_cast("expected function call"));
                };
                debug_assert_eq!(call_reg, call_reg_check);
                let Ir::FunctionReturn(ret_reg) = self.next()? else {
                    return Err(CompileError::ir_cast("expected function return"));
                };

                let mut arg_types = Vec::with_capacity(arg_regs.len());
                for r in &arg_regs {
                    arg_types.push(self.lookup(r)?);
                }
                let (mangled, ret_ty) = if let Some(resolved) =
                    resolve_builtin_call(&name, &arg_types)
                {
                    resolved
                } else {
                    let (mangled, ret) = self
                        .mangle_st
                        .get_c_function(&Id(name.clone()), &arg_types)?;
                    (mangled, ret.as_ref().map(to_ctype))
                };
                let call = CExpr::Call(mangled, arg_regs.into_iter().map(CExpr::id).collect());
                match ret_ty {
                    Some(ty) => {
                        self.declare(&ret_reg, match &ty {
                            CType::Int => Type::int(),
                            CType::Float => Type::float(),
                            CType::Bool => Type::bool(),
                            CType::Str => Type::str(),
                            CType::None => Type::none(),
                            CType::ListPtr => {
                                Type::NonPrimitive(tabc_parser::ast::CollectionKind::List, None)
                            }
                        });
                        out.push(CStmt::DeclAssign {
                            name: ret_reg,
                            ty,
                            value: call,
                        });
                    }
                    None => out.push(CStmt::ExprStmt(call)),
                }
                Ok(())
            }
            Ir::ReturnStmt(reg) => {
                self.pos += 1;
                out.push(CStmt::Return(match reg {
                    Some(r) => {
                        self.lookup(&r)?;
                        Some(CExpr::id(r))
                    }
                    None => None,
                }));
                Ok(())
            }
            other => Err(CompileError::ir_cast(format!(
                "unexpected instruction in statement position: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabc_parser::ast::CollectionKind;

    #[test]
    fn tuple_assignment_aliases_rather_than_copies() {
        let ir = vec![
            Ir::PrimitiveLiteral("_t0_".into(), Literal::Int(1)),
            Ir::PrimitiveLiteral("_t1_".into(), Literal::Int(2)),
            Ir::List("_t2_".into(), CollectionKind::Tuple, 2),
            Ir::ListVal("_t0_".into()),
            Ir::ListVal("_t1_".into()),
            Ir::Assignment("a".into(), "_t2_".into()),
            Ir::Assignment("b".into(), "a".into()),
        ];
        let st = SymbolTable::new();
        let program = build(&ir, &st).expect("tuple aliasing program should build");

        let b_stmt = program
            .main_body
            .iter()
            .find(|s| matches!(s, CStmt::Assign { name, .. } if name == "b"))
            .expect("assignment to 'b' should be a plain reassignment, not a fresh declaration");
        match b_stmt {
            CStmt::Assign { value, .. } => {
                assert!(
                    matches!(value, CExpr::Id(id) if id == "a"),
                    "tuple assignment should copy the pointer by referencing 'a' directly, not rebuild the tuple"
                );
            }
            other => panic!("expected CStmt::Assign, found {other:?}"),
        }
    }

    #[test]
    fn slice_with_literal_bounds_tracks_a_length() {
        let ir = vec![
            Ir::PrimitiveLiteral("_t0_".into(), Literal::Int(1)),
            Ir::List("_t1_".into(), CollectionKind::List, 1),
            Ir::ListVal("_t0_".into()),
            Ir::PrimitiveLiteral("_t2_".into(), Literal::Int(0)),
            Ir::NonPrimitiveSlicing("_t3_".into(), "_t1_".into(), Some("_t2_".into()), None),
            Ir::GetLength("_t4_".into(), "_t3_".into()),
        ];
        let st = SymbolTable::new();
        let program = build(&ir, &st)
            .expect("a slice whose bounds are known at compile time should carry a tracked length");
        assert!(program
            .main_body
            .iter()
            .any(|s| matches!(s, CStmt::DeclAssign { name, .. } if name == "_t4_")));
    }

    #[test]
    fn slice_with_unknown_bound_has_no_tracked_length() {
        // `_t2_` comes out of a binary operation, which the builder never
        // constant-folds, so its value is unknown here; the slice's length
        // cannot be derived, and a later consumer that needs a static length
        // (here, `GetLength`, standing in for a for-list loop) must fail
        // rather than silently emit an unbounded loop.
        let ir = vec![
            Ir::PrimitiveLiteral("_t0_".into(), Literal::Int(1)),
            Ir::List("_t1_".into(), CollectionKind::List, 1),
            Ir::ListVal("_t0_".into()),
            Ir::PrimitiveLiteral("_t5_".into(), Literal::Int(0)),
            Ir::PrimitiveLiteral("_t6_".into(), Literal::Int(0)),
            Ir::BinaryOperation(
                "_t2_".into(),
                "_t5_".into(),
                "_t6_".into(),
                BinOp::Add,
            ),
            Ir::NonPrimitiveSlicing("_t3_".into(), "_t1_".into(), Some("_t2_".into()), None),
            Ir::GetLength("_t4_".into(), "_t3_".into()),
        ];
        let st = SymbolTable::new();
        let err = build(&ir, &st).expect_err("slicing on an unknown bound must not fabricate a length");
        assert!(err.to_string().contains("not known at compile time"));
    }
}
