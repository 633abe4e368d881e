//! Register-based three-address IR and the generator that lowers a
//! type-checked source AST into it.
//!
//! Generation cannot fail: by the time it runs, the type checker has already
//! validated the program, so every lowering here is a pure structural
//! translation.

use tabc_parser::ast::{BinOp, Block, CollectionKind, Expr, Id, Literal, RangeValues, Stmt, UnOp};

/// Where a `LstAdd` inserts: only `End` is reachable from this language's
/// grammar (there is no `insert(idx, val)`), but the IR keeps the int case
/// for fidelity with the documented instruction shape.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexTarget {
    End,
    Int(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ir {
    Label(String),
    Goto(String),
    IfStmt(String, String),
    ElifStmt(String, String),

    PrimitiveLiteral(String, Literal),
    StringLit(String, usize),
    StringChar(String, char),
    BinaryOperation(String, String, String, BinOp),
    UnaryOperation(String, UnOp, String),
    Assignment(String, String),

    List(String, CollectionKind, usize),
    ListVal(String),
    LstAdd(String, String, IndexTarget),
    NonPrimitiveIndex(String, String, String),
    NonPrimitiveSlicing(String, String, Option<String>, Option<String>),
    GetLength(String, String),

    Parameter(String, usize),
    ParameterVal(String, String),
    Argument(String, String, usize),
    ArgumentVal(String),
    FunctionCall(String, String),
    FunctionReturn(String),
    ReturnStmt(Option<String>),

    LoopStart(String, String),
    LoopStop(String, String),
    LoopStep(String, String),
    ForLoopVar(String),
}

impl Ir {
    /// One readable line, used for the `<name>.ir.txt` dump.
    pub fn to_line(&self) -> String {
        match self {
            Ir::Label(l) => format!("{l}:"),
            Ir::Goto(l) => format!("    goto {l}"),
            Ir::IfStmt(cond, l) => format!("    if_false {cond} -> {l}"),
            Ir::ElifStmt(cond, l) => format!("    elif_false {cond} -> {l}"),
            Ir::PrimitiveLiteral(r, lit) => format!("    {r} = {lit:?}"),
            Ir::StringLit(r, n) => format!("    {r} = string[{n}]"),
            Ir::StringChar(r, c) => format!("    {r} += '{c}'"),
            Ir::BinaryOperation(r, l, rhs, op) => format!("    {r} = {l} {op:?} {rhs}"),
            Ir::UnaryOperation(r, op, o) => format!("    {r} = {op:?} {o}"),
            Ir::Assignment(name, v) => format!("    {name} = {v}"),
            Ir::List(r, kind, n) => format!("    {r} = {kind:?}[{n}]"),
            Ir::ListVal(r) => format!("    list_val {r}"),
            Ir::LstAdd(obj, val, idx) => format!("    {obj}.add({val}, {idx:?})"),
            Ir::NonPrimitiveIndex(r, obj, idx) => format!("    {r} = {obj}[{idx}]"),
            Ir::NonPrimitiveSlicing(r, obj, s, e) => {
                format!("    {r} = {obj}[{s:?}:{e:?}]")
            }
            Ir::GetLength(r, p) => format!("    {r} = len({p})"),
            Ir::Parameter(r, n) => format!("    params {r}[{n}]"),
            Ir::ParameterVal(r, name) => format!("    param {r} = {name}"),
            Ir::Argument(r, call_reg, n) => format!("    args {r}[{n}] -> {call_reg}"),
            Ir::ArgumentVal(r) => format!("    arg {r}"),
            Ir::FunctionCall(name, r) => format!("    {r} = call {name}"),
            Ir::FunctionReturn(r) => format!("    return_val {r}"),
            Ir::ReturnStmt(r) => format!("    return {r:?}"),
            Ir::LoopStart(r, v) => format!("    {r} = loop_start {v}"),
            Ir::LoopStop(r, v) => format!("    {r} = loop_stop {v}"),
            Ir::LoopStep(r, v) => format!("    {r} = loop_step {v}"),
            Ir::ForLoopVar(r) => format!("    for_loop_var {r}"),
        }
    }
}

pub struct IrGen {
    ir: Vec<Ir>,
    register_count: u32,
    label_count: u32,
    aux_count: u32,
    cond_label_stack: Vec<String>,
    cond_label_idx_stack: Vec<usize>,
}

impl Default for IrGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IrGen {
    pub fn new() -> Self {
        Self {
            ir: Vec::new(),
            register_count: 0,
            label_count: 0,
            aux_count: 0,
            cond_label_stack: Vec::new(),
            cond_label_idx_stack: Vec::new(),
        }
    }

    pub fn generate(block: &Block) -> Vec<Ir> {
        let mut gen = Self::new();
        gen.gen_block(block);
        gen.ir
    }

    fn push(&mut self, instr: Ir) {
        self.ir.push(instr);
    }

    fn inc_register(&mut self) -> String {
        let name = format!("_t{}_", self.register_count);
        self.register_count += 1;
        name
    }

    /// A hidden non-temporary name (no leading underscore, so downstream
    /// stages treat it as a plain variable) for loop-internal bookkeeping.
    fn fresh_aux(&mut self, prefix: &str) -> String {
        let name = format!("{prefix}_{}", self.aux_count);
        self.aux_count += 1;
        name
    }

    fn inc_label(&mut self, kind: Option<&str>) -> String {
        let name = match kind {
            Some(kind) => format!("L_{kind}_{}", self.label_count),
            None => format!("L_{}", self.label_count),
        };
        self.label_count += 1;
        name
    }

    fn gen_block(&mut self, block: &Block) {
        for stmt in block {
            self.gen_stmt(stmt);
        }
    }

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assignment { target, value, .. } => {
                let value_reg = self.gen_expr(value);
                self.push(Ir::Assignment(target.0.clone(), value_reg));
            }
            Stmt::If { cond, body } => self.gen_if(cond, body),
            Stmt::Elif { cond, body } => self.gen_elif(cond, body),
            Stmt::Else { body } => self.gen_else(body),
            Stmt::While { cond, body } => self.gen_while(cond, body),
            Stmt::ForLoopRange { var, range, body } => self.gen_for_range(var, range, body),
            Stmt::ForLoopList { var, list, body } => self.gen_for_list(var, list, body),
            Stmt::FunctionDef {
                name, params, body, ..
            } => self.gen_function_def(name, params, body),
            Stmt::Return(expr) => {
                let reg = expr.as_ref().map(|e| self.gen_expr(e));
                self.push(Ir::ReturnStmt(reg));
            }
            Stmt::LstAppend { obj, val } => {
                let obj_reg = self.gen_expr(obj);
                let val_reg = self.gen_expr(val);
                self.push(Ir::LstAdd(obj_reg, val_reg, IndexTarget::End));
            }
            Stmt::Expr(expr) => {
                self.gen_expr(expr);
            }
        }
    }

    fn gen_expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::PrimitiveLiteral(Literal::Str(s)) => self.gen_string(s),
            Expr::PrimitiveLiteral(lit) => {
                let reg = self.inc_register();
                self.push(Ir::PrimitiveLiteral(reg.clone(), lit.clone()));
                reg
            }
            Expr::NonPrimitiveLiteral(kind, children) => {
                let child_regs: Vec<String> = children.iter().map(|c| self.gen_expr(c)).collect();
                let reg = self.inc_register();
                self.push(Ir::List(reg.clone(), *kind, children.len()));
                for cr in child_regs {
                    self.push(Ir::ListVal(cr));
                }
                reg
            }
            Expr::Id(name) => name.0.clone(),
            Expr::BinaryOp(op, left, right) => {
                let left_reg = self.gen_expr(left);
                let right_reg = self.gen_expr(right);
                let result = self.inc_register();
                self.push(Ir::BinaryOperation(
                    result.clone(),
                    left_reg,
                    right_reg,
                    *op,
                ));
                result
            }
            Expr::UnaryOp(op, operand) => {
                let operand_reg = self.gen_expr(operand);
                let result = self.inc_register();
                self.push(Ir::UnaryOperation(result.clone(), *op, operand_reg));
                result
            }
            Expr::FunctionCall(name, args) => self.gen_call(name, args),
            Expr::NonPrimitiveIndex(obj, idx) => {
                let obj_reg = self.gen_expr(obj);
                let idx_reg = self.gen_expr(idx);
                let result = self.inc_register();
                self.push(Ir::NonPrimitiveIndex(result.clone(), obj_reg, idx_reg));
                result
            }
            Expr::NonPrimitiveSlicing(obj, start, end) => {
                let obj_reg = self.gen_expr(obj);
                let start_reg = start.as_ref().map(|e| self.gen_expr(e));
                let end_reg = end.as_ref().map(|e| self.gen_expr(e));
                let result = self.inc_register();
                self.push(Ir::NonPrimitiveSlicing(
                    result.clone(),
                    obj_reg,
                    start_reg,
                    end_reg,
                ));
                result
            }
        }
    }

    fn gen_string(&mut self, s: &str) -> String {
        let reg = self.inc_register();
        self.push(Ir::StringLit(reg.clone(), s.chars().count()));
        for c in s.chars() {
            let _char_reg = self.inc_register();
            self.push(Ir::StringChar(reg.clone(), c));
        }
        reg
    }

    fn gen_call(&mut self, name: &Id, args: &[Expr]) -> String {
        let arg_regs: Vec<String> = args.iter().map(|a| self.gen_expr(a)).collect();
        let group_reg = self.inc_register();
        let call_reg = self.inc_register();
        self.push(Ir::Argument(group_reg, call_reg.clone(), args.len()));
        for r in arg_regs {
            self.push(Ir::ArgumentVal(r));
        }
        self.push(Ir::FunctionCall(name.0.clone(), call_reg));
        let ret_reg = self.inc_register();
        self.push(Ir::FunctionReturn(ret_reg.clone()));
        ret_reg
    }

    fn gen_function_def(&mut self, name: &Id, params: &[tabc_parser::ast::Param], body: &Block) {
        let skip_label = self.inc_label(None);
        self.push(Ir::Goto(skip_label.clone()));
        let func_label = self.inc_label(Some(&format!("FUNC_{}", name.0)));
        self.push(Ir::Label(func_label));
        let group_reg = self.inc_register();
        self.push(Ir::Parameter(group_reg, params.len()));
        for param in params {
            let reg = self.inc_register();
            self.push(Ir::ParameterVal(reg, param.name.0.clone()));
        }
        self.gen_block(body);
        self.push(Ir::Label(skip_label));
    }

    /// The if/elif/else splice algorithm: `elif`/`else` generate into a
    /// scratch buffer, then splice it into the main buffer right before the
    /// chain's recorded end label, advancing the recorded index so a
    /// following elif/else splices after this one.
    fn gen_if(&mut self, cond: &Expr, body: &Block) {
        let false_label = self.inc_label(None);
        let cond_reg = self.gen_expr(cond);
        self.push(Ir::IfStmt(cond_reg, false_label.clone()));
        self.gen_block(body);
        let end_label = self.inc_label(None);
        self.push(Ir::Goto(end_label.clone()));
        self.push(Ir::Label(false_label));
        self.cond_label_stack.push(end_label.clone());
        self.cond_label_idx_stack.push(self.ir.len());
        self.push(Ir::Label(end_label));
    }

    fn gen_elif(&mut self, cond: &Expr, body: &Block) {
        let saved = std::mem::take(&mut self.ir);
        let false_label = self.inc_label(None);
        let cond_reg = self.gen_expr(cond);
        self.push(Ir::ElifStmt(cond_reg, false_label.clone()));
        self.gen_block(body);
        // The parser rejects an `elif` that does not immediately follow an
        // `if`/`elif` at the same indentation (`ParseError::DanglingBranch`),
        // so by the time IR generation sees one, these stacks are never empty.
        let end_label = match self.cond_label_stack.last() {
            Some(label) => label.clone(),
            None => unreachable!("elif without a preceding if should have been rejected by the parser"),
        };
        self.push(Ir::Goto(end_label));
        self.push(Ir::Label(false_label));

        let elif_ir = std::mem::replace(&mut self.ir, saved);
        let idx = match self.cond_label_idx_stack.last() {
            Some(idx) => *idx,
            None => unreachable!("elif without a preceding if should have been rejected by the parser"),
        };
        let len_elif = elif_ir.len();
        self.ir.splice(idx..idx, elif_ir);
        match self.cond_label_idx_stack.last_mut() {
            Some(idx) => *idx += len_elif,
            None => unreachable!("elif without a preceding if should have been rejected by the parser"),
        }
    }

    fn gen_else(&mut self, body: &Block) {
        let saved = std::mem::take(&mut self.ir);
        self.gen_block(body);
        let else_ir = std::mem::replace(&mut self.ir, saved);
        // Same invariant as `gen_elif`: the parser already rejected a
        // dangling `else`, so this stack is guaranteed non-empty here.
        let idx = match self.cond_label_idx_stack.last() {
            Some(idx) => *idx,
            None => unreachable!("else without a preceding if should have been rejected by the parser"),
        };
        self.ir.splice(idx..idx, else_ir);
        self.cond_label_idx_stack.pop();
        self.cond_label_stack.pop();
    }

    fn gen_while(&mut self, cond: &Expr, body: &Block) {
        let loop_label = self.inc_label(Some("WHILE"));
        self.push(Ir::Label(loop_label.clone()));
        let cond_reg = self.gen_expr(cond);
        let end_label = self.inc_label(None);
        self.push(Ir::IfStmt(cond_reg, end_label.clone()));
        self.gen_block(body);
        self.push(Ir::Goto(loop_label));
        self.push(Ir::Label(end_label));
    }

    fn gen_for_range(&mut self, var: &Id, range: &RangeValues, body: &Block) {
        let start_expr = range
            .start
            .clone()
            .unwrap_or(Expr::PrimitiveLiteral(Literal::Int(0)));
        let step_expr = range
            .step
            .clone()
            .unwrap_or(Expr::PrimitiveLiteral(Literal::Int(1)));

        let start_val = self.gen_expr(&start_expr);
        let start_reg = self.inc_register();
        self.push(Ir::LoopStart(start_reg.clone(), start_val));

        let stop_val = self.gen_expr(&range.stop);
        let stop_reg = self.inc_register();
        self.push(Ir::LoopStop(stop_reg.clone(), stop_val));

        let step_val = self.gen_expr(&step_expr);
        let step_reg = self.inc_register();
        self.push(Ir::LoopStep(step_reg.clone(), step_val));

        let loop_label = self.inc_label(Some("FORRANGE"));
        self.push(Ir::Label(loop_label.clone()));
        self.push(Ir::Assignment(var.0.clone(), start_reg));

        let cond_reg = self.inc_register();
        self.push(Ir::BinaryOperation(
            cond_reg.clone(),
            var.0.clone(),
            stop_reg,
            BinOp::Lt,
        ));
        let end_label = self.inc_label(None);
        self.push(Ir::IfStmt(cond_reg, end_label.clone()));

        self.gen_block(body);

        self.push(Ir::Goto(loop_label));
        self.push(Ir::Label(end_label));
    }

    /// The stepping literal register always holds `1`; it tells the C-AST
    /// builder the increment amount for the hidden counter it declares for
    /// this loop, the same way `LoopStep` does for a range loop. The
    /// counter itself (`idx_reg` here) is a hidden register, distinct from
    /// the user-facing element variable `var`, that the builder promotes to
    /// a real declared loop variable -- `var` only ever holds the current
    /// element, never a position.
    fn gen_for_list(&mut self, var: &Id, list_expr: &Expr, body: &Block) {
        let list_reg = self.gen_expr(list_expr);
        let len_reg = self.inc_register();
        self.push(Ir::GetLength(len_reg, list_reg.clone()));

        let idx_reg = self.fresh_aux("idx");
        self.push(Ir::PrimitiveLiteral(idx_reg.clone(), Literal::Int(0)));

        let step_reg = self.fresh_aux("step");
        self.push(Ir::PrimitiveLiteral(step_reg, Literal::Int(1)));

        let loop_label = self.inc_label(Some("FORLIST"));
        self.push(Ir::Label(loop_label.clone()));

        let cond_reg = self.inc_register();
        self.push(Ir::BinaryOperation(
            cond_reg.clone(),
            idx_reg.clone(),
            len_reg,
            BinOp::Lt,
        ));
        let end_label = self.inc_label(None);
        self.push(Ir::IfStmt(cond_reg, end_label.clone()));

        self.push(Ir::ForLoopVar(var.0.clone()));
        self.push(Ir::NonPrimitiveIndex(var.0.clone(), list_reg, idx_reg));

        self.gen_block(body);

        self.push(Ir::Goto(loop_label));
        self.push(Ir::Label(end_label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen(src: &str) -> Vec<Ir> {
        let block = tabc_parser::parse(src).unwrap();
        IrGen::generate(&block)
    }

    #[test]
    fn every_goto_targets_a_defined_label() {
        let ir = gen(
            "if True:\n\tx: int = 1\nelif False:\n\tx: int = 2\nelse:\n\tx: int = 3\nprint(x)\n",
        );
        let labels: std::collections::HashSet<&str> = ir
            .iter()
            .filter_map(|i| match i {
                Ir::Label(l) => Some(l.as_str()),
                _ => None,
            })
            .collect();
        for instr in &ir {
            match instr {
                Ir::Goto(l) | Ir::IfStmt(_, l) | Ir::ElifStmt(_, l) => {
                    assert!(labels.contains(l.as_str()), "undefined label {l}");
                }
                _ => {}
            }
        }
    }

    #[test]
    fn function_return_always_follows_function_call() {
        let ir = gen("def f(x: int) -> int:\n\treturn x\ny: int = f(1)\n");
        for (i, instr) in ir.iter().enumerate() {
            if let Ir::FunctionCall(..) = instr {
                assert!(matches!(ir.get(i + 1), Some(Ir::FunctionReturn(_))));
            }
        }
    }

    #[test]
    fn if_body_ends_with_goto_end_label() {
        let ir = gen("if True:\n\tprint(1)\n");
        let if_pos = ir.iter().position(|i| matches!(i, Ir::IfStmt(..))).unwrap();
        let Ir::IfStmt(_, false_label) = &ir[if_pos] else {
            unreachable!()
        };
        let false_pos = ir
            .iter()
            .position(|i| matches!(i, Ir::Label(l) if l == false_label))
            .unwrap();
        assert!(matches!(ir[false_pos - 1], Ir::Goto(_)));
    }

    #[test]
    fn for_range_loop_increments_additively() {
        let ir = gen("s: int = 0\nfor i in range(1, 4):\n\ts = s + i\nprint(s)\n");
        assert!(ir.iter().any(|i| matches!(i, Ir::LoopStart(..))));
        assert!(ir.iter().any(|i| matches!(i, Ir::LoopStop(..))));
        assert!(ir.iter().any(|i| matches!(i, Ir::LoopStep(..))));
    }

    #[test]
    fn for_list_index_register_is_not_the_element_variable() {
        let ir = gen("xs: [int] = []\nxs.append(1)\nfor x in xs:\n\tprint(x)\n");
        let (elem_reg, idx_reg) = ir
            .iter()
            .find_map(|i| match i {
                Ir::NonPrimitiveIndex(elem, _, idx) => Some((elem.clone(), idx.clone())),
                _ => None,
            })
            .expect("for-list lowers to a NonPrimitiveIndex");
        assert_ne!(elem_reg, idx_reg, "the element var must not double as the position counter");
        assert!(ir.iter().any(|i| matches!(i, Ir::PrimitiveLiteral(r, Literal::Int(0)) if *r == idx_reg)));
    }
}
