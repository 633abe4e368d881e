//! Orchestrates the five compilation stages front to back: parse, type-check,
//! generate IR, rebuild the C-AST, emit C text. Each stage's failure is
//! already stage-tagged by the time it reaches here (see [`crate::error`]);
//! this module's only job is sequencing, not further wrapping.

use tabc_parser::ast::Block;

use crate::cast::CProgram;
use crate::cast_builder;
use crate::emitter;
use crate::error::CompileResult;
use crate::ir::{Ir, IrGen};
use crate::symbol_table::SymbolTable;
use crate::type_checker::TypeChecker;

/// Everything produced along the way, not just the final C text: callers
/// that want the IR dump (the CLI's `<name>.ir.txt`) or the raw C-AST need
/// access to the intermediate stages too.
pub struct CompileArtifacts {
    pub symbol_table: SymbolTable,
    pub ir: Vec<Ir>,
    pub cast: CProgram,
    pub c_source: String,
}

/// Runs the full pipeline over already-parsed source.
pub fn compile_block(block: &Block, optimize: bool) -> CompileResult<CompileArtifacts> {
    let mut checker = TypeChecker::new();
    checker.check_program(block)?;

    let ir = IrGen::generate(block);
    let cast = cast_builder::build(&ir, &checker.st)?;
    let c_source = emitter::emit(&cast, optimize);

    Ok(CompileArtifacts {
        symbol_table: checker.st,
        ir,
        cast,
        c_source,
    })
}

/// Parses `source` and runs it through the full pipeline.
pub fn compile_source(source: &str, optimize: bool) -> CompileResult<CompileArtifacts> {
    let block = tabc_parser::parse(source)?;
    compile_block(&block, optimize)
}

/// Renders the IR as the line-oriented dump format written to `<name>.ir.txt`.
pub fn dump_ir(ir: &[Ir]) -> String {
    ir.iter().map(Ir::to_line).collect::<Vec<_>>().join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_arithmetic_and_print_to_c() {
        let artifacts = compile_source("x: int = 1 + 2\nprint(x)\n", false).unwrap();
        assert!(artifacts.c_source.contains("#include \"../starter.c\""));
        assert!(artifacts.c_source.contains("print_int"));
    }

    #[test]
    fn optimizer_folds_the_same_program_to_a_constant_print() {
        let artifacts = compile_source("x: int = 1 + 2\nprint(x)\n", true).unwrap();
        assert!(artifacts.c_source.contains("print_int(3)"));
    }

    #[test]
    fn redeclaration_fails_at_the_type_check_stage() {
        let err = compile_source("x: int = 1\nx: int = 2\n", false).unwrap_err();
        assert!(err.to_string().contains("Redeclaring variable"));
    }

    #[test]
    fn ir_dump_is_one_line_per_instruction() {
        let artifacts = compile_source("x: int = 1\n", false).unwrap();
        let dump = dump_ir(&artifacts.ir);
        assert_eq!(dump.lines().count(), artifacts.ir.len());
    }
}
