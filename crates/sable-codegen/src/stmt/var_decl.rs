//! Local variable declarations.

use sable_core::{BoundExpr, VariableSymbol};

use crate::function_compiler::{FunctionCompiler, Result};

impl<'e, 'l> FunctionCompiler<'e, 'l> {
    /// Allocate the local and store its initializer.
    ///
    /// The slot is allocated before the initializer runs so a declaration
    /// inside a loop reuses the same slot on every iteration.
    pub(crate) fn compile_var_decl(
        &mut self,
        variable: &'l VariableSymbol<'l>,
        initializer: &'l BoundExpr<'l>,
    ) -> Result<()> {
        self.declare_local(variable)?;
        self.compile_assignment(variable, initializer, false)
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use sable_core::testing::TreeBuilder;

    use crate::bytecode::OpCode;
    use crate::function_compiler::test_support::compile;
    use crate::module::TypeSig;

    #[test]
    fn declaration_allocates_a_typed_slot() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let name = b.local("name", b.string_type());
        let count = b.local("count", b.int_type().nullable());
        let body = b.block(&[
            b.declare(name, b.string("sable")),
            b.declare(count, b.null(b.int_type().nullable())),
        ]);
        let out = compile(&arena, main, body, 0).unwrap();
        assert_eq!(
            out.code.locals,
            vec![TypeSig::String, TypeSig::nullable(TypeSig::Int32)]
        );
        assert_eq!(
            out.ops(),
            [
                OpCode::LdStr,
                OpCode::StLoc,
                OpCode::LdLocA,
                OpCode::InitObj,
                OpCode::Ret
            ]
        );
    }
}
