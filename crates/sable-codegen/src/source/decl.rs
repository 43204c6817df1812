//! Type and method declarations.

use sable_core::{
    BoundProgram, Builtin, EmitError, InitializerKind, MethodSymbol, Modifiers, TypeDecl, TypeKind,
};

use super::expr::{ENTRY_NAME, ExprRenderer, PROGRAM_CLASS};
use super::stmt::StmtWriter;
use super::writer::SourceWriter;
use crate::sanitize::sanitize;

type Result<T> = std::result::Result<T, EmitError>;

/// Writes the declarations of one program.
pub(super) struct DeclWriter<'w, 'a> {
    pub out: &'w mut SourceWriter,
    pub exprs: &'w ExprRenderer,
    pub program: &'w BoundProgram<'a>,
}

impl<'w, 'a> DeclWriter<'w, 'a> {
    /// `public class Name<T> : Base` and its members.
    pub fn write_type(&mut self, decl: &'a TypeDecl<'a>) -> Result<()> {
        let symbol = decl.symbol;
        let keyword = match symbol.kind {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            other => {
                return Err(EmitError::invalid(format!(
                    "type declaration '{}' has kind {other:?}",
                    symbol.name
                )));
            }
        };
        let is_abstract = decl
            .methods
            .iter()
            .any(|m| m.modifiers.contains(Modifiers::ABSTRACT));

        let mut header = format!("public {}{keyword} {}", if is_abstract { "abstract " } else { "" }, sanitize(symbol.name));
        let type_params: Vec<_> = symbol
            .template_params
            .iter()
            .filter(|p| p.constant_type.is_none())
            .map(|p| sanitize(p.name))
            .collect();
        if !type_params.is_empty() {
            header.push_str(&format!("<{}>", type_params.join(", ")));
        }
        if let Some(base) = decl.base {
            header.push_str(&format!(" : {}", sanitize(base.name)));
        }
        self.out.line(header);
        self.out.open();

        let mut members = 0usize;
        for param in symbol.template_params {
            if let Some(ty) = &param.constant_type {
                self.out
                    .line(format!("private {} {};", self.exprs.ty(ty)?, sanitize(param.name)));
                members += 1;
            }
        }
        for field in decl.fields {
            self.out
                .line(format!("public {} {};", self.exprs.ty(&field.ty)?, sanitize(field.name)));
            members += 1;
        }
        for method in decl.constructors.iter().chain(decl.methods) {
            if members > 0 {
                self.out.blank();
            }
            self.write_method(method)?;
            members += 1;
        }

        self.out.close();
        Ok(())
    }

    /// The static class holding the entry point and every free function.
    pub fn write_program_class(&mut self) -> Result<()> {
        self.out.line(format!("public static class {PROGRAM_CLASS}"));
        self.out.open();

        match self.program.entry() {
            Some(entry) => self.write_method(entry)?,
            None => {
                self.out.line(format!("public static int {ENTRY_NAME}()"));
                self.out.open();
                self.out.line("return 0;");
                self.out.close();
            }
        }

        for body in self.program.all_methods() {
            let method = body.symbol;
            if method.containing_type.is_some()
                || Builtin::of(method).is_some()
                || self.exprs.is_entry(method)
            {
                continue;
            }
            self.out.blank();
            self.write_method(method)?;
        }

        self.out.close();
        Ok(())
    }

    /// Header and body of `method`. Abstract methods end at the header.
    pub fn write_method(&mut self, method: &'a MethodSymbol<'a>) -> Result<()> {
        let params = self.params(method)?;
        let header = if method.is_constructor() {
            let owner = method
                .containing_type
                .ok_or_else(|| EmitError::invalid(format!("constructor '{}' has no type", method.name)))?;
            format!("{} {}({params})", method.accessibility.keyword(), sanitize(owner.name))
        } else if self.exprs.is_entry(method) {
            format!("public static int {ENTRY_NAME}({params})")
        } else if method.containing_type.is_none() {
            format!(
                "public static {} {}({params})",
                self.exprs.ty(&method.return_type)?,
                self.exprs.method_name(method)
            )
        } else {
            format!(
                "{} {}{} {}({params})",
                method.accessibility.keyword(),
                modifier_keywords(method.modifiers),
                self.exprs.ty(&method.return_type)?,
                self.exprs.method_name(method)
            )
        };

        if method.modifiers.contains(Modifiers::ABSTRACT) {
            self.out.line(format!("{header};"));
            return Ok(());
        }
        let body = self.program.body(method.id()).ok_or_else(|| {
            EmitError::invalid(format!("method '{}' has no body", method.qualified_name()))
        })?;

        match body.initializer {
            Some(init) => {
                let keyword = match init.kind {
                    InitializerKind::This => "this",
                    InitializerKind::Base => "base",
                };
                let args = self.exprs.arguments(init.constructor.params, init.args)?;
                self.out.line(format!("{header} : {keyword}({args})"));
            }
            None => self.out.line(header),
        }
        StmtWriter::new(self.out, self.exprs, method).write_body(body.body)
    }

    fn params(&self, method: &MethodSymbol<'_>) -> Result<String> {
        let mut rendered = Vec::with_capacity(method.params.len());
        for param in method.params {
            rendered.push(format!("{} {}", self.exprs.ty(&param.ty)?, self.exprs.variable(param)));
        }
        Ok(rendered.join(", "))
    }
}

fn modifier_keywords(modifiers: Modifiers) -> &'static str {
    if modifiers.contains(Modifiers::STATIC) {
        "static "
    } else if modifiers.contains(Modifiers::ABSTRACT) {
        "abstract "
    } else if modifiers.contains(Modifiers::OVERRIDE | Modifiers::SEALED) {
        "sealed override "
    } else if modifiers.contains(Modifiers::OVERRIDE) {
        "override "
    } else if modifiers.contains(Modifiers::VIRTUAL) {
        "virtual "
    } else {
        ""
    }
}
