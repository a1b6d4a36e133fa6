//! Desugaring passes for the Lyra compiler.
//!
//! The centerpiece is [`desugar_type_classes`], which lowers type class and
//! instance declarations into ordinary record-valued definitions:
//!
//! - each class becomes a record type synonym (its dictionary type) plus one
//!   accessor function per member;
//! - each instance becomes a value definition constructing a dictionary
//!   record, with members scheduled in dependency order;
//! - references to the new instance values are appended to the module's
//!   export list where the class and head types are visible.
//!
//! Later stages need not know type classes exist; they see only records,
//! functions, and constrained value types.

#![warn(missing_docs)]

pub mod cases;
pub mod classes;
pub mod errors;
pub mod instances;
pub mod member_map;
pub mod supply;

use lyra_ast::{Declaration, DeclarationRef, Module, ModuleName};
use lyra_externs::ExternsFile;
use tracing::debug;

pub use errors::{DesugarError, DesugarResult};
pub use member_map::{MemberMap, TypeClassData};
pub use supply::NameSupply;

/// Lower every type class and instance declaration in the given modules.
///
/// `externs` supply class metadata from previously compiled modules. Modules
/// are processed in order; within a module, the first failure aborts that
/// module. Failures across modules are collected and reported together.
///
/// # Errors
///
/// Returns the failing module's error, or [`DesugarError::Multiple`] when
/// more than one module failed.
pub fn desugar_type_classes(
    externs: &[ExternsFile],
    modules: Vec<Module>,
) -> DesugarResult<Vec<Module>> {
    let mut context = DesugarContext::new(externs);
    let mut out = Vec::with_capacity(modules.len());
    let mut failures = Vec::new();
    for module in modules {
        match context.desugar_module(module) {
            Ok(module) => out.push(module),
            Err(error) => failures.push(error),
        }
    }
    match failures.len() {
        0 => Ok(out),
        1 => Err(failures.remove(0)),
        _ => Err(DesugarError::Multiple(failures)),
    }
}

/// The state threaded through one desugaring run: the class metadata table
/// and the fresh-name supply. Owned by the pass and dropped with it.
pub struct DesugarContext {
    member_map: MemberMap,
    supply: NameSupply,
}

impl DesugarContext {
    /// A context seeded from the primitive classes and the given externs.
    #[must_use]
    pub fn new(externs: &[ExternsFile]) -> Self {
        Self {
            member_map: member_map::member_map_from_externs(externs),
            supply: NameSupply::new(),
        }
    }

    /// Desugar the classes and instances of one module.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any declaration of the module.
    pub fn desugar_module(&mut self, module: Module) -> DesugarResult<Module> {
        debug!(module = %module.name, "desugaring type classes");
        let mut exports = module.exports.ok_or_else(|| {
            DesugarError::Internal(format!(
                "exports of {} should have been elaborated before type class desugaring",
                module.name
            ))
        })?;

        // Classes must be processed before the instances that mention them;
        // the sort is stable so everything else keeps its source order.
        let mut declarations = module.declarations;
        declarations.sort_by_key(|decl| !decl.is_type_class());

        let mut out = Vec::with_capacity(declarations.len());
        let mut instance_refs = Vec::new();
        for declaration in declarations {
            let (instance_ref, replacements) =
                self.desugar_declaration(&module.name, &exports, declaration)?;
            instance_refs.extend(instance_ref);
            out.extend(replacements);
        }
        exports.extend(instance_refs);

        Ok(Module {
            file: module.file,
            span: module.span,
            comments: module.comments,
            name: module.name,
            declarations: out,
            exports: Some(exports),
        })
    }

    fn desugar_declaration(
        &mut self,
        module_name: &ModuleName,
        exports: &[DeclarationRef],
        declaration: Declaration,
    ) -> DesugarResult<(Option<DeclarationRef>, Vec<Declaration>)> {
        match declaration {
            Declaration::TypeClass(class) => Ok((
                None,
                classes::desugar_class(&mut self.member_map, module_name, class)?,
            )),
            Declaration::TypeInstance(instance) => instances::desugar_instance(
                &self.member_map,
                &mut self.supply,
                module_name,
                exports,
                instance,
            ),
            Declaration::Positioned(span, inner) => {
                let (instance_ref, replacements) =
                    self.desugar_declaration(module_name, exports, *inner)?;
                // Generated declarations inherit the position of the
                // declaration they came from.
                let replacements = replacements
                    .into_iter()
                    .map(|decl| Declaration::Positioned(span, Box::new(decl)))
                    .collect();
                Ok((instance_ref, replacements))
            }
            other => Ok((None, vec![other])),
        }
    }
}
