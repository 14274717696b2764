//! Uses of constants declared `const C = D`.

use gofix_syntax::ast::Span;
use gofix_types::program::is_exported;

use super::{Rewrite, Site};
use crate::edit::TextEdit;
use crate::error::InlineError;
use crate::facts::ConstFact;
use crate::imports::ImportManager;

/// Replaces the use of a constant at `span` with the constant it names.
pub(crate) fn inline_constant(site: &Site<'_>, span: Span, fact: &ConstFact) -> Result<Rewrite, InlineError> {
    let mut imports = ImportManager::new(site.prog, site.imports, span.start);
    let name = &fact.rhs_name;
    let text = if fact.rhs_pkg_path.is_empty() || fact.rhs_pkg_path == site.here() {
        let obj = fact.rhs_obj.ok_or_else(|| InlineError::Shadowed {
            name: name.clone(),
            by: "nothing visible".to_string(),
        })?;
        site.check_visible(name, obj, span.start)?;
        name.clone()
    } else {
        if !is_exported(name) {
            return Err(InlineError::Unsupported("constant names an unexported constant of another package"));
        }
        let q = imports.prefix(&fact.rhs_pkg_path, &fact.rhs_pkg_name)?;
        format!("{q}.{name}")
    };
    imports.replace(span);
    let (mut edits, commit) = imports.finish();
    edits.push(TextEdit::replace(span, text));
    Ok(Rewrite { span, edits, commit })
}
