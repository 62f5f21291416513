//! Parser front end: fragment text to an oxc [`Program`].

use jsrepl_types::ParseError;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Parse `source` as an ECMAScript module.
///
/// Module goal is required so top-level `await` and `import` declarations
/// are accepted. Any diagnostic fails the parse; no partially recovered tree
/// is ever handed to a pass.
pub(crate) fn parse<'a>(allocator: &'a Allocator, source: &'a str) -> Result<Program<'a>, ParseError> {
    let ret = Parser::new(allocator, source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Err(ParseError::new(
            ret.errors.iter().map(|e| e.to_string()).collect(),
        ));
    }
    if ret.panicked {
        return Err(ParseError::new(vec!["unrecoverable syntax error".into()]));
    }
    Ok(ret.program)
}
