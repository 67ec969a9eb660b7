//! Status frame renderer.

use crate::error::Result;
use crate::markup::MarkupParser;
use crate::memory::MemoryView;
use crate::module::{ComputeModule, Export};

/// Fetches the module's current frame and parses it to HTML.
///
/// The frame pointer is queried on every call and the string copied out
/// at once, so module-side double buffering is invisible here. Rendering
/// the same frame twice yields the same HTML.
///
/// # Errors
///
/// Returns an error if the module does not export `get_frame` or the call
/// traps.
pub fn render_frame<M: ComputeModule + ?Sized>(
    module: &mut M,
    view: &MemoryView,
    parser: &MarkupParser,
) -> Result<String> {
    let ptr = module.pointer(Export::GetFrame)?;
    let text = view.read_cstring(module, ptr);
    Ok(parser.parse(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ScriptedModule;

    #[test]
    fn test_frame_is_parsed() {
        let mut module = ScriptedModule::new();
        module.set_frame("\x1b[34mOS\x1b[0m: kernel");
        let html =
            render_frame(&mut module, &MemoryView::default(), &MarkupParser::default()).unwrap();
        assert_eq!(html, r#"<span style="color: #97b1f1">OS</span>: kernel"#);
    }

    #[test]
    fn test_frame_is_idempotent() {
        let mut module = ScriptedModule::new();
        module.set_frame("cpu <1%>");
        let view = MemoryView::default();
        let parser = MarkupParser::default();
        let first = render_frame(&mut module, &view, &parser).unwrap();
        let second = render_frame(&mut module, &view, &parser).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "cpu &lt;1%&gt;");
    }

    #[test]
    fn test_missing_frame_export() {
        let mut module = ScriptedModule::new().without_export(Export::GetFrame);
        let result = render_frame(&mut module, &MemoryView::default(), &MarkupParser::default());
        assert!(result.is_err());
    }
}
