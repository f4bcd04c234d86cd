//! Diagram markup sanitization and render-output styling.
//!
//! Generated markup comes from a language model and routinely contains
//! characters and directives the renderer chokes on. Everything here runs
//! before or after the external renderer, never inside it.

use regex::Regex;
use std::sync::LazyLock;

/// Matches `linkStyle default ...;` directives, a known renderer crasher in
/// generated markup.
static LINK_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"linkStyle default[^;\n]*;?").expect("link style pattern"));

static ROOT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.root \{[^}]*\}").expect("root style pattern"));
static MAIN_CATEGORY_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.mainCategory \{[^}]*\}").expect("main category style pattern"));
static DEFAULT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.default \{[^}]*\}").expect("default style pattern"));

/// Cleans generated diagram markup before it is handed to the renderer.
///
/// Line endings are normalized to `\n`, characters outside the printable
/// ASCII range (other than newline and tab) are stripped, and known
/// problematic style directives are removed. Already-clean ASCII input with
/// unix line endings passes through unchanged.
pub fn sanitize_markup(markup: &str) -> String {
    let normalized = markup.replace("\r\n", "\n");
    let ascii: String = normalized
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || (' '..='~').contains(c))
        .collect();
    LINK_STYLE.replace_all(&ascii, "").into_owned()
}

/// Rewrites the renderer's node style classes with the house palette.
///
/// Markup without the targeted style blocks passes through unchanged, so
/// this is safe to apply to any renderer output.
pub fn apply_theme(rendered: &str) -> String {
    let themed = ROOT_STYLE.replace_all(
        rendered,
        ".root { fill:white;stroke:#F08BC3;color:#333333;stroke-width:2; }",
    );
    let themed = MAIN_CATEGORY_STYLE.replace_all(
        &themed,
        ".mainCategory { fill:white;stroke:#6495ED;color:#333333;stroke-width:2; }",
    );
    DEFAULT_STYLE
        .replace_all(
            &themed,
            ".default { fill:white;stroke:#A6ABFF;color:#333333;stroke-width:1.5; }",
        )
        .into_owned()
}

/// A rendered vector image plus its intrinsic size, used for fit math.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDiagram {
    pub svg: String,
    pub width: f32,
    pub height: f32,
}

/// Renders diagram markup into a vector image.
///
/// Implemented by the external renderer integration; swapped for a stub in
/// tests.
pub trait DiagramRenderer: Send + Sync {
    /// Renders markup to a vector image.
    ///
    /// # Returns
    ///
    /// - `Ok(RenderedDiagram)`: the rendered image and its dimensions
    /// - `Err(String)`: a human-readable failure reason
    fn render(&self, markup: &str) -> Result<RenderedDiagram, String>;
}

/// The inline block shown in place of the diagram when rendering fails.
///
/// Render failures are non-fatal: the viewer displays this block and the
/// application continues.
pub fn inline_error_block(reason: &str) -> String {
    format!(
        "<div class=\"render-error\">\
         <p>Error rendering diagram: {reason}</p>\
         <p>Please try a different topic or format.</p>\
         </div>"
    )
}
