//! Diagram view controller: sanitize, render, and transform the result.
//!
//! Wraps the external renderer. Render failures substitute an inline error
//! block in place of the diagram and never propagate. The viewport resets to
//! a fitted scale at the origin whenever a new diagram loads.

use mindforge_core::diagram::{
    apply_theme, inline_error_block, sanitize_markup, DiagramRenderer,
};
use mindforge_core::export::{export_filename, fit_to_page, PagePlacement};
use mindforge_core::viewport::{ViewportState, ZoomCommand};
use std::sync::Arc;
use tracing::warn;

/// Holds the rendered diagram and its pan/zoom state.
pub struct DiagramView {
    renderer: Arc<dyn DiagramRenderer>,
    container_width: f32,
    svg: Option<String>,
    content_width: f32,
    content_height: f32,
    render_failed: bool,
    viewport: ViewportState,
    dragging: bool,
}

impl DiagramView {
    pub fn new(renderer: Arc<dyn DiagramRenderer>, container_width: f32) -> Self {
        Self {
            renderer,
            container_width,
            svg: None,
            content_width: 0.0,
            content_height: 0.0,
            render_failed: false,
            viewport: ViewportState::new(),
            dragging: false,
        }
    }

    /// Renders new diagram markup, replacing the previous result.
    ///
    /// The markup is sanitized first; a renderer failure swaps in a visible
    /// inline error block instead of propagating.
    pub fn load_diagram(&mut self, markup: &str) {
        let clean = sanitize_markup(markup);
        self.dragging = false;

        match self.renderer.render(&clean) {
            Ok(rendered) => {
                self.svg = Some(apply_theme(&rendered.svg));
                self.content_width = rendered.width;
                self.content_height = rendered.height;
                self.render_failed = false;
                self.viewport = ViewportState::fitted(self.container_width, rendered.width);
            }
            Err(reason) => {
                warn!(reason = %reason, "Diagram rendering failed");
                self.svg = Some(inline_error_block(&reason));
                self.content_width = 0.0;
                self.content_height = 0.0;
                self.render_failed = true;
                self.viewport = ViewportState::new();
            }
        }
    }

    /// The current display content: a rendered diagram or an inline error
    /// block.
    pub fn svg(&self) -> Option<&str> {
        self.svg.as_deref()
    }

    pub fn render_failed(&self) -> bool {
        self.render_failed
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    pub fn set_container_width(&mut self, width: f32) {
        self.container_width = width;
    }

    /// Applies a discrete zoom command.
    pub fn zoom(&mut self, command: ZoomCommand) {
        match command {
            ZoomCommand::In => self.viewport.zoom_in(),
            ZoomCommand::Out => self.viewport.zoom_out(),
            ZoomCommand::Reset => self.viewport.reset(),
            ZoomCommand::Fit => self.viewport.fit(self.container_width, self.content_width),
        }
    }

    /// Starts a drag gesture; subsequent [`drag`] deltas pan the viewport.
    ///
    /// [`drag`]: DiagramView::drag
    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Ends the drag gesture.
    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Pans by a pointer delta. Only active while a drag gesture is held.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        if !self.dragging {
            return;
        }
        self.viewport.pan(dx, dy);
    }

    /// Placement of the current diagram on an export page.
    pub fn export_placement(&self, page_width: f32, page_height: f32) -> PagePlacement {
        fit_to_page(
            page_width,
            page_height,
            self.content_width,
            self.content_height,
        )
    }

    /// Filename (without extension) for exporting the current diagram.
    pub fn export_name(&self, topic: &str) -> String {
        export_filename(topic, chrono::Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindforge_core::diagram::RenderedDiagram;
    use mindforge_core::viewport::{DEFAULT_SCALE, MAX_SCALE, MIN_SCALE, Offset};

    struct StubRenderer {
        width: f32,
        fail_with: Option<String>,
    }

    impl DiagramRenderer for StubRenderer {
        fn render(&self, markup: &str) -> Result<RenderedDiagram, String> {
            if let Some(reason) = &self.fail_with {
                return Err(reason.clone());
            }
            Ok(RenderedDiagram {
                svg: format!("<svg>{markup}</svg>"),
                width: self.width,
                height: self.width / 2.0,
            })
        }
    }

    fn view(width: f32) -> DiagramView {
        DiagramView::new(
            Arc::new(StubRenderer {
                width,
                fail_with: None,
            }),
            1000.0,
        )
    }

    #[test]
    fn test_load_fits_viewport_to_container() {
        let mut view = view(2000.0);
        view.load_diagram("mindmap\n  root((Topic))\n");

        assert!(view.svg().is_some());
        assert!(!view.render_failed());
        assert!((view.viewport().scale - 0.425).abs() < 1e-6);
        assert_eq!(view.viewport().offset, Offset::ORIGIN);
    }

    #[test]
    fn test_render_failure_substitutes_inline_error() {
        let mut view = DiagramView::new(
            Arc::new(StubRenderer {
                width: 500.0,
                fail_with: Some("parse error on line 3".to_string()),
            }),
            1000.0,
        );
        view.load_diagram("mindmap");

        assert!(view.render_failed());
        assert!(view.svg().unwrap().contains("parse error on line 3"));
        assert_eq!(view.viewport().scale, DEFAULT_SCALE);
    }

    #[test]
    fn test_zoom_commands_respect_clamps() {
        let mut view = view(500.0);
        view.load_diagram("mindmap");

        for _ in 0..20 {
            view.zoom(ZoomCommand::In);
        }
        assert!(view.viewport().scale <= MAX_SCALE);

        for _ in 0..40 {
            view.zoom(ZoomCommand::Out);
        }
        assert!(view.viewport().scale >= MIN_SCALE);
    }

    #[test]
    fn test_reset_restores_default_scale_and_origin() {
        let mut view = view(500.0);
        view.load_diagram("mindmap");
        view.zoom(ZoomCommand::In);
        view.begin_drag();
        view.drag(30.0, 40.0);
        view.zoom(ZoomCommand::Reset);

        assert_eq!(view.viewport().scale, DEFAULT_SCALE);
        assert_eq!(view.viewport().offset, Offset::ORIGIN);
    }

    #[test]
    fn test_fit_recomputes_after_container_resize() {
        let mut view = view(2000.0);
        view.load_diagram("mindmap");
        view.set_container_width(500.0);
        view.zoom(ZoomCommand::Fit);

        assert!((view.viewport().scale - 0.2125).abs() < 1e-6);
    }

    #[test]
    fn test_drag_only_pans_while_held() {
        let mut view = view(500.0);
        view.load_diagram("mindmap");

        view.drag(10.0, 10.0);
        assert_eq!(view.viewport().offset, Offset::ORIGIN);

        view.begin_drag();
        view.drag(10.0, 10.0);
        view.end_drag();
        view.drag(5.0, 5.0);

        assert_eq!(view.viewport().offset, Offset { x: 10.0, y: 10.0 });
    }

    #[test]
    fn test_new_load_resets_pan() {
        let mut view = view(500.0);
        view.load_diagram("mindmap");
        view.begin_drag();
        view.drag(50.0, 50.0);

        view.load_diagram("mindmap v2");
        assert_eq!(view.viewport().offset, Offset::ORIGIN);
    }

    #[test]
    fn test_export_placement_uses_content_size() {
        let mut view = view(1000.0);
        view.load_diagram("mindmap");
        let placement = view.export_placement(297.0, 210.0);

        // 1000x500 image on a 297x210 page: width-bound, 0.9 margin.
        let ratio = (297.0_f32 / 1000.0).min(210.0 / 500.0) * 0.9;
        assert!((placement.width - 1000.0 * ratio).abs() < 1e-3);
    }
}
