//! Selection tool, the editor's default.

use annovec_canvas::DrawContext;

use super::{InputEvent, Tool, ToolContext, ToolView};
use crate::backend::{CommitRequest, CommitResult};
use crate::error::PreconditionError;
use crate::model::AnnotationId;

const CLEAR: &str = "select_tool.clear";
const BRING_TO_FRONT: &str = "select_tool.bring_to_front";

/// Highlights the annotation under the cursor and selects it on click.
#[derive(Debug, Default)]
pub struct SelectTool {
    hovered: Option<AnnotationId>,
}

impl SelectTool {
    pub const NAME: &'static str = "select_tool";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for SelectTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) -> Result<(), PreconditionError> {
        ctx.subscribe_pointer();
        ctx.register_command(CLEAR);
        ctx.register_command(BRING_TO_FRONT);
        Ok(())
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        if self.hovered.take().is_some() {
            ctx.store.highlight(None);
            ctx.changed();
        }
    }

    fn reset(&mut self) {
        self.hovered = None;
    }

    fn handle_event(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerMove(e) => {
                let p = ctx.camera.screen_to_image(e.position);
                let hit = ctx.store.hit_test(p, ctx.frame_index());
                if hit != self.hovered {
                    self.hovered = hit;
                    ctx.store.highlight(hit);
                    ctx.changed();
                }
                false
            }
            InputEvent::PointerDown(e) if e.is_primary() => {
                let p = ctx.camera.screen_to_image(e.position);
                let hit = ctx.store.hit_test(p, ctx.frame_index());
                ctx.store.select(hit);
                if let Some(id) = hit {
                    log::debug!("🔍 Selected annotation {}", id);
                }
                ctx.changed();
                true
            }
            _ => false,
        }
    }

    fn run_command(&mut self, ctx: &mut ToolContext<'_>, command: &str, _arg: Option<f64>) -> bool {
        match command {
            CLEAR => {
                let had_selection = ctx.store.selected().is_some();
                ctx.store.select(None);
                ctx.changed();
                had_selection
            }
            BRING_TO_FRONT => {
                let moved = ctx
                    .store
                    .selected()
                    .is_some_and(|id| ctx.store.bring_to_front(id));
                if moved {
                    ctx.changed();
                }
                moved
            }
            _ => false,
        }
    }

    fn render(&self, _draw: &mut dyn DrawContext, _view: &ToolView<'_>) {}

    fn take_commit(&mut self) -> Option<CommitRequest> {
        None
    }

    fn finish_commit(&mut self, _ctx: &mut ToolContext<'_>, _result: &CommitResult) {}

    fn is_drawing(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Size;
    use crate::config::EngineConfig;
    use crate::geometry::{CompoundPath, ImagePoint};
    use crate::model::ShapeVariant;
    use crate::tools::{Disposers, PointerEvent, Session};

    fn square(x: f64) -> ShapeVariant {
        ShapeVariant::Polygon(CompoundPath::from_points([
            ImagePoint::new(x, 0.0),
            ImagePoint::new(x + 10.0, 0.0),
            ImagePoint::new(x + 10.0, 10.0),
            ImagePoint::new(x, 10.0),
        ]))
    }

    #[test]
    fn test_click_selects_topmost() {
        let mut session = Session::new(EngineConfig::default(), Size::new(100.0, 100.0), Size::new(100.0, 100.0));
        let a = session.store.add(1, square(0.0));
        let b = session.store.add(1, square(20.0));
        let mut disposers = Disposers::new();
        let mut ctx = session.context(&mut disposers);
        let mut tool = SelectTool::new();
        tool.activate(&mut ctx).expect("activate");

        tool.handle_event(&mut ctx, &InputEvent::PointerMove(PointerEvent::at(25.0, 5.0)));
        assert_eq!(ctx.store.highlighted(), Some(b));

        tool.handle_event(&mut ctx, &InputEvent::PointerDown(PointerEvent::at(5.0, 5.0)));
        assert_eq!(ctx.store.selected(), Some(a));

        assert!(tool.run_command(&mut ctx, CLEAR, None));
        assert_eq!(ctx.store.selected(), None);
    }
}
