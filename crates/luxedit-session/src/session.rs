//! Editing session: the render context plus its scheduler.
//!
//! Every mutation made through [`EditSession::edit`] triggers a coalesced
//! re-render, so callers never schedule renders by hand.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::SessionConfig;
use crate::image::EditableImage;
use crate::pass::{EditorPass, RenderContext, RenderListener};
use crate::scheduler::RenderScheduler;

pub struct EditSession {
    scheduler: RenderScheduler<EditorPass>,
}

impl EditSession {
    pub fn new(
        image: EditableImage,
        listener: Arc<dyn RenderListener>,
        config: SessionConfig,
        runtime: Handle,
    ) -> Self {
        let context = RenderContext::new(image, listener, config);
        Self {
            scheduler: RenderScheduler::new(EditorPass::new(context), runtime),
        }
    }

    pub fn context(&self) -> &RenderContext {
        self.scheduler.pass().context()
    }

    /// Read the image without triggering a render.
    pub fn read<R>(&self, f: impl FnOnce(&EditableImage) -> R) -> R {
        f(&self.context().image().read())
    }

    /// Mutate the image, then request a render of the new state.
    pub fn edit<R>(&self, f: impl FnOnce(&mut EditableImage) -> R) -> R {
        let result = f(&mut self.context().image().write());
        self.scheduler.request();
        result
    }

    pub fn undo(&self) -> bool {
        self.edit(EditableImage::undo)
    }

    pub fn redo(&self) -> bool {
        self.edit(EditableImage::redo)
    }

    /// Re-render without changing anything.
    pub fn request_render(&self) -> u64 {
        self.scheduler.request()
    }

    pub async fn wait_idle(&self) {
        self.scheduler.wait_idle().await
    }

    pub fn scheduler(&self) -> &RenderScheduler<EditorPass> {
        &self.scheduler
    }
}
