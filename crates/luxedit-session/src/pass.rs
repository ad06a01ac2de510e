//! The editor's render body and its explicit context object.
//!
//! One pass renders the preview, publishes it, then renders and publishes
//! the full-resolution image. Each stage runs crop, the global color
//! pipeline and the layer stack, checking for cancellation around the
//! expensive steps. A cancelled stage publishes nothing.

use std::sync::Arc;

use luxedit_core::mask::composite_layers;
use luxedit_core::{extract_crop, ColorPipeline, Raster, ResizeFilter};
use parking_lot::RwLock;

use crate::config::SessionConfig;
use crate::image::{EditableImage, RenderInput};
use crate::scheduler::{CancelToken, PassOutcome, RenderPass};

/// Receives finished renders. Called from the render thread.
pub trait RenderListener: Send + Sync {
    fn preview_ready(&self, raster: &Arc<Raster>, generation: u64);
    fn full_ready(&self, raster: &Arc<Raster>, generation: u64);
}

/// Everything a render needs, passed in rather than looked up globally.
#[derive(Clone)]
pub struct RenderContext {
    image: Arc<RwLock<EditableImage>>,
    listener: Arc<dyn RenderListener>,
    config: SessionConfig,
}

impl RenderContext {
    pub fn new(image: EditableImage, listener: Arc<dyn RenderListener>, config: SessionConfig) -> Self {
        Self {
            image: Arc::new(RwLock::new(image)),
            listener,
            config,
        }
    }

    pub fn image(&self) -> &Arc<RwLock<EditableImage>> {
        &self.image
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Which resolution a stage renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Preview,
    Full,
}

pub struct EditorPass {
    context: RenderContext,
}

impl EditorPass {
    pub fn new(context: RenderContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    fn publish(&self, stage: Stage, generation: u64, raster: Raster) {
        let raster = Arc::new(raster);
        let accepted = {
            let mut image = self.context.image.write();
            match stage {
                Stage::Preview => image.publish_preview(generation, Arc::clone(&raster)),
                Stage::Full => image.publish_full(generation, Arc::clone(&raster)),
            }
        };
        if !accepted {
            return;
        }
        match stage {
            Stage::Preview => self.context.listener.preview_ready(&raster, generation),
            Stage::Full => self.context.listener.full_ready(&raster, generation),
        }
    }
}

impl RenderPass for EditorPass {
    fn run(&self, cancel: &CancelToken) -> PassOutcome {
        let input = self.context.image.read().render_input();

        for stage in [Stage::Preview, Stage::Full] {
            let filter = match stage {
                Stage::Preview => self.context.config.preview_filter,
                Stage::Full => self.context.config.full_filter,
            };
            match render_stage(&input, stage, filter, cancel) {
                Some(raster) => self.publish(stage, cancel.generation(), raster),
                None => return PassOutcome::Cancelled,
            }
        }
        PassOutcome::Completed
    }
}

/// Crop, color pipeline, then layers. `None` when cancelled midway.
fn render_stage(
    input: &RenderInput,
    stage: Stage,
    filter: ResizeFilter,
    cancel: &CancelToken,
) -> Option<Raster> {
    if cancel.is_cancelled() {
        return None;
    }

    let (source, crop) = match stage {
        Stage::Preview => {
            let (sx, sy) = input.preview_scale();
            (input.preview.as_ref(), input.crop.scaled(sx, sy))
        }
        Stage::Full => (input.original.as_ref(), input.crop),
    };

    let cropped = if input.crop_editing {
        source.clone()
    } else {
        extract_crop(source, &crop, filter)
    };

    let pipeline = ColorPipeline::compile_with_background(&input.settings, input.background_mask.as_ref());
    let mut output = pipeline.apply(&cropped);
    if cancel.is_cancelled() {
        return None;
    }

    composite_layers(&mut output, &input.layers);
    if cancel.is_cancelled() {
        return None;
    }

    tracing::trace!(
        ?stage,
        width = output.width,
        height = output.height,
        generation = cancel.generation(),
        "stage rendered"
    );
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::RenderScheduler;
    use luxedit_core::settings::keys;
    use luxedit_core::CropBox;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(&'static str, u64, u32, u32)>>,
    }

    impl RenderListener for Recorder {
        fn preview_ready(&self, raster: &Arc<Raster>, generation: u64) {
            self.events.lock().push(("preview", generation, raster.width, raster.height));
        }

        fn full_ready(&self, raster: &Arc<Raster>, generation: u64) {
            self.events.lock().push(("full", generation, raster.width, raster.height));
        }
    }

    fn context(width: u32, height: u32, recorder: Arc<Recorder>) -> RenderContext {
        let config = SessionConfig {
            preview_max_edge: 100,
            ..SessionConfig::default()
        };
        let image = EditableImage::new(Raster::filled(width, height, [60, 120, 180, 255]), &config).unwrap();
        RenderContext::new(image, recorder, config)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pass_publishes_preview_then_full() {
        let recorder = Arc::new(Recorder::default());
        let ctx = context(400, 200, Arc::clone(&recorder));
        ctx.image().write().crop_mut().set_size(200.0, 100.0);

        let scheduler = RenderScheduler::new(EditorPass::new(ctx.clone()), tokio::runtime::Handle::current());
        let generation = scheduler.request();
        scheduler.wait_idle().await;

        let events = recorder.events.lock().clone();
        assert_eq!(
            events,
            vec![("preview", generation, 50, 25), ("full", generation, 200, 100)],
            "Preview publishes first, at the preview scale"
        );
        let image = ctx.image().read();
        assert_eq!(image.edited().unwrap().generation, generation);
        assert_eq!(image.edited_preview().unwrap().raster.width, 50);
    }

    #[test]
    fn test_stage_applies_settings() {
        let recorder = Arc::new(Recorder::default());
        let ctx = context(40, 40, recorder);
        ctx.image().write().settings_mut().set_float(keys::EXPOSURE, 1.0);
        let input = ctx.image().read().render_input();

        let token = cancel_token(1, 1);
        let out = render_stage(&input, Stage::Full, ResizeFilter::Bilinear, &token).unwrap();
        let before = input.original.pixel_clamped(0, 0);
        let after = out.pixel_clamped(0, 0);
        assert!(after[0] > before[0], "Positive exposure brightens");
        assert_eq!(after[3], 255);
    }

    #[test]
    fn test_crop_editing_shows_uncropped_image() {
        let recorder = Arc::new(Recorder::default());
        let ctx = context(80, 60, recorder);
        {
            let mut image = ctx.image().write();
            image.crop_mut().load(CropBox::new(10.0, 10.0, 40.0, 40.0, 0.0));
            image.set_crop_editing(true);
        }
        let input = ctx.image().read().render_input();
        let token = cancel_token(1, 1);
        let out = render_stage(&input, Stage::Full, ResizeFilter::Bilinear, &token).unwrap();
        assert_eq!((out.width, out.height), (80, 60));
    }

    #[test]
    fn test_cancelled_stage_returns_none() {
        let recorder = Arc::new(Recorder::default());
        let ctx = context(20, 20, recorder);
        let input = ctx.image().read().render_input();
        let token = cancel_token(1, 2);
        assert!(render_stage(&input, Stage::Preview, ResizeFilter::Bilinear, &token).is_none());
    }

    fn cancel_token(issued: u64, live: u64) -> CancelToken {
        CancelToken::for_tests(issued, live)
    }
}
