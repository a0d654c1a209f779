use crossbeam_channel::{Receiver, Sender};

use crate::shared::detection_result::DetectionResult;

/// Fire-and-forget dispatch onto the thread that owns the display.
///
/// `submit` must never block the detection cycle, and the caller never
/// observes completion of the rendering work.
pub trait RenderContext: Send {
    fn submit(&self, result: DetectionResult);
}

/// Creates the channel pair connecting the detection loop to the display
/// thread: the scheduler submits into the context, the display loop
/// drains the queue from its own thread.
pub fn render_queue() -> (QueuedRenderContext, RenderQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (QueuedRenderContext { tx }, RenderQueue { rx })
}

pub struct QueuedRenderContext {
    tx: Sender<DetectionResult>,
}

impl RenderContext for QueuedRenderContext {
    fn submit(&self, result: DetectionResult) {
        // The display loop may already be gone during teardown.
        let _ = self.tx.send(result);
    }
}

pub struct RenderQueue {
    rx: Receiver<DetectionResult>,
}

impl RenderQueue {
    /// Newest pending result, discarding anything older. `None` when no
    /// cycle has completed since the last poll.
    pub fn poll(&self) -> Option<DetectionResult> {
        self.rx.try_iter().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(frame_width: u32) -> DetectionResult {
        DetectionResult {
            frame_width,
            frame_height: 240,
            faces: Vec::new(),
        }
    }

    #[test]
    fn test_poll_empty_queue() {
        let (_ctx, queue) = render_queue();
        assert!(queue.poll().is_none());
    }

    #[test]
    fn test_submit_then_poll() {
        let (ctx, queue) = render_queue();
        ctx.submit(result(320));
        assert_eq!(queue.poll().unwrap().frame_width, 320);
        assert!(queue.poll().is_none());
    }

    #[test]
    fn test_poll_keeps_only_newest() {
        let (ctx, queue) = render_queue();
        ctx.submit(result(1));
        ctx.submit(result(2));
        ctx.submit(result(3));
        assert_eq!(queue.poll().unwrap().frame_width, 3);
        assert!(queue.poll().is_none());
    }

    #[test]
    fn test_submit_after_queue_dropped_is_silent() {
        let (ctx, queue) = render_queue();
        drop(queue);
        ctx.submit(result(320));
    }
}
