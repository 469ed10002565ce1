//! Collaborator contracts shared with the host.
//!
//! The renderer is a separate subsystem; only the call surface it shares
//! with the emulator core lives here.

/// Active drawing region in framebuffer coordinates. Primitives entirely
/// outside it are rejected before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawArea {
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
}

/// Consumes decoded GPU primitives on behalf of the host graphics context.
pub trait GpuCommandSink {
    /// Update the active draw area; applies to subsequent primitives.
    fn set_draw_area(&mut self, area: DrawArea);

    /// Submit one decoded primitive's data words.
    fn submit_primitive(&mut self, words: &[u32]);
}
