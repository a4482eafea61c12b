use std::sync::Arc;

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::assets::loader::{AssetHandle, AssetLoader, AssetSource, AssetState, LoaderOpts};
use crate::editor::state::{DEFAULT_BACKGROUND, DEFAULT_RECENT_CAPACITY, EditorState};
use crate::foundation::core::Canvas;
use crate::foundation::error::{AdError, AdResult};
use crate::render::compositor::{Compositor, LayerImages, RenderReport};
use crate::render::surface::{FrameRGBA, Surface};
use crate::template::model::TemplateModel;
use crate::text::engine::TextEngine;

/// Face used for caption and CTA text.
#[derive(Debug, Clone)]
pub enum FontChoice {
    /// Metric-only block face; every character advances by `advance_em × size`.
    Block {
        /// Per-character advance in ems.
        advance_em: f32,
    },
    /// TrueType/OpenType font bytes.
    Bytes(Arc<Vec<u8>>),
}

impl Default for FontChoice {
    fn default() -> Self {
        Self::Block { advance_em: 0.6 }
    }
}

impl FontChoice {
    fn build(&self) -> AdResult<TextEngine> {
        match self {
            Self::Block { advance_em } => TextEngine::block(*advance_em),
            Self::Bytes(bytes) => TextEngine::from_font_bytes(bytes.as_ref().clone()),
        }
    }
}

/// Editor session configuration.
#[derive(Debug, Clone)]
pub struct EditorOpts {
    /// Output surface size.
    pub canvas: Canvas,
    /// Initial background color.
    pub background: Color,
    /// How many recently used colors to keep.
    pub recent_capacity: usize,
    /// Text face.
    pub font: FontChoice,
    /// Asset loader settings.
    pub loader: LoaderOpts,
}

impl Default for EditorOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas::AD_SQUARE,
            background: DEFAULT_BACKGROUND,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            font: FontChoice::default(),
            loader: LoaderOpts::default(),
        }
    }
}

impl EditorOpts {
    /// Return options with a different surface size.
    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    /// Return options with a different initial background.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Return options with a different recent-color capacity.
    pub fn with_recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity;
        self
    }

    /// Return options with a different text face.
    pub fn with_font(mut self, font: FontChoice) -> Self {
        self.font = font;
        self
    }

    /// Return options with different loader settings.
    pub fn with_loader(mut self, loader: LoaderOpts) -> Self {
        self.loader = loader;
        self
    }
}

/// The three template overlay roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayRole {
    /// Full-surface pattern.
    DesignPattern,
    /// Mask inside the image rectangle.
    Mask,
    /// Stroke over the mask.
    Stroke,
}

impl OverlayRole {
    /// All roles, in draw order.
    pub const ALL: [OverlayRole; 3] = [Self::DesignPattern, Self::Mask, Self::Stroke];

    fn reference(self, template: &TemplateModel) -> &str {
        match self {
            Self::DesignPattern => &template.urls.design_pattern,
            Self::Mask => &template.urls.mask,
            Self::Stroke => &template.urls.stroke,
        }
    }
}

struct Overlays {
    design_pattern: AssetHandle,
    mask: AssetHandle,
    stroke: AssetHandle,
}

impl Overlays {
    fn load(loader: &AssetLoader, template: &TemplateModel) -> Self {
        Self {
            design_pattern: loader.load_from_url(&template.urls.design_pattern),
            mask: loader.load_from_url(&template.urls.mask),
            stroke: loader.load_from_url(&template.urls.stroke),
        }
    }

    fn get(&self, role: OverlayRole) -> &AssetHandle {
        match role {
            OverlayRole::DesignPattern => &self.design_pattern,
            OverlayRole::Mask => &self.mask,
            OverlayRole::Stroke => &self.stroke,
        }
    }

    fn get_mut(&mut self, role: OverlayRole) -> &mut AssetHandle {
        match role {
            OverlayRole::DesignPattern => &mut self.design_pattern,
            OverlayRole::Mask => &mut self.mask,
            OverlayRole::Stroke => &mut self.stroke,
        }
    }

    fn ready_layers(&self) -> LayerImages {
        LayerImages {
            design_pattern: self.design_pattern.ready(),
            mask: self.mask.ready(),
            stroke: self.stroke.ready(),
        }
    }
}

/// Consistent copy of everything a render reads.
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    /// Template with the user's text applied.
    pub template: TemplateModel,
    /// Background fill.
    pub background: Color,
    /// Overlays that were ready when the snapshot was taken.
    pub layers: LayerImages,
    /// Selected user photo.
    pub user_photo: Option<Arc<DecodedImage>>,
}

/// An interactive editing session over one template.
///
/// Edits and asset completions only mark the session dirty; the host calls
/// [`EditorSession::pump`] and [`EditorSession::render_if_dirty`] from its render loop, and every
/// render redraws the whole surface from a fresh [`RenderSnapshot`].
pub struct EditorSession {
    template: TemplateModel,
    state: EditorState,
    loader: AssetLoader,
    overlays: Overlays,
    photo: Option<AssetHandle>,
    photo_applied: bool,
    compositor: Compositor,
    surface: Surface,
    dirty: bool,
    last_report: Option<RenderReport>,
}

impl EditorSession {
    /// Validate `template`, start loading its overlays and allocate the surface.
    pub fn new(
        template: TemplateModel,
        source: Arc<dyn AssetSource>,
        opts: EditorOpts,
    ) -> AdResult<Self> {
        template.validate()?;
        let loader = AssetLoader::new(source, opts.loader)?;
        let compositor = Compositor::new(opts.font.build()?);
        let surface = Surface::new(opts.canvas)?;
        let overlays = Overlays::load(&loader, &template);
        Ok(Self {
            template,
            state: EditorState::new(opts.background, opts.recent_capacity),
            loader,
            overlays,
            photo: None,
            photo_applied: false,
            compositor,
            surface,
            dirty: true,
            last_report: None,
        })
    }

    /// Current template, including the user's text edits.
    pub fn template(&self) -> &TemplateModel {
        &self.template
    }

    /// Current editor state.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Return `true` when the surface no longer reflects the latest state.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the caption text.
    pub fn set_caption_text(&mut self, text: impl Into<String>) {
        self.template.caption.text = text.into();
        self.mark_dirty("caption");
    }

    /// Replace the call-to-action text.
    pub fn set_cta_text(&mut self, text: impl Into<String>) {
        self.template.cta.text = text.into();
        self.mark_dirty("cta");
    }

    /// Change the background and record it in the recent colors.
    pub fn set_background_color(&mut self, color: Color) {
        self.state.set_background_color(color);
        self.mark_dirty("background");
    }

    /// Parse a `#RRGGBB` string and apply it as background.
    pub fn set_background_hex(&mut self, hex: &str) -> AdResult<()> {
        self.set_background_color(Color::from_hex(hex)?);
        Ok(())
    }

    /// Re-apply the recent color at `index` (0 = oldest).
    pub fn select_recent_color(&mut self, index: usize) -> AdResult<()> {
        let color = self
            .state
            .recent_colors()
            .get(index)
            .ok_or_else(|| AdError::validation(format!("no recent color at index {index}")))?;
        self.set_background_color(color);
        Ok(())
    }

    /// Start decoding a user-supplied file. The photo replaces the current one once decoded;
    /// a newer selection always wins over an older one that finishes later.
    pub fn select_image_bytes(&mut self, bytes: Vec<u8>) -> AssetHandle {
        let handle = self.loader.load_from_user_file(bytes);
        self.photo = Some(handle.clone());
        self.photo_applied = false;
        handle
    }

    /// Drop the current photo and forget any pending selection.
    pub fn clear_image(&mut self) {
        self.photo = None;
        self.photo_applied = false;
        self.state.set_selected_image(None);
        self.mark_dirty("clear image");
    }

    /// Swap in a new template. Overlays whose reference is unchanged keep their loaded image.
    pub fn set_template(&mut self, template: TemplateModel) -> AdResult<()> {
        template.validate()?;
        for role in OverlayRole::ALL {
            if role.reference(&template) != role.reference(&self.template) {
                *self.overlays.get_mut(role) = self.loader.load_from_url(role.reference(&template));
            }
        }
        self.template = template;
        self.mark_dirty("template");
        Ok(())
    }

    /// Load state of one template overlay.
    pub fn overlay_status(&self, role: OverlayRole) -> AssetState {
        self.overlays.get(role).state()
    }

    /// Handle of one template overlay.
    pub fn overlay_handle(&self, role: OverlayRole) -> &AssetHandle {
        self.overlays.get(role)
    }

    /// Load state of the most recent photo selection, `None` when nothing was selected.
    pub fn photo_status(&self) -> Option<AssetState> {
        self.photo.as_ref().map(AssetHandle::state)
    }

    /// Apply finished loads. Returns `true` when this call changed anything the next render reads.
    pub fn pump(&mut self) -> bool {
        let events = self.loader.poll_events();
        for ev in &events {
            tracing::debug!(id = ev.id.0, ok = ev.ok, "asset finished");
        }
        if !events.is_empty() {
            self.dirty = true;
        }
        let applied = self.apply_photo();
        applied || !events.is_empty()
    }

    /// Block until every outstanding load finishes, then apply the results.
    pub fn wait_for_assets(&mut self) {
        for role in OverlayRole::ALL {
            self.overlays.get(role).wait();
        }
        if let Some(photo) = &self.photo {
            photo.wait();
        }
        self.pump();
        self.dirty = true;
    }

    /// Copy everything the next render reads.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            template: self.template.clone(),
            background: self.state.background_color(),
            layers: self.overlays.ready_layers(),
            user_photo: self.state.selected_image().cloned(),
        }
    }

    /// Redraw the whole surface from a fresh snapshot.
    pub fn render(&mut self) -> AdResult<&RenderReport> {
        let snap = self.snapshot();
        let report = self.compositor.render(
            &mut self.surface,
            &snap.template,
            snap.background,
            &snap.layers,
            snap.user_photo.as_deref(),
        )?;
        self.dirty = false;
        Ok(self.last_report.insert(report))
    }

    /// Render only when something changed since the last render. Returns whether it rendered.
    pub fn render_if_dirty(&mut self) -> AdResult<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// Report of the most recent render.
    pub fn last_report(&self) -> Option<&RenderReport> {
        self.last_report.as_ref()
    }

    /// Current pixels.
    pub fn frame(&self) -> FrameRGBA {
        self.surface.frame()
    }

    /// The output surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Returns `true` when a newly decoded photo was selected.
    fn apply_photo(&mut self) -> bool {
        if self.photo_applied {
            return false;
        }
        let Some(handle) = &self.photo else {
            return false;
        };
        match handle.state() {
            AssetState::Pending => false,
            AssetState::Ready(img) => {
                self.state.set_selected_image(Some(img));
                self.photo_applied = true;
                self.mark_dirty("photo ready");
                true
            }
            AssetState::Failed(_) => {
                // Keep showing the previous photo.
                self.photo_applied = true;
                false
            }
        }
    }

    fn mark_dirty(&mut self, reason: &'static str) {
        tracing::debug!(reason, "editor state changed");
        self.dirty = true;
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("canvas", &self.surface.canvas())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/session.rs"]
mod tests;
