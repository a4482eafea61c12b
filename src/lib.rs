//! adcanvas renders parametrized ad templates onto a fixed-size RGBA surface.
//!
//! A [`TemplateModel`] fixes the layer structure (background, design pattern, mask, mask stroke,
//! user photo, caption, call-to-action); a host edits only its parameter values:
//!
//! - Create an [`EditorSession`] with an [`AssetSource`] for the overlay images
//! - Apply edits (caption, CTA, background color, user photo)
//! - Call [`EditorSession::pump`] and [`EditorSession::render_if_dirty`] from the render loop
//!
//! Lower-level pieces ([`Compositor`], [`wrap_lines`], [`AssetLoader`]) are public for hosts that
//! manage their own state.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod editor;
mod foundation;
mod render;
mod template;
mod text;

pub use crate::assets::color::Color;
pub use crate::assets::decode::{DecodedImage, decode_image};
pub use crate::assets::loader::{
    AssetEvent, AssetHandle, AssetId, AssetLoader, AssetSource, AssetState, DirSource,
    LoaderOpts, MemorySource,
};
pub use crate::editor::session::{
    EditorOpts, EditorSession, FontChoice, OverlayRole, RenderSnapshot,
};
pub use crate::editor::state::{
    DEFAULT_BACKGROUND, DEFAULT_RECENT_CAPACITY, EditorState, RecentColors,
};
pub use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba8Premul, Vec2};
pub use crate::foundation::error::{AdError, AdResult};
pub use crate::render::compositor::{
    CTA_PAD_X, CTA_PAD_Y, Compositor, LayerImages, RenderReport,
};
pub use crate::render::surface::{FrameRGBA, Surface};
pub use crate::template::model::{
    Alignment, AssetUrls, Caption, Cta, DEFAULT_CTA_FONT_SIZE, ImageMask, Position, TemplateModel,
};
pub use crate::text::engine::{Baseline, TextEngine, TextMeasure, TextRun};
pub use crate::text::wrap::{REFERENCE_GLYPH, reference_width, wrap_lines, wrap_to_char_budget};
