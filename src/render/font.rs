//! Font handling for bitmap charts.
//!
//! Charts are drawn with the pure-Rust `ab_glyph` text engine, which only
//! knows fonts registered at runtime. A TrueType file is looked up once per
//! process; when none is available text is skipped rather than failing the
//! whole render.

use std::fs;
use std::panic;
use std::path::PathBuf;
use std::sync::OnceLock;

use plotters::style::{FontStyle, register_font};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};
use tracing::{debug, info, warn};

/// Environment variable naming a `.ttf` file to use for chart text.
pub const FONT_ENV_VAR: &str = "PORT_ANALYTICS_FONT";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Registers a sans-serif font with plotters, at most once. Returns whether
/// chart text can be drawn.
pub fn ensure_font_registered() -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = std::env::var_os(FONT_ENV_VAR)
            .map(PathBuf::from)
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            if !looks_like_font(&bytes) {
                debug!(font = %path.display(), "Not a TrueType/OpenType file, skipped");
                continue;
            }
            // plotters keeps a reference to the font for the life of the process,
            // so at most one candidate is ever leaked
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            return match register_font("sans-serif", FontStyle::Normal, bytes) {
                Ok(()) => {
                    info!(font = %path.display(), "Chart font registered");
                    true
                }
                Err(_) => {
                    warn!(font = %path.display(), "Chart font rejected, chart text will be omitted");
                    false
                }
            };
        }

        warn!(
            env = FONT_ENV_VAR,
            "No usable TrueType font found, chart text will be omitted"
        );
        false
    })
}

/// Checks the sfnt version tag of a TrueType, OpenType or collection file.
fn looks_like_font(bytes: &[u8]) -> bool {
    const SFNT_TAGS: [&[u8]; 4] = [b"\x00\x01\x00\x00", b"OTTO", b"true", b"ttcf"];
    bytes
        .get(..4)
        .is_some_and(|tag| SFNT_TAGS.contains(&tag))
}

/// Backend wrapper that turns font failures into skipped text instead of a
/// failed chart. Everything else is forwarded unchanged.
pub struct FontTolerantBackend<DB> {
    inner: DB,
}

impl<DB> FontTolerantBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontTolerantBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let inner = &mut self.inner;
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            inner.draw_text(text, style, pos)
        })) {
            Ok(Err(DrawingErrorKind::FontError(e))) => {
                debug!(error = %e, text, "Chart text skipped");
                Ok(())
            }
            Ok(result) => result,
            Err(_) => {
                debug!(text, "Text rasterizer panicked, chart text skipped");
                Ok(())
            }
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match self.inner.estimate_text_size(text, style) {
            Err(DrawingErrorKind::FontError(_)) => {
                let size = style.size().max(1.0);
                let width = text.chars().count() as f64 * size * 0.6;
                Ok((width.ceil() as u32, size.ceil() as u32))
            }
            other => other,
        }
    }
}
