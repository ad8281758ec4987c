//! PDF rasterisation: render the first pages of an in-memory PDF via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Binding
//!
//! The pdfium shared library is looked up at `PDFIUM_LIB_PATH` (a directory),
//! then next to the working directory, then on the system library path. A
//! missing library is reported as [`CapabilityError::Unavailable`] so the
//! extraction cascade can fall through to its placeholder.

use crate::error::CapabilityError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

/// Environment variable naming the directory that holds the pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Rasterise up to `max_pages` leading pages of a PDF.
///
/// # Returns
/// A vector of `(page_index_0based, DynamicImage)` tuples.
pub async fn render_pdf_pages(
    bytes: Vec<u8>,
    max_pages: usize,
    max_pixels: u32,
) -> Result<Vec<(usize, DynamicImage)>, CapabilityError> {
    tokio::task::spawn_blocking(move || render_pages_blocking(&bytes, max_pages, max_pixels))
        .await
        .map_err(|e| CapabilityError::Failed(format!("Render task panicked: {}", e)))?
}

fn bind_pdfium() -> Result<Pdfium, CapabilityError> {
    let dir = std::env::var(PDFIUM_LIB_PATH_ENV).unwrap_or_else(|_| "./".to_string());
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| CapabilityError::Unavailable(format!("pdfium library not found: {:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    bytes: &[u8],
    max_pages: usize,
    max_pixels: u32,
) -> Result<Vec<(usize, DynamicImage)>, CapabilityError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            CapabilityError::Unsupported("password-protected PDF".into())
        } else {
            CapabilityError::Failed(format!("corrupt PDF: {}", err_str))
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);
    if total_pages > max_pages {
        warn!(
            "Rendering only the first {} of {} pages",
            max_pages, total_pages
        );
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total_pages.min(max_pages));

    for idx in 0..total_pages.min(max_pages) {
        let page = pages.get(idx as u16).map_err(|e| {
            CapabilityError::Failed(format!("page {}: {:?}", idx + 1, e))
        })?;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            CapabilityError::Failed(format!("rasterising page {}: {:?}", idx + 1, e))
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(results)
}
