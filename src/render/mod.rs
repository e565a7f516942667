// src/render/mod.rs

pub mod svg;

use crate::projection::{AverageEntry, Projection, SeriesEntry};

pub use svg::SvgChart;

/// Categorical palette (matplotlib "tab10"), indexed by palette slot.
pub const PALETTE: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

pub fn palette_color(color_index: usize) -> (u8, u8, u8) {
    PALETTE[color_index % PALETTE.len()]
}

/// Consumer of a [`Projection`]: draws it, or prompts when nothing is selected.
pub trait Renderer {
    type Output;
    type Error;

    fn render_series(&mut self, entities: &[SeriesEntry]) -> Result<Self::Output, Self::Error>;
    fn render_averages(&mut self, entities: &[AverageEntry]) -> Result<Self::Output, Self::Error>;
    fn render_empty_selection(&mut self) -> Result<Self::Output, Self::Error>;
}

pub fn render<R: Renderer>(projection: &Projection, renderer: &mut R) -> Result<R::Output, R::Error> {
    match projection {
        Projection::EmptySelection => renderer.render_empty_selection(),
        Projection::Series(entries) => renderer.render_series(entries),
        Projection::Averages(entries) => renderer.render_averages(entries),
    }
}
