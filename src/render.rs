//! Headless drawing of the arena and of the report chart as SVG.

use crate::geometry::{Rect, Vec2};
use crate::model::{Stat, State};
use anyhow::{Context, Result};
use std::{fmt::Write, fs, path::Path};

/// Size of the report chart in pixels.
const REPORT_WIDTH: f64 = 1000.0;
const REPORT_HEIGHT: f64 = 150.0;

/// One agent as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub radius: f64,
    pub state: State,
}

/// Fill colour of an agent in `state`.
pub fn state_color(state: State) -> &'static str {
    match state {
        State::Live => "gray",
        State::Touched => "blueviolet",
        State::Dead => "red",
        State::Cured => "green",
    }
}

/// Render the arena with one outlined disc per sprite.
///
/// The y axis points up, as in the simulation.
pub fn frame_svg<I>(bounds: &Rect, sprites: I) -> String
where
    I: IntoIterator<Item = Sprite>,
{
    let size = bounds.size();
    let mut svg = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = size.x,
        h = size.y,
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="skyblue"/>"#);
    for sprite in sprites {
        let x = sprite.position.x - bounds.min.x;
        let y = bounds.max.y - sprite.position.y;
        let _ = writeln!(
            svg,
            r#"<circle cx="{x:.2}" cy="{y:.2}" r="{r}" fill="{fill}" stroke="black" stroke-width="1"/>"#,
            r = sprite.radius,
            fill = state_color(sprite.state),
        );
    }
    svg.push_str("</svg>\n");
    svg
}

/// Render the stat sequence as a stacked area chart.
///
/// Bands from the bottom: dead, touched, cured, live.
pub fn report_svg(stats: &[Stat]) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{REPORT_WIDTH}" height="{REPORT_HEIGHT}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="beige"/>"#);

    if let (Some(first), Some(last)) = (stats.first(), stats.last()) {
        let span = (last.time - first.time).max(1) as f64;
        let x_of = |stat: &Stat| (stat.time - first.time) as f64 / span * REPORT_WIDTH;

        let layers: [(State, fn(&Stat) -> usize); 4] = [
            (State::Dead, |s: &Stat| s.dead),
            (State::Touched, |s: &Stat| s.touched),
            (State::Cured, |s: &Stat| s.cured),
            (State::Live, |s: &Stat| s.live),
        ];

        let mut floor = vec![0usize; stats.len()];
        for (state, count) in layers {
            let ceil: Vec<_> = stats
                .iter()
                .zip(&floor)
                .map(|(stat, base)| base + count(stat))
                .collect();

            let mut points = String::new();
            for (stat, &top) in stats.iter().zip(&ceil) {
                let _ = write!(points, "{:.2},{:.2} ", x_of(stat), y_of(top, stat.total()));
            }
            for (stat, &base) in stats.iter().zip(&floor).rev() {
                let _ = write!(points, "{:.2},{:.2} ", x_of(stat), y_of(base, stat.total()));
            }
            let _ = writeln!(
                svg,
                r#"<polygon points="{}" fill="{}"/>"#,
                points.trim_end(),
                state_color(state),
            );

            floor = ceil;
        }
    }

    svg.push_str("</svg>\n");
    svg
}

fn y_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return REPORT_HEIGHT;
    }
    REPORT_HEIGHT * (1.0 - count as f64 / total as f64)
}

pub fn write_svg<P: AsRef<Path>>(file: P, svg: &str) -> Result<()> {
    let file = file.as_ref();
    fs::write(file, svg).with_context(|| format!("failed to write {file:?}"))?;
    Ok(())
}
