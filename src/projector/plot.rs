use crate::domain::Ring;
use crate::error::Result;
use crate::geometry::Bounds;
use std::path::Path;

pub const PLOT_TITLE: &str = "Euclidean projection of GeoJSON Polygons, scale in meters";

/// Colour cycle, one entry per polygon
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const TITLE_HEIGHT_PX: f64 = 24.0;

/// Receiver of projected polygons for rendering
pub trait Canvas {
    fn set_title(&mut self, title: &str);

    /// One polygon per call: exterior ring first, then holes
    fn draw_polygon(&mut self, rings: &[Ring]);
}

/// Renders projected polygons as an SVG document
///
/// Equal aspect ratio, north up (the SVG y axis is flipped), holes
/// dashed.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width_px: f64,
    margin_px: f64,
    title: Option<String>,
    polygons: Vec<Vec<Ring>>,
}

impl SvgCanvas {
    pub fn new(width_px: f64) -> Self {
        Self {
            width_px,
            margin_px: 20.0,
            title: None,
            polygons: Vec::new(),
        }
    }

    pub fn with_margin(mut self, margin_px: f64) -> Self {
        self.margin_px = margin_px;
        self
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn render(&self) -> String {
        let bounds = Bounds::from_points(self.polygons.iter().flatten().flatten());
        let drawable = self.width_px - 2.0 * self.margin_px;

        let (scale, height_px) = match &bounds {
            Some(b) => {
                let extent = b.width().max(b.height());
                let scale = if extent > 0.0 { drawable / extent } else { 1.0 };
                (scale, b.height() * scale + 2.0 * self.margin_px + TITLE_HEIGHT_PX)
            }
            None => (1.0, 2.0 * self.margin_px + TITLE_HEIGHT_PX),
        };

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" viewBox=\"0 0 {w:.2} {h:.2}\">\n",
            w = self.width_px,
            h = height_px
        );
        svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

        if let Some(title) = &self.title {
            svg.push_str(&format!(
                "  <text x=\"{:.2}\" y=\"{:.2}\" font-family=\"sans-serif\" font-size=\"14\" text-anchor=\"middle\">{}</text>\n",
                self.width_px / 2.0,
                self.margin_px,
                escape(title)
            ));
        }

        if let Some(b) = &bounds {
            let top = self.margin_px + TITLE_HEIGHT_PX;
            for (index, rings) in self.polygons.iter().enumerate() {
                let colour = PALETTE[index % PALETTE.len()];
                for (ring_index, ring) in rings.iter().enumerate() {
                    let points: Vec<String> = ring
                        .iter()
                        .map(|c| {
                            let px = self.margin_px + (c.x - b.min_x) * scale;
                            let py = top + (b.max_y - c.y) * scale;
                            format!("{px:.2},{py:.2}")
                        })
                        .collect();
                    let dash = if ring_index > 0 {
                        " stroke-dasharray=\"4 2\""
                    } else {
                        ""
                    };
                    svg.push_str(&format!(
                        "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"{}/>\n",
                        points.join(" "),
                        colour,
                        dash
                    ));
                }
            }
        }

        svg.push_str("</svg>\n");
        svg
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

impl Default for SvgCanvas {
    fn default() -> Self {
        Self::new(800.0)
    }
}

impl Canvas for SvgCanvas {
    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn draw_polygon(&mut self, rings: &[Ring]) {
        self.polygons.push(rings.to_vec());
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            geo::coord! { x: x0, y: y0 },
            geo::coord! { x: x0 + size, y: y0 },
            geo::coord! { x: x0 + size, y: y0 + size },
            geo::coord! { x: x0, y: y0 + size },
            geo::coord! { x: x0, y: y0 },
        ]
    }

    #[test]
    fn test_render_empty() {
        let svg = SvgCanvas::default().render();
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("polyline"));
    }

    #[test]
    fn test_render_polygons_with_holes() {
        let mut canvas = SvgCanvas::new(440.0);
        canvas.set_title(PLOT_TITLE);
        canvas.draw_polygon(&[square(0.0, 0.0, 100.0), square(10.0, 10.0, 10.0)]);
        canvas.draw_polygon(&[square(200.0, 0.0, 50.0)]);

        let svg = canvas.render();
        assert_eq!(canvas.polygon_count(), 2);
        assert_eq!(svg.matches("<polyline").count(), 3);
        assert_eq!(svg.matches("stroke-dasharray").count(), 1);
        assert!(svg.contains(PALETTE[0]));
        assert!(svg.contains(PALETTE[1]));
        assert!(svg.contains("scale in meters"));
    }

    #[test]
    fn test_north_up() {
        // 250 m extent on a 270 px canvas with 10 px margins: 1 px per m
        let mut canvas = SvgCanvas::new(270.0).with_margin(10.0);
        canvas.draw_polygon(&[square(0.0, 0.0, 250.0)]);
        let svg = canvas.render();
        // southwest corner (0, 0) sits at the bottom-left of the drawing
        let bottom = 10.0 + TITLE_HEIGHT_PX + 250.0;
        assert!(svg.contains(&format!("10.00,{bottom:.2}")));
    }

    #[test]
    fn test_escape_title() {
        let mut canvas = SvgCanvas::default();
        canvas.set_title("a < b & c");
        assert!(canvas.render().contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        let mut canvas = SvgCanvas::default();
        canvas.draw_polygon(&[square(0.0, 0.0, 1.0)]);
        canvas.write_to(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<polyline"));
    }
}
