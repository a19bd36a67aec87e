use super::Color;
use crate::Result;
use glam::Vec2;
use std::path::Path;
use ::svg::node::element::{Circle, Line, Polygon};
use ::svg::Document;

/// Shape stored by [`SvgExporter`], in top view coordinates
#[derive(Debug, Clone)]
pub enum SvgShape {
    Polygon {
        points: Vec<Vec2>,
        fill: Color,
        stroke: Color,
    },
    Line {
        a: Vec2,
        b: Vec2,
        color: Color,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
}

/// Collects 2D shapes and writes them as a SVG document.
///
/// Input points use the `(x, -z)` top view convention (y axis up); they are
/// flipped to the SVG y-down axis on export.
#[derive(Debug, Clone)]
pub struct SvgExporter {
    shapes: Vec<SvgShape>,
    stroke_width: f32,
    margin: f32,
}

impl Default for SvgExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgExporter {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            stroke_width: 0.05,
            margin: 1.0,
        }
    }

    pub fn with_stroke_width(mut self, stroke_width: f32) -> Self {
        self.stroke_width = stroke_width;
        self
    }

    pub fn add_polygon(&mut self, points: &[Vec2], fill: Color, stroke: Color) {
        self.shapes.push(SvgShape::Polygon {
            points: points.to_vec(),
            fill,
            stroke,
        });
    }

    pub fn add_line(&mut self, a: Vec2, b: Vec2, color: Color) {
        self.shapes.push(SvgShape::Line { a, b, color });
    }

    pub fn add_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.shapes.push(SvgShape::Circle {
            center,
            radius,
            color,
        });
    }

    pub fn shapes(&self) -> &[SvgShape] {
        &self.shapes
    }

    fn view_box(&self) -> (f32, f32, f32, f32) {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for shape in &self.shapes {
            let (points, pad): (Vec<Vec2>, f32) = match shape {
                SvgShape::Polygon { points, .. } => (points.clone(), 0.0),
                SvgShape::Line { a, b, .. } => (vec![*a, *b], 0.0),
                SvgShape::Circle { center, radius, .. } => (vec![*center], *radius),
            };
            for p in points {
                let flipped = Vec2::new(p.x, -p.y);
                min = min.min(flipped - Vec2::splat(pad));
                max = max.max(flipped + Vec2::splat(pad));
            }
        }
        if min.x > max.x {
            return (0.0, 0.0, 1.0, 1.0);
        }
        (
            min.x - self.margin,
            min.y - self.margin,
            (max.x - min.x) + 2.0 * self.margin,
            (max.y - min.y) + 2.0 * self.margin,
        )
    }

    /// Builds the SVG document
    pub fn to_document(&self) -> Document {
        let mut document = Document::new().set("viewBox", self.view_box());
        for shape in &self.shapes {
            document = match shape {
                SvgShape::Polygon {
                    points,
                    fill,
                    stroke,
                } => {
                    let points_attribute = points
                        .iter()
                        .map(|p| format!("{},{}", p.x, -p.y))
                        .collect::<Vec<_>>()
                        .join(" ");
                    document.add(
                        Polygon::new()
                            .set("points", points_attribute)
                            .set("fill", fill.to_hex())
                            .set("fill-opacity", fill.a)
                            .set("stroke", stroke.to_hex())
                            .set("stroke-width", self.stroke_width),
                    )
                }
                SvgShape::Line { a, b, color } => document.add(
                    Line::new()
                        .set("x1", a.x)
                        .set("y1", -a.y)
                        .set("x2", b.x)
                        .set("y2", -b.y)
                        .set("stroke", color.to_hex())
                        .set("stroke-opacity", color.a)
                        .set("stroke-width", self.stroke_width),
                ),
                SvgShape::Circle {
                    center,
                    radius,
                    color,
                } => document.add(
                    Circle::new()
                        .set("cx", center.x)
                        .set("cy", -center.y)
                        .set("r", *radius)
                        .set("fill", color.to_hex())
                        .set("fill-opacity", color.a),
                ),
            };
        }
        document
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ::svg::save(path, &self.to_document())?;
        log::debug!("SVG debug file written with {} shapes", self.shapes.len());
        Ok(())
    }
}
