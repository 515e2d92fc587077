use iced::mouse;
use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke, Text};
use iced::{Color, Font, Point, Rectangle, Renderer, Theme};
use std::f32::consts::PI;

use crate::theme::with_alpha;

/// Colors needed by the gauge from the active palette.
#[derive(Debug, Clone, Copy)]
pub struct GaugeColors {
    pub track: Color,
    pub text: Color,
    pub muted: Color,
}

/// Full-circle progress ring with the rounded value in its center.
#[derive(Debug, Clone)]
pub struct CircularGauge {
    /// Current value (0.0 – 100.0)
    pub value: f32,
    pub color: Color,
    pub colors: GaugeColors,
}

impl<Message: 'static> canvas::Program<Message> for CircularGauge {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let c = &self.colors;

        let cx = bounds.width / 2.0;
        let cy = bounds.height / 2.0;
        let thickness = 8.0f32;
        let radius = ((bounds.width.min(bounds.height) - thickness) / 2.0).max(10.0);

        frame.stroke(
            &Path::circle(Point::new(cx, cy), radius),
            Stroke::default().with_color(c.track).with_width(thickness),
        );

        // Starts at 12 o'clock, runs clockwise.
        let pct = (self.value / 100.0).clamp(0.0, 1.0);
        if pct > 0.001 {
            draw_arc(&mut frame, cx, cy, radius, thickness, -PI / 2.0, 2.0 * PI * pct, self.color);
        }

        let mut value = Text::from(format!("{:.0}", self.value));
        value.position = Point::new(cx, cy - 6.0);
        value.color = c.text;
        value.size = (radius * 0.5).max(14.0).into();
        value.font = Font::MONOSPACE;
        value.horizontal_alignment = iced::alignment::Horizontal::Center;
        value.vertical_alignment = iced::alignment::Vertical::Center;
        frame.fill_text(value);

        let mut unit = Text::from(String::from("%"));
        unit.position = Point::new(cx, cy + radius * 0.4);
        unit.color = c.muted;
        unit.size = 11.0.into();
        unit.horizontal_alignment = iced::alignment::Horizontal::Center;
        unit.vertical_alignment = iced::alignment::Vertical::Center;
        frame.fill_text(unit);

        vec![frame.into_geometry()]
    }
}

/// Draw a thick arc by approximating it with many small line segments.
/// Angles are in screen coordinates (y down), so positive sweep is clockwise.
#[allow(clippy::too_many_arguments)]
fn draw_arc(
    frame: &mut Frame,
    cx: f32, cy: f32,
    radius: f32, thickness: f32,
    start: f32, sweep: f32,
    color: Color,
) {
    let segments = ((sweep.abs() / PI * 60.0) as usize).max(8);
    let step = sweep / segments as f32;
    let mut builder = canvas::path::Builder::new();
    for i in 0..=segments {
        let angle = start + step * i as f32;
        let p = Point::new(cx + radius * angle.cos(), cy + radius * angle.sin());
        if i == 0 {
            builder.move_to(p);
        } else {
            builder.line_to(p);
        }
    }
    frame.stroke(
        &builder.build(),
        Stroke::default()
            .with_color(color)
            .with_width(thickness)
            .with_line_cap(canvas::LineCap::Round),
    );
}

/// A tiny sparkline drawn via iced Canvas (for the resources sidebar).
#[derive(Debug, Clone)]
pub struct Sparkline {
    pub data: Vec<f32>,
    pub color: Color,
}

/// Vertical position of each sample, 0 at the top, `h` at the bottom.
fn sparkline_ys(data: &[f32], h: f32) -> Vec<f32> {
    let max_val = data.iter().copied().fold(1.0_f32, f32::max);
    let min_val = data.iter().copied().fold(0.0_f32, f32::min);
    let range = (max_val - min_val).max(0.01);
    let pad = 1.0;
    data.iter()
        .map(|&v| pad + (h - 2.0 * pad) * (1.0 - (v - min_val) / range))
        .collect()
}

impl<Message: 'static> canvas::Program<Message> for Sparkline {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let n = self.data.len();
        if n < 2 {
            return vec![frame.into_geometry()];
        }

        let w = bounds.width;
        let h = bounds.height;
        let points: Vec<Point> = sparkline_ys(&self.data, h)
            .into_iter()
            .enumerate()
            .map(|(i, y)| Point::new((i as f32 / (n - 1) as f32) * w, y))
            .collect();

        let mut fill = canvas::path::Builder::new();
        fill.move_to(Point::new(0.0, h));
        for &p in &points {
            fill.line_to(p);
        }
        fill.line_to(Point::new(w, h));
        fill.close();
        frame.fill(&fill.build(), with_alpha(self.color, 0.15));

        let mut line = canvas::path::Builder::new();
        line.move_to(points[0]);
        for &p in &points[1..] {
            line.line_to(p);
        }
        frame.stroke(&line.build(), Stroke::default().with_color(self.color).with_width(1.2));

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_ys_span_height() {
        let ys = sparkline_ys(&[0.0, 50.0, 100.0], 22.0);
        assert!((ys[0] - 21.0).abs() < 1e-4);
        assert!((ys[2] - 1.0).abs() < 1e-4);
        assert!(ys[1] < ys[0] && ys[1] > ys[2]);
    }

    #[test]
    fn test_sparkline_ys_flat_series() {
        let ys = sparkline_ys(&[0.0, 0.0], 10.0);
        assert_eq!(ys[0], ys[1]);
        assert!(ys.iter().all(|y| y.is_finite()));
    }
}
